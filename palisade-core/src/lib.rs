//! Core functionality for the palisade project
//!
//! Palisade simulates credential-guessing attacks against an
//! authentication endpoint together with the layered defenses that
//! mitigate them. This crate holds both subsystems and their interaction
//! contract:
//!
//! - the attack side: [`generator::AttackStrategy`], the
//!   [`partition`] module, and [`services::AttackOrchestrator`];
//! - the defense side: [`services::DefenseGateway`],
//!   [`services::AttemptRecorder`], and the repository traits backing
//!   them.
//!
//! Password hashing, CAPTCHA validation, and credential checking are
//! consumed through the capability traits in [`verifier`]; the core never
//! implements them.

pub mod account;
pub mod alphabet;
pub mod attempt;
pub mod config;
pub mod error;
pub mod events;
pub mod generator;
pub mod id;
pub mod keyspace;
pub mod partition;
pub mod rainbow;
pub mod repositories;
pub mod services;
pub mod verifier;
pub mod wordlist;

pub use account::AccountState;
pub use alphabet::Alphabet;
pub use attempt::{AttemptMethod, AttemptRecord, NewAttemptRecord};
pub use config::{AttackConfig, CaptchaConfig, DefenseConfig, DelayConfig, DelayMode, LockoutConfig, PatternConfig};
pub use error::Error;
pub use events::{Event, EventBus, EventHandler};
pub use generator::{AttackStrategy, Candidate};
pub use keyspace::KeyspaceRange;
pub use rainbow::{RainbowEntry, RainbowTable};
pub use services::{
    AttackOrchestrator, AttackOutcome, AttackPhase, AttackReport, AttemptDecision,
    AttemptRecorder, DefenseGateway, LoginAttempt,
};
pub use verifier::{CaptchaOracle, PasswordHasher, Verifier};
pub use wordlist::{Dictionary, MutationRule, UserProfile, Wordlist};
