//! Service layer for the attack and defense subsystems
//!
//! Services coordinate the domain types with repositories and external
//! capabilities: the orchestrator drives attack runs, the gateway enforces
//! the defense protocol, and the recorder owns the attempt log.

pub mod gateway;
pub mod orchestrator;
pub mod recorder;

pub use gateway::{AttemptDecision, DefenseGateway, LoginAttempt};
pub use orchestrator::{AttackOrchestrator, AttackOutcome, AttackPhase, AttackReport};
pub use recorder::AttemptRecorder;
