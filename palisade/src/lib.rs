//! # Palisade
//!
//! Palisade simulates credential-guessing attacks against an authentication
//! endpoint and the layered defenses that mitigate them. It is a reference
//! implementation: the point is correctness and clarity of the
//! attack/defense state machines under concurrency, not raw cracking
//! throughput.
//!
//! The attack side enumerates candidates (mono/poly keyspaces, mutated
//! wordlists, rainbow lookups) and fans them out across concurrent
//! workers. The defense side is a per-account gateway applying lockout,
//! delay, CAPTCHA gating, and pattern detection in front of an external
//! verifier. [`GatewayVerifier`] closes the loop by exposing a defended
//! gateway as the attack's target.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use palisade::{
//!     DefenseConfig, LoginAttempt, MemoryRepositoryProvider, Palisade, PasswordHasher,
//!     StaticVerifier,
//! };
//!
//! // Stand-in for the external hashing capability.
//! struct PlainHasher;
//!
//! impl PasswordHasher for PlainHasher {
//!     fn hash(&self, password: &str, _salt: &[u8]) -> String {
//!         format!("plain${password}")
//!     }
//!     fn verify(&self, password: &str, digest: &str) -> bool {
//!         digest.strip_prefix("plain$") == Some(password)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = Arc::new(MemoryRepositoryProvider::new());
//!     let verifier = Arc::new(
//!         StaticVerifier::new(PlainHasher)
//!             .with_credential("alice", PlainHasher.hash("hunter2", b"salt")),
//!     );
//!
//!     let palisade = Palisade::new(provider, verifier, DefenseConfig::default()).unwrap();
//!
//!     let decision = palisade
//!         .login(LoginAttempt::new("alice", "hunter2", "127.0.0.1", Utc::now()))
//!         .await
//!         .unwrap();
//!     println!("{decision:?}");
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use palisade_core::{
    error::VerifierError,
    repositories::RepositoryProvider,
    services::gateway::DefenseGateway,
};

/// Re-export core types from palisade_core
///
/// These types are commonly used when working with the Palisade API.
pub use palisade_core::{
    AccountState, Alphabet, AttackConfig, AttackOrchestrator, AttackOutcome, AttackPhase,
    AttackReport, AttackStrategy, AttemptDecision, AttemptMethod, AttemptRecord, Candidate,
    CaptchaConfig, CaptchaOracle, DefenseConfig, DelayConfig, DelayMode, Dictionary, Error, Event,
    EventBus, EventHandler, KeyspaceRange, LockoutConfig, LoginAttempt, MutationRule,
    NewAttemptRecord, PasswordHasher, PatternConfig, RainbowEntry, RainbowTable, UserProfile,
    Verifier, Wordlist,
};

pub use palisade_core::verifier::{StaticCaptchaOracle, StaticVerifier};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding
/// feature is enabled.
#[cfg(feature = "memory")]
pub use palisade_storage_memory::{
    MemoryAccountRepository, MemoryAttemptLog, MemoryRepositoryProvider,
};

/// A wired-up defense deployment: repository provider, verifier, and
/// defense configuration behind one login surface.
pub struct Palisade<P: RepositoryProvider, V: Verifier> {
    provider: Arc<P>,
    gateway: DefenseGateway<P::Accounts, P::Attempts, V>,
}

impl<P: RepositoryProvider, V: Verifier> Palisade<P, V> {
    /// Wire a gateway over the provider's repositories. The defense
    /// configuration is validated here; an invalid preset never comes up.
    pub fn new(provider: Arc<P>, verifier: Arc<V>, config: DefenseConfig) -> Result<Self, Error> {
        let gateway = DefenseGateway::new(
            provider.accounts(),
            provider.attempts(),
            verifier,
            config,
        )?;
        Ok(Self { provider, gateway })
    }

    /// Wire the external CAPTCHA oracle. Without one, a demanded CAPTCHA
    /// can never pass.
    pub fn with_captcha_oracle(mut self, oracle: Arc<dyn CaptchaOracle>) -> Self {
        self.gateway = self.gateway.with_captcha_oracle(oracle);
        self
    }

    /// Process one inbound login attempt through the defense protocol.
    pub async fn login(&self, attempt: LoginAttempt) -> Result<AttemptDecision, Error> {
        self.gateway.process_attempt(attempt).await
    }

    pub fn gateway(&self) -> &DefenseGateway<P::Accounts, P::Attempts, V> {
        &self.gateway
    }

    /// The security event bus; register handlers to observe lockouts and
    /// attack detections.
    pub fn events(&self) -> &EventBus {
        self.gateway.events()
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }
}

/// Adapts a defended [`Palisade`] deployment into the attack side's
/// [`Verifier`] seam, so an [`AttackOrchestrator`] can run against the
/// gateway exactly as it would against an undefended endpoint. Rejections
/// of any kind (wrong password, lockout, CAPTCHA demand) read as a
/// failed guess to the attacker.
pub struct GatewayVerifier<P: RepositoryProvider, V: Verifier> {
    palisade: Arc<Palisade<P, V>>,
    source_ip: String,
}

impl<P: RepositoryProvider, V: Verifier> GatewayVerifier<P, V> {
    pub fn new(palisade: Arc<Palisade<P, V>>, source_ip: impl Into<String>) -> Self {
        Self {
            palisade,
            source_ip: source_ip.into(),
        }
    }
}

#[async_trait]
impl<P: RepositoryProvider, V: Verifier> Verifier for GatewayVerifier<P, V> {
    async fn attempt(&self, username: &str, password: &str) -> Result<bool, VerifierError> {
        tracing::trace!(username, "relaying attack attempt through gateway");
        let attempt = LoginAttempt::new(username, password, self.source_ip.clone(), Utc::now());
        match self.palisade.login(attempt).await {
            Ok(AttemptDecision::Success) => Ok(true),
            Ok(_) => Ok(false),
            Err(Error::Verifier(error)) => Err(error),
            Err(error) => Err(VerifierError::Unavailable(error.to_string())),
        }
    }
}
