//! External capability seams
//!
//! The core never implements credential checking, password hashing, or
//! CAPTCHA validation itself; it consumes them through the traits here.
//! The attack orchestrator and the defense gateway share the same
//! [`Verifier`] seam, which is what lets a simulation point the
//! attacker at the defended endpoint.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::VerifierError;

/// The credential oracle: does this username/password pair authenticate?
///
/// Errors mean the verifier could not answer (network failure, backend
/// down). The attack side retries them with bounded backoff; the defense
/// side surfaces them without touching account state.
#[async_trait]
pub trait Verifier: Send + Sync + 'static {
    async fn attempt(&self, username: &str, password: &str) -> Result<bool, VerifierError>;
}

/// Opaque password hashing capability. Supplied by the collaborator server;
/// the core only ever calls through it.
pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, password: &str, salt: &[u8]) -> String;
    fn verify(&self, password: &str, digest: &str) -> bool;
}

/// External CAPTCHA verification oracle.
#[async_trait]
pub trait CaptchaOracle: Send + Sync + 'static {
    async fn verify_token(&self, token: &str) -> bool;
}

/// A fixed credential store behind the [`Verifier`] seam: username →
/// stored digest, checked through a supplied [`PasswordHasher`]. Useful as
/// the simulation target and in tests.
pub struct StaticVerifier<H: PasswordHasher> {
    digests: HashMap<String, String>,
    hasher: H,
}

impl<H: PasswordHasher> StaticVerifier<H> {
    pub fn new(hasher: H) -> Self {
        Self {
            digests: HashMap::new(),
            hasher,
        }
    }

    pub fn with_credential(
        mut self,
        username: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        self.digests.insert(username.into(), digest.into());
        self
    }
}

#[async_trait]
impl<H: PasswordHasher> Verifier for StaticVerifier<H> {
    async fn attempt(&self, username: &str, password: &str) -> Result<bool, VerifierError> {
        Ok(self
            .digests
            .get(username)
            .is_some_and(|digest| self.hasher.verify(password, digest)))
    }
}

/// A CAPTCHA oracle that accepts a fixed set of tokens. Stands in for the
/// real external service in simulations and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCaptchaOracle {
    valid: std::collections::HashSet<String>,
}

impl StaticCaptchaOracle {
    pub fn accepting(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            valid: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CaptchaOracle for StaticCaptchaOracle {
    async fn verify_token(&self, token: &str) -> bool {
        self.valid.contains(token)
    }
}
