use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Verifier error: {0}")]
    Verifier(#[from] VerifierError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Invalid attack or defense configuration. Always fatal, raised eagerly
/// before any run or attempt is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Alphabet is empty")]
    EmptyAlphabet,

    #[error("Keyspace declares no alphabets")]
    NoAlphabets,

    #[error("Invalid length range: min {min} > max {max}")]
    InvalidLengthRange { min: usize, max: usize },

    #[error("Minimum candidate length must be at least 1")]
    ZeroLength,

    #[error("Wordlist unreadable: {path}: {source}")]
    WordlistUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("Worker count must be at least 1")]
    ZeroWorkers,

    #[error("Lockout threshold must be at least 1")]
    ZeroLockoutThreshold,

    #[error("CAPTCHA failure threshold must be at least 1")]
    ZeroCaptchaThreshold,

    #[error("Pattern threshold must be at least 1")]
    ZeroPatternThreshold,

    #[error("{field} must be non-zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} is out of range")]
    DurationOutOfRange { field: &'static str },

    #[error("Progressive growth factor must be at least 1.0, got {0}")]
    GrowthFactorTooSmall(f64),
}

/// Bad rainbow table data. Fatal at table build time.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Duplicate hash in rainbow table: {0}")]
    DuplicateHash(String),

    #[error("Rainbow table unreadable: {0}")]
    Unreadable(String),

    #[error("Malformed rainbow table: {0}")]
    Malformed(String),

    #[error("Invalid hex hash key: {0}")]
    InvalidHashKey(String),
}

/// The external verifier could not answer. The attack side retries these
/// with bounded backoff; the defense side surfaces them without mutating
/// account state.
#[derive(Debug, Clone, Error)]
pub enum VerifierError {
    #[error("Verifier unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event handler error: {0}")]
    HandlerError(String),
}

impl Error {
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    pub fn is_build_error(&self) -> bool {
        matches!(self, Error::Build(_))
    }

    /// Verifier failures are the only errors the attack side treats as
    /// transient and retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Verifier(VerifierError::Unavailable(_)))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
