//! Attack and defense configuration
//!
//! All configuration is validated eagerly: an orchestrator or gateway is
//! never constructed from an invalid config, and no error surfaces
//! mid-run from a value that could have been rejected at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the gateway stalls an attempt before consulting the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayMode {
    None,
    Linear,
    Progressive,
}

/// Delay policy applied at step 3 of the attempt protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayConfig {
    pub mode: DelayMode,
    /// Fixed delay in linear mode; first-attempt delay in progressive mode.
    pub base_delay: Duration,
    /// Per-failure multiplier in progressive mode.
    pub growth_factor: f64,
    /// Upper bound for progressive delays.
    pub max_delay: Duration,
}

impl DelayConfig {
    pub fn none() -> Self {
        Self {
            mode: DelayMode::None,
            base_delay: Duration::ZERO,
            growth_factor: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    pub fn linear(delay: Duration) -> Self {
        Self {
            mode: DelayMode::Linear,
            base_delay: delay,
            growth_factor: 1.0,
            max_delay: delay,
        }
    }

    pub fn progressive(base: Duration, growth_factor: f64, max: Duration) -> Self {
        Self {
            mode: DelayMode::Progressive,
            base_delay: base,
            growth_factor,
            max_delay: max,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            DelayMode::None => Ok(()),
            DelayMode::Linear => {
                if self.base_delay.is_zero() {
                    return Err(ConfigError::ZeroDuration {
                        field: "delay.base_delay",
                    });
                }
                Ok(())
            }
            DelayMode::Progressive => {
                if self.base_delay.is_zero() {
                    return Err(ConfigError::ZeroDuration {
                        field: "delay.base_delay",
                    });
                }
                if self.max_delay.is_zero() {
                    return Err(ConfigError::ZeroDuration {
                        field: "delay.max_delay",
                    });
                }
                if self.growth_factor < 1.0 || !self.growth_factor.is_finite() {
                    return Err(ConfigError::GrowthFactorTooSmall(self.growth_factor));
                }
                Ok(())
            }
        }
    }

    /// The delay owed before an attempt, given the account's current
    /// failure count. Monotonically non-decreasing in `failed_attempts`
    /// and never above `max_delay` in progressive mode.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        match self.mode {
            DelayMode::None => Duration::ZERO,
            DelayMode::Linear => self.base_delay,
            DelayMode::Progressive => {
                // Exponent clamped so the f64 math stays finite; any real
                // growth factor has hit the cap long before this.
                let exponent = failed_attempts.min(1_000) as i32;
                let grown = self.base_delay.as_secs_f64() * self.growth_factor.powi(exponent);
                let capped = grown.min(self.max_delay.as_secs_f64());
                Duration::from_secs_f64(capped)
            }
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self::progressive(Duration::from_secs(1), 2.0, Duration::from_secs(30))
    }
}

/// Account lockout policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Failures that trigger a lock.
    pub threshold: u32,
    /// How long a lock lasts.
    pub duration: Duration,
}

impl LockoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::ZeroLockoutThreshold);
        }
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "lockout.duration",
            });
        }
        Ok(())
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            duration: Duration::from_secs(300),
        }
    }
}

/// CAPTCHA gating policy. When enabled, an account or source IP whose
/// recent failures exceed the threshold must present a passing token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaConfig {
    pub enabled: bool,
    /// Failures within the window before a token is demanded.
    pub failure_threshold: u32,
    /// Sliding window for counting failures.
    pub window: Duration,
}

impl CaptchaConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroCaptchaThreshold);
        }
        if self.window.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "captcha.window",
            });
        }
        Ok(())
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_threshold: 3,
            window: Duration::from_secs(600),
        }
    }
}

/// Distributed-attack detection: more than `threshold` distinct usernames
/// with failures from one source IP inside the window flags the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub threshold: u32,
    pub window: Duration,
}

impl PatternConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::ZeroPatternThreshold);
        }
        if self.window.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "pattern.window",
            });
        }
        Ok(())
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            window: Duration::from_secs(60),
        }
    }
}

/// Full defense preset for a gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefenseConfig {
    pub delay: DelayConfig,
    pub lockout: LockoutConfig,
    pub captcha: CaptchaConfig,
    pub pattern: PatternConfig,
}

impl DefenseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delay.validate()?;
        self.lockout.validate()?;
        self.captcha.validate()?;
        self.pattern.validate()?;
        Ok(())
    }
}

/// Attack orchestrator tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackConfig {
    /// Concurrent workers to spawn.
    pub worker_count: usize,
    /// Retries per candidate on transient verifier failure.
    pub max_retries: u32,
    /// Linear backoff unit: retry `n` sleeps `n * retry_backoff`.
    pub retry_backoff: Duration,
}

impl AttackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            max_retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}
