//! Per-account lockout state
//!
//! [`AccountState`] is owned exclusively by the defense gateway: it is read
//! and written only inside the gateway's per-account critical section, so
//! the transition methods here can be plain and synchronous.
//!
//! Lockout expiry does not reset the failure counter; only a successful
//! attempt does. An account whose lock has lapsed but whose counter is
//! still at the threshold re-locks on its next failure.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub username: String,
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl AccountState {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            failed_attempts: 0,
            locked_until: None,
        }
    }

    /// Whether the account rejects attempts at `now`.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Seconds until the lock lapses, if locked at `now`.
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.locked_until
            .filter(|until| now < *until)
            .map(|until| (until - now).num_seconds().max(1))
    }

    /// Apply a successful attempt: the counter resets and any lock clears.
    pub fn record_success(&mut self) {
        self.failed_attempts = 0;
        self.locked_until = None;
    }

    /// Apply a failed attempt at `now`. Returns `true` when this failure
    /// pushed the account to (or past) the threshold and set a new lock.
    pub fn record_failure(&mut self, now: DateTime<Utc>, threshold: u32, lockout: Duration) -> bool {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        if self.failed_attempts >= threshold {
            self.locked_until = Some(now + lockout);
            true
        } else {
            false
        }
    }
}
