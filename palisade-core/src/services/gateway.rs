//! Adaptive defense gateway
//!
//! The gateway sits in front of the external verifier and runs the
//! per-account attempt protocol: lockout check, CAPTCHA gate, delay,
//! verification, state update, recording. Exactly one decision or error
//! comes back per attempt, never a silent drop.
//!
//! # Concurrency
//!
//! Attempts for different usernames proceed fully in parallel. Attempts
//! for the same username serialize on a per-account `tokio::sync::Mutex`
//! held for the duration of the protocol, which makes the state update a
//! single atomic read-modify-write: N simultaneous failures on one account
//! always count N. There is no global lock; the lock registry is a
//! `DashMap` keyed by username. The delay step awaits inside the calling
//! task only and never blocks other accounts.

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{
    Error,
    account::AccountState,
    attempt::NewAttemptRecord,
    config::DefenseConfig,
    error::ConfigError,
    events::{Event, EventBus},
    repositories::{AccountRepository, AttemptLogRepository},
    services::recorder::AttemptRecorder,
    verifier::{CaptchaOracle, Verifier},
};

/// One inbound login attempt, as handed to the gateway by the transport
/// layer. The timestamp is caller-supplied so replayed or simulated
/// traffic evaluates against its own clock.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub username: String,
    pub password: String,
    pub source_ip: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub captcha_token: Option<String>,
}

impl LoginAttempt {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        source_ip: impl Into<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            source_ip: source_ip.into(),
            timestamp,
            captcha_token: None,
        }
    }

    pub fn with_captcha_token(mut self, token: impl Into<String>) -> Self {
        self.captcha_token = Some(token.into());
        self
    }
}

/// The gateway's answer for one attempt. `Locked` and `CaptchaRequired`
/// are expected rejections, not faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptDecision {
    Success,
    InvalidCredentials,
    Locked { retry_after_seconds: i64 },
    CaptchaRequired,
}

pub struct DefenseGateway<A, L, V>
where
    A: AccountRepository,
    L: AttemptLogRepository,
    V: Verifier,
{
    accounts: Arc<A>,
    recorder: AttemptRecorder<L>,
    verifier: Arc<V>,
    captcha_oracle: Option<Arc<dyn CaptchaOracle>>,
    config: DefenseConfig,
    lockout_duration: ChronoDuration,
    captcha_window: ChronoDuration,
    locks: DashMap<String, Arc<Mutex<()>>>,
    events: EventBus,
}

impl<A, L, V> DefenseGateway<A, L, V>
where
    A: AccountRepository,
    L: AttemptLogRepository,
    V: Verifier,
{
    /// Build a gateway. Configuration is validated here; nothing invalid
    /// survives to request time.
    pub fn new(
        accounts: Arc<A>,
        attempts: Arc<L>,
        verifier: Arc<V>,
        config: DefenseConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        let lockout_duration = ChronoDuration::from_std(config.lockout.duration)
            .map_err(|_| ConfigError::DurationOutOfRange {
                field: "lockout.duration",
            })?;
        let captcha_window = ChronoDuration::from_std(config.captcha.window)
            .map_err(|_| ConfigError::DurationOutOfRange {
                field: "captcha.window",
            })?;

        let events = EventBus::default();
        let recorder = AttemptRecorder::new(attempts, config.pattern.clone(), events.clone())?;

        Ok(Self {
            accounts,
            recorder,
            verifier,
            captcha_oracle: None,
            config,
            lockout_duration,
            captcha_window,
            locks: DashMap::new(),
            events,
        })
    }

    /// Wire the external CAPTCHA oracle. Without one, the CAPTCHA gate
    /// fails closed: a demanded token can never pass.
    pub fn with_captcha_oracle(mut self, oracle: Arc<dyn CaptchaOracle>) -> Self {
        self.captcha_oracle = Some(oracle);
        self
    }

    pub fn config(&self) -> &DefenseConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn recorder(&self) -> &AttemptRecorder<L> {
        &self.recorder
    }

    fn account_lock(&self, username: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(username.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Process one inbound attempt through the full protocol.
    pub async fn process_attempt(&self, attempt: LoginAttempt) -> Result<AttemptDecision, Error> {
        let lock = self.account_lock(&attempt.username);
        let _guard = lock.lock().await;

        let mut state = match self.accounts.get_account(&attempt.username).await? {
            Some(state) => state,
            None => AccountState::new(attempt.username.clone()),
        };

        // Step 1: lockout check, before anything else touches the verifier.
        if state.is_locked_at(attempt.timestamp) {
            let retry_after_seconds = state
                .retry_after_seconds(attempt.timestamp)
                .unwrap_or_default();
            tracing::info!(
                username = %attempt.username,
                retry_after_seconds,
                "rejected attempt against locked account"
            );
            self.recorder
                .record(
                    NewAttemptRecord::new(
                        &attempt.username,
                        &attempt.source_ip,
                        attempt.timestamp,
                        false,
                    )
                    .with_note("locked"),
                )
                .await?;
            return Ok(AttemptDecision::Locked {
                retry_after_seconds,
            });
        }

        // Step 2: CAPTCHA gate. Friction, not a credential failure: the
        // counter is untouched on rejection.
        if self.config.captcha.enabled && self.requires_captcha(&attempt).await? {
            let passed = match (&self.captcha_oracle, &attempt.captcha_token) {
                (Some(oracle), Some(token)) => oracle.verify_token(token).await,
                _ => false,
            };
            if !passed {
                tracing::info!(
                    username = %attempt.username,
                    source_ip = %attempt.source_ip,
                    "rejected attempt pending CAPTCHA"
                );
                self.recorder
                    .record(
                        NewAttemptRecord::new(
                            &attempt.username,
                            &attempt.source_ip,
                            attempt.timestamp,
                            false,
                        )
                        .with_note("captcha-required"),
                    )
                    .await?;
                return Ok(AttemptDecision::CaptchaRequired);
            }
        }

        // Step 3: delay, computed from the current failure count before
        // the attempt is evaluated. Suspends only this task.
        let delay = self.config.delay.delay_for(state.failed_attempts);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        // Step 4: verification. A verifier failure is no attempt at all as
        // far as account state is concerned, but it is still recorded.
        let verified = match self
            .verifier
            .attempt(&attempt.username, &attempt.password)
            .await
        {
            Ok(verified) => verified,
            Err(e) => {
                tracing::warn!(
                    username = %attempt.username,
                    error = %e,
                    "verifier unavailable"
                );
                self.recorder
                    .record(
                        NewAttemptRecord::new(
                            &attempt.username,
                            &attempt.source_ip,
                            attempt.timestamp,
                            false,
                        )
                        .with_note("verifier-error"),
                    )
                    .await?;
                return Err(e.into());
            }
        };

        // Step 5: state update, atomic for this account under the guard.
        if verified {
            let was_locked = state.locked_until.is_some();
            state.record_success();
            self.accounts.upsert_account(&state).await?;
            if was_locked {
                self.events
                    .emit(&Event::AccountUnlocked {
                        username: attempt.username.clone(),
                        timestamp: attempt.timestamp,
                    })
                    .await?;
            }
        } else {
            let newly_locked = state.record_failure(
                attempt.timestamp,
                self.config.lockout.threshold,
                self.lockout_duration,
            );
            self.accounts.upsert_account(&state).await?;

            self.events
                .emit(&Event::LoginFailed {
                    username: attempt.username.clone(),
                    failed_attempts: state.failed_attempts,
                    source_ip: attempt.source_ip.clone(),
                    timestamp: attempt.timestamp,
                })
                .await?;

            if newly_locked {
                let locked_until = state.locked_until.unwrap_or(attempt.timestamp);
                tracing::warn!(
                    username = %attempt.username,
                    failed_attempts = state.failed_attempts,
                    %locked_until,
                    "account locked"
                );
                self.events
                    .emit(&Event::AccountLocked {
                        username: attempt.username.clone(),
                        failed_attempts: state.failed_attempts,
                        locked_until,
                        source_ip: attempt.source_ip.clone(),
                        timestamp: attempt.timestamp,
                    })
                    .await?;
            }
        }

        // Step 6: record the final outcome.
        let note = if verified { "" } else { "invalid-credentials" };
        self.recorder
            .record(
                NewAttemptRecord::new(
                    &attempt.username,
                    &attempt.source_ip,
                    attempt.timestamp,
                    verified,
                )
                .with_note(note),
            )
            .await?;

        Ok(if verified {
            AttemptDecision::Success
        } else {
            AttemptDecision::InvalidCredentials
        })
    }

    /// Whether the account's or the source IP's recent failures put this
    /// attempt behind the CAPTCHA gate.
    async fn requires_captcha(&self, attempt: &LoginAttempt) -> Result<bool, Error> {
        let since = attempt.timestamp - self.captcha_window;
        let threshold = u64::from(self.config.captcha.failure_threshold);

        let account_failures = self
            .recorder
            .account_failures_since(&attempt.username, since)
            .await?;
        if account_failures > threshold {
            return Ok(true);
        }

        let ip_failures = self
            .recorder
            .ip_failures_since(&attempt.source_ip, since)
            .await?;
        Ok(ip_failures > threshold)
    }
}
