//! Attempt recorder and pattern detector
//!
//! Every processed attempt ends here: the recorder folds any advisory
//! pattern flag into the record's note (records are immutable once
//! written), appends it, and emits security events. The detector's rule is
//! deliberately simple: failures from one source IP spread across more
//! than `threshold` distinct usernames inside a rolling window look like a
//! distributed (password spraying) attack. Detection annotates; blocking
//! policy belongs to an external alerting collaborator.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    Error,
    attempt::{AttemptRecord, NewAttemptRecord},
    config::PatternConfig,
    error::ConfigError,
    events::{Event, EventBus},
    repositories::AttemptLogRepository,
};

/// Note annotation applied to attempts flagged by the pattern detector.
pub const DISTRIBUTED_ATTACK_NOTE: &str = "distributed-attack";

pub struct AttemptRecorder<L: AttemptLogRepository> {
    log: Arc<L>,
    pattern: PatternConfig,
    pattern_window: Duration,
    events: EventBus,
}

impl<L: AttemptLogRepository> AttemptRecorder<L> {
    pub fn new(log: Arc<L>, pattern: PatternConfig, events: EventBus) -> Result<Self, ConfigError> {
        pattern.validate()?;
        let pattern_window = Duration::from_std(pattern.window)
            .map_err(|_| ConfigError::DurationOutOfRange {
                field: "pattern.window",
            })?;
        Ok(Self {
            log,
            pattern,
            pattern_window,
            events,
        })
    }

    /// Append a record, annotating it first if its source IP now matches
    /// the distributed-attack pattern.
    pub async fn record(&self, mut record: NewAttemptRecord) -> Result<AttemptRecord, Error> {
        if !record.success {
            if let Some(distinct) = self.detect_distributed(&record).await? {
                record.annotate(DISTRIBUTED_ATTACK_NOTE);
                tracing::warn!(
                    source_ip = %record.source_ip,
                    distinct_usernames = distinct,
                    "distributed attack pattern detected"
                );
                self.events
                    .emit(&Event::DistributedAttackDetected {
                        source_ip: record.source_ip.clone(),
                        distinct_usernames: distinct,
                        timestamp: record.timestamp,
                    })
                    .await?;
            }
        }

        let record = self.log.append_attempt(record).await?;
        tracing::debug!(
            username = %record.username,
            source_ip = %record.source_ip,
            success = record.success,
            note = %record.note,
            "recorded authentication attempt"
        );
        Ok(record)
    }

    /// Distinct usernames (including this attempt's) with failures from the
    /// record's source IP inside the rolling window, if that count exceeds
    /// the pattern threshold.
    async fn detect_distributed(&self, record: &NewAttemptRecord) -> Result<Option<u64>, Error> {
        let since = record.timestamp - self.pattern_window;
        let past_distinct = self
            .log
            .distinct_usernames_for_ip(&record.source_ip, since)
            .await?;
        let seen_before = self
            .log
            .count_ip_failures_for_username(&record.source_ip, &record.username, since)
            .await?
            > 0;
        let distinct = past_distinct + u64::from(!seen_before);

        if distinct > u64::from(self.pattern.threshold) {
            Ok(Some(distinct))
        } else {
            Ok(None)
        }
    }

    /// Failed attempts for a username inside a window ending at `now`.
    pub async fn account_failures_since(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, Error> {
        self.log.count_account_failures(username, since).await
    }

    /// Failed attempts from a source IP inside a window ending at `now`.
    pub async fn ip_failures_since(
        &self,
        source_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, Error> {
        self.log.count_ip_failures(source_ip, since).await
    }

    pub async fn recent_attempts(&self, limit: usize) -> Result<Vec<AttemptRecord>, Error> {
        self.log.recent_attempts(limit).await
    }

    /// Delete records older than the cutoff.
    pub async fn cleanup_old_attempts(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        self.log.cleanup_old_attempts(before).await
    }

    /// Start the background retention task: periodically deletes records
    /// older than `retention`, until the shutdown channel flips.
    pub fn start_cleanup_task(
        &self,
        retention: Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let log = Arc::clone(&self.log);

        // Cleanup runs hourly
        const CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = Utc::now() - retention;
                        match log.cleanup_old_attempts(before).await {
                            Ok(count) if count > 0 => {
                                tracing::info!(count = count, "Cleaned up old attempt records");
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to cleanup attempt records");
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down attempt log cleanup task");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::AttemptMethod;
    use crate::id::generate_prefixed_id;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock log for testing
    struct MockAttemptLog {
        records: Mutex<Vec<AttemptRecord>>,
    }

    impl MockAttemptLog {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AttemptLogRepository for MockAttemptLog {
        async fn append_attempt(&self, record: NewAttemptRecord) -> Result<AttemptRecord, Error> {
            let record = AttemptRecord {
                id: generate_prefixed_id("att"),
                username: record.username,
                source_ip: record.source_ip,
                timestamp: record.timestamp,
                success: record.success,
                method: record.method,
                note: record.note,
            };
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn count_account_failures(
            &self,
            username: &str,
            since: DateTime<Utc>,
        ) -> Result<u64, Error> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| !r.success && r.username == username && r.timestamp >= since)
                .count() as u64)
        }

        async fn count_ip_failures(
            &self,
            source_ip: &str,
            since: DateTime<Utc>,
        ) -> Result<u64, Error> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| !r.success && r.source_ip == source_ip && r.timestamp >= since)
                .count() as u64)
        }

        async fn count_ip_failures_for_username(
            &self,
            source_ip: &str,
            username: &str,
            since: DateTime<Utc>,
        ) -> Result<u64, Error> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| {
                    !r.success
                        && r.source_ip == source_ip
                        && r.username == username
                        && r.timestamp >= since
                })
                .count() as u64)
        }

        async fn distinct_usernames_for_ip(
            &self,
            source_ip: &str,
            since: DateTime<Utc>,
        ) -> Result<u64, Error> {
            let records = self.records.lock().unwrap();
            let usernames: HashSet<&str> = records
                .iter()
                .filter(|r| !r.success && r.source_ip == source_ip && r.timestamp >= since)
                .map(|r| r.username.as_str())
                .collect();
            Ok(usernames.len() as u64)
        }

        async fn recent_attempts(&self, limit: usize) -> Result<Vec<AttemptRecord>, Error> {
            let records = self.records.lock().unwrap();
            let start = records.len().saturating_sub(limit);
            Ok(records[start..].to_vec())
        }

        async fn cleanup_old_attempts(&self, before: DateTime<Utc>) -> Result<u64, Error> {
            let mut records = self.records.lock().unwrap();
            let before_len = records.len();
            records.retain(|r| r.timestamp >= before);
            Ok((before_len - records.len()) as u64)
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn recorder(log: Arc<MockAttemptLog>, threshold: u32) -> AttemptRecorder<MockAttemptLog> {
        AttemptRecorder::new(
            log,
            PatternConfig {
                threshold,
                window: std::time::Duration::from_secs(60),
            },
            EventBus::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_record_assigns_id_and_appends() {
        let log = Arc::new(MockAttemptLog::new());
        let recorder = recorder(log.clone(), 5);

        let record = recorder
            .record(NewAttemptRecord::new("alice", "10.0.0.1", at(0), false))
            .await
            .unwrap();

        assert!(record.id.starts_with("att_"));
        assert_eq!(record.method, AttemptMethod::Password);
        assert_eq!(log.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_spraying_across_usernames_is_flagged() {
        let log = Arc::new(MockAttemptLog::new());
        let recorder = recorder(log.clone(), 2);

        // Two distinct usernames: under the threshold, no flag.
        for (i, user) in ["u1", "u2"].iter().enumerate() {
            let record = recorder
                .record(NewAttemptRecord::new(*user, "10.0.0.9", at(i as i64), false))
                .await
                .unwrap();
            assert!(!record.note.contains(DISTRIBUTED_ATTACK_NOTE));
        }

        // Third distinct username pushes past the threshold.
        let record = recorder
            .record(NewAttemptRecord::new("u3", "10.0.0.9", at(2), false))
            .await
            .unwrap();
        assert!(record.note.contains(DISTRIBUTED_ATTACK_NOTE));
    }

    #[tokio::test]
    async fn test_repeated_failures_on_one_account_not_flagged() {
        let log = Arc::new(MockAttemptLog::new());
        let recorder = recorder(log.clone(), 2);

        for i in 0..10 {
            let record = recorder
                .record(NewAttemptRecord::new("alice", "10.0.0.9", at(i), false))
                .await
                .unwrap();
            assert!(
                !record.note.contains(DISTRIBUTED_ATTACK_NOTE),
                "single-account failures are not a distributed pattern"
            );
        }
    }

    #[tokio::test]
    async fn test_failures_outside_window_ignored() {
        let log = Arc::new(MockAttemptLog::new());
        let recorder = recorder(log.clone(), 2);

        for (i, user) in ["u1", "u2", "u3"].iter().enumerate() {
            recorder
                .record(NewAttemptRecord::new(*user, "10.0.0.9", at(i as i64), false))
                .await
                .unwrap();
        }

        // Two minutes later the old failures have aged out.
        let record = recorder
            .record(NewAttemptRecord::new("u4", "10.0.0.9", at(180), false))
            .await
            .unwrap();
        assert!(!record.note.contains(DISTRIBUTED_ATTACK_NOTE));
    }

    #[tokio::test]
    async fn test_successes_not_flagged() {
        let log = Arc::new(MockAttemptLog::new());
        let recorder = recorder(log.clone(), 1);

        for (i, user) in ["u1", "u2", "u3"].iter().enumerate() {
            let record = recorder
                .record(NewAttemptRecord::new(*user, "10.0.0.9", at(i as i64), true))
                .await
                .unwrap();
            assert!(record.note.is_empty());
        }
    }

    #[tokio::test]
    async fn test_cleanup_removes_old_records() {
        let log = Arc::new(MockAttemptLog::new());
        let recorder = recorder(log.clone(), 5);

        recorder
            .record(NewAttemptRecord::new("alice", "10.0.0.1", at(0), false))
            .await
            .unwrap();
        recorder
            .record(NewAttemptRecord::new("alice", "10.0.0.1", at(100), false))
            .await
            .unwrap();

        let removed = recorder.cleanup_old_attempts(at(50)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(recorder.recent_attempts(10).await.unwrap().len(), 1);
    }
}
