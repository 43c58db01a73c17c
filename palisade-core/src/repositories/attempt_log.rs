//! Repository trait for the append-only attempt log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    attempt::{AttemptRecord, NewAttemptRecord},
};

/// Append-only log of processed attempts plus the aggregate queries the
/// CAPTCHA gate and pattern detector need.
///
/// Records are immutable once appended. Failed attempts are counted for
/// all usernames, existing or not, so probing for valid accounts leaks
/// nothing.
#[async_trait]
pub trait AttemptLogRepository: Send + Sync + 'static {
    /// Append a record and return it with its assigned ID.
    async fn append_attempt(&self, record: NewAttemptRecord) -> Result<AttemptRecord, Error>;

    /// Failed attempts for one username since the cutoff.
    async fn count_account_failures(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, Error>;

    /// Failed attempts from one source IP since the cutoff, any username.
    async fn count_ip_failures(&self, source_ip: &str, since: DateTime<Utc>)
    -> Result<u64, Error>;

    /// Failed attempts from one source IP against one username since the
    /// cutoff.
    async fn count_ip_failures_for_username(
        &self,
        source_ip: &str,
        username: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, Error>;

    /// Number of distinct usernames with failures from one source IP since
    /// the cutoff.
    async fn distinct_usernames_for_ip(
        &self,
        source_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, Error>;

    /// The most recent `limit` records, oldest first.
    async fn recent_attempts(&self, limit: usize) -> Result<Vec<AttemptRecord>, Error>;

    /// Delete records older than the cutoff. Returns the number removed.
    async fn cleanup_old_attempts(&self, before: DateTime<Utc>) -> Result<u64, Error>;
}
