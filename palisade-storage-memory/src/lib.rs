//! In-memory storage backend for palisade
//!
//! The reference repository implementation: a [`DashMap`] account store and
//! an append-only attempt log behind an async `RwLock`. Account upserts are
//! atomic per key through the map's entry API; combined with the gateway's
//! per-account critical section this backend never loses an update, while
//! attempts for different usernames touch different shards and proceed in
//! parallel.
//!
//! Suitable for simulations and tests; real deployments put a persistent
//! backend behind the same traits.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use palisade_core::{
    AccountState, AttemptRecord, Error, NewAttemptRecord,
    id::generate_prefixed_id,
    repositories::{AccountRepository, AttemptLogRepository, RepositoryProvider},
};

/// Account state store keyed by username.
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    accounts: DashMap<String, AccountState>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn get_account(&self, username: &str) -> Result<Option<AccountState>, Error> {
        Ok(self.accounts.get(username).map(|entry| entry.clone()))
    }

    async fn upsert_account(&self, state: &AccountState) -> Result<AccountState, Error> {
        self.accounts
            .insert(state.username.clone(), state.clone());
        Ok(state.clone())
    }

    async fn delete_account(&self, username: &str) -> Result<(), Error> {
        self.accounts.remove(username);
        Ok(())
    }
}

/// Append-only attempt log.
#[derive(Debug, Default)]
pub struct MemoryAttemptLog {
    records: RwLock<Vec<AttemptRecord>>,
}

impl MemoryAttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, oldest first.
    pub async fn all_attempts(&self) -> Vec<AttemptRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AttemptLogRepository for MemoryAttemptLog {
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
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn count_account_failures(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, Error> {
        Ok(self
            .records
            .read()
            .await
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
            .read()
            .await
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
            .read()
            .await
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
        let records = self.records.read().await;
        let usernames: HashSet<&str> = records
            .iter()
            .filter(|r| !r.success && r.source_ip == source_ip && r.timestamp >= since)
            .map(|r| r.username.as_str())
            .collect();
        Ok(usernames.len() as u64)
    }

    async fn recent_attempts(&self, limit: usize) -> Result<Vec<AttemptRecord>, Error> {
        let records = self.records.read().await;
        let start = records.len().saturating_sub(limit);
        Ok(records[start..].to_vec())
    }

    async fn cleanup_old_attempts(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        let mut records = self.records.write().await;
        let before_len = records.len();
        records.retain(|r| r.timestamp >= before);
        Ok((before_len - records.len()) as u64)
    }
}

/// Bundles the in-memory repositories for the facade.
#[derive(Debug, Default)]
pub struct MemoryRepositoryProvider {
    accounts: Arc<MemoryAccountRepository>,
    attempts: Arc<MemoryAttemptLog>,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for MemoryRepositoryProvider {
    type Accounts = MemoryAccountRepository;
    type Attempts = MemoryAttemptLog;

    fn accounts(&self) -> Arc<Self::Accounts> {
        Arc::clone(&self.accounts)
    }

    fn attempts(&self) -> Arc<Self::Attempts> {
        Arc::clone(&self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::AttemptMethod;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn failure(username: &str, ip: &str, secs: i64) -> NewAttemptRecord {
        NewAttemptRecord::new(username, ip, at(secs), false)
    }

    #[tokio::test]
    async fn test_account_roundtrip() {
        let repo = MemoryAccountRepository::new();
        assert!(repo.get_account("alice").await.unwrap().is_none());

        let mut state = AccountState::new("alice");
        state.failed_attempts = 2;
        repo.upsert_account(&state).await.unwrap();

        let fetched = repo.get_account("alice").await.unwrap().unwrap();
        assert_eq!(fetched, state);

        repo.delete_account("alice").await.unwrap();
        assert!(repo.get_account("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_assigns_prefixed_id() {
        let log = MemoryAttemptLog::new();
        let record = log
            .append_attempt(failure("alice", "10.0.0.1", 0))
            .await
            .unwrap();
        assert!(record.id.starts_with("att_"));
        assert_eq!(record.method, AttemptMethod::Password);
    }

    #[tokio::test]
    async fn test_failure_counts_respect_window() {
        let log = MemoryAttemptLog::new();
        log.append_attempt(failure("alice", "10.0.0.1", 0)).await.unwrap();
        log.append_attempt(failure("alice", "10.0.0.1", 100)).await.unwrap();
        log.append_attempt(NewAttemptRecord::new("alice", "10.0.0.1", at(200), true))
            .await
            .unwrap();

        assert_eq!(log.count_account_failures("alice", at(0)).await.unwrap(), 2);
        assert_eq!(
            log.count_account_failures("alice", at(50)).await.unwrap(),
            1
        );
        assert_eq!(log.count_ip_failures("10.0.0.1", at(0)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_distinct_usernames_for_ip() {
        let log = MemoryAttemptLog::new();
        for (user, secs) in [("u1", 0), ("u2", 1), ("u1", 2)] {
            log.append_attempt(failure(user, "10.0.0.9", secs)).await.unwrap();
        }
        log.append_attempt(failure("u3", "172.16.0.1", 3)).await.unwrap();

        assert_eq!(
            log.distinct_usernames_for_ip("10.0.0.9", at(0)).await.unwrap(),
            2
        );
        assert_eq!(
            log.count_ip_failures_for_username("10.0.0.9", "u1", at(0))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_recent_attempts_keeps_order() {
        let log = MemoryAttemptLog::new();
        for secs in 0..5 {
            log.append_attempt(failure("alice", "10.0.0.1", secs)).await.unwrap();
        }

        let recent = log.recent_attempts(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, at(3));
        assert_eq!(recent[1].timestamp, at(4));
    }

    #[tokio::test]
    async fn test_cleanup_old_attempts() {
        let log = MemoryAttemptLog::new();
        log.append_attempt(failure("alice", "10.0.0.1", 0)).await.unwrap();
        log.append_attempt(failure("alice", "10.0.0.1", 100)).await.unwrap();

        let removed = log.cleanup_old_attempts(at(50)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(log.all_attempts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_provider_hands_out_shared_repositories() {
        let provider = MemoryRepositoryProvider::new();
        let accounts = provider.accounts();
        accounts
            .upsert_account(&AccountState::new("alice"))
            .await
            .unwrap();
        assert!(
            provider
                .accounts()
                .get_account("alice")
                .await
                .unwrap()
                .is_some()
        );
    }
}
