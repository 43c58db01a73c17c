//! Repository trait for per-account lockout state.

use async_trait::async_trait;

use crate::{Error, account::AccountState};

/// Storage for [`AccountState`], keyed by username.
///
/// The gateway is the sole writer during an attempt and holds the
/// account's critical section across get/upsert, so a backend only needs
/// per-call atomicity keyed by username, never a store-wide lock.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Fetch the state for a username, or `None` if the account has never
    /// been seen.
    async fn get_account(&self, username: &str) -> Result<Option<AccountState>, Error>;

    /// Insert or replace the state for `state.username`.
    async fn upsert_account(&self, state: &AccountState) -> Result<AccountState, Error>;

    /// Remove an account's state entirely.
    async fn delete_account(&self, username: &str) -> Result<(), Error>;
}
