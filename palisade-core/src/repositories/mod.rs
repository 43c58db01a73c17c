//! Repository traits for the defense-side data access layer
//!
//! These traits abstract the account-state store and the append-only
//! attempt log. Storage layout is an external concern; backends only need
//! to honor the access contract here. The gateway serializes writes per
//! account, so implementations do not need cross-call transactions;
//! single-call atomicity per method is enough.

pub mod account;
pub mod attempt_log;

pub use account::AccountRepository;
pub use attempt_log::AttemptLogRepository;

use std::sync::Arc;

/// Bundles the repositories a gateway needs. Backends implement this once
/// and hand the whole provider to the facade.
pub trait RepositoryProvider: Send + Sync + 'static {
    type Accounts: AccountRepository;
    type Attempts: AttemptLogRepository;

    fn accounts(&self) -> Arc<Self::Accounts>;
    fn attempts(&self) -> Arc<Self::Attempts>;
}
