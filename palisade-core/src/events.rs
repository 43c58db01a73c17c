//! Security event bus
//!
//! The defense side emits events at state transitions so monitoring and
//! alerting collaborators can react without being wired into the gateway's
//! protocol. Handlers are advisory: they observe, they do not block or veto
//! an attempt.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::EventError;

/// Events emitted by the defense gateway and the attempt recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A login attempt failed verification.
    LoginFailed {
        username: String,
        failed_attempts: u32,
        source_ip: String,
        timestamp: DateTime<Utc>,
    },

    /// An account reached the failure threshold and was locked.
    AccountLocked {
        username: String,
        failed_attempts: u32,
        locked_until: DateTime<Utc>,
        source_ip: String,
        timestamp: DateTime<Utc>,
    },

    /// A previously locked account was cleared by a successful login.
    AccountUnlocked {
        username: String,
        timestamp: DateTime<Utc>,
    },

    /// One source IP accumulated failures across enough distinct usernames
    /// to look like a distributed (password spraying) attack. Advisory.
    DistributedAttackDetected {
        source_ip: String,
        distinct_usernames: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A handler registered with the [`EventBus`]. Called asynchronously for
/// each emitted event.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle_event(&self, event: &Event) -> Result<(), EventError>;
}

/// Event bus that can emit events and register event handlers.
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register an event handler with the event bus.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().await.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: &Event) -> Result<(), EventError> {
        for handler in self.handlers.read().await.iter() {
            handler.handle_event(event).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle_event(&self, _event: &Event) -> Result<(), EventError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ErroringHandler;

    #[async_trait]
    impl EventHandler for ErroringHandler {
        async fn handle_event(&self, _event: &Event) -> Result<(), EventError> {
            Err(EventError::HandlerError("boom".into()))
        }
    }

    fn sample_event() -> Event {
        Event::LoginFailed {
            username: "alice".into(),
            failed_attempts: 1,
            source_ip: "10.0.0.1".into(),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_emit_with_no_handlers() {
        let bus = EventBus::default();
        bus.emit(&sample_event()).await.unwrap();
    }

    #[tokio::test]
    async fn test_all_handlers_called() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        bus.register(Arc::new(CountingHandler {
            count: count.clone(),
        }))
        .await;
        bus.register(Arc::new(CountingHandler {
            count: count.clone(),
        }))
        .await;

        bus.emit(&sample_event()).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let bus = EventBus::default();
        bus.register(Arc::new(ErroringHandler)).await;
        let result = bus.emit(&sample_event()).await;
        assert!(matches!(result, Err(EventError::HandlerError(_))));
    }
}
