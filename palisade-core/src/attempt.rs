//! Authentication attempt records
//!
//! One record is appended per processed attempt, after the outcome is
//! known, on every path (locked, CAPTCHA-blocked, verifier error, or
//! verified). Records are append-only and never mutated after creation;
//! advisory annotations such as the distributed-attack flag are folded
//! into the note before the record is written.
//!
//! Passwords never appear in records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the attempt authenticated. Currently only password login flows
/// through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptMethod {
    Password,
}

/// A stored attempt record, as returned by the attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: String,
    pub username: String,
    pub source_ip: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub method: AttemptMethod,
    pub note: String,
}

/// An attempt record before the log has assigned it an ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttemptRecord {
    pub username: String,
    pub source_ip: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub method: AttemptMethod,
    pub note: String,
}

impl NewAttemptRecord {
    pub fn new(
        username: impl Into<String>,
        source_ip: impl Into<String>,
        timestamp: DateTime<Utc>,
        success: bool,
    ) -> Self {
        Self {
            username: username.into(),
            source_ip: source_ip.into(),
            timestamp,
            success,
            method: AttemptMethod::Password,
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Append an annotation to the note, separating from any existing text.
    pub fn annotate(&mut self, annotation: &str) {
        if self.note.is_empty() {
            self.note = annotation.to_string();
        } else {
            self.note = format!("{}; {annotation}", self.note);
        }
    }
}
