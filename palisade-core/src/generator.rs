//! Candidate generation strategies
//!
//! The generator is the attack side's single entry point for producing
//! password candidates. A strategy is a closed set of kinds
//! ([`AttackStrategy`]): keyspace enumeration (mono or poly), dictionary
//! expansion, or rainbow lookup. Every strategy yields a lazy, finite,
//! deterministic sequence that is restartable from the beginning;
//! mid-sequence offsets exist only through the work partitioner.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::keyspace::KeyspaceRange;
use crate::partition::keyspace_classes;
use crate::rainbow::RainbowTable;
use crate::wordlist::Dictionary;

/// A single password guess. Produced lazily and consumed once per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        Candidate(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        Candidate(value)
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Candidate(value.to_string())
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of attack strategies.
#[derive(Debug, Clone)]
pub enum AttackStrategy {
    /// Brute-force enumeration over a keyspace. Mono and poly attacks are
    /// both ranges; mono simply declares a single alphabet.
    Keyspace(KeyspaceRange),
    /// Wordlist plus mutation rules, personalized entries first.
    Dictionary(Dictionary),
    /// Reverse a target hash through a precomputed table. Yields at most
    /// one candidate.
    Rainbow {
        table: Arc<RainbowTable>,
        target_hash: Vec<u8>,
    },
}

impl AttackStrategy {
    pub fn keyspace(range: KeyspaceRange) -> Self {
        Self::Keyspace(range)
    }

    pub fn dictionary(dictionary: Dictionary) -> Self {
        Self::Dictionary(dictionary)
    }

    pub fn rainbow(table: Arc<RainbowTable>, target_hash: impl Into<Vec<u8>>) -> Self {
        Self::Rainbow {
            table,
            target_hash: target_hash.into(),
        }
    }

    /// Short label for progress reporting and spans.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Keyspace(range) if range.is_mono() => "mono",
            Self::Keyspace(_) => "poly",
            Self::Dictionary(_) => "dictionary",
            Self::Rainbow { .. } => "rainbow",
        }
    }

    /// Enumerate the strategy's full candidate sequence from the beginning.
    pub fn candidates(&self) -> Box<dyn Iterator<Item = Candidate> + Send> {
        match self {
            Self::Keyspace(range) => Box::new(
                keyspace_classes(range)
                    .into_iter()
                    .flat_map(|shard| shard.candidates()),
            ),
            Self::Dictionary(dictionary) => Box::new(dictionary.iter()),
            Self::Rainbow { table, target_hash } => {
                let hit = table.lookup(target_hash).map(Candidate::new);
                Box::new(hit.into_iter())
            }
        }
    }
}
