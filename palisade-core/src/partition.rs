//! Work partitioning for concurrent attack workers
//!
//! [`partition`] splits a strategy's candidate sequence into disjoint
//! [`Partition`]s whose enumerations, concatenated in partition order,
//! reproduce the whole sequence exactly once, with no duplication and no
//! omission, for any worker count.
//!
//! Keyspaces split at the level of whole (alphabet, length) classes first;
//! when the worker count exceeds the number of classes, the largest class
//! is subdivided by contiguous first-character ranges. Wordlists split into
//! contiguous index ranges of equal (±1) size over base entries; mutations
//! expand inside each range. Rainbow lookups are inherently single-partition.

use std::ops::Range;

use crate::alphabet::Alphabet;
use crate::error::ConfigError;
use crate::generator::{AttackStrategy, Candidate};
use crate::keyspace::KeyspaceRange;
use crate::wordlist::Dictionary;

/// A disjoint slice of a strategy's candidate sequence, enumerable on its
/// own by one worker.
#[derive(Debug, Clone)]
pub enum Partition {
    Shard(KeyspaceShard),
    Words {
        dictionary: Dictionary,
        range: Range<usize>,
    },
    Fixed(Vec<Candidate>),
}

impl Partition {
    pub fn candidates(&self) -> Box<dyn Iterator<Item = Candidate> + Send> {
        match self {
            Self::Shard(shard) => Box::new(shard.candidates()),
            Self::Words { dictionary, range } => Box::new(dictionary.iter_range(range.clone())),
            Self::Fixed(candidates) => Box::new(candidates.clone().into_iter()),
        }
    }
}

/// All strings of one exact length over one alphabet, optionally restricted
/// to a contiguous range of first characters.
#[derive(Debug, Clone)]
pub struct KeyspaceShard {
    alphabet: Alphabet,
    length: usize,
    first_chars: Range<usize>,
}

impl KeyspaceShard {
    fn full(alphabet: Alphabet, length: usize) -> Self {
        let first_chars = 0..alphabet.len();
        Self {
            alphabet,
            length,
            first_chars,
        }
    }

    fn restricted(alphabet: Alphabet, length: usize, first_chars: Range<usize>) -> Self {
        Self {
            alphabet,
            length,
            first_chars,
        }
    }

    /// Number of candidates in the shard.
    pub fn candidate_count(&self) -> u128 {
        let a = self.alphabet.len() as u128;
        let rest = a
            .checked_pow(self.length.saturating_sub(1) as u32)
            .unwrap_or(u128::MAX);
        (self.first_chars.len() as u128).saturating_mul(rest)
    }

    pub fn candidates(&self) -> ShardIter {
        ShardIter {
            chars: self.alphabet.chars().to_vec(),
            length: self.length,
            first_chars: self.first_chars.clone(),
            indices: Vec::new(),
            done: self.first_chars.is_empty() || self.length == 0,
        }
    }
}

/// Odometer-style enumeration of a shard: the rightmost position advances
/// fastest, the first position stays inside the shard's character range.
/// Holds no shared state, so the orchestrator can drop it between any two
/// candidates.
pub struct ShardIter {
    chars: Vec<char>,
    length: usize,
    first_chars: Range<usize>,
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for ShardIter {
    type Item = Candidate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.indices.is_empty() {
            self.indices = vec![0; self.length];
            self.indices[0] = self.first_chars.start;
        } else if !self.advance() {
            self.done = true;
            return None;
        }

        let value: String = self.indices.iter().map(|&i| self.chars[i]).collect();
        Some(Candidate::new(value))
    }
}

impl ShardIter {
    fn advance(&mut self) -> bool {
        for pos in (0..self.indices.len()).rev() {
            let limit = if pos == 0 {
                self.first_chars.end
            } else {
                self.chars.len()
            };
            self.indices[pos] += 1;
            if self.indices[pos] < limit {
                return true;
            }
            self.indices[pos] = if pos == 0 { self.first_chars.start } else { 0 };
        }
        false
    }
}

/// One (alphabet, length) class per shard, in enumeration order. This is
/// both the finest partition-free decomposition and the whole-sequence
/// enumeration order used by the generator.
pub(crate) fn keyspace_classes(range: &KeyspaceRange) -> Vec<KeyspaceShard> {
    let mut classes = Vec::new();
    for alphabet in range.alphabets() {
        for length in range.min_len()..=range.max_len() {
            classes.push(KeyspaceShard::full(alphabet.clone(), length));
        }
    }
    classes
}

/// Split `total` items into `parts` contiguous ranges of equal (±1) size.
/// `parts` must not exceed `total`.
fn chunk_ranges(total: usize, parts: usize) -> Vec<Range<usize>> {
    let base = total / parts;
    let remainder = total % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for part in 0..parts {
        let size = if part < remainder { base + 1 } else { base };
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

fn partition_keyspace(range: &KeyspaceRange, worker_count: usize) -> Vec<Partition> {
    let mut shards = keyspace_classes(range);

    if worker_count > shards.len() {
        // Subdivide the largest class by first character. The first such
        // class wins ties so the result stays deterministic.
        let largest = shards
            .iter()
            .enumerate()
            .max_by(|(ai, a), (bi, b)| {
                a.candidate_count()
                    .cmp(&b.candidate_count())
                    .then(bi.cmp(ai))
            })
            .map(|(i, _)| i);

        if let Some(index) = largest {
            let class = shards[index].clone();
            let wanted = worker_count - shards.len() + 1;
            let pieces = wanted.min(class.alphabet.len());
            let replacements: Vec<KeyspaceShard> = chunk_ranges(class.alphabet.len(), pieces)
                .into_iter()
                .map(|first_chars| {
                    KeyspaceShard::restricted(class.alphabet.clone(), class.length, first_chars)
                })
                .collect();
            shards.splice(index..=index, replacements);
        }
    }

    shards.into_iter().map(Partition::Shard).collect()
}

fn partition_wordlist(dictionary: &Dictionary, worker_count: usize) -> Vec<Partition> {
    let total = dictionary.len();
    if total == 0 {
        return Vec::new();
    }
    let parts = worker_count.min(total);
    chunk_ranges(total, parts)
        .into_iter()
        .map(|range| Partition::Words {
            dictionary: dictionary.clone(),
            range,
        })
        .collect()
}

/// Partition a strategy for `worker_count` concurrent consumers.
pub fn partition(
    strategy: &AttackStrategy,
    worker_count: usize,
) -> Result<Vec<Partition>, ConfigError> {
    if worker_count == 0 {
        return Err(ConfigError::ZeroWorkers);
    }
    match strategy {
        AttackStrategy::Keyspace(range) => {
            range.validate()?;
            Ok(partition_keyspace(range, worker_count))
        }
        AttackStrategy::Dictionary(dictionary) => Ok(partition_wordlist(dictionary, worker_count)),
        AttackStrategy::Rainbow { table, target_hash } => {
            let candidates: Vec<Candidate> = table
                .lookup(target_hash)
                .map(Candidate::new)
                .into_iter()
                .collect();
            Ok(vec![Partition::Fixed(candidates)])
        }
    }
}
