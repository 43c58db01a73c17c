//! Wordlists, mutation rules, and target profiles for dictionary attacks
//!
//! A dictionary attack walks a list of base entries and expands each entry
//! through a fixed set of [`MutationRule`]s. Rules are pure and total: they
//! never fail, always produce the same variants for the same word, and may
//! produce duplicates (candidates are not deduplicated).
//!
//! Known facts about the target user ([`UserProfile`]) are injected as
//! additional entries ahead of the general wordlist, since personalized
//! guesses are the cheapest ones to try.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generator::Candidate;

/// A list of base words, one candidate seed per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wordlist {
    words: Vec<String>,
}

impl Wordlist {
    /// Load a wordlist from a file, one word per line. Blank lines and
    /// surrounding whitespace are dropped.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::WordlistUnreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), &path.display().to_string())
    }

    /// Load a wordlist from any reader, one word per line.
    pub fn from_reader<R: Read>(reader: BufReader<R>, path: &str) -> Result<Self, ConfigError> {
        let mut words = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|source| ConfigError::WordlistUnreadable {
                path: path.to_string(),
                source,
            })?;
            let word = line.trim();
            if !word.is_empty() {
                words.push(word.to_string());
            }
        }
        Ok(Self { words })
    }

    pub fn from_words(words: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A deterministic, total transformation from one base word to a set of
/// candidate variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationRule {
    /// Append each suffix in turn (`word1`, `word123`, `word2025`, ...).
    Suffixes(Vec<String>),
    /// Leet-speak substitutions: o->0, a->@, i->1, e->3, s->$ (both cases).
    /// Produces nothing if the word has no substitutable characters.
    Leet,
    /// Capitalized, uppercase, and lowercase variants that differ from the
    /// original word.
    CaseVariants,
}

impl MutationRule {
    /// The suffixes users actually append: digits, punctuation, recent years.
    pub fn common_suffixes() -> Self {
        Self::Suffixes(
            ["1", "123", "!", "@", "2024", "2025"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    /// The default rule chain for dictionary attacks, applied in order.
    pub fn default_rules() -> Vec<Self> {
        vec![Self::common_suffixes(), Self::Leet, Self::CaseVariants]
    }

    /// Apply the rule to a word. Never fails; may return an empty set.
    pub fn apply(&self, word: &str) -> Vec<String> {
        match self {
            Self::Suffixes(suffixes) => suffixes
                .iter()
                .map(|suffix| format!("{word}{suffix}"))
                .collect(),
            Self::Leet => {
                let mutated = leet(word);
                if mutated != word {
                    vec![mutated]
                } else {
                    vec![]
                }
            }
            Self::CaseVariants => {
                let mut variants = Vec::new();
                for variant in [capitalize(word), word.to_uppercase(), word.to_lowercase()] {
                    if variant != word && !variants.contains(&variant) {
                        variants.push(variant);
                    }
                }
                variants
            }
        }
    }
}

fn leet(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            'o' | 'O' => '0',
            'a' | 'A' => '@',
            'i' | 'I' => '1',
            'e' | 'E' => '3',
            's' | 'S' => '$',
            other => other,
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Known facts about a target user, each worth a handful of zero-cost
/// candidate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

impl UserProfile {
    /// Expand the profile into wordlist entries, in a fixed order: name
    /// forms, email forms, then date fragments and name+year combinations.
    pub fn entries(&self) -> Vec<String> {
        let mut entries = Vec::new();
        let mut push = |entry: String| {
            if !entry.is_empty() && !entries.contains(&entry) {
                entries.push(entry);
            }
        };

        if let Some(name) = &self.name {
            push(name.clone());
            push(name.to_lowercase());
        }
        if let Some(email) = &self.email {
            push(email.clone());
            if let Some(local) = email.split('@').next() {
                push(local.to_string());
            }
        }
        if let Some(date) = &self.birthdate {
            let year = date.year().to_string();
            push(year.clone());
            push(format!("{:02}{:02}{}", date.day(), date.month(), date.year()));
            push(format!("{:02}{:02}", date.day(), date.month()));
            if let Some(name) = &self.name {
                push(format!("{}{}", name.to_lowercase(), year));
            }
        }

        entries
    }
}

/// A fully assembled dictionary: profile entries ahead of the general
/// wordlist, plus the mutation rule chain. Cheap to clone; the entry list
/// is shared.
#[derive(Debug, Clone)]
pub struct Dictionary {
    entries: Arc<Vec<String>>,
    rules: Arc<Vec<MutationRule>>,
}

impl Dictionary {
    pub fn new(wordlist: Wordlist, rules: Vec<MutationRule>, profile: Option<&UserProfile>) -> Self {
        let mut entries = profile.map(UserProfile::entries).unwrap_or_default();
        entries.extend(wordlist.words.iter().cloned());
        Self {
            entries: Arc::new(entries),
            rules: Arc::new(rules),
        }
    }

    /// Number of base entries (before mutation expansion).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rules(&self) -> &[MutationRule] {
        &self.rules
    }

    /// Enumerate the candidates for a contiguous slice of base entries:
    /// each entry unchanged first, then every rule's variants in
    /// rule-declaration order.
    pub fn iter_range(&self, range: Range<usize>) -> DictionaryIter {
        DictionaryIter {
            entries: Arc::clone(&self.entries),
            rules: Arc::clone(&self.rules),
            next_entry: range.start,
            end: range.end.min(self.entries.len()),
            pending: VecDeque::new(),
        }
    }

    pub fn iter(&self) -> DictionaryIter {
        self.iter_range(0..self.entries.len())
    }
}

/// Lazy candidate iterator over a dictionary slice. Expands one base entry
/// at a time, so cancellation between candidates never buffers more than a
/// single entry's variants.
pub struct DictionaryIter {
    entries: Arc<Vec<String>>,
    rules: Arc<Vec<MutationRule>>,
    next_entry: usize,
    end: usize,
    pending: VecDeque<String>,
}

impl Iterator for DictionaryIter {
    type Item = Candidate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(candidate) = self.pending.pop_front() {
                return Some(Candidate::new(candidate));
            }
            if self.next_entry >= self.end {
                return None;
            }
            let word = &self.entries[self.next_entry];
            self.next_entry += 1;
            self.pending.push_back(word.clone());
            for rule in self.rules.iter() {
                self.pending.extend(rule.apply(word));
            }
        }
    }
}
