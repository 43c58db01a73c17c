//! Keyspace ranges for brute-force enumeration
//!
//! A [`KeyspaceRange`] fully determines the ordered candidate sequence of a
//! mono (single alphabet) or poly (several alphabets, each exhausted in
//! turn) attack: every string over each alphabet with length inside
//! `[min_len, max_len]`, shortest first, lexicographic in alphabet order
//! within a length.

use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspaceRange {
    alphabets: Vec<Alphabet>,
    min_len: usize,
    max_len: usize,
}

impl KeyspaceRange {
    /// A single-alphabet (mono) keyspace.
    pub fn mono(alphabet: Alphabet, min_len: usize, max_len: usize) -> Result<Self, ConfigError> {
        Self::poly(vec![alphabet], min_len, max_len)
    }

    /// A multi-alphabet (poly) keyspace. Alphabets are enumerated in the
    /// declared order, each producing its full mono sequence before the
    /// next begins. Overlapping alphabets are not deduplicated.
    pub fn poly(
        alphabets: Vec<Alphabet>,
        min_len: usize,
        max_len: usize,
    ) -> Result<Self, ConfigError> {
        let range = Self {
            alphabets,
            min_len,
            max_len,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alphabets.is_empty() {
            return Err(ConfigError::NoAlphabets);
        }
        for alphabet in &self.alphabets {
            alphabet.validate()?;
        }
        if self.min_len == 0 {
            return Err(ConfigError::ZeroLength);
        }
        if self.min_len > self.max_len {
            return Err(ConfigError::InvalidLengthRange {
                min: self.min_len,
                max: self.max_len,
            });
        }
        Ok(())
    }

    pub fn alphabets(&self) -> &[Alphabet] {
        &self.alphabets
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_mono(&self) -> bool {
        self.alphabets.len() == 1
    }

    /// Total number of candidates in the range: for each alphabet of size
    /// `a`, the sum of `a^len` over every length in `[min_len, max_len]`.
    /// Saturates at `u128::MAX` for absurdly large spaces.
    pub fn total_candidates(&self) -> u128 {
        let mut total = 0u128;
        for alphabet in &self.alphabets {
            let a = alphabet.len() as u128;
            for len in self.min_len..=self.max_len {
                let class = a.checked_pow(len as u32).unwrap_or(u128::MAX);
                total = total.saturating_add(class);
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_total_is_geometric_sum() {
        // alphabet size 4, lengths 1..=3: 4 + 16 + 64
        let range = KeyspaceRange::mono(Alphabet::custom("pin", "0123").unwrap(), 1, 3).unwrap();
        assert_eq!(range.total_candidates(), 84);
    }

    #[test]
    fn test_poly_total_sums_alphabets() {
        let range = KeyspaceRange::poly(
            vec![Alphabet::digits(), Alphabet::lowercase()],
            1,
            2,
        )
        .unwrap();
        // digits: 10 + 100; lowercase: 26 + 676
        assert_eq!(range.total_candidates(), 110 + 702);
    }

    #[test]
    fn test_rejects_inverted_length_range() {
        let result = KeyspaceRange::mono(Alphabet::digits(), 3, 2);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidLengthRange { min: 3, max: 2 })
        ));
    }

    #[test]
    fn test_rejects_zero_min_length() {
        let result = KeyspaceRange::mono(Alphabet::digits(), 0, 2);
        assert!(matches!(result, Err(ConfigError::ZeroLength)));
    }

    #[test]
    fn test_rejects_missing_alphabets() {
        let result = KeyspaceRange::poly(vec![], 1, 2);
        assert!(matches!(result, Err(ConfigError::NoAlphabets)));
    }
}
