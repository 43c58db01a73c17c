//! Precomputed hash-to-plaintext lookup (rainbow table)
//!
//! A [`RainbowTable`] is built once from a set of entries and never mutated
//! afterwards, so lookups are safe for unlimited concurrent callers without
//! locking. Duplicate hash keys make the mapping ambiguous and are rejected
//! at build time.
//!
//! Tables load from the JSON interchange format produced by table
//! generators: a single object mapping hex-encoded hashes to plaintexts.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::BuildError;

/// One precomputed hash → plaintext pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RainbowEntry {
    pub hash: Vec<u8>,
    pub plaintext: String,
}

impl RainbowEntry {
    pub fn new(hash: impl Into<Vec<u8>>, plaintext: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            plaintext: plaintext.into(),
        }
    }
}

/// Immutable hash → plaintext map with O(1) expected lookup.
#[derive(Debug, Clone, Default)]
pub struct RainbowTable {
    entries: HashMap<Vec<u8>, String>,
}

impl RainbowTable {
    /// Build a table from entries, rejecting duplicate hash keys.
    pub fn from_entries(
        entries: impl IntoIterator<Item = RainbowEntry>,
    ) -> Result<Self, BuildError> {
        let mut map = HashMap::new();
        for entry in entries {
            match map.entry(entry.hash) {
                Entry::Vacant(slot) => {
                    slot.insert(entry.plaintext);
                }
                Entry::Occupied(slot) => {
                    return Err(BuildError::DuplicateHash(hex::encode(slot.key())));
                }
            }
        }
        Ok(Self { entries: map })
    }

    /// Load a table from a JSON object of `{"<hex hash>": "<plaintext>"}`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, BuildError> {
        let raw: HashMap<String, String> = serde_json::from_reader(reader)
            .map_err(|e| BuildError::Malformed(e.to_string()))?;
        let entries = raw
            .into_iter()
            .map(|(key, plaintext)| {
                let hash = hex::decode(&key).map_err(|_| BuildError::InvalidHashKey(key))?;
                Ok(RainbowEntry { hash, plaintext })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        Self::from_entries(entries)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| BuildError::Unreadable(format!("{}: {e}", path.display())))?;
        Self::from_json_reader(file)
    }

    /// Reverse a hash. Returns the plaintext or `None` when the hash is not
    /// in the table.
    pub fn lookup(&self, hash: &[u8]) -> Option<&str> {
        self.entries.get(hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_deterministic() {
        let table = RainbowTable::from_entries([
            RainbowEntry::new(vec![0xa1, 0xb2], "hunter2"),
            RainbowEntry::new(vec![0xc3, 0xd4], "letmein"),
        ])
        .unwrap();

        assert_eq!(table.lookup(&[0xa1, 0xb2]), Some("hunter2"));
        assert_eq!(table.lookup(&[0xa1, 0xb2]), Some("hunter2"));
        assert_eq!(table.lookup(&[0xff]), None);
        assert_eq!(table.lookup(&[0xff]), None);
    }

    #[test]
    fn test_duplicate_hash_is_build_error() {
        let result = RainbowTable::from_entries([
            RainbowEntry::new(vec![0xa1], "first"),
            RainbowEntry::new(vec![0xa1], "second"),
        ]);
        assert!(matches!(result, Err(BuildError::DuplicateHash(key)) if key == "a1"));
    }

    #[test]
    fn test_from_json_reader() {
        let json = r#"{"a1b2": "hunter2", "c3d4": "letmein"}"#;
        let table = RainbowTable::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(&[0xa1, 0xb2]), Some("hunter2"));
    }

    #[test]
    fn test_from_json_rejects_bad_hex() {
        let json = r#"{"not-hex": "oops"}"#;
        let result = RainbowTable::from_json_reader(json.as_bytes());
        assert!(matches!(result, Err(BuildError::InvalidHashKey(_))));
    }

    #[test]
    fn test_from_json_rejects_case_folded_duplicates() {
        // "A1" and "a1" decode to the same bytes: an ambiguous mapping.
        let json = r#"{"a1": "first", "A1": "second"}"#;
        let result = RainbowTable::from_json_reader(json.as_bytes());
        assert!(matches!(result, Err(BuildError::DuplicateHash(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = RainbowTable::from_json_reader("not json".as_bytes());
        assert!(matches!(result, Err(BuildError::Malformed(_))));
    }
}
