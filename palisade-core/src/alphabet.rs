//! Character alphabets for keyspace enumeration
//!
//! An [`Alphabet`] is an ordered, non-empty set of characters. The order
//! defines the generation sequence of keyspace attacks; it does not imply
//! uniqueness, and alphabets combined in a poly attack may overlap.
//!
//! Named constructors cover the common ASCII classes plus the international
//! sets (Turkish, Hungarian, Cyrillic) used for localized password guessing.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DIGITS: &str = "0123456789";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:',.<>?/";
const TURKISH: &str = "çğıöşüÇĞİÖŞÜ";
const HUNGARIAN: &str = "áéíóöőúüűÁÉÍÓÖŐÚÜŰ";
const CYRILLIC: &str = "абвгдежзийклмнопрстуфхцчшщъыьэюяАБВГДЕЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯ";

/// An ordered, non-empty character set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alphabet {
    name: String,
    chars: Vec<char>,
}

impl Alphabet {
    fn named(name: &str, chars: &str) -> Self {
        Self {
            name: name.to_string(),
            chars: chars.chars().collect(),
        }
    }

    /// ASCII digits `0-9`.
    pub fn digits() -> Self {
        Self::named("digits", DIGITS)
    }

    /// ASCII lowercase letters `a-z`.
    pub fn lowercase() -> Self {
        Self::named("lower", LOWERCASE)
    }

    /// ASCII uppercase letters `A-Z`.
    pub fn uppercase() -> Self {
        Self::named("upper", UPPERCASE)
    }

    /// Common keyboard symbols.
    pub fn symbols() -> Self {
        Self::named("symbols", SYMBOLS)
    }

    /// Turkish-specific characters (ç, ğ, ı, ö, ş, ü), both cases.
    pub fn turkish() -> Self {
        Self::named("turkish", TURKISH)
    }

    /// Hungarian-specific characters (á, é, í, ó, ö, ő, ú, ü, ű), both cases.
    pub fn hungarian() -> Self {
        Self::named("hungarian", HUNGARIAN)
    }

    /// Cyrillic (Russian) alphabet, both cases.
    pub fn cyrillic() -> Self {
        Self::named("cyrillic", CYRILLIC)
    }

    /// A caller-supplied character set. The given order is preserved and
    /// defines the enumeration sequence.
    pub fn custom(name: impl Into<String>, chars: &str) -> Result<Self, ConfigError> {
        let alphabet = Self {
            name: name.into(),
            chars: chars.chars().collect(),
        };
        alphabet.validate()?;
        Ok(alphabet)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.chars.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}
