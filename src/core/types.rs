//! Strongly-typed wrappers for game concepts
//!
//! Newtypes keep card names, subtypes and permanent ids from being mixed up
//! with each other or with bare strings and integers.

use deunicode::deunicode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card subtype (creature type, artifact type, land type, etc.)
///
/// Examples: "Elf", "Equipment", "Island"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subtype(String);

impl Subtype {
    pub fn new(s: impl Into<String>) -> Self {
        Subtype(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Subtype {
    fn from(s: &str) -> Self {
        Subtype(s.to_string())
    }
}

/// Card name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cache key: ASCII-folded and lowercased, so "Lim-Dûl's Vault" and
    /// "lim-dul's vault" hit the same entry
    pub fn key(&self) -> String {
        card_key(&self.0)
    }
}

/// Normalize any card name string into an ability-cache key
pub fn card_key(name: &str) -> String {
    deunicode(name.trim()).to_lowercase()
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardName {
    fn from(s: String) -> Self {
        CardName(s)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}

/// Identifier of one permanent in a battlefield snapshot
///
/// Supplied by the collaborator that owns the game state; the core only
/// echoes it back in tap instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermanentId(u32);

impl PermanentId {
    pub fn new(id: u32) -> Self {
        PermanentId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PermanentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype() {
        let subtype = Subtype::new("Forest");
        assert_eq!(subtype.as_str(), "Forest");
        assert_eq!(subtype.to_string(), "Forest");
    }

    #[test]
    fn test_card_name_key_folds_unicode() {
        let name = CardName::new("Lim-Dûl's Vault");
        assert_eq!(name.key(), "lim-dul's vault");
        assert_eq!(card_key("  SOL RING "), "sol ring");
    }

    #[test]
    fn test_permanent_id_display() {
        assert_eq!(PermanentId::new(7).to_string(), "#7");
    }
}
