//! Strongly-typed wrappers for game concepts
//!
//! Newtypes to prevent type confusion and make the code more
//! self-documenting. Instead of using bare Strings for different concepts,
//! we wrap them in distinct types that cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static card definition ID (e.g. "ember_whelp")
///
/// Names an entry in the blueprint registry. Many card instances can share
/// one blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlueprintId(String);

impl BlueprintId {
    pub fn new(s: impl Into<String>) -> Self {
        BlueprintId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BlueprintId {
    fn from(s: String) -> Self {
        BlueprintId(s)
    }
}

impl From<&str> for BlueprintId {
    fn from(s: &str) -> Self {
        BlueprintId(s.to_string())
    }
}

/// Player name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerName {
    fn from(s: String) -> Self {
        PlayerName(s)
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        PlayerName(s.to_string())
    }
}

/// The five card affinities
///
/// Affinities gate deck building and a few effects ("choose an affinity"
/// interactions resolve to one of these).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Affinity {
    Ember,
    Tide,
    Stone,
    Gale,
    Void,
}

impl Affinity {
    pub const ALL: [Affinity; 5] = [
        Affinity::Ember,
        Affinity::Tide,
        Affinity::Stone,
        Affinity::Gale,
        Affinity::Void,
    ];
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Affinity::Ember => "Ember",
            Affinity::Tide => "Tide",
            Affinity::Stone => "Stone",
            Affinity::Gale => "Gale",
            Affinity::Void => "Void",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blueprint_id() {
        let id = BlueprintId::new("ember_whelp");
        assert_eq!(id.as_str(), "ember_whelp");
        assert_eq!(id.to_string(), "ember_whelp");
    }

    #[test]
    fn test_player_name() {
        let name = PlayerName::new("Alice");
        assert_eq!(name.as_str(), "Alice");
    }

    #[test]
    fn test_affinity_roundtrip() {
        for affinity in Affinity::ALL {
            let json = serde_json::to_string(&affinity).unwrap();
            let back: Affinity = serde_json::from_str(&json).unwrap();
            assert_eq!(back, affinity);
        }
    }
}
