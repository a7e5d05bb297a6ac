//! Deck list loader
//!
//! Plain-text deck lists: one `<count> <blueprint id>` per line, with
//! `#` starting a comment. Ids are checked against the blueprint
//! registry before a game is built from the list.

use crate::blueprint::registry;
use crate::core::{BlueprintId, CardKind};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One line of a deck list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub blueprint: BlueprintId,
    pub count: u8,
}

/// A parsed deck list, duplicate lines merged
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeckList {
    pub entries: Vec<DeckEntry>,
}

pub struct DeckLoader;

impl DeckLoader {
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a deck from its text content
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut entries: Vec<DeckEntry> = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = match raw.split_once('#') {
                Some((before, _comment)) => before.trim(),
                None => raw.trim(),
            };
            if line.is_empty() {
                continue;
            }

            let Some((count_str, id_str)) = line.split_once(char::is_whitespace) else {
                return Err(EngineError::InvalidDeckFormat(format!(
                    "line {}: expected `<count> <blueprint id>`, got {:?}",
                    index + 1,
                    line
                )));
            };
            let count: u8 = count_str.parse().map_err(|_| {
                EngineError::InvalidDeckFormat(format!(
                    "line {}: bad count {:?}",
                    index + 1,
                    count_str
                ))
            })?;
            if count == 0 {
                return Err(EngineError::InvalidDeckFormat(format!(
                    "line {}: count must be at least 1",
                    index + 1
                )));
            }
            let id_str = id_str.trim();
            if id_str.contains(char::is_whitespace) {
                return Err(EngineError::InvalidDeckFormat(format!(
                    "line {}: expected a single blueprint id, got {:?}",
                    index + 1,
                    id_str
                )));
            }

            let blueprint = BlueprintId::new(id_str);
            match entries.iter_mut().find(|e| e.blueprint == blueprint) {
                Some(entry) => entry.count = entry.count.saturating_add(count),
                None => entries.push(DeckEntry { blueprint, count }),
            }
        }

        if entries.is_empty() {
            return Err(EngineError::InvalidDeckFormat("empty deck".to_string()));
        }
        Ok(DeckList { entries })
    }
}

impl DeckList {
    /// Total cards the list instantiates
    pub fn total_cards(&self) -> usize {
        self.entries.iter().map(|e| e.count as usize).sum()
    }

    /// Check every id against the registry. Heroes are chosen separately
    /// and may not appear in a deck list.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            let bp = registry().get(&entry.blueprint).map_err(|_| {
                EngineError::InvalidDeckFormat(format!(
                    "unknown blueprint: {}",
                    entry.blueprint
                ))
            })?;
            if matches!(bp.kind(), CardKind::Hero { .. }) {
                return Err(EngineError::InvalidDeckFormat(format!(
                    "{} is a hero, not a deck card",
                    entry.blueprint
                )));
            }
        }
        Ok(())
    }
}
