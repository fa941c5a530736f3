//! Parse-once cache of mana abilities keyed by card name
//!
//! Every card's oracle text is parsed exactly once, when the card is added.
//! Lookups after that hand out shared slices and never touch text again.

use crate::core::{card_key, CardMetadata, ManaAbility};
use crate::error::Diagnostic;
use crate::loader::ability_parser::parse_abilities_with_diagnostics;
use crate::loader::card::{CardDefinition, CardLoader};
use crate::logger::ManaLogger;
use crate::{MtgError, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Parsed abilities for one card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardEntry {
    pub metadata: CardMetadata,
    pub abilities: Vec<ManaAbility>,
}

/// Database of parsed mana abilities
#[derive(Debug, Default)]
pub struct AbilityDatabase {
    cards: FxHashMap<String, CardEntry>,
}

impl AbilityDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        AbilityDatabase {
            cards: FxHashMap::default(),
        }
    }

    /// Load and parse every .txt card file under a cardsfolder
    ///
    /// Files are read and parsed in parallel. Results are inserted in path
    /// order, so diagnostics come out in the same order on every run.
    pub fn load_from_cardsfolder(cardsfolder_path: &Path, logger: &ManaLogger) -> Result<Self> {
        if !cardsfolder_path.exists() {
            return Err(MtgError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Cardsfolder not found: {cardsfolder_path:?}"),
            )));
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in jwalk::WalkDir::new(cardsfolder_path).sort(true) {
            let entry = entry.map_err(|e| MtgError::IoError(std::io::Error::other(e.to_string())))?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "txt") {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let parsed: Vec<(PathBuf, Result<ParsedCard>)> = paths
            .into_par_iter()
            .map(|path| {
                let parsed = CardLoader::load_from_file(&path).map(ParsedCard::from_definition);
                (path, parsed)
            })
            .collect();

        let mut db = AbilityDatabase::new();
        for (path, result) in parsed {
            match result {
                Ok(card) => db.insert_parsed(card, logger),
                Err(e) => logger.normal(&format!("skipping {}: {e}", path.display())),
            }
        }

        logger.verbose(&format!("loaded {} cards", db.len()));
        Ok(db)
    }

    /// Load specific card files, failing on the first bad one
    pub fn load_files(paths: &[PathBuf], logger: &ManaLogger) -> Result<Self> {
        let mut db = AbilityDatabase::new();
        for path in paths {
            let def = CardLoader::load_from_file(path)?;
            db.add_definition(&def, logger);
        }
        Ok(db)
    }

    /// Parse and cache a card definition
    pub fn add_definition(&mut self, def: &CardDefinition, logger: &ManaLogger) {
        self.insert_parsed(ParsedCard::from_definition(def.clone()), logger);
    }

    /// Parse and cache a card from raw oracle text
    pub fn add_card(&mut self, metadata: CardMetadata, oracle: &str, logger: &ManaLogger) {
        let (abilities, diagnostics) = parse_abilities_with_diagnostics(oracle, &metadata);
        self.insert_parsed(
            ParsedCard {
                metadata,
                abilities,
                diagnostics,
            },
            logger,
        );
    }

    fn insert_parsed(&mut self, card: ParsedCard, logger: &ManaLogger) {
        for diagnostic in &card.diagnostics {
            logger.diagnostic(diagnostic);
        }
        logger.trace(
            "parser",
            &format!("{}: {} mana abilities", card.metadata.name, card.abilities.len()),
        );
        self.cards.insert(
            card.metadata.name.key(),
            CardEntry {
                metadata: card.metadata,
                abilities: card.abilities,
            },
        );
    }

    /// Parsed abilities of a card (name lookup ignores case and accents)
    pub fn abilities(&self, name: &str) -> Option<&[ManaAbility]> {
        self.cards.get(&card_key(name)).map(|e| e.abilities.as_slice())
    }

    /// Full entry of a card
    pub fn get(&self, name: &str) -> Option<&CardEntry> {
        self.cards.get(&card_key(name))
    }

    /// Check if a card exists in the database
    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(&card_key(name))
    }

    /// Card names in sorted key order
    pub fn names(&self) -> Vec<&str> {
        let mut entries: Vec<(&String, &CardEntry)> = self.cards.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, e)| e.metadata.name.as_str()).collect()
    }

    /// Total number of cards in database
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

struct ParsedCard {
    metadata: CardMetadata,
    abilities: Vec<ManaAbility>,
    diagnostics: Vec<Diagnostic>,
}

impl ParsedCard {
    fn from_definition(def: CardDefinition) -> Self {
        let metadata = def.metadata();
        let (abilities, diagnostics) = parse_abilities_with_diagnostics(&def.oracle, &metadata);
        ParsedCard {
            metadata,
            abilities,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_database() {
        let db = AbilityDatabase::new();
        assert_eq!(db.len(), 0);
        assert!(db.is_empty());
        assert!(db.abilities("Sol Ring").is_none());
    }

    #[test]
    fn test_manual_add_is_case_insensitive() {
        let logger = ManaLogger::silent();
        let mut db = AbilityDatabase::new();
        db.add_card(
            CardMetadata::from_type_line("Sol Ring", "Artifact"),
            "{T}: Add {C}{C}.",
            &logger,
        );

        assert!(db.contains("sol ring"));
        assert_eq!(db.abilities("SOL RING").map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_diagnostics_are_logged_once_at_load() {
        let logger = ManaLogger::capturing();
        let mut db = AbilityDatabase::new();
        db.add_card(
            CardMetadata::from_type_line("Chosen Rock", "Artifact"),
            "{T}: Add one mana of the chosen color.",
            &logger,
        );

        assert_eq!(db.abilities("Chosen Rock"), Some(&[][..]));
        assert_eq!(logger.logs_in("parser").len(), 2);
        assert!(logger
            .logs_in("parser")
            .iter()
            .any(|e| e.message.contains("unrecognized mana ability")));
    }

    #[test]
    fn test_load_from_cardsfolder() {
        let cardsfolder = PathBuf::from("test_cards");

        // Only run if the fixture folder exists
        if !cardsfolder.exists() {
            return;
        }

        let db = AbilityDatabase::load_from_cardsfolder(&cardsfolder, &ManaLogger::silent()).unwrap();
        assert!(!db.is_empty());
        assert!(db.contains("Forest"));
        assert!(db.contains("llanowar elves"));
    }

    #[test]
    fn test_missing_cardsfolder_is_error() {
        let result = AbilityDatabase::load_from_cardsfolder(Path::new("no/such/dir"), &ManaLogger::silent());
        assert!(matches!(result, Err(MtgError::IoError(_))));
    }
}
