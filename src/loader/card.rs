//! Card file loader (.txt format)
//!
//! Loads card definitions from Forge's cardsfolder format. Only the fields
//! that matter for mana production are kept:
//!
//! ```text
//! Name:Llanowar Elves
//! ManaCost:G
//! Types:Creature Elf Druid
//! PT:1/1
//! Oracle:{T}: Add {G}.
//! ```

use crate::core::{
    mana::mana_symbol, CardMetadata, CardName, Color, ColorSet, ManaAbility, ManaCost, ManaSymbol,
};
use crate::error::Diagnostic;
use crate::loader::ability_parser::parse_abilities_with_diagnostics;
use crate::{MtgError, Result};
use std::fs;
use std::path::Path;

/// Card loader for .txt files
pub struct CardLoader;

impl CardLoader {
    /// Load a card from a .txt file
    pub fn load_from_file(path: &Path) -> Result<CardDefinition> {
        let content = fs::read_to_string(path).map_err(MtgError::IoError)?;
        Self::parse(&content)
    }

    /// Parse a card from its text content
    pub fn parse(content: &str) -> Result<CardDefinition> {
        let mut name = None;
        let mut mana_cost = ManaCost::new();
        let mut type_line = String::new();
        let mut loyalty = None;
        let mut power = None;
        let mut colors = ColorSet::empty();
        let mut oracle = String::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "Name" => name = Some(CardName::new(value)),
                    "ManaCost" => {
                        if !value.eq_ignore_ascii_case("no cost") {
                            mana_cost = ManaCost::from_string(value);
                        }
                    }
                    "Types" => type_line = value.to_string(),
                    "Loyalty" => {
                        loyalty = Some(value.parse().map_err(|_| {
                            MtgError::InvalidCardFormat(format!("Bad loyalty value: {value}"))
                        })?)
                    }
                    "PT" => {
                        if let Some((p, _)) = value.split_once('/') {
                            power = p.trim().parse().ok();
                        }
                    }
                    // Forge color overrides: "Colors:red,green"
                    "Colors" => {
                        for word in value.split(',') {
                            if let Some(color) = color_from_word(word.trim()) {
                                colors.insert(color);
                            }
                        }
                    }
                    "Oracle" => oracle = value.to_string(),
                    _ => {} // Scripting fields are not needed here
                }
            }
        }

        let name = name.ok_or(MtgError::InvalidCardFormat("Missing card name".to_string()))?;

        Ok(CardDefinition {
            name,
            mana_cost,
            type_line,
            loyalty,
            power,
            colors,
            oracle,
        })
    }
}

fn color_from_word(word: &str) -> Option<Color> {
    match word.to_ascii_lowercase().as_str() {
        "white" => Some(Color::White),
        "blue" => Some(Color::Blue),
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        _ => None,
    }
}

/// Card definition as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDefinition {
    pub name: CardName,
    pub mana_cost: ManaCost,
    /// Raw "Types:" line (supertypes, types and subtypes)
    pub type_line: String,
    pub loyalty: Option<u8>,
    pub power: Option<i8>,
    /// Explicit color override from the card file
    pub colors: ColorSet,
    /// Oracle text, with `\n` separating lines
    pub oracle: String,
}

impl CardDefinition {
    /// Color identity: cost pips, color overrides and symbols in rules text
    pub fn color_identity(&self) -> ColorSet {
        let mut identity = self.colors;
        for color in Color::WUBRG {
            if self.mana_cost.pips(color) > 0 {
                identity.insert(color);
            }
        }

        let mut rest = self.oracle.as_str();
        while let Some(i) = rest.find('{') {
            match mana_symbol(&rest[i..]) {
                Ok((next, ManaSymbol::Colored(color))) => {
                    if color != Color::Colorless {
                        identity.insert(color);
                    }
                    rest = next;
                }
                Ok((next, _)) => rest = next,
                Err(_) => rest = &rest[i + 1..],
            }
        }
        identity
    }

    /// Parser-facing metadata
    pub fn metadata(&self) -> CardMetadata {
        let mut meta = CardMetadata::from_type_line(self.name.clone(), &self.type_line);
        meta.loyalty = self.loyalty;
        meta.color_identity = self.color_identity();
        meta
    }

    /// Parse this card's mana abilities
    pub fn mana_abilities(&self) -> (Vec<ManaAbility>, Vec<Diagnostic>) {
        parse_abilities_with_diagnostics(&self.oracle, &self.metadata())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardType;

    #[test]
    fn test_parse_basic_land() {
        let content = r#"
Name:Forest
ManaCost:no cost
Types:Basic Land Forest
Oracle:({T}: Add {G}.)
"#;

        let def = CardLoader::parse(content).unwrap();
        assert_eq!(def.name.as_str(), "Forest");
        assert!(def.mana_cost.is_zero());

        let meta = def.metadata();
        assert!(meta.is_type(CardType::Land));

        let (abilities, diagnostics) = def.mana_abilities();
        assert_eq!(abilities.len(), 1);
        assert!(abilities[0].is_implicit_basic_land);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_parse_creature() {
        let content = r#"
Name:Llanowar Elves
ManaCost:G
Types:Creature Elf Druid
PT:1/1
A:AB$ Mana | Cost$ T | Produced$ G | SpellDescription$ Add {G}.
Oracle:{T}: Add {G}.
"#;

        let def = CardLoader::parse(content).unwrap();
        assert_eq!(def.mana_cost.green, 1);
        assert_eq!(def.power, Some(1));
        assert_eq!(def.color_identity(), ColorSet::single(Color::Green));

        let (abilities, _) = def.mana_abilities();
        assert_eq!(abilities.len(), 1);
        assert!(abilities[0].requires_tap());
    }

    #[test]
    fn test_parse_planeswalker_loyalty() {
        let content = r#"
Name:Nissa, Who Shakes the World
ManaCost:3 G G
Types:Legendary Planeswalker Nissa
Loyalty:5
Oracle:Whenever you tap a Forest for mana, add an additional {G}.\n+1: Untap target land you control.
"#;

        let def = CardLoader::parse(content).unwrap();
        assert_eq!(def.loyalty, Some(5));
        assert!(def.metadata().has_loyalty_abilities());
        assert!(def.mana_abilities().0.is_empty());
    }

    #[test]
    fn test_identity_includes_rules_text() {
        let content = r#"
Name:Hybrid Helper
ManaCost:1
Types:Artifact
Colors:blue
Oracle:{T}: Add {R}.
"#;

        let def = CardLoader::parse(content).unwrap();
        let identity = def.color_identity();
        assert!(identity.contains(Color::Blue));
        assert!(identity.contains(Color::Red));
        assert_eq!(identity.len(), 2);
    }

    #[test]
    fn test_missing_name_is_error() {
        let result = CardLoader::parse("ManaCost:1\nTypes:Artifact\n");
        assert!(matches!(result, Err(MtgError::InvalidCardFormat(_))));
    }
}
