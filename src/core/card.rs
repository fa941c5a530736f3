//! Card types and the metadata the ability parser needs

use crate::core::{CardName, ColorSet, Subtype};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Card types in MTG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
    Planeswalker,
    Battle,
}

impl CardType {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "Creature" => Some(CardType::Creature),
            "Instant" => Some(CardType::Instant),
            "Sorcery" => Some(CardType::Sorcery),
            "Enchantment" => Some(CardType::Enchantment),
            "Artifact" => Some(CardType::Artifact),
            "Land" => Some(CardType::Land),
            "Planeswalker" => Some(CardType::Planeswalker),
            "Battle" => Some(CardType::Battle),
            _ => None,
        }
    }
}

/// Supertypes are recognized so they don't end up as subtypes
const SUPERTYPES: [&str; 5] = ["Basic", "Legendary", "Snow", "World", "Ongoing"];

/// Everything about a card besides its rules text that affects parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    /// Card name (e.g., "Sol Ring")
    pub name: CardName,

    /// Card types (a card can be multiple types)
    pub types: SmallVec<[CardType; 2]>,

    /// Card subtypes (e.g., "Forest", "Elf")
    pub subtypes: SmallVec<[Subtype; 2]>,

    /// Starting loyalty, present on permanents with loyalty abilities
    #[serde(default)]
    pub loyalty: Option<u8>,

    /// Color identity (used by commander-restricted abilities)
    #[serde(default)]
    pub color_identity: ColorSet,
}

impl CardMetadata {
    pub fn new(name: impl Into<CardName>) -> Self {
        CardMetadata {
            name: name.into(),
            types: SmallVec::new(),
            subtypes: SmallVec::new(),
            loyalty: None,
            color_identity: ColorSet::empty(),
        }
    }

    /// Build metadata from a printed type line
    ///
    /// Accepts both "Artifact Creature — Elf Druid" and the space-separated
    /// Forge form "Artifact Creature Elf Druid".
    pub fn from_type_line(name: impl Into<CardName>, type_line: &str) -> Self {
        let mut meta = CardMetadata::new(name);
        for word in type_line.split_whitespace() {
            if matches!(word, "—" | "-" | "--") || SUPERTYPES.contains(&word) {
                continue;
            }
            match CardType::parse(word) {
                Some(card_type) => meta.types.push(card_type),
                None => meta.subtypes.push(Subtype::new(word)),
            }
        }
        meta
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    /// Permanents whose activated abilities are loyalty abilities
    pub fn has_loyalty_abilities(&self) -> bool {
        self.loyalty.is_some() || self.is_type(CardType::Planeswalker)
    }

    /// Basic land types on the type line, in printed order
    pub fn basic_land_types(&self) -> impl Iterator<Item = &Subtype> {
        self.subtypes
            .iter()
            .filter(|s| crate::core::Color::from_basic_land_type(s.as_str()).is_some())
    }
}
