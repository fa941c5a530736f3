//! Read-only game snapshots supplied by the caller
//!
//! The mana engine never owns game state. Collaborators hand it a battlefield
//! snapshot (for the pool) and the hand plus a pending commander (for the
//! demand profile), and get back verdicts and tap instructions.

use crate::core::{CardName, CardType, ColorSet, Color, ManaCost, PermanentId};
use crate::game::color_choice::DemandProfile;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::path::Path;

/// One permanent on the battlefield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permanent {
    pub id: PermanentId,

    /// Lookup key into the ability database
    pub name: CardName,

    pub types: SmallVec<[CardType; 2]>,

    #[serde(default)]
    pub tapped: bool,

    #[serde(default)]
    pub summoning_sick: bool,

    /// Current power, for creatures
    #[serde(default)]
    pub power: Option<i8>,

    /// Mana value of the permanent itself
    #[serde(default)]
    pub mana_value: u8,
}

impl Permanent {
    pub fn new(id: u32, name: impl Into<CardName>, types: impl IntoIterator<Item = CardType>) -> Self {
        Permanent {
            id: PermanentId::new(id),
            name: name.into(),
            types: types.into_iter().collect(),
            tapped: false,
            summoning_sick: false,
            power: None,
            mana_value: 0,
        }
    }

    /// Builder: a land with the given name
    pub fn land(id: u32, name: impl Into<CardName>) -> Self {
        Self::new(id, name, [CardType::Land])
    }

    /// Builder: an artifact with the given name
    pub fn artifact(id: u32, name: impl Into<CardName>) -> Self {
        Self::new(id, name, [CardType::Artifact])
    }

    /// Builder: a creature with the given name and power
    pub fn creature(id: u32, name: impl Into<CardName>, power: i8) -> Self {
        let mut permanent = Self::new(id, name, [CardType::Creature]);
        permanent.power = Some(power);
        permanent
    }

    pub fn tapped(mut self) -> Self {
        self.tapped = true;
        self
    }

    pub fn summoning_sick(mut self) -> Self {
        self.summoning_sick = true;
        self
    }

    pub fn with_mana_value(mut self, mana_value: u8) -> Self {
        self.mana_value = mana_value;
        self
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    /// Lands, artifacts and creatures can carry mana abilities
    pub fn can_bear_mana_abilities(&self) -> bool {
        self.is_type(CardType::Land) || self.is_type(CardType::Artifact) || self.is_creature()
    }
}

/// The permanents one player controls, plus their commander's color identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlefieldSnapshot {
    pub permanents: Vec<Permanent>,

    /// None outside of commander games
    #[serde(default)]
    pub commander_identity: Option<ColorSet>,
}

impl BattlefieldSnapshot {
    pub fn new(permanents: Vec<Permanent>) -> Self {
        BattlefieldSnapshot {
            permanents,
            commander_identity: None,
        }
    }

    pub fn with_commander_identity(mut self, identity: ColorSet) -> Self {
        self.commander_identity = Some(identity);
        self
    }

    pub fn creature_count(&self) -> u8 {
        self.count_type(CardType::Creature)
    }

    pub fn artifact_count(&self) -> u8 {
        self.count_type(CardType::Artifact)
    }

    fn count_type(&self, card_type: CardType) -> u8 {
        let n = self.permanents.iter().filter(|p| p.is_type(card_type)).count();
        u8::try_from(n).unwrap_or(u8::MAX)
    }

    /// Greatest power among creatures (0 with no creatures)
    pub fn greatest_power(&self) -> i8 {
        self.permanents
            .iter()
            .filter(|p| p.is_creature())
            .filter_map(|p| p.power)
            .max()
            .unwrap_or(0)
    }
}

/// Full input for one solve: battlefield, hand and pending commander
///
/// This is the JSON document the `mana` binary reads:
///
/// ```json
/// {
///   "battlefield": { "permanents": [
///     { "id": 1, "name": "Forest", "types": ["Land"] }
///   ] },
///   "hand": ["{1}{G}", "{2}{U}{U}"],
///   "pending_commander": "{2}{G}{U}"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub battlefield: BattlefieldSnapshot,

    /// Mana costs of the cards in hand, bracketed notation
    #[serde(default)]
    pub hand: Vec<String>,

    /// Cost of the commander waiting in the command zone
    #[serde(default)]
    pub pending_commander: Option<String>,

    /// Deck-strategy hint used to break demand ties
    #[serde(default)]
    pub primary_colors: Vec<Color>,
}

impl GameSnapshot {
    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: GameSnapshot = serde_json::from_str(json)?;
        let mut seen = rustc_hash::FxHashSet::default();
        for permanent in &snapshot.battlefield.permanents {
            if !seen.insert(permanent.id) {
                return Err(MtgError::InvalidSnapshot(format!(
                    "duplicate permanent id {}",
                    permanent.id
                )));
            }
        }
        Ok(snapshot)
    }

    /// Demand profile from the hand and pending commander
    pub fn demand(&self) -> DemandProfile {
        let hand: Vec<ManaCost> = self.hand.iter().map(|c| ManaCost::from_string(c)).collect();
        let commander = self.pending_commander.as_deref().map(ManaCost::from_string);
        DemandProfile::from_costs(&hand, commander.as_ref()).with_primary_colors(self.primary_colors.iter().copied())
    }
}
