//! Core card, cost and mana types

pub mod ability;
pub mod card;
pub mod costs;
pub mod mana;
pub mod types;

pub use ability::{ManaAbility, ProductionDescriptor, XContext, XRule};
pub use card::{CardMetadata, CardType};
pub use costs::{ActivationCost, Cost};
pub use mana::{Color, ColorSet, ManaCost, ManaSymbol};
pub use types::{card_key, CardName, PermanentId, Subtype};
