//! Card loaders and the ability parser
//!
//! Parsers for the Forge card format (.txt) and for the mana abilities printed
//! in a card's oracle text

pub mod ability_parser;
pub mod card;
pub mod database;

pub use ability_parser::{parse_abilities, parse_abilities_with_diagnostics};
pub use card::{CardDefinition, CardLoader};
pub use database::{AbilityDatabase, CardEntry};
