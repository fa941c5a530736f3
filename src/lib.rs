//! MTG Mana - mana ability parsing and cost solving for Forge-format cards
//!
//! Parses the mana abilities printed on cards once, turns a battlefield
//! snapshot into a pool of potential mana sources, and decides which sources
//! to activate (and which colors to take) to pay a cost.

pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod logger;

pub use error::{Diagnostic, MtgError, Result};
pub use game::{
    apply_allocation, build_pool, can_pay, solve, Allocation, BattlefieldSnapshot, GameSnapshot, ManaSolver,
    Permanent, SolverOptions, SourcePool, TapInstruction,
};
pub use loader::{parse_abilities, AbilityDatabase, CardLoader};
pub use logger::ManaLogger;
