//! Battlefield snapshots, the source pool and the cost solver

pub mod color_choice;
pub mod mana_engine;
pub mod mana_payment;
pub mod snapshot;

pub use color_choice::{
    choose_color, choose_combination_assignment, choose_waste_color, DemandProfile, COMMANDER_WEIGHT,
};
pub use mana_engine::{build_pool, ManaCapacity, ManaEngine, PotentialSource, SourcePool, Yield};
pub use mana_payment::{
    apply_allocation, bounds_check, can_pay, solve, Allocation, AllocationEntry, BacktrackingResolver,
    GreedyManaResolver, ManaPaymentResolver, ManaSolver, PaymentPhase, PaymentResult, SolverOptions,
    TapInstruction,
};
pub use snapshot::{BattlefieldSnapshot, GameSnapshot, Permanent};
