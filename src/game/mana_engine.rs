//! Potential source pool for one battlefield snapshot
//!
//! The pool is a flat list of `PotentialSource`s, one per activatable mana
//! ability (one per alternative for modal abilities), in battlefield order.
//!
//! # Lifetime
//!
//! A `SourcePool<'a>` borrows the snapshot it was built from and the ability
//! database. It is never patched: after a land is played or a source is
//! tapped, build a new snapshot and a new pool. The borrow makes it impossible
//! to keep using a pool once its snapshot is gone.
//!
//! # Example
//!
//! ```ignore
//! let pool = build_pool(&snapshot, &db);
//! if let Some(allocation) = solve("{1}{G}", &pool) {
//!     for step in apply_allocation(&allocation, &pool) {
//!         // mark step.permanent tapped, sacrificed, ...
//!     }
//! }
//! ```

use crate::core::{
    ActivationCost, Color, ColorSet, Cost, ManaAbility, ManaCost, ProductionDescriptor, XContext,
};
use crate::error::Diagnostic;
use crate::game::color_choice::{choose_color, choose_combination_assignment, DemandProfile};
use crate::game::snapshot::{BattlefieldSnapshot, Permanent};
use crate::loader::AbilityDatabase;
use crate::logger::ManaLogger;
use smallvec::SmallVec;

/// Maximum mana production capacity
///
/// Represents the amount of mana of each color the free sources of a pool
/// can produce at once, with flexible sources committed by the heuristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ManaCapacity {
    /// White mana
    pub white: u8,
    /// Blue mana
    pub blue: u8,
    /// Black mana
    pub black: u8,
    /// Red mana
    pub red: u8,
    /// Green mana
    pub green: u8,
    /// Colorless mana
    pub colorless: u8,
}

impl ManaCapacity {
    /// Create a new empty mana capacity
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, color: Color, amount: u8) {
        let slot = match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        };
        *slot = slot.saturating_add(amount);
    }

    /// Get total mana available
    pub fn total(&self) -> u8 {
        self.white
            .saturating_add(self.blue)
            .saturating_add(self.black)
            .saturating_add(self.red)
            .saturating_add(self.green)
            .saturating_add(self.colorless)
    }

    /// Check if this capacity can pay for a mana cost
    ///
    /// Exact for capacities where every color is already committed; the
    /// solver is the authority for flexible sources.
    pub fn can_pay_simple(&self, cost: &ManaCost) -> bool {
        if cost.white > u16::from(self.white)
            || cost.blue > u16::from(self.blue)
            || cost.black > u16::from(self.black)
            || cost.red > u16::from(self.red)
            || cost.green > u16::from(self.green)
            || cost.colorless > u16::from(self.colorless)
        {
            return false;
        }

        // Generic can be paid with any color or colorless mana
        let remaining_capacity = u32::from(self.total()).saturating_sub(cost.colored_total());
        remaining_capacity >= u32::from(cost.generic)
    }
}

/// What one activation of a pool entry yields, with X already resolved
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum Yield {
    /// Exactly these colors
    Fixed(SmallVec<[Color; 4]>),
    /// `amount` mana, all of one option
    Choice { options: ColorSet, amount: u8 },
    /// `amount` mana, each any palette color
    Combination { palette: ColorSet, amount: u8 },
}

impl Yield {
    pub fn quantity(&self) -> u8 {
        match self {
            Yield::Fixed(colors) => colors.len() as u8,
            Yield::Choice { amount, .. } | Yield::Combination { amount, .. } => *amount,
        }
    }

    pub fn can_produce(&self, color: Color) -> bool {
        self.colors().contains(color)
    }

    /// Most mana of one color a single activation can yield
    pub fn max_of(&self, color: Color) -> u8 {
        match self {
            Yield::Fixed(colors) => colors.iter().filter(|&&c| c == color).count() as u8,
            Yield::Choice { options, amount } if options.contains(color) => *amount,
            Yield::Combination { palette, amount } if palette.contains(color) => *amount,
            _ => 0,
        }
    }

    pub fn colors(&self) -> ColorSet {
        match self {
            Yield::Fixed(colors) => colors.iter().copied().collect(),
            Yield::Choice { options, .. } => *options,
            Yield::Combination { palette, .. } => *palette,
        }
    }

    /// Score for paying a pip of `color` (lower = more specific = use first)
    pub fn score_for_color(&self, color: Color) -> u8 {
        match self {
            Yield::Fixed(colors) if colors.contains(&color) => 0,
            Yield::Choice { options, .. } | Yield::Combination { palette: options, .. }
                if options.contains(color) =>
            {
                if ColorSet::five_colors().intersection(*options) == ColorSet::five_colors() {
                    100 // any color: save for last resort
                } else {
                    options.len() as u8
                }
            }
            _ => 255,
        }
    }
}

impl std::fmt::Display for Yield {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Yield::Fixed(colors) => {
                for color in colors {
                    write!(f, "{{{color}}}")?;
                }
                Ok(())
            }
            Yield::Choice { options, amount } => write!(f, "{amount} of one of [{options}]"),
            Yield::Combination { palette, amount } => write!(f, "{amount} in any combination of [{palette}]"),
        }
    }
}

/// One activatable mana ability of one permanent
#[derive(Debug, Clone)]
pub struct PotentialSource<'a> {
    pub permanent: &'a Permanent,
    pub ability: &'a ManaAbility,

    /// Index into the card's parsed ability list
    pub ability_index: usize,

    /// Alternative chosen up front for modal abilities
    pub alternative: Option<usize>,

    /// Index of the permanent in the snapshot
    pub slot: usize,

    pub produces: Yield,

    /// Mana value paid to activate
    pub tax: u8,
}

impl<'a> PotentialSource<'a> {
    pub fn quantity(&self) -> u8 {
        self.produces.quantity()
    }

    /// Quantity minus activation tax
    pub fn net_contribution(&self) -> i16 {
        i16::from(self.quantity()) - i16::from(self.tax)
    }

    /// Tapping or sacrificing uses the permanent up
    pub fn exhausts_permanent(&self) -> bool {
        let costs = self.ability.activation_cost.as_slice();
        costs.requires_tap()
            || costs.sacrifices_self()
            || costs.iter().any(|c| matches!(c, Cost::Untap))
    }

    pub fn sacrifices_self(&self) -> bool {
        self.ability.activation_cost.sacrifices_self()
    }

    /// True when the two sources cannot both be activated in one payment
    pub fn conflicts_with(&self, other: &PotentialSource<'_>) -> bool {
        if self.slot != other.slot {
            return false;
        }
        self.ability_index == other.ability_index
            || (self.exhausts_permanent() && other.exhausts_permanent())
            || self.sacrifices_self()
            || other.sacrifices_self()
    }
}

/// Every potential source of one snapshot
#[derive(Debug)]
pub struct SourcePool<'a> {
    sources: Vec<PotentialSource<'a>>,
    snapshot: &'a BattlefieldSnapshot,
    demand: DemandProfile,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SourcePool<'a> {
    pub fn sources(&self) -> &[PotentialSource<'a>] {
        &self.sources
    }

    pub fn get(&self, index: usize) -> Option<&PotentialSource<'a>> {
        self.sources.get(index)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn snapshot(&self) -> &'a BattlefieldSnapshot {
        self.snapshot
    }

    pub fn demand(&self) -> &DemandProfile {
        &self.demand
    }

    /// Replace the demand profile the heuristic reads
    pub fn with_demand(mut self, demand: DemandProfile) -> Self {
        self.demand = demand;
        self
    }

    /// Diagnostics raised while building (restricted sources left out)
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Mana the free sources can produce at once
    ///
    /// Taxed sources are left out, and each permanent counts once, through
    /// its largest free ability. Flexible sources are committed through the
    /// color-choice heuristic.
    pub fn preview_capacity(&self) -> ManaCapacity {
        let mut capacity = ManaCapacity::new();
        let mut best_by_slot: Vec<Option<&PotentialSource<'a>>> = vec![None; self.snapshot.permanents.len()];

        for source in self.sources.iter().filter(|s| s.tax == 0) {
            let best = &mut best_by_slot[source.slot];
            if best.map_or(true, |b| source.quantity() > b.quantity()) {
                *best = Some(source);
            }
        }

        for source in best_by_slot.into_iter().flatten() {
            match &source.produces {
                Yield::Fixed(colors) => {
                    for &color in colors {
                        capacity.add(color, 1);
                    }
                }
                Yield::Choice { options, amount } => {
                    if let Some(color) = choose_color(&options.to_vec(), &self.demand) {
                        capacity.add(color, *amount);
                    }
                }
                Yield::Combination { palette, amount } => {
                    for color in choose_combination_assignment(&palette.to_vec(), *amount, &self.demand) {
                        capacity.add(color, 1);
                    }
                }
            }
        }
        capacity
    }
}

/// Source pool builder
///
/// Reads the parse-once ability cache; never parses text itself.
pub struct ManaEngine<'d> {
    db: &'d AbilityDatabase,
}

impl<'d> ManaEngine<'d> {
    pub fn new(db: &'d AbilityDatabase) -> Self {
        ManaEngine { db }
    }

    /// Build the pool for a snapshot
    pub fn build_pool<'a>(&self, snapshot: &'a BattlefieldSnapshot, logger: &ManaLogger) -> SourcePool<'a>
    where
        'd: 'a,
    {
        let db: &'d AbilityDatabase = self.db;
        let mut sources = Vec::new();
        let mut diagnostics = Vec::new();

        for (slot, permanent) in snapshot.permanents.iter().enumerate() {
            if permanent.tapped || !permanent.can_bear_mana_abilities() {
                continue;
            }

            let Some(abilities) = db.abilities(permanent.name.as_str()) else {
                logger.trace("pool", &format!("{} has no parsed abilities", permanent.name));
                continue;
            };

            for (ability_index, ability) in abilities.iter().enumerate() {
                if !ability.is_valid() {
                    continue;
                }
                if permanent.is_creature() && permanent.summoning_sick && needs_untapped_symbol(ability) {
                    logger.trace(
                        "pool",
                        &format!("{} is summoning sick, skipping {}", permanent.name, ability.text),
                    );
                    continue;
                }

                let Ok(tax) = u8::try_from(ability.mana_tax()) else {
                    logger.trace("pool", &format!("{} costs more to activate than it can make", permanent.name));
                    continue;
                };
                let ctx = x_context(snapshot, slot, ability);
                for (alt, descriptor) in ability.produces.iter().enumerate() {
                    let alternative = ability.is_modal.then_some(alt);
                    match resolve_yield(descriptor, &ctx, snapshot) {
                        Ok(produces) if produces.quantity() > 0 => sources.push(PotentialSource {
                            permanent,
                            ability,
                            ability_index,
                            alternative,
                            slot,
                            produces,
                            tax,
                        }),
                        Ok(_) => logger.trace("pool", &format!("{} produces nothing right now", permanent.name)),
                        Err(()) => {
                            let diagnostic = Diagnostic::EmptyColorIdentity {
                                card: permanent.name.to_string(),
                            };
                            logger.diagnostic(&diagnostic);
                            diagnostics.push(diagnostic);
                        }
                    }
                }
            }
        }

        logger.trace("pool", &format!("{} potential sources", sources.len()));
        SourcePool {
            sources,
            snapshot,
            demand: DemandProfile::new(),
            diagnostics,
        }
    }
}

/// Build a pool without logging
pub fn build_pool<'a>(snapshot: &'a BattlefieldSnapshot, db: &'a AbilityDatabase) -> SourcePool<'a> {
    ManaEngine::new(db).build_pool(snapshot, &ManaLogger::silent())
}

fn needs_untapped_symbol(ability: &ManaAbility) -> bool {
    ability
        .activation_cost
        .iter()
        .any(|c| matches!(c, Cost::Tap | Cost::Untap))
}

/// Game-state facts for one source's variable amounts
fn x_context(snapshot: &BattlefieldSnapshot, slot: usize, ability: &ManaAbility) -> XContext {
    let permanent = &snapshot.permanents[slot];
    let costs = ability.activation_cost.as_slice();

    let sacrificed_mana_value = if costs.sacrifices_self() {
        permanent.mana_value
    } else if costs.requires_sacrifice() {
        // Best case among the other permanents that could be sacrificed
        snapshot
            .permanents
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != slot)
            .map(|(_, p)| p.mana_value)
            .max()
            .unwrap_or(0)
    } else {
        0
    };

    XContext {
        creature_count: snapshot.creature_count(),
        artifact_count: snapshot.artifact_count(),
        source_power: permanent.power.unwrap_or(0),
        sacrificed_mana_value,
        greatest_power: snapshot.greatest_power(),
    }
}

/// Resolve a descriptor against the snapshot
///
/// Err means a commander-restricted choice with nothing left to choose from.
fn resolve_yield(
    descriptor: &ProductionDescriptor,
    ctx: &XContext,
    snapshot: &BattlefieldSnapshot,
) -> std::result::Result<Yield, ()> {
    match descriptor {
        ProductionDescriptor::Fixed { colors } => Ok(Yield::Fixed(colors.clone())),
        ProductionDescriptor::Choice {
            options,
            amount,
            commander_identity,
        } => {
            let options = if *commander_identity {
                let identity = snapshot.commander_identity.unwrap_or_default();
                options.intersection(identity)
            } else {
                *options
            };
            if options.is_empty() {
                return Err(());
            }
            Ok(Yield::Choice {
                options,
                amount: *amount,
            })
        }
        ProductionDescriptor::Combination { palette, amount } => Ok(Yield::Combination {
            palette: palette.iter().copied().collect(),
            amount: *amount,
        }),
        ProductionDescriptor::Variable { rule, options } => Ok(Yield::Choice {
            options: *options,
            amount: rule.resolve(ctx),
        }),
    }
}
