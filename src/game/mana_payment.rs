//! Mana payment resolution system
//!
//! This module decides which pool entries to activate for a cost, and which
//! color each flexible entry yields.
//!
//! # Architecture
//!
//! - **GreedyManaResolver**: two-phase greedy (colored pips first, then
//!   generic), the way a player taps mana by hand
//! - **BacktrackingResolver**: complete search over small pools, used when the
//!   greedy pass gets stuck but the bounds check cannot rule the cost out
//! - **ManaSolver**: greedy first, backtracking on `Maybe`
//!
//! # Example
//!
//! ```ignore
//! use mtg_mana_rs::game::{build_pool, solve, apply_allocation};
//!
//! let pool = build_pool(&snapshot, &db);
//! if let Some(allocation) = solve("{2}{U}{B}", &pool) {
//!     let steps = apply_allocation(&allocation, &pool);
//!     // Caller taps, sacrifices and pays life, then rebuilds the pool
//! }
//! ```

use crate::core::{ActivationCost, CardName, Color, ColorSet, Cost, ManaCost, PermanentId};
use crate::error::Diagnostic;
use crate::game::color_choice::{assign_combination_for_pips, choose_waste_color, DemandProfile};
use crate::game::mana_engine::{PotentialSource, SourcePool, Yield};
use crate::logger::ManaLogger;
use serde::Serialize;
use smallvec::SmallVec;

/// Result of checking whether a mana cost can be paid
///
/// This three-valued logic allows us to distinguish between:
/// - Definite success (with solution)
/// - Definite failure (provably impossible)
/// - Uncertain (greedy failed but backtracking might succeed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResult {
    /// We can definitely pay this cost, here's how
    Yes(Allocation),

    /// We can prove that this cost cannot be paid with available sources
    No,

    /// The resolver couldn't find a solution, but one might exist
    Maybe,
}

/// Which solver phase committed an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaymentPhase {
    Colored,
    Generic,
}

/// One activation in an allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationEntry {
    /// Index into the pool's sources
    pub source_index: usize,
    pub permanent: PermanentId,
    pub ability_index: usize,
    /// Colors the activation yields, in the order they are spent
    pub chosen_colors: SmallVec<[Color; 4]>,
    /// Quantity minus activation tax
    pub net_contribution: i16,
    pub phase: PaymentPhase,
}

/// Ordered activations that together pay one cost
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub entries: Vec<AllocationEntry>,
}

impl Allocation {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.source_index)
    }
}

/// What the caller must do to one permanent to carry out an allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapInstruction {
    pub permanent: PermanentId,
    pub name: CardName,
    /// The oracle line being activated
    pub ability_text: String,
    pub tap: bool,
    pub untap: bool,
    pub sacrifice_self: bool,
    /// Description of another permanent to sacrifice ("a creature")
    pub sacrifice_other: Option<String>,
    pub life: u32,
    /// Mana spent on the activation itself
    pub mana_paid: u8,
    pub produced: SmallVec<[Color; 4]>,
}

/// Trait for mana payment resolution strategies
///
/// Different implementations can provide different algorithms for determining
/// how to pay mana costs. The interface is kept minimal to allow flexibility.
pub trait ManaPaymentResolver {
    /// Check if a cost can be paid and return the payment result
    fn check_payment(&self, cost: &ManaCost, pool: &SourcePool<'_>) -> PaymentResult;

    /// Quick bounds check without attempting to construct a solution
    ///
    /// Returns `No` when the cost is provably impossible, `Maybe` otherwise.
    /// Never returns `Yes`.
    fn quick_check(&self, cost: &ManaCost, pool: &SourcePool<'_>) -> PaymentResult {
        bounds_check(cost, pool)
    }

    /// Pessimistic: `Maybe` is treated as `No`
    fn can_pay(&self, cost: &ManaCost, pool: &SourcePool<'_>) -> bool {
        matches!(self.check_payment(cost, pool), PaymentResult::Yes(_))
    }

    /// The allocation, if this resolver found one
    fn compute_allocation(&self, cost: &ManaCost, pool: &SourcePool<'_>) -> Option<Allocation> {
        match self.check_payment(cost, pool) {
            PaymentResult::Yes(allocation) => Some(allocation),
            _ => None,
        }
    }
}

/// Prove impossibility from totals alone
///
/// Total: the positive net contributions must cover the whole cost. Colors:
/// treating every source as free, each color must be producible often
/// enough. A required color nothing can make fails here.
pub fn bounds_check(cost: &ManaCost, pool: &SourcePool<'_>) -> PaymentResult {
    let available: i64 = pool
        .sources()
        .iter()
        .map(|s| i64::from(s.net_contribution().max(0)))
        .sum();
    if available < i64::from(cost.cmc()) {
        return PaymentResult::No;
    }

    for color in Color::ALL {
        let pips = u32::from(cost.pips(color));
        if pips == 0 {
            continue;
        }
        let max: u32 = pool.sources().iter().map(|s| u32::from(s.produces.max_of(color))).sum();
        if pips > max {
            return PaymentResult::No;
        }
    }

    PaymentResult::Maybe
}

/// No two entries may share a source, a modal activation, or an exhausted permanent
fn is_available(sources: &[PotentialSource<'_>], chosen: &[usize], index: usize) -> bool {
    !chosen.contains(&index) && chosen.iter().all(|&j| !sources[j].conflicts_with(&sources[index]))
}

/// Greedy resolver
///
/// 1. Colored phase, colors in W U B R G C order: for each outstanding pip
///    take the first free source that can make it, preferring untaxed
///    sources, then specific ones (fixed < narrow choice < any color). Every
///    color the activation yields is credited; surplus pays generic and the
///    activation tax is added to generic.
/// 2. Generic phase: untaxed first, least flexible first, and only sources
///    with a positive net contribution.
///
/// The greedy approach preserves flexible sources for later pips.
#[derive(Debug, Default)]
pub struct GreedyManaResolver;

impl GreedyManaResolver {
    pub fn new() -> Self {
        Self
    }

    /// Try to pay greedily; None when stuck
    fn try_greedy_payment(&self, cost: &ManaCost, pool: &SourcePool<'_>) -> Option<Allocation> {
        let sources = pool.sources();
        let demand = pool.demand();
        let mut outstanding = cost.colored();
        let mut generic = i32::from(cost.generic);
        let mut chosen: Vec<usize> = Vec::new();
        let mut allocation = Allocation::default();

        for color in Color::ALL {
            while outstanding[color.index()] > 0 {
                let pick = sources
                    .iter()
                    .enumerate()
                    .filter(|(i, s)| s.produces.can_produce(color) && is_available(sources, &chosen, *i))
                    .min_by_key(|(i, s)| (s.tax > 0, s.produces.score_for_color(color), *i))
                    .map(|(i, _)| i)?;

                let source = &sources[pick];
                let colors = colors_for_pip(&source.produces, color, &outstanding, demand);
                let mut surplus = 0i32;
                for c in &colors {
                    let slot = &mut outstanding[c.index()];
                    if *slot > 0 {
                        *slot -= 1;
                    } else {
                        surplus += 1;
                    }
                }
                generic = (generic + i32::from(source.tax) - surplus).max(0);

                chosen.push(pick);
                allocation.entries.push(entry(pick, source, colors, PaymentPhase::Colored));
            }
        }

        while generic > 0 {
            let pick = sources
                .iter()
                .enumerate()
                .filter(|(i, s)| s.net_contribution() > 0 && is_available(sources, &chosen, *i))
                .min_by_key(|(i, s)| (s.tax > 0, s.produces.colors().len(), *i))
                .map(|(i, _)| i)?;

            let source = &sources[pick];
            generic -= i32::from(source.net_contribution());
            chosen.push(pick);
            let colors = colors_for_generic(&source.produces, demand);
            allocation.entries.push(entry(pick, source, colors, PaymentPhase::Generic));
        }

        Some(allocation)
    }
}

impl ManaPaymentResolver for GreedyManaResolver {
    fn check_payment(&self, cost: &ManaCost, pool: &SourcePool<'_>) -> PaymentResult {
        // First, do bounds checking to see if we can prove "No"
        if bounds_check(cost, pool) == PaymentResult::No {
            return PaymentResult::No;
        }

        match self.try_greedy_payment(cost, pool) {
            Some(allocation) => PaymentResult::Yes(allocation),
            // Greedy failed but bounds check says it might be possible
            None => PaymentResult::Maybe,
        }
    }
}

fn entry(index: usize, source: &PotentialSource<'_>, colors: SmallVec<[Color; 4]>, phase: PaymentPhase) -> AllocationEntry {
    AllocationEntry {
        source_index: index,
        permanent: source.permanent.id,
        ability_index: source.ability_index,
        chosen_colors: colors,
        net_contribution: source.net_contribution(),
        phase,
    }
}

/// Colors a source yields when picked for a pip of `paying`
fn colors_for_pip(
    produces: &Yield,
    paying: Color,
    outstanding: &[u16; 6],
    demand: &DemandProfile,
) -> SmallVec<[Color; 4]> {
    match produces {
        Yield::Fixed(colors) => colors.clone(),
        Yield::Choice { amount, .. } => SmallVec::from_elem(paying, *amount as usize),
        Yield::Combination { palette, amount } => {
            assign_combination_for_pips(*palette, *amount, paying, outstanding, demand)
                .into_iter()
                .collect()
        }
    }
}

/// Colors a source yields when paying generic mana
fn colors_for_generic(produces: &Yield, demand: &DemandProfile) -> SmallVec<[Color; 4]> {
    match produces {
        Yield::Fixed(colors) => colors.clone(),
        Yield::Choice { options: set, amount } | Yield::Combination { palette: set, amount } => {
            match choose_waste_color(*set, demand) {
                Some(color) => SmallVec::from_elem(color, *amount as usize),
                None => SmallVec::new(),
            }
        }
    }
}

/// Exhaustive resolver
///
/// Iterative deepening on the number of activations, so the first allocation
/// found uses as few sources as possible. A node budget bounds the work;
/// running out yields `Maybe`.
#[derive(Debug)]
pub struct BacktrackingResolver {
    node_budget: usize,
}

impl BacktrackingResolver {
    pub fn new(node_budget: usize) -> Self {
        BacktrackingResolver { node_budget }
    }
}

impl Default for BacktrackingResolver {
    fn default() -> Self {
        Self::new(SolverOptions::default().node_budget)
    }
}

impl ManaPaymentResolver for BacktrackingResolver {
    fn check_payment(&self, cost: &ManaCost, pool: &SourcePool<'_>) -> PaymentResult {
        if bounds_check(cost, pool) == PaymentResult::No {
            return PaymentResult::No;
        }

        let mut search = Search::new(cost, pool, self.node_budget);
        match search.run() {
            Some(allocation) => PaymentResult::Yes(allocation),
            None if search.out_of_budget => PaymentResult::Maybe,
            None => PaymentResult::No,
        }
    }
}

/// A flexible production unit for the color-cover search
#[derive(Debug, Clone, Copy)]
struct FlexUnit {
    /// Position in the chosen list
    owner: usize,
    options: ColorSet,
    amount: u8,
}

struct Search<'p, 'a> {
    sources: &'p [PotentialSource<'a>],
    demand: &'p DemandProfile,
    pips: [u16; 6],
    cmc: i32,
    /// Sources worth considering, in pool order
    candidates: Vec<usize>,
    /// Sum of positive net contributions of `candidates[k..]`
    suffix_potential: Vec<i32>,
    nodes: usize,
    budget: usize,
    out_of_budget: bool,
}

impl<'p, 'a> Search<'p, 'a> {
    fn new(cost: &ManaCost, pool: &'p SourcePool<'a>, budget: usize) -> Self {
        let pips = cost.colored();
        let sources = pool.sources();
        let candidates: Vec<usize> = (0..sources.len())
            .filter(|&i| {
                let s = &sources[i];
                s.net_contribution() > 0 || Color::ALL.iter().any(|&c| pips[c.index()] > 0 && s.produces.can_produce(c))
            })
            .collect();

        let mut suffix_potential = vec![0i32; candidates.len() + 1];
        for k in (0..candidates.len()).rev() {
            let net = i32::from(sources[candidates[k]].net_contribution().max(0));
            suffix_potential[k] = suffix_potential[k + 1] + net;
        }

        Search {
            sources,
            demand: pool.demand(),
            pips,
            cmc: i32::try_from(cost.cmc()).unwrap_or(i32::MAX),
            candidates,
            suffix_potential,
            nodes: 0,
            budget,
            out_of_budget: false,
        }
    }

    fn run(&mut self) -> Option<Allocation> {
        if self.cmc == 0 {
            return Some(Allocation::default());
        }
        for size in 1..=self.candidates.len() {
            let mut chosen = Vec::with_capacity(size);
            if let Some(allocation) = self.choose(0, size, &mut chosen, 0) {
                return Some(allocation);
            }
            if self.out_of_budget {
                return None;
            }
        }
        None
    }

    fn tick(&mut self) -> bool {
        self.nodes += 1;
        if self.nodes > self.budget {
            self.out_of_budget = true;
        }
        !self.out_of_budget
    }

    fn choose(&mut self, start: usize, size: usize, chosen: &mut Vec<usize>, net: i32) -> Option<Allocation> {
        if !self.tick() {
            return None;
        }
        if chosen.len() == size {
            return self.complete(chosen);
        }

        let needed = size - chosen.len();
        for k in start..self.candidates.len() {
            if self.candidates.len() - k < needed {
                break;
            }
            // Even every remaining positive source cannot reach the total
            if net + self.suffix_potential[k] < self.cmc {
                break;
            }
            let index = self.candidates[k];
            if !is_available(self.sources, chosen, index) {
                continue;
            }

            chosen.push(index);
            let next_net = net + i32::from(self.sources[index].net_contribution());
            let found = self.choose(k + 1, size, chosen, next_net);
            chosen.pop();
            if found.is_some() || self.out_of_budget {
                return found;
            }
        }
        None
    }

    /// Check one set of sources and turn it into an allocation
    fn complete(&mut self, chosen: &[usize]) -> Option<Allocation> {
        let net: i32 = chosen
            .iter()
            .map(|&i| i32::from(self.sources[i].net_contribution()))
            .sum();
        if net < self.cmc {
            return None;
        }

        let mut need = self.pips;
        let mut units = Vec::new();
        for (owner, &i) in chosen.iter().enumerate() {
            match &self.sources[i].produces {
                Yield::Fixed(colors) => {
                    for c in colors {
                        need[c.index()] = need[c.index()].saturating_sub(1);
                    }
                }
                Yield::Choice { options, amount } => units.push(FlexUnit {
                    owner,
                    options: *options,
                    amount: *amount,
                }),
                Yield::Combination { palette, amount } => {
                    for _ in 0..*amount {
                        units.push(FlexUnit {
                            owner,
                            options: *palette,
                            amount: 1,
                        });
                    }
                }
            }
        }

        let mut assigned: Vec<Option<Color>> = vec![None; units.len()];
        if !self.cover(&units, 0, &mut need, &mut assigned) {
            return None;
        }
        Some(self.build_allocation(chosen, &units, &assigned))
    }

    /// Assign flexible units to the remaining pips
    fn cover(&mut self, units: &[FlexUnit], k: usize, need: &mut [u16; 6], assigned: &mut [Option<Color>]) -> bool {
        if need.iter().all(|&n| n == 0) {
            return true;
        }
        if k == units.len() || !self.tick() {
            return false;
        }

        let unit = units[k];
        let mut useful = false;
        for color in unit.options.iter() {
            let outstanding = need[color.index()];
            if outstanding == 0 {
                continue;
            }
            useful = true;
            let take = outstanding.min(u16::from(unit.amount));
            need[color.index()] -= take;
            assigned[k] = Some(color);
            if self.cover(units, k + 1, need, assigned) {
                return true;
            }
            need[color.index()] += take;
            assigned[k] = None;
            if self.out_of_budget {
                return false;
            }
        }

        // A unit that cannot help any pip is skipped
        !useful && self.cover(units, k + 1, need, assigned)
    }

    /// Order entries so replaying them credits pips before generic
    fn build_allocation(&self, chosen: &[usize], units: &[FlexUnit], assigned: &[Option<Color>]) -> Allocation {
        let mut outstanding = self.pips;
        let mut colored = Vec::new();
        let mut generic = Vec::new();

        for (owner, &index) in chosen.iter().enumerate() {
            let source = &self.sources[index];
            let colors: SmallVec<[Color; 4]> = match &source.produces {
                Yield::Fixed(colors) => colors.clone(),
                _ => {
                    let waste = choose_waste_color(source.produces.colors(), self.demand);
                    let mut colors = SmallVec::new();
                    for (unit, slot) in units.iter().zip(assigned).filter(|(u, _)| u.owner == owner) {
                        if let Some(color) = slot.or(waste) {
                            colors.extend(std::iter::repeat(color).take(unit.amount as usize));
                        }
                    }
                    colors
                }
            };

            let mut credited = false;
            for c in &colors {
                let slot = &mut outstanding[c.index()];
                if *slot > 0 {
                    *slot -= 1;
                    credited = true;
                }
            }

            if credited {
                colored.push(entry(index, source, colors, PaymentPhase::Colored));
            } else {
                generic.push(entry(index, source, colors, PaymentPhase::Generic));
            }
        }

        colored.extend(generic);
        Allocation { entries: colored }
    }
}

/// Solver knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverOptions {
    /// Fall back to the exhaustive resolver when greedy is stuck
    pub exhaustive_fallback: bool,
    /// Search nodes the exhaustive resolver may visit
    pub node_budget: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            exhaustive_fallback: true,
            node_budget: 200_000,
        }
    }
}

/// Greedy first, exhaustive search when greedy gets stuck
#[derive(Debug, Default)]
pub struct ManaSolver {
    options: SolverOptions,
    greedy: GreedyManaResolver,
    backtracking: BacktrackingResolver,
}

impl ManaSolver {
    pub fn new(options: SolverOptions) -> Self {
        ManaSolver {
            options,
            greedy: GreedyManaResolver::new(),
            backtracking: BacktrackingResolver::new(options.node_budget),
        }
    }

    pub fn options(&self) -> SolverOptions {
        self.options
    }

    /// Parse a bracketed cost string and solve it
    pub fn solve(&self, cost_text: &str, pool: &SourcePool<'_>, logger: &ManaLogger) -> Option<Allocation> {
        let (cost, diagnostics) = ManaCost::parse_with_diagnostics(cost_text);
        for diagnostic in &diagnostics {
            logger.diagnostic(diagnostic);
        }
        self.solve_cost(&cost, pool, logger)
    }

    /// Solve a parsed cost; None means the cost cannot be paid
    pub fn solve_cost(&self, cost: &ManaCost, pool: &SourcePool<'_>, logger: &ManaLogger) -> Option<Allocation> {
        let result = match self.greedy.check_payment(cost, pool) {
            PaymentResult::Maybe if self.options.exhaustive_fallback => {
                logger.trace("solver", &format!("greedy stuck on {cost}, searching"));
                self.backtracking.check_payment(cost, pool)
            }
            other => other,
        };

        match result {
            PaymentResult::Yes(allocation) => {
                for e in &allocation.entries {
                    if let Some(source) = pool.get(e.source_index) {
                        logger.trace(
                            "solver",
                            &format!("{:?}: {} {}", e.phase, source.permanent.name, source.ability.text),
                        );
                    }
                }
                logger.trace("solver", &format!("paid {cost} with {} sources", allocation.len()));
                Some(allocation)
            }
            PaymentResult::No => {
                logger.trace("solver", &format!("cannot pay {cost}"));
                None
            }
            PaymentResult::Maybe => {
                if self.options.exhaustive_fallback {
                    logger.diagnostic(&Diagnostic::SearchBudgetExhausted {
                        cost: cost.to_string(),
                        budget: self.options.node_budget,
                    });
                } else {
                    logger.trace("solver", &format!("greedy could not pay {cost}"));
                }
                None
            }
        }
    }
}

/// Solve a cost string against a pool with default options
pub fn solve(cost_text: &str, pool: &SourcePool<'_>) -> Option<Allocation> {
    ManaSolver::default().solve(cost_text, pool, &ManaLogger::silent())
}

/// Can the pool pay this cost string?
pub fn can_pay(cost_text: &str, pool: &SourcePool<'_>) -> bool {
    solve(cost_text, pool).is_some()
}

/// Describe the permanent mutations an allocation implies
///
/// Side-effect free: the caller applies these to its own game state, then
/// rebuilds the pool.
pub fn apply_allocation(allocation: &Allocation, pool: &SourcePool<'_>) -> Vec<TapInstruction> {
    allocation
        .entries
        .iter()
        .filter_map(|e| {
            let source = pool.get(e.source_index)?;
            let costs = source.ability.activation_cost.as_slice();
            Some(TapInstruction {
                permanent: source.permanent.id,
                name: source.permanent.name.clone(),
                ability_text: source.ability.text.clone(),
                tap: costs.requires_tap(),
                untap: costs.iter().any(|c| matches!(c, Cost::Untap)),
                sacrifice_self: costs.sacrifices_self(),
                sacrifice_other: costs.iter().find_map(|c| match c {
                    Cost::Sacrifice { what } => Some(what.clone()),
                    _ => None,
                }),
                life: costs.life_paid(),
                mana_paid: source.tax,
                produced: e.chosen_colors.clone(),
            })
        })
        .collect()
}
