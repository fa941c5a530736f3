//! Color-choice heuristic for flexible mana sources
//!
//! Advisory only. Nothing here can make a payment fail; it only decides which
//! color a `Choice` or `Combination` source should yield.

use crate::core::{Color, ColorSet, ManaCost};
use smallvec::SmallVec;

/// Weight of the pending commander's pips relative to a card in hand
pub const COMMANDER_WEIGHT: u16 = 3;

/// Outstanding colored need per color, in `Color::ALL` order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemandProfile {
    need: [u16; 6],
    primary: SmallVec<[Color; 5]>,
}

impl DemandProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan hand costs, plus the pending commander weighted by `COMMANDER_WEIGHT`
    pub fn from_costs(hand: &[ManaCost], pending_commander: Option<&ManaCost>) -> Self {
        let mut profile = DemandProfile::new();
        for cost in hand {
            profile.add_cost(cost, 1);
        }
        if let Some(cost) = pending_commander {
            profile.add_cost(cost, COMMANDER_WEIGHT);
        }
        profile
    }

    pub fn add_cost(&mut self, cost: &ManaCost, weight: u16) {
        for color in Color::ALL {
            let weighted = cost.pips(color).saturating_mul(weight);
            self.need[color.index()] = self.need[color.index()].saturating_add(weighted);
        }
    }

    /// Declared primary colors, used to break ties
    pub fn with_primary_colors(mut self, colors: impl IntoIterator<Item = Color>) -> Self {
        self.primary = colors.into_iter().collect();
        self
    }

    pub fn need(&self, color: Color) -> u16 {
        self.need[color.index()]
    }

    pub fn is_primary(&self, color: Color) -> bool {
        self.primary.contains(&color)
    }

    pub fn is_empty(&self) -> bool {
        self.need.iter().all(|&n| n == 0)
    }
}

/// Pick one option: highest need, then primary colors, then first in list
///
/// Returns None only when `options` is empty.
pub fn choose_color(options: &[Color], demand: &DemandProfile) -> Option<Color> {
    if demand.is_empty() {
        return options.first().copied();
    }
    options
        .iter()
        .enumerate()
        .max_by_key(|&(i, &c)| (demand.need(c), demand.is_primary(c), std::cmp::Reverse(i)))
        .map(|(_, &c)| c)
}

/// Assign `amount` mana over a palette, round-robin in descending need
pub fn choose_combination_assignment(palette: &[Color], amount: u8, demand: &DemandProfile) -> Vec<Color> {
    if palette.is_empty() {
        return Vec::new();
    }
    let mut ordered: SmallVec<[Color; 6]> = palette.iter().copied().collect();
    // Stable sort keeps palette order among equal needs
    ordered.sort_by_key(|&c| (std::cmp::Reverse(demand.need(c)), !demand.is_primary(c)));
    (0..amount as usize).map(|i| ordered[i % ordered.len()]).collect()
}

/// Color to take from a flexible source when paying generic mana
///
/// Colorless when possible, otherwise the least demanded option, keeping the
/// needed colors for later spells.
pub fn choose_waste_color(options: ColorSet, demand: &DemandProfile) -> Option<Color> {
    if options.contains(Color::Colorless) {
        return Some(Color::Colorless);
    }
    options
        .iter()
        .enumerate()
        .min_by_key(|&(i, c)| (demand.need(c), demand.is_primary(c), i))
        .map(|(_, c)| c)
}

/// Colors for a combination source picked while paying a colored pip
///
/// The pip's color comes first, then any other outstanding pips the palette
/// can cover, then the rest as waste.
pub fn assign_combination_for_pips(
    palette: ColorSet,
    amount: u8,
    paying: Color,
    outstanding: &[u16; 6],
    demand: &DemandProfile,
) -> Vec<Color> {
    let mut remaining = *outstanding;
    let mut colors = Vec::with_capacity(amount as usize);

    let order = std::iter::once(paying).chain(Color::ALL.into_iter().filter(|&c| c != paying));
    for color in order {
        if !palette.contains(color) {
            continue;
        }
        while colors.len() < amount as usize && remaining[color.index()] > 0 {
            colors.push(color);
            remaining[color.index()] -= 1;
        }
    }

    if let Some(waste) = choose_waste_color(palette, demand) {
        colors.resize(amount as usize, waste);
    }
    colors
}
