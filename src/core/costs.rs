//! Cost system for activated abilities
//!
//! Represents the costs a player pays to activate a mana ability, such as
//! tapping, paying mana, sacrificing permanents or paying life. Parsed from the
//! part of an oracle line before the `:` separator, e.g. `"{1}, {T}, Pay 1 life"`.

use crate::core::mana::{mana_symbols, ManaCost, ManaSymbol};
use serde::{Deserialize, Serialize};

/// A cost that must be paid to activate an ability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cost {
    /// Tap the permanent ({T})
    Tap,

    /// Untap the permanent ({Q})
    Untap,

    /// Pay mana (the activation tax of mana rocks and filters)
    Mana(ManaCost),

    /// Sacrifice the permanent itself
    SacrificeSelf,

    /// Sacrifice some other permanent (e.g. "Sacrifice a creature")
    Sacrifice { what: String },

    /// Pay life
    PayLife { amount: u32 },

    /// Anything else ("Remove a charge counter", "Exile a card ...")
    Other(String),
}

impl Cost {
    /// Parse the cost segment of an ability line
    ///
    /// `card_name` lets "Sacrifice Lotus Petal" be recognized as a self
    /// sacrifice. Components are comma separated; several symbols in one
    /// component ("{2}{G}") become one `Mana` cost.
    pub fn parse_list(segment: &str, card_name: &str) -> Vec<Cost> {
        let mut costs = Vec::new();
        let mut mana = ManaCost::new();

        for part in segment.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if part.starts_with('{') {
                if let Ok((rest, symbols)) = mana_symbols(part) {
                    for symbol in symbols {
                        match symbol {
                            ManaSymbol::Tap => costs.push(Cost::Tap),
                            ManaSymbol::Untap => costs.push(Cost::Untap),
                            ManaSymbol::Colored(color) => mana.add_pip(color),
                            ManaSymbol::Generic(n) => mana.generic = mana.generic.saturating_add(n),
                            // Hybrid activation symbols are paid with one mana of either half
                            ManaSymbol::Hybrid(_) => mana.generic = mana.generic.saturating_add(1),
                            ManaSymbol::X => mana.x_count = mana.x_count.saturating_add(1),
                            ManaSymbol::Unknown(raw) => costs.push(Cost::Other(format!("{{{raw}}}"))),
                        }
                    }
                    if !rest.trim().is_empty() {
                        costs.push(Cost::Other(rest.trim().to_string()));
                    }
                    continue;
                }
            }

            costs.push(Self::parse_single(part, card_name));
        }

        if !mana.is_zero() || mana.x_count > 0 {
            costs.push(Cost::Mana(mana));
        }

        costs
    }

    /// Parse a single non-symbol cost component
    fn parse_single(part: &str, card_name: &str) -> Cost {
        let lower = part.to_lowercase();

        if let Some(what) = lower.strip_prefix("sacrifice ") {
            let what = what.trim();
            let is_self = what == card_name.to_lowercase()
                || what == "~"
                || what == "cardname"
                || what.starts_with("this ")
                || card_name
                    .split(',')
                    .next()
                    .is_some_and(|short| !short.is_empty() && what == short.trim().to_lowercase());
            return if is_self {
                Cost::SacrificeSelf
            } else {
                Cost::Sacrifice { what: what.to_string() }
            };
        }

        if let Some(rest) = lower.strip_prefix("pay ") {
            if let Some(amount) = rest.strip_suffix(" life").and_then(|n| n.trim().parse::<u32>().ok()) {
                return Cost::PayLife { amount };
            }
        }

        Cost::Other(part.to_string())
    }

    /// Check if this cost includes a tap
    pub fn includes_tap(&self) -> bool {
        matches!(self, Cost::Tap)
    }

    /// Get the mana cost component if present
    pub fn get_mana_cost(&self) -> Option<&ManaCost> {
        match self {
            Cost::Mana(mana) => Some(mana),
            _ => None,
        }
    }
}

/// Summary helpers over a full activation cost
pub trait ActivationCost {
    /// Does activating tap the permanent?
    fn requires_tap(&self) -> bool;

    /// Does activating sacrifice the permanent itself?
    fn sacrifices_self(&self) -> bool;

    /// Any sacrifice at all (self or other)
    fn requires_sacrifice(&self) -> bool;

    /// Mana value paid to activate
    fn mana_tax(&self) -> u32;

    /// Life paid to activate
    fn life_paid(&self) -> u32;
}

impl ActivationCost for [Cost] {
    fn requires_tap(&self) -> bool {
        self.iter().any(Cost::includes_tap)
    }

    fn sacrifices_self(&self) -> bool {
        self.iter().any(|c| matches!(c, Cost::SacrificeSelf))
    }

    fn requires_sacrifice(&self) -> bool {
        self.iter()
            .any(|c| matches!(c, Cost::SacrificeSelf | Cost::Sacrifice { .. }))
    }

    fn mana_tax(&self) -> u32 {
        self.iter()
            .filter_map(Cost::get_mana_cost)
            .map(ManaCost::cmc)
            .fold(0, u32::saturating_add)
    }

    fn life_paid(&self) -> u32 {
        self.iter()
            .map(|c| match c {
                Cost::PayLife { amount } => *amount,
                _ => 0,
            })
            .sum()
    }
}
