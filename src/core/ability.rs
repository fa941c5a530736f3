//! Structured mana abilities
//!
//! The ability parser turns oracle text into `ManaAbility` records once per
//! card; everything downstream works on these closed types and never looks at
//! text again.

use crate::core::costs::{ActivationCost, Cost};
use crate::core::{Color, ColorSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Table of recognized variable-amount formulas
///
/// Phrasings outside this table bind `Unrecognized`, which resolves to 1.
/// That default is a known limitation, not an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XRule {
    /// Number of creatures you control
    CreatureCount,
    /// Number of artifacts you control
    ArtifactCount,
    /// Power of the source permanent
    SourcePower,
    /// Mana value of the permanent sacrificed to pay the cost
    SacrificedManaValue,
    /// Greatest power among creatures you control
    GreatestPower,
    Unrecognized,
}

impl XRule {
    pub fn resolve(&self, ctx: &XContext) -> u8 {
        match self {
            XRule::CreatureCount => ctx.creature_count,
            XRule::ArtifactCount => ctx.artifact_count,
            XRule::SourcePower => ctx.source_power.max(0) as u8,
            XRule::SacrificedManaValue => ctx.sacrificed_mana_value,
            XRule::GreatestPower => ctx.greatest_power.max(0) as u8,
            XRule::Unrecognized => 1,
        }
    }
}

/// Game-state facts an `XRule` can read, gathered per source by the pool builder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XContext {
    pub creature_count: u8,
    pub artifact_count: u8,
    pub source_power: i8,
    pub sacrificed_mana_value: u8,
    pub greatest_power: i8,
}

/// What one activation produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProductionDescriptor {
    /// Literal symbols, all produced ("Add {C}{C}")
    Fixed { colors: SmallVec<[Color; 4]> },

    /// `amount` mana, all of one chosen option ("Add {U} or {B}",
    /// "Add two mana of any one color")
    Choice {
        options: ColorSet,
        amount: u8,
        /// Options narrow to the commander's color identity
        #[serde(default)]
        commander_identity: bool,
    },

    /// `amount` mana produced together, each any palette color
    /// ("Add two mana in any combination of {R} and/or {G}")
    Combination { palette: SmallVec<[Color; 6]>, amount: u8 },

    /// X mana of one of `options`, X resolved from game state
    Variable { rule: XRule, options: ColorSet },
}

impl ProductionDescriptor {
    pub fn fixed(colors: impl IntoIterator<Item = Color>) -> Self {
        ProductionDescriptor::Fixed {
            colors: colors.into_iter().collect(),
        }
    }

    pub fn choice(options: ColorSet, amount: u8) -> Self {
        ProductionDescriptor::Choice {
            options,
            amount,
            commander_identity: false,
        }
    }

    /// How much mana one activation yields
    pub fn quantity(&self, ctx: &XContext) -> u8 {
        match self {
            ProductionDescriptor::Fixed { colors } => colors.len() as u8,
            ProductionDescriptor::Choice { amount, .. } => *amount,
            ProductionDescriptor::Combination { amount, .. } => *amount,
            ProductionDescriptor::Variable { rule, .. } => rule.resolve(ctx),
        }
    }

    /// Every color this descriptor could possibly yield
    pub fn colors(&self) -> ColorSet {
        match self {
            ProductionDescriptor::Fixed { colors } => colors.iter().copied().collect(),
            ProductionDescriptor::Choice { options, .. } => *options,
            ProductionDescriptor::Combination { palette, .. } => palette.iter().copied().collect(),
            ProductionDescriptor::Variable { options, .. } => *options,
        }
    }
}

impl fmt::Display for ProductionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductionDescriptor::Fixed { colors } => {
                for color in colors {
                    write!(f, "{{{color}}}")?;
                }
                Ok(())
            }
            ProductionDescriptor::Choice {
                options,
                amount,
                commander_identity,
            } => {
                write!(f, "{amount} of one of [{options}]")?;
                if *commander_identity {
                    write!(f, " (commander identity)")?;
                }
                Ok(())
            }
            ProductionDescriptor::Combination { palette, amount } => {
                write!(f, "{amount} in any combination of [")?;
                for color in palette {
                    write!(f, "{color}")?;
                }
                write!(f, "]")
            }
            ProductionDescriptor::Variable { rule, options } => {
                write!(f, "X ({rule:?}) of one of [{options}]")
            }
        }
    }
}

/// One activated mana ability of a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaAbility {
    /// Costs paid to activate, in printed order
    pub activation_cost: Vec<Cost>,

    /// Non-modal: exactly one descriptor. Modal: one descriptor per
    /// alternative, of which a single one is chosen.
    pub produces: Vec<ProductionDescriptor>,

    /// Synthesized from a basic land type rather than read from text
    #[serde(default)]
    pub is_implicit_basic_land: bool,

    #[serde(default)]
    pub is_modal: bool,

    /// The oracle line this ability came from
    #[serde(default)]
    pub text: String,
}

impl ManaAbility {
    /// Implicit "{T}: Add {color}" of a basic land type
    pub fn basic_land(color: Color) -> Self {
        ManaAbility {
            activation_cost: vec![Cost::Tap],
            produces: vec![ProductionDescriptor::fixed([color])],
            is_implicit_basic_land: true,
            is_modal: false,
            text: format!("{{T}}: Add {{{color}}}."),
        }
    }

    /// Abilities without any production never enter a pool
    pub fn is_valid(&self) -> bool {
        !self.produces.is_empty()
    }

    pub fn requires_tap(&self) -> bool {
        self.activation_cost.requires_tap()
    }

    pub fn mana_tax(&self) -> u32 {
        self.activation_cost.mana_tax()
    }

    /// Union of every color any alternative can yield
    pub fn colors(&self) -> ColorSet {
        self.produces
            .iter()
            .fold(ColorSet::empty(), |acc, p| acc.union(p.colors()))
    }
}

impl fmt::Display for ManaAbility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alternatives: Vec<String> = self.produces.iter().map(|p| p.to_string()).collect();
        let joiner = if self.is_modal { " | " } else { " + " };
        write!(f, "{}", alternatives.join(joiner))?;
        let tax = self.mana_tax();
        if tax > 0 {
            write!(f, " (tax {tax})")?;
        }
        if self.requires_tap() {
            write!(f, " [T]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_quantity() {
        let sol_ring = ProductionDescriptor::fixed([Color::Colorless, Color::Colorless]);
        assert_eq!(sol_ring.quantity(&XContext::default()), 2);
        assert_eq!(sol_ring.to_string(), "{C}{C}");
    }

    #[test]
    fn test_variable_resolution() {
        let ctx = XContext {
            creature_count: 4,
            source_power: -1,
            ..XContext::default()
        };
        let cradle = ProductionDescriptor::Variable {
            rule: XRule::CreatureCount,
            options: ColorSet::single(Color::Green),
        };
        assert_eq!(cradle.quantity(&ctx), 4);
        assert_eq!(XRule::SourcePower.resolve(&ctx), 0);
        assert_eq!(XRule::Unrecognized.resolve(&ctx), 1);
    }

    #[test]
    fn test_basic_land_ability() {
        let forest = ManaAbility::basic_land(Color::Green);
        assert!(forest.is_valid());
        assert!(forest.requires_tap());
        assert_eq!(forest.mana_tax(), 0);
        assert_eq!(forest.colors(), ColorSet::single(Color::Green));
    }

    #[test]
    fn test_descriptor_serde_tagged() {
        let choice = ProductionDescriptor::choice(ColorSet::five_colors(), 1);
        let json = serde_json::to_value(&choice).unwrap();
        assert_eq!(json["kind"], "Choice");
        let back: ProductionDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, choice);
    }
}
