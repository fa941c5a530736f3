//! Mana colors, symbols, and cost requirements
//!
//! Costs arrive in the game's bracketed notation (`"{2}{U}{B}"`). Symbols are
//! tokenized with nom so the same tokenizer serves cost strings, activation
//! costs, and the "Add ..." clauses of ability text.

use crate::error::Diagnostic;
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    multi::many1,
    sequence::{delimited, preceded},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mana colors in MTG
///
/// Colorless is treated as a color here: a `{C}` pip is a specific
/// requirement that only colorless mana can satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "W", alias = "White")]
    White,
    #[serde(rename = "U", alias = "Blue")]
    Blue,
    #[serde(rename = "B", alias = "Black")]
    Black,
    #[serde(rename = "R", alias = "Red")]
    Red,
    #[serde(rename = "G", alias = "Green")]
    Green,
    #[serde(rename = "C", alias = "Colorless")]
    Colorless,
}

impl Color {
    /// Fixed iteration order used everywhere (WUBRG, then colorless)
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Colorless,
    ];

    /// The five colors proper
    pub const WUBRG: [Color; 5] = [Color::White, Color::Blue, Color::Black, Color::Red, Color::Green];

    /// Position in `Color::ALL`
    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Blue => 1,
            Color::Black => 2,
            Color::Red => 3,
            Color::Green => 4,
            Color::Colorless => 5,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Colorless => 'C',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'W' | 'w' => Some(Color::White),
            'U' | 'u' => Some(Color::Blue),
            'B' | 'b' => Some(Color::Black),
            'R' | 'r' => Some(Color::Red),
            'G' | 'g' => Some(Color::Green),
            'C' | 'c' => Some(Color::Colorless),
            _ => None,
        }
    }

    /// Color produced by a basic land type (Plains -> W, ...)
    pub fn from_basic_land_type(subtype: &str) -> Option<Self> {
        match subtype {
            "Plains" => Some(Color::White),
            "Island" => Some(Color::Blue),
            "Swamp" => Some(Color::Black),
            "Mountain" => Some(Color::Red),
            "Forest" => Some(Color::Green),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A small set of colors stored as a bitmask
///
/// Iteration always follows `Color::ALL` order, which keeps every choice made
/// from a set deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Color>", from = "Vec<Color>")]
pub struct ColorSet(u8);

impl ColorSet {
    pub const fn empty() -> Self {
        ColorSet(0)
    }

    /// White, blue, black, red and green (no colorless)
    pub const fn five_colors() -> Self {
        ColorSet(0b01_1111)
    }

    pub fn single(color: Color) -> Self {
        ColorSet(1 << color.index())
    }

    pub fn insert(&mut self, color: Color) {
        self.0 |= 1 << color.index();
    }

    pub fn contains(&self, color: Color) -> bool {
        self.0 & (1 << color.index()) != 0
    }

    pub fn intersection(&self, other: ColorSet) -> ColorSet {
        ColorSet(self.0 & other.0)
    }

    pub fn union(&self, other: ColorSet) -> ColorSet {
        ColorSet(self.0 | other.0)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        Color::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    pub fn to_vec(&self) -> Vec<Color> {
        self.iter().collect()
    }
}

impl FromIterator<Color> for ColorSet {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        let mut set = ColorSet::empty();
        for color in iter {
            set.insert(color);
        }
        set
    }
}

impl From<Vec<Color>> for ColorSet {
    fn from(colors: Vec<Color>) -> Self {
        colors.into_iter().collect()
    }
}

impl From<ColorSet> for Vec<Color> {
    fn from(set: ColorSet) -> Self {
        set.to_vec()
    }
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in self.iter() {
            write!(f, "{color}")?;
        }
        Ok(())
    }
}

/// One bracketed symbol such as `{G}`, `{2}`, `{T}` or `{W/U}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManaSymbol {
    Colored(Color),
    Generic(u16),
    X,
    Tap,
    Untap,
    /// Hybrid or Phyrexian symbols (`{W/U}`, `{G/P}`)
    Hybrid(String),
    Unknown(String),
}

impl ManaSymbol {
    fn classify(inner: &str) -> Self {
        let upper = inner.trim().to_ascii_uppercase();
        if upper.len() == 1 {
            let c = upper.chars().next().unwrap_or(' ');
            if let Some(color) = Color::from_char(c) {
                return ManaSymbol::Colored(color);
            }
            match c {
                'X' => return ManaSymbol::X,
                'T' => return ManaSymbol::Tap,
                'Q' => return ManaSymbol::Untap,
                _ => {}
            }
        }
        if !upper.is_empty() && upper.chars().all(|c| c.is_ascii_digit()) {
            // Digits only, so the parse fails on overflow alone
            return ManaSymbol::Generic(upper.parse::<u16>().unwrap_or(u16::MAX));
        }
        if upper.contains('/') {
            return ManaSymbol::Hybrid(inner.to_string());
        }
        ManaSymbol::Unknown(inner.to_string())
    }

    /// Mana value of the symbol when it appears in a cost
    pub fn mana_value(&self) -> u16 {
        match self {
            ManaSymbol::Colored(_) => 1,
            ManaSymbol::Generic(n) => *n,
            ManaSymbol::Hybrid(_) => 1,
            _ => 0,
        }
    }
}

/// Parse one `{...}` symbol
pub fn mana_symbol(input: &str) -> IResult<&str, ManaSymbol> {
    let (rest, inner) = delimited(char('{'), take_while1(|c| c != '}' && c != '{'), char('}'))(input)?;
    Ok((rest, ManaSymbol::classify(inner)))
}

/// Parse a run of symbols, allowing whitespace between them
pub fn mana_symbols(input: &str) -> IResult<&str, Vec<ManaSymbol>> {
    many1(preceded(multispace0, mana_symbol))(input)
}

/// Represents a mana cost (e.g., "{2}{R}{R}" = 2 generic + 2 red)
///
/// This is the cost requirement handed to the solver: colored pips per color
/// (including `{C}`) plus a generic remainder. `{X}` contributes nothing and is
/// only counted. Counts saturate at `u16::MAX`, far beyond anything a
/// battlefield produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u16,
    pub white: u16,
    pub blue: u16,
    pub black: u16,
    pub red: u16,
    pub green: u16,
    pub colorless: u16,
    #[serde(default)]
    pub x_count: u8,
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a cost string, ignoring diagnostics
    ///
    /// Accepts bracketed notation (`"{2}{U}{B}"`) as well as the Forge card
    /// file shorthand (`"2 U B"`, `"2RR"`).
    pub fn from_string(s: &str) -> Self {
        Self::parse_with_diagnostics(s).0
    }

    /// Parse a cost string, reporting symbols outside the recognized alphabet
    ///
    /// Unknown symbols contribute zero requirement and are reported rather
    /// than crashing. Hybrid and Phyrexian pips are reported too, and each
    /// still counts as one generic so the cost never gets cheaper.
    pub fn parse_with_diagnostics(s: &str) -> (Self, Vec<Diagnostic>) {
        let trimmed = s.trim();
        if !trimmed.contains('{') {
            return (Self::from_shorthand(trimmed), Vec::new());
        }

        let mut cost = ManaCost::new();
        let mut diagnostics = Vec::new();
        let mut rest = trimmed;

        while !rest.is_empty() {
            match preceded(multispace0, mana_symbol)(rest) {
                Ok((next, symbol)) => {
                    match symbol {
                        ManaSymbol::Colored(color) => cost.add_pip(color),
                        ManaSymbol::Generic(n) => cost.generic = cost.generic.saturating_add(n),
                        ManaSymbol::X => cost.x_count = cost.x_count.saturating_add(1),
                        ManaSymbol::Hybrid(raw) => {
                            cost.generic = cost.generic.saturating_add(1);
                            diagnostics.push(Diagnostic::MalformedCostText {
                                text: trimmed.to_string(),
                                symbol: format!("{{{raw}}}"),
                            });
                        }
                        ManaSymbol::Unknown(raw) => diagnostics.push(Diagnostic::MalformedCostText {
                            text: trimmed.to_string(),
                            symbol: format!("{{{raw}}}"),
                        }),
                        ManaSymbol::Tap => diagnostics.push(Diagnostic::MalformedCostText {
                            text: trimmed.to_string(),
                            symbol: "{T}".to_string(),
                        }),
                        ManaSymbol::Untap => diagnostics.push(Diagnostic::MalformedCostText {
                            text: trimmed.to_string(),
                            symbol: "{Q}".to_string(),
                        }),
                    }
                    rest = next;
                }
                Err(_) => {
                    // Skip stray characters up to the next symbol
                    let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                    let skip = rest[first..].find('{').map(|i| i + first).unwrap_or(rest.len());
                    let junk = rest[..skip].trim();
                    if !junk.is_empty() {
                        diagnostics.push(Diagnostic::MalformedCostText {
                            text: trimmed.to_string(),
                            symbol: junk.to_string(),
                        });
                    }
                    rest = &rest[skip..];
                }
            }
        }

        (cost, diagnostics)
    }

    /// Forge shorthand: "2 R R", "1UB", "no cost"
    fn from_shorthand(s: &str) -> Self {
        let mut cost = ManaCost::new();
        let mut generic_str = String::new();

        for c in s.chars() {
            match c {
                '0'..='9' => generic_str.push(c),
                'X' => cost.x_count = cost.x_count.saturating_add(1),
                _ => {
                    if let Some(color) = Color::from_char(c).filter(|_| c.is_ascii_uppercase()) {
                        cost.add_pip(color);
                    }
                }
            }
        }

        if !generic_str.is_empty() {
            cost.generic = generic_str.parse().unwrap_or(u16::MAX);
        }

        cost
    }

    pub fn add_pip(&mut self, color: Color) {
        let slot = match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        };
        *slot = slot.saturating_add(1);
    }

    /// Required pips of one color
    pub fn pips(&self, color: Color) -> u16 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    /// Colored requirements in `Color::ALL` order
    pub fn colored(&self) -> [u16; 6] {
        Color::ALL.map(|c| self.pips(c))
    }

    /// Total colored pips (including `{C}`)
    pub fn colored_total(&self) -> u32 {
        Color::ALL.iter().map(|&c| u32::from(self.pips(c))).sum()
    }

    /// Total converted mana cost
    pub fn cmc(&self) -> u32 {
        u32::from(self.generic) + self.colored_total()
    }

    pub fn is_zero(&self) -> bool {
        self.cmc() == 0
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.x_count {
            write!(f, "{{X}}")?;
        }
        if self.generic > 0 || (self.cmc() == 0 && self.x_count == 0) {
            write!(f, "{{{}}}", self.generic)?;
        }
        for color in Color::ALL {
            for _ in 0..self.pips(color) {
                write!(f, "{{{color}}}")?;
            }
        }
        Ok(())
    }
}
