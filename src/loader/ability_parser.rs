//! Oracle text to structured mana abilities
//!
//! Recognizes a fixed set of phrasings and drops everything else. A line is a
//! candidate when it has a `cost: effect` separator and the effect says "add".
//! Each "add" clause of the effect is run through the recognizers below, first
//! match wins:
//!
//! 1. variable amounts ("for each", "equal to", "X mana")
//! 2. fixed amount of a chosen color ("two mana of any one color",
//!    "two mana in any combination of {R} and/or {G}")
//! 3. choice of one ("one mana of any color", "{U} or {B}")
//! 4. literal symbols ("{C}{C}", "{2}")
//!
//! Two or more recognized alternatives make the ability modal.

use crate::core::{
    mana::{mana_symbol, ManaSymbol},
    ActivationCost, CardMetadata, Color, ColorSet, Cost, ManaAbility, ProductionDescriptor, XRule,
};
use crate::error::Diagnostic;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{map_res, value},
    multi::{many1, separated_list1},
    sequence::terminated,
    IResult,
};
use smallvec::SmallVec;

/// Parse every mana ability of a card, dropping diagnostics
pub fn parse_abilities(text: &str, meta: &CardMetadata) -> Vec<ManaAbility> {
    parse_abilities_with_diagnostics(text, meta).0
}

/// Parse every mana ability of a card
///
/// Pure: the same text and metadata always give the same abilities and the
/// same diagnostics, in the same order.
pub fn parse_abilities_with_diagnostics(
    text: &str,
    meta: &CardMetadata,
) -> (Vec<ManaAbility>, Vec<Diagnostic>) {
    let mut parser = AbilityParser::new(meta);
    let abilities = parser.parse(text);
    (abilities, parser.diagnostics)
}

struct AbilityParser<'a> {
    meta: &'a CardMetadata,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> AbilityParser<'a> {
    fn new(meta: &'a CardMetadata) -> Self {
        AbilityParser {
            meta,
            diagnostics: Vec::new(),
        }
    }

    fn parse(&mut self, text: &str) -> Vec<ManaAbility> {
        // Loyalty abilities are never mana abilities
        if self.meta.has_loyalty_abilities() {
            return Vec::new();
        }

        let mut abilities = Vec::new();
        for line in split_lines(text) {
            if let Some(ability) = self.parse_line(&line) {
                abilities.push(ability);
            }
        }

        if abilities.is_empty() {
            abilities = self.implicit_basic_land_abilities();
        }

        abilities
    }

    fn parse_line(&mut self, line: &str) -> Option<ManaAbility> {
        let (cost_text, effect_text) = line.split_once(':')?;
        let effect = effect_text.to_lowercase();
        let clause_starts = add_positions(&effect);
        if clause_starts.is_empty() {
            return None;
        }

        if line.to_lowercase().contains("target") {
            return None;
        }

        let activation_cost = Cost::parse_list(cost_text, self.meta.name.as_str());
        if activation_cost.requires_sacrifice() && effect.contains("search") {
            return None;
        }

        let mut produces = Vec::new();
        for (i, &start) in clause_starts.iter().enumerate() {
            let end = clause_starts.get(i + 1).copied().unwrap_or(effect.len());
            let clause = clause_body(&effect[start + "add".len()..end]);
            if let Some(descriptors) = self.recognize_clause(clause, line) {
                produces.extend(descriptors);
            }
        }

        if produces.is_empty() {
            self.diagnostics.push(Diagnostic::UnrecognizedAbilityText {
                card: self.meta.name.to_string(),
                line: line.to_string(),
            });
            return None;
        }

        Some(ManaAbility {
            activation_cost,
            is_modal: produces.len() > 1,
            produces,
            is_implicit_basic_land: false,
            text: line.to_string(),
        })
    }

    /// Run one "add" clause through the recognizers
    ///
    /// More than one descriptor means the clause lists alternatives.
    fn recognize_clause(&mut self, clause: &str, line: &str) -> Option<Vec<ProductionDescriptor>> {
        if clause.is_empty() {
            return None;
        }
        if let Some(descriptor) = self.variable_amount(clause, line) {
            return Some(vec![descriptor]);
        }
        if let Some(descriptor) = fixed_amount_choice(clause) {
            return Some(vec![descriptor]);
        }
        if let Some(descriptors) = choice_of_one(clause) {
            return Some(descriptors);
        }
        simple_fixed(clause).map(|d| vec![d])
    }

    fn variable_amount(&mut self, clause: &str, line: &str) -> Option<ProductionDescriptor> {
        let triggered = clause.starts_with("x ")
            || clause.contains("for each")
            || clause.contains("where x is")
            || (clause.contains("amount of") && clause.contains("equal to"));
        if !triggered {
            return None;
        }

        let (what, formula) = ["for each", "equal to", "where x is"]
            .iter()
            .filter_map(|phrase| clause.find(phrase).map(|i| (i, phrase.len())))
            .min()
            .map(|(i, len)| (&clause[..i], &clause[i + len..]))
            .unwrap_or((clause, ""));

        let rule = x_rule(formula);
        if rule == XRule::Unrecognized {
            self.diagnostics.push(Diagnostic::UnrecognizedVariableAmount {
                card: self.meta.name.to_string(),
                line: line.to_string(),
            });
        }

        let symbols: ColorSet = symbol_colors(what).into_iter().collect();
        let options = if !symbols.is_empty() {
            symbols
        } else if what.contains("any one color")
            || what.contains("any color")
            || what.contains("that color")
            || what.contains("combination of colors")
        {
            ColorSet::five_colors()
        } else {
            ColorSet::single(Color::Colorless)
        };

        Some(ProductionDescriptor::Variable { rule, options })
    }

    /// One implicit tap ability per basic land type on the type line
    fn implicit_basic_land_abilities(&self) -> Vec<ManaAbility> {
        let mut seen = ColorSet::empty();
        let mut abilities = Vec::new();
        for subtype in self.meta.basic_land_types() {
            if let Some(color) = Color::from_basic_land_type(subtype.as_str()) {
                if !seen.contains(color) {
                    seen.insert(color);
                    abilities.push(ManaAbility::basic_land(color));
                }
            }
        }
        abilities
    }
}

/// Split card text into logical lines
///
/// Accepts real newlines and the literal `\n` used by card files. Reminder
/// text is removed, and bullet lines of a "Choose one" ability are joined back
/// onto the line that introduces them.
fn split_lines(text: &str) -> Vec<String> {
    let text = strip_reminder_text(&text.replace("\\n", "\n"));
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let is_bullet = line.starts_with('•') || line.starts_with('*');
        match lines.last_mut() {
            Some(prev) if is_bullet => {
                prev.push(' ');
                prev.push_str(line);
            }
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

fn strip_reminder_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Byte offsets of every whole word "add" in lowercased effect text
fn add_positions(effect: &str) -> Vec<usize> {
    let bytes = effect.as_bytes();
    effect
        .match_indices("add")
        .map(|(i, _)| i)
        .filter(|&i| {
            let before = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
            let after = bytes.get(i + 3).map_or(true, |b| !b.is_ascii_alphanumeric());
            before && after
        })
        .collect()
}

/// The production part of a clause: first sentence, without trailing filler
fn clause_body(raw: &str) -> &str {
    let sentence = raw.split('.').next().unwrap_or("");
    let sentence = sentence.trim().trim_end_matches(|c: char| c == ',' || c == '•');
    sentence
        .strip_suffix("to your mana pool")
        .unwrap_or(sentence)
        .trim()
}

fn x_rule(formula: &str) -> XRule {
    if formula.contains("greatest power") {
        XRule::GreatestPower
    } else if formula.contains("sacrificed") {
        if formula.contains("mana value") || formula.contains("converted mana cost") {
            XRule::SacrificedManaValue
        } else {
            XRule::Unrecognized
        }
    } else if formula.contains("power") {
        XRule::SourcePower
    } else if formula.contains("creature") {
        XRule::CreatureCount
    } else if formula.contains("artifact") {
        XRule::ArtifactCount
    } else {
        XRule::Unrecognized
    }
}

fn number_word(input: &str) -> IResult<&str, u8> {
    alt((
        map_res(digit1, |d: &str| d.parse::<u8>()),
        value(1, tag("one")),
        value(2, tag("two")),
        value(3, tag("three")),
        value(4, tag("four")),
        value(5, tag("five")),
        value(6, tag("six")),
        value(7, tag("seven")),
        value(8, tag("eight")),
        value(9, tag("nine")),
        value(10, tag("ten")),
    ))(input)
}

/// "two mana of any one color", "three mana in any combination of colors"
fn fixed_amount_choice(clause: &str) -> Option<ProductionDescriptor> {
    let (rest, amount) = terminated(number_word, tag(" mana "))(clause).ok()?;

    if let Some(palette_text) = rest.strip_prefix("in any combination of ") {
        let palette: SmallVec<[Color; 6]> = if palette_text.starts_with("colors") {
            Color::WUBRG.into_iter().collect()
        } else {
            symbol_colors(palette_text).into_iter().collect()
        };
        if palette.is_empty() || amount == 0 {
            return None;
        }
        return Some(ProductionDescriptor::Combination { palette, amount });
    }

    if amount < 2 {
        return None;
    }
    if rest.starts_with("of any one color") {
        Some(ProductionDescriptor::choice(ColorSet::five_colors(), amount))
    } else if rest.starts_with("of any color") {
        Some(ProductionDescriptor::Combination {
            palette: Color::WUBRG.into_iter().collect(),
            amount,
        })
    } else {
        None
    }
}

fn or_separator(input: &str) -> IResult<&str, &str> {
    alt((tag(", or "), tag(" or "), tag(", ")))(input)
}

fn symbol_alternatives(input: &str) -> IResult<&str, Vec<Vec<ManaSymbol>>> {
    separated_list1(or_separator, many1(mana_symbol))(input)
}

/// "one mana of any color", "{U} or {B}", "{W}{W}, {W}{U}, or {U}{U}"
fn choice_of_one(clause: &str) -> Option<Vec<ProductionDescriptor>> {
    if let Some(rest) = clause.strip_prefix("one mana of any ") {
        if rest.starts_with("color") || rest.starts_with("one color") {
            let commander_identity = rest.contains("commander") && rest.contains("color identity");
            return Some(vec![ProductionDescriptor::Choice {
                options: ColorSet::five_colors(),
                amount: 1,
                commander_identity,
            }]);
        }
        return None;
    }

    let (rest, groups) = symbol_alternatives(clause).ok()?;
    if groups.len() < 2 || !rest.trim().is_empty() {
        return None;
    }

    let groups: Vec<SmallVec<[Color; 4]>> = groups
        .iter()
        .map(|g| symbols_to_colors(g))
        .collect::<Option<_>>()?;

    if groups.iter().all(|g| g.len() == 1) {
        let options = groups.iter().map(|g| g[0]).collect();
        Some(vec![ProductionDescriptor::choice(options, 1)])
    } else {
        // Filter-style alternatives: each group is produced as a whole
        Some(
            groups
                .into_iter()
                .map(|colors| ProductionDescriptor::Fixed { colors })
                .collect(),
        )
    }
}

/// "{C}{C}{C}", "{G}", "{2}"
fn simple_fixed(clause: &str) -> Option<ProductionDescriptor> {
    let (rest, symbols) = many1(mana_symbol)(clause).ok()?;
    if !rest.trim().is_empty() {
        return None;
    }
    let colors = symbols_to_colors(&symbols)?;
    if colors.is_empty() {
        return None;
    }
    Some(ProductionDescriptor::Fixed { colors })
}

/// Literal production symbols; `{n}` is n colorless
fn symbols_to_colors(symbols: &[ManaSymbol]) -> Option<SmallVec<[Color; 4]>> {
    let mut colors = SmallVec::new();
    for symbol in symbols {
        match symbol {
            ManaSymbol::Colored(color) => colors.push(*color),
            ManaSymbol::Generic(n) => colors.extend(std::iter::repeat(Color::Colorless).take(usize::from(*n))),
            _ => return None,
        }
        // Yields are counted in u8
        if colors.len() > usize::from(u8::MAX) {
            return None;
        }
    }
    Some(colors)
}

/// Every colored symbol mentioned in a text fragment, deduplicated in order
fn symbol_colors(text: &str) -> Vec<Color> {
    let mut colors = Vec::new();
    let mut rest = text;
    while let Some(i) = rest.find('{') {
        match mana_symbol(&rest[i..]) {
            Ok((next, ManaSymbol::Colored(color))) => {
                if !colors.contains(&color) {
                    colors.push(color);
                }
                rest = next;
            }
            Ok((next, _)) => rest = next,
            Err(_) => rest = &rest[i + 1..],
        }
    }
    colors
}
