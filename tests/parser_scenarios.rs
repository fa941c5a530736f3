//! Ability parser end-to-end tests
//!
//! Tests are automatically generated for each card file in `test_cards/`
//! using the `dir-test` procedural macro. Each fixture states what it should
//! parse to in `# expect-...` comment lines, which the card loader skips.

use dir_test::{dir_test, Fixture};
use mtg_mana_rs::core::{CardMetadata, Color, ColorSet, ProductionDescriptor};
use mtg_mana_rs::loader::{parse_abilities, parse_abilities_with_diagnostics, CardLoader};
use similar_asserts::assert_eq;

fn expectation<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        line.strip_prefix('#')
            .map(str::trim)
            .and_then(|rest| rest.strip_prefix(key))
            .and_then(|rest| rest.strip_prefix(':'))
            .map(str::trim)
    })
}

/// Parse every fixture card and compare against its stated expectations
#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/test_cards",
    glob: "**/*.txt",
)]
fn test_fixture_card(fixture: Fixture<&str>) {
    let content = fixture.content();
    let def = CardLoader::parse(content).unwrap();
    let (abilities, _) = def.mana_abilities();

    let expected_count: usize = expectation(content, "expect-abilities")
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("{} has no expect-abilities line", fixture.path()));
    assert_eq!(abilities.len(), expected_count, "ability count of {}", def.name);

    let expected_colors: ColorSet = expectation(content, "expect-colors")
        .unwrap_or("")
        .chars()
        .filter_map(Color::from_char)
        .collect();
    let colors = abilities
        .iter()
        .fold(ColorSet::empty(), |acc, a| acc.union(a.colors()));
    assert_eq!(colors, expected_colors, "colors of {}", def.name);

    // Parsing is a pure function of the text
    let (again, _) = def.mana_abilities();
    assert_eq!(abilities, again);
}

#[test]
fn test_three_colorless_is_one_fixed_ability() {
    let meta = CardMetadata::from_type_line("Basalt Monolith", "Artifact");
    let abilities = parse_abilities("{T}: Add {C}{C}{C}.", &meta);

    assert_eq!(abilities.len(), 1);
    assert_eq!(abilities[0].produces.len(), 1);
    assert_eq!(
        abilities[0].produces[0],
        ProductionDescriptor::fixed([Color::Colorless, Color::Colorless, Color::Colorless])
    );
    assert!(abilities[0].requires_tap());
    assert_eq!(abilities[0].mana_tax(), 0);
}

#[test]
fn test_spend_restriction_is_not_modeled() {
    let meta = CardMetadata::from_type_line("Pyromancer's Goggles Copy", "Legendary Artifact");
    let (abilities, diagnostics) = parse_abilities_with_diagnostics(
        "{T}: Add one mana of any color. Spend this mana only to cast instant spells.",
        &meta,
    );

    assert!(diagnostics.is_empty());
    assert_eq!(abilities.len(), 1);
    assert_eq!(
        abilities[0].produces,
        vec![ProductionDescriptor::choice(ColorSet::five_colors(), 1)]
    );
}

#[test]
fn test_parse_is_idempotent_across_cards() {
    let cases = [
        ("Forest", "Basic Land Forest", ""),
        ("Mystic Gate", "Land", "{T}: Add {C}.\\n{W/U}, {T}: Add {W}{W}, {W}{U}, or {U}{U}."),
        ("Gaea's Cradle", "Legendary Land", "{T}: Add {G} for each creature you control."),
        ("Cabal Coffers", "Land", "{2}, {T}: Add {B} for each Swamp you control."),
        ("Grim Tutor", "Sorcery", "Search your library for a card."),
    ];

    for (name, type_line, oracle) in cases {
        let meta = CardMetadata::from_type_line(name, type_line);
        let first = parse_abilities_with_diagnostics(oracle, &meta);
        let second = parse_abilities_with_diagnostics(oracle, &meta);
        assert_eq!(first, second, "{name}");
    }
}

#[test]
fn test_unrecognized_amount_still_yields_ability() {
    let meta = CardMetadata::from_type_line("Cabal Coffers", "Land");
    let (abilities, diagnostics) =
        parse_abilities_with_diagnostics("{2}, {T}: Add {B} for each Swamp you control.", &meta);

    assert_eq!(abilities.len(), 1);
    assert_eq!(abilities[0].mana_tax(), 2);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].category(), "parser");
}
