//! Cost solver properties
//!
//! The concrete scenarios, plus structural checks (no double use,
//! colored-before-generic, net-positive generic sources, determinism) and a
//! soundness cross-check against brute force on small seeded random pools.

use mtg_mana_rs::core::{CardMetadata, Color, ManaCost};
use mtg_mana_rs::game::{
    build_pool, choose_color, solve, Allocation, BattlefieldSnapshot, DemandProfile, ManaSolver, PaymentPhase,
    Permanent, SolverOptions, SourcePool, Yield,
};
use mtg_mana_rs::loader::AbilityDatabase;
use mtg_mana_rs::logger::ManaLogger;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use similar_asserts::assert_eq;

fn database(cards: &[(&str, &str, &str)]) -> AbilityDatabase {
    let logger = ManaLogger::silent();
    let mut db = AbilityDatabase::new();
    for &(name, type_line, oracle) in cards {
        db.add_card(CardMetadata::from_type_line(name, type_line), oracle, &logger);
    }
    db
}

/// Check every structural property of an allocation
fn assert_valid(cost: &ManaCost, pool: &SourcePool<'_>, allocation: &Allocation) {
    let sources = pool.sources();

    // No double use and no conflicting activations
    for (i, a) in allocation.entries.iter().enumerate() {
        for b in &allocation.entries[i + 1..] {
            assert_ne!(a.source_index, b.source_index, "source used twice");
            assert!(
                !sources[a.source_index].conflicts_with(&sources[b.source_index]),
                "conflicting sources {} and {}",
                a.source_index,
                b.source_index
            );
        }
    }

    // Colored entries come first
    let first_generic = allocation
        .entries
        .iter()
        .position(|e| e.phase == PaymentPhase::Generic)
        .unwrap_or(allocation.entries.len());
    assert!(allocation.entries[first_generic..]
        .iter()
        .all(|e| e.phase == PaymentPhase::Generic));

    let mut outstanding = cost.colored();
    let mut produced = 0i32;
    let mut tax = 0i32;
    for entry in &allocation.entries {
        let source = &sources[entry.source_index];
        assert_eq!(entry.chosen_colors.len(), source.quantity() as usize);
        assert_eq!(entry.net_contribution, source.net_contribution());
        match &source.produces {
            Yield::Fixed(colors) => assert_eq!(entry.chosen_colors.as_slice(), colors.as_slice()),
            Yield::Choice { options, .. } => {
                assert!(entry.chosen_colors.iter().all(|&c| c == entry.chosen_colors[0]));
                assert!(entry.chosen_colors.iter().all(|&c| options.contains(c)));
            }
            Yield::Combination { palette, .. } => {
                assert!(entry.chosen_colors.iter().all(|&c| palette.contains(c)));
            }
        }

        match entry.phase {
            PaymentPhase::Colored => {
                assert!(
                    entry.chosen_colors.iter().any(|c| outstanding[c.index()] > 0),
                    "colored entry {} pays no outstanding pip",
                    entry.source_index
                );
            }
            PaymentPhase::Generic => assert!(entry.net_contribution > 0),
        }

        for c in &entry.chosen_colors {
            outstanding[c.index()] = outstanding[c.index()].saturating_sub(1);
        }
        produced += entry.chosen_colors.len() as i32;
        tax += i32::from(source.tax);
    }

    assert!(outstanding.iter().all(|&n| n == 0), "pips left unpaid");
    assert!(i64::from(produced - tax) >= i64::from(cost.cmc()), "not enough mana");
}

/// Exhaustive feasibility over every subset and every color choice
fn brute_force(cost: &ManaCost, pool: &SourcePool<'_>) -> bool {
    let sources = pool.sources();
    let n = sources.len();
    let pips = cost.colored();

    for mask in 0u32..(1 << n) {
        let chosen: Vec<usize> = (0..n).filter(|i| mask & (1 << i) != 0).collect();
        let conflict = chosen
            .iter()
            .enumerate()
            .any(|(k, &a)| chosen[k + 1..].iter().any(|&b| sources[a].conflicts_with(&sources[b])));
        if conflict {
            continue;
        }
        let net: i32 = chosen.iter().map(|&i| i32::from(sources[i].net_contribution())).sum();
        if i64::from(net) < i64::from(cost.cmc()) {
            continue;
        }

        let mut units: Vec<(Vec<Color>, u8)> = Vec::new();
        let mut need = pips;
        for &i in &chosen {
            match &sources[i].produces {
                Yield::Fixed(colors) => {
                    for c in colors {
                        need[c.index()] = need[c.index()].saturating_sub(1);
                    }
                }
                Yield::Choice { options, amount } => units.push((options.to_vec(), *amount)),
                Yield::Combination { palette, amount } => {
                    for _ in 0..*amount {
                        units.push((palette.to_vec(), 1));
                    }
                }
            }
        }
        if covers(&units, need) {
            return true;
        }
    }
    false
}

fn covers(units: &[(Vec<Color>, u8)], need: [u16; 6]) -> bool {
    if need.iter().all(|&n| n == 0) {
        return true;
    }
    let Some(((options, amount), rest)) = units.split_first() else {
        return false;
    };
    options.iter().any(|c| {
        let mut next = need;
        next[c.index()] = next[c.index()].saturating_sub(u16::from(*amount));
        covers(rest, next)
    })
}

const CARD_TEMPLATES: &[(&str, &str)] = &[
    ("Land", "{T}: Add {W}."),
    ("Land", "{T}: Add {U}."),
    ("Land", "{T}: Add {B}."),
    ("Land", "{T}: Add {R}."),
    ("Land", "{T}: Add {G}."),
    ("Land", "{T}: Add {C}."),
    ("Land", "{T}: Add {U} or {B}."),
    ("Land", "{T}: Add {R}, {G}, or {W}."),
    ("Land Mountain Forest", ""),
    ("Land", "{T}: Add {C}.\\n{W/U}, {T}: Add {W}{W}, {W}{U}, or {U}{U}."),
    ("Land", "{T}: Add {W}.\\n{T}: Add {G}."),
    ("Artifact", "{T}: Add {C}{C}."),
    ("Artifact", "{1}, {T}: Add {C}{C}."),
    ("Artifact", "{2}, {T}: Add one mana of any color."),
    ("Artifact", "{T}: Add one mana of any color."),
    ("Artifact", "{T}: Add two mana in any combination of {R} and/or {G}."),
    ("Artifact", "{T}, Sacrifice this artifact: Add three mana of any one color."),
];

/// A random database and battlefield of up to five permanents
fn random_case(rng: &mut ChaCha8Rng) -> (AbilityDatabase, BattlefieldSnapshot) {
    let logger = ManaLogger::silent();
    let mut db = AbilityDatabase::new();
    let mut permanents = Vec::new();
    let count = rng.gen_range(0..=5);
    for id in 0..count {
        let (type_line, oracle) = CARD_TEMPLATES[rng.gen_range(0..CARD_TEMPLATES.len())];
        let name = format!("Card {id}");
        db.add_card(CardMetadata::from_type_line(name.as_str(), type_line), oracle, &logger);
        let permanent = if type_line.starts_with("Artifact") {
            Permanent::artifact(id, name)
        } else {
            Permanent::land(id, name)
        };
        permanents.push(permanent);
    }
    (db, BattlefieldSnapshot::new(permanents))
}

fn random_cost(rng: &mut ChaCha8Rng) -> String {
    let mut text = String::new();
    let generic = rng.gen_range(0..=4);
    if generic > 0 {
        text.push_str(&format!("{{{generic}}}"));
    }
    for _ in 0..rng.gen_range(0..=3) {
        let color = Color::ALL[rng.gen_range(0..Color::ALL.len())];
        text.push_str(&format!("{{{color}}}"));
    }
    if text.is_empty() {
        text.push_str("{0}");
    }
    text
}

#[test]
fn test_forest_pays_green() {
    let db = database(&[("Forest", "Basic Land Forest", "")]);
    let snapshot = BattlefieldSnapshot::new(vec![Permanent::land(1, "Forest")]);
    let pool = build_pool(&snapshot, &db);

    let allocation = solve("{G}", &pool).unwrap();
    assert_eq!(allocation.entries.len(), 1);
    assert_eq!(allocation.entries[0].source_index, 0);
    assert_eq!(allocation.entries[0].chosen_colors.as_slice(), &[Color::Green]);
    assert_valid(&ManaCost::from_string("{G}"), &pool, &allocation);
}

#[test]
fn test_taxed_rock_pays_generic_alone() {
    let db = database(&[("Worn Powerstone", "Artifact", "{1}, {T}: Add {C}{C}.")]);
    let snapshot = BattlefieldSnapshot::new(vec![Permanent::artifact(1, "Worn Powerstone")]);
    let pool = build_pool(&snapshot, &db);

    let allocation = solve("{1}", &pool).unwrap();
    assert_eq!(allocation.entries.len(), 1);
    assert_valid(&ManaCost::from_string("{1}"), &pool, &allocation);
}

#[test]
fn test_demand_picks_the_needed_color() {
    let db = database(&[("Watery Grave Copy", "Land", "{T}: Add {U} or {B}.")]);
    let snapshot = BattlefieldSnapshot::new(vec![Permanent::land(1, "Watery Grave Copy")]);
    let demand = DemandProfile::from_costs(&[ManaCost::from_string("{B}{B}")], None);

    assert_eq!(choose_color(&[Color::Blue, Color::Black], &demand), Some(Color::Black));

    let pool = build_pool(&snapshot, &db).with_demand(demand);
    let capacity = pool.preview_capacity();
    assert_eq!(capacity.black, 1);
    assert_eq!(capacity.blue, 0);
}

#[test]
fn test_empty_pool_pays_nothing() {
    let db = AbilityDatabase::new();
    let snapshot = BattlefieldSnapshot::default();
    let pool = build_pool(&snapshot, &db);
    assert!(solve("{1}", &pool).is_none());
}

#[test]
fn test_solve_is_deterministic() {
    let db = database(&[
        ("Forest", "Basic Land Forest", ""),
        ("Birds of Paradise", "Creature Bird", "{T}: Add one mana of any color."),
        ("Sol Ring", "Artifact", "{T}: Add {C}{C}."),
        ("Mana Confluence", "Land", "{T}, Pay 1 life: Add one mana of any color."),
    ]);
    let snapshot = BattlefieldSnapshot::new(vec![
        Permanent::land(1, "Forest"),
        Permanent::creature(2, "Birds of Paradise", 0),
        Permanent::artifact(3, "Sol Ring"),
        Permanent::land(4, "Mana Confluence"),
    ]);
    let pool = build_pool(&snapshot, &db);

    let first = solve("{2}{G}{U}", &pool).unwrap();
    for _ in 0..5 {
        assert_eq!(solve("{2}{G}{U}", &pool).unwrap(), first);
    }
    assert_valid(&ManaCost::from_string("{2}{G}{U}"), &pool, &first);
}

#[test]
fn test_failure_is_total() {
    let db = database(&[("Forest", "Basic Land Forest", "")]);
    let snapshot = BattlefieldSnapshot::new(vec![Permanent::land(1, "Forest"), Permanent::land(2, "Forest")]);
    let pool = build_pool(&snapshot, &db);
    assert!(solve("{1}{G}{G}", &pool).is_none());
    assert!(solve("{U}", &pool).is_none());
    assert!(solve("{W/U}{W/U}{W/U}", &pool).is_none());
}

#[test]
fn test_oversized_costs_are_never_payable() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x4249_4721);
    for _ in 0..50 {
        let (db, snapshot) = random_case(&mut rng);
        let pool = build_pool(&snapshot, &db);
        for cost_text in ["{256}", "{300}", "{255}{G}", "{65535}{W}{U}{B}{R}{G}{C}", "{4294967296}"] {
            assert!(solve(cost_text, &pool).is_none(), "{cost_text} paid by {} sources", pool.len());
        }
    }
}

#[test]
fn test_solver_matches_brute_force_on_random_pools() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x4d41_4e41);
    let solver = ManaSolver::new(SolverOptions::default());
    let logger = ManaLogger::silent();

    for case in 0..400 {
        let (db, snapshot) = random_case(&mut rng);
        let pool = build_pool(&snapshot, &db);
        let cost_text = random_cost(&mut rng);
        let cost = ManaCost::from_string(&cost_text);

        let result = solver.solve(&cost_text, &pool, &logger);
        let feasible = brute_force(&cost, &pool);
        assert_eq!(
            result.is_some(),
            feasible,
            "case {case}: {cost_text} against {} sources",
            pool.len()
        );
        if let Some(allocation) = result {
            assert_valid(&cost, &pool, &allocation);
        }
    }
}

#[test]
fn test_greedy_only_never_overclaims() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let solver = ManaSolver::new(SolverOptions {
        exhaustive_fallback: false,
        ..SolverOptions::default()
    });
    let logger = ManaLogger::silent();

    for _ in 0..200 {
        let (db, snapshot) = random_case(&mut rng);
        let pool = build_pool(&snapshot, &db);
        let cost_text = random_cost(&mut rng);
        let cost = ManaCost::from_string(&cost_text);

        if let Some(allocation) = solver.solve(&cost_text, &pool, &logger) {
            assert!(brute_force(&cost, &pool));
            assert_valid(&cost, &pool, &allocation);
        }
    }
}
