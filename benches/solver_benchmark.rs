//! Performance benchmarks for the mana solver
//!
//! Measures the three hot paths with Criterion.rs:
//!
//! 1. **Parse** - oracle text of the fixture cards to abilities
//! 2. **Pool** - battlefield snapshot to source pool
//! 3. **Solve** - greedy solves, and costs that fall through to the exhaustive search

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mtg_mana_rs::{
    core::CardMetadata,
    game::{build_pool, BattlefieldSnapshot, ManaSolver, Permanent, SolverOptions},
    loader::{parse_abilities, AbilityDatabase, CardLoader},
    logger::ManaLogger,
};
use std::path::PathBuf;

const ORACLES: &[(&str, &str, &str)] = &[
    ("Forest", "Basic Land Forest", ""),
    ("Taiga", "Land Mountain Forest", "({T}: Add {R} or {G}.)"),
    ("Sol Ring", "Artifact", "{T}: Add {C}{C}."),
    ("Birds of Paradise", "Creature Bird", "Flying\\n{T}: Add one mana of any color."),
    ("Mystic Gate", "Land", "{T}: Add {C}.\\n{W/U}, {T}: Add {W}{W}, {W}{U}, or {U}{U}."),
    ("Gaea's Cradle", "Legendary Land", "{T}: Add {G} for each creature you control."),
    ("Celestial Prism", "Artifact", "{2}, {T}: Add one mana of any color."),
    ("Jungle Shrine", "Land", "{T}: Add {R}, {G}, or {W}."),
];

fn database() -> AbilityDatabase {
    let logger = ManaLogger::silent();
    let mut db = AbilityDatabase::new();
    for &(name, type_line, oracle) in ORACLES {
        db.add_card(CardMetadata::from_type_line(name, type_line), oracle, &logger);
    }
    db
}

/// A mid-game battlefield: a dozen lands, rocks and dorks
fn battlefield() -> BattlefieldSnapshot {
    let mut permanents = Vec::new();
    let mut id = 0;
    for (name, copies) in [
        ("Forest", 3),
        ("Taiga", 2),
        ("Mystic Gate", 1),
        ("Jungle Shrine", 2),
        ("Gaea's Cradle", 1),
    ] {
        for _ in 0..copies {
            id += 1;
            permanents.push(Permanent::land(id, name));
        }
    }
    permanents.push(Permanent::artifact(id + 1, "Sol Ring"));
    permanents.push(Permanent::artifact(id + 2, "Celestial Prism"));
    permanents.push(Permanent::creature(id + 3, "Birds of Paradise", 0));
    BattlefieldSnapshot::new(permanents)
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(ORACLES.len() as u64));
    let metas: Vec<(CardMetadata, &str)> = ORACLES
        .iter()
        .map(|&(name, type_line, oracle)| (CardMetadata::from_type_line(name, type_line), oracle))
        .collect();

    group.bench_function("oracle_texts", |b| {
        b.iter(|| {
            for (meta, oracle) in &metas {
                black_box(parse_abilities(black_box(oracle), meta));
            }
        })
    });

    let fixtures = PathBuf::from("test_cards");
    if fixtures.exists() {
        group.bench_function("cardsfolder_fixtures", |b| {
            b.iter(|| AbilityDatabase::load_from_cardsfolder(&fixtures, &ManaLogger::silent()))
        });
    }

    if let Ok(def) = CardLoader::parse("Name:Mystic Gate\nTypes:Land\nOracle:{T}: Add {C}.\\n{W/U}, {T}: Add {W}{W}, {W}{U}, or {U}{U}.") {
        group.bench_function("card_file", |b| b.iter(|| black_box(def.mana_abilities())));
    }
    group.finish();
}

fn bench_pool(c: &mut Criterion) {
    let db = database();
    let snapshot = battlefield();

    c.benchmark_group("pool").bench_function("build", |b| {
        b.iter(|| black_box(build_pool(black_box(&snapshot), &db).len()))
    });
}

fn bench_solve(c: &mut Criterion) {
    let db = database();
    let snapshot = battlefield();
    let pool = build_pool(&snapshot, &db);
    let logger = ManaLogger::silent();

    let mut group = c.benchmark_group("solve");
    for cost in ["{G}", "{2}{R}{G}", "{3}{W}{U}{G}", "{X}{R}{R}{G}{G}", "{20}"] {
        for (label, options) in [
            ("greedy", SolverOptions {
                exhaustive_fallback: false,
                ..SolverOptions::default()
            }),
            ("fallback", SolverOptions::default()),
        ] {
            let solver = ManaSolver::new(options);
            group.bench_with_input(BenchmarkId::new(label, cost), &cost, |b, &cost| {
                b.iter(|| black_box(solver.solve(black_box(cost), &pool, &logger)))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_pool, bench_solve);
criterion_main!(benches);
