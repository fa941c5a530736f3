//! MTG Mana - Main Binary
//!
//! Parse Forge card files, inspect the source pool of a game snapshot, and
//! solve mana costs against it

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mtg_mana_rs::{
    core::PermanentId,
    game::{apply_allocation, GameSnapshot, ManaEngine, ManaSolver, SolverOptions, SourcePool, Yield},
    loader::{AbilityDatabase, CardEntry},
    logger::{ManaLogger, OutputFormat, VerbosityLevel},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Output format for results and log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable text
    Text,
    /// One JSON document on stdout, JSON log lines on stderr
    Json,
}

/// Verbosity level for log output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "mana")]
#[command(about = "MTG Mana - mana ability parser and cost solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level for log output (0=silent, 1=minimal, 2=normal, 3=verbose)
    #[arg(long, short = 'v', default_value = "normal", global = true)]
    verbosity: VerbosityArg,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: Format,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse card files (or cardsfolders) and print their mana abilities
    Parse {
        /// Card files (.txt) or directories of them
        #[arg(required = true, value_name = "PATHS")]
        paths: Vec<PathBuf>,
    },

    /// Print the potential source pool of a game snapshot
    Pool {
        /// Cardsfolder with the card definitions
        #[arg(long, value_name = "DIR")]
        cards: PathBuf,

        /// Game snapshot (.json)
        #[arg(long, value_name = "STATE_FILE")]
        state: PathBuf,
    },

    /// Decide which sources pay a cost
    Solve {
        /// Cardsfolder with the card definitions
        #[arg(long, value_name = "DIR")]
        cards: PathBuf,

        /// Game snapshot (.json)
        #[arg(long, value_name = "STATE_FILE")]
        state: PathBuf,

        /// Cost in bracketed notation, e.g. "{2}{U}{B}"
        #[arg(long)]
        cost: String,

        /// Only run the greedy pass
        #[arg(long)]
        no_fallback: bool,

        /// Node budget of the exhaustive search
        #[arg(long, default_value_t = SolverOptions::default().node_budget)]
        node_budget: usize,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut logger = ManaLogger::with_verbosity(cli.verbosity.into());
    if cli.format == Format::Json {
        logger.set_output_format(OutputFormat::Json);
    }

    match cli.command {
        Commands::Parse { paths } => run_parse(&paths, cli.format, &logger),
        Commands::Pool { cards, state } => run_pool(&cards, &state, cli.format, &logger),
        Commands::Solve {
            cards,
            state,
            cost,
            no_fallback,
            node_budget,
        } => {
            let options = SolverOptions {
                exhaustive_fallback: !no_fallback,
                node_budget,
            };
            run_solve(&cards, &state, &cost, options, cli.format, &logger)
        }
    }
}

fn load_database(path: &Path, logger: &ManaLogger) -> Result<AbilityDatabase> {
    let db = if path.is_dir() {
        AbilityDatabase::load_from_cardsfolder(path, logger)
    } else {
        AbilityDatabase::load_files(&[path.to_path_buf()], logger)
    };
    db.with_context(|| format!("loading cards from {}", path.display()))
}

fn load_snapshot(path: &Path) -> Result<GameSnapshot> {
    GameSnapshot::from_file(path).with_context(|| format!("reading snapshot {}", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_parse(paths: &[PathBuf], format: Format, logger: &ManaLogger) -> Result<ExitCode> {
    let mut cards: Vec<CardEntry> = Vec::new();
    for path in paths {
        let db = load_database(path, logger)?;
        cards.extend(db.names().into_iter().filter_map(|name| db.get(name)).cloned());
    }

    if format == Format::Json {
        print_json(&cards)?;
        return Ok(ExitCode::SUCCESS);
    }

    for card in &cards {
        println!("{}", card.metadata.name);
        if card.abilities.is_empty() {
            println!("  (no mana abilities)");
        }
        for ability in &card.abilities {
            let produces: Vec<String> = ability.produces.iter().map(|p| p.to_string()).collect();
            let label = if ability.is_implicit_basic_land {
                "implicit"
            } else {
                ability.text.as_str()
            };
            println!("  {label}  =>  {}", produces.join(" | "));
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct PoolRow<'a> {
    index: usize,
    permanent: PermanentId,
    name: &'a str,
    ability: &'a str,
    yields: &'a Yield,
    tax: u8,
    net: i16,
}

fn pool_rows<'p>(pool: &'p SourcePool<'_>) -> Vec<PoolRow<'p>> {
    pool.sources()
        .iter()
        .enumerate()
        .map(|(index, source)| PoolRow {
            index,
            permanent: source.permanent.id,
            name: source.permanent.name.as_str(),
            ability: source.ability.text.as_str(),
            yields: &source.produces,
            tax: source.tax,
            net: source.net_contribution(),
        })
        .collect()
}

fn run_pool(cards: &Path, state: &Path, format: Format, logger: &ManaLogger) -> Result<ExitCode> {
    let db = load_database(cards, logger)?;
    let snapshot = load_snapshot(state)?;
    let pool = ManaEngine::new(&db)
        .build_pool(&snapshot.battlefield, logger)
        .with_demand(snapshot.demand());

    let rows = pool_rows(&pool);
    let capacity = pool.preview_capacity();

    if format == Format::Json {
        print_json(&serde_json::json!({ "sources": rows, "capacity": capacity }))?;
        return Ok(ExitCode::SUCCESS);
    }

    for row in &rows {
        println!(
            "[{}] {} {}  =>  {} (tax {}, net {})",
            row.index, row.permanent, row.name, row.yields, row.tax, row.net
        );
    }
    println!(
        "capacity: W{} U{} B{} R{} G{} C{} (total {})",
        capacity.white,
        capacity.blue,
        capacity.black,
        capacity.red,
        capacity.green,
        capacity.colorless,
        capacity.total()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_solve(
    cards: &Path,
    state: &Path,
    cost: &str,
    options: SolverOptions,
    format: Format,
    logger: &ManaLogger,
) -> Result<ExitCode> {
    let db = load_database(cards, logger)?;
    let snapshot = load_snapshot(state)?;
    let pool = ManaEngine::new(&db)
        .build_pool(&snapshot.battlefield, logger)
        .with_demand(snapshot.demand());

    let allocation = ManaSolver::new(options).solve(cost, &pool, logger);
    let steps = allocation
        .as_ref()
        .map(|a| apply_allocation(a, &pool))
        .unwrap_or_default();

    if format == Format::Json {
        print_json(&serde_json::json!({
            "cost": cost,
            "payable": allocation.is_some(),
            "allocation": allocation,
            "steps": steps,
        }))?;
    } else if allocation.is_some() {
        println!("{cost}: payable");
        for step in &steps {
            let mut actions = Vec::new();
            if step.tap {
                actions.push("tap".to_string());
            }
            if step.untap {
                actions.push("untap".to_string());
            }
            if step.mana_paid > 0 {
                actions.push(format!("pay {}", step.mana_paid));
            }
            if step.life > 0 {
                actions.push(format!("pay {} life", step.life));
            }
            if let Some(what) = &step.sacrifice_other {
                actions.push(format!("sacrifice {what}"));
            }
            if step.sacrifice_self {
                actions.push("sacrifice it".to_string());
            }
            let produced: String = step.produced.iter().map(|c| format!("{{{c}}}")).collect();
            println!("  {} {}: {}  =>  {produced}", step.permanent, step.name, actions.join(", "));
        }
    } else {
        println!("{cost}: not payable");
    }

    Ok(if allocation.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
