//! Error types for the mana engine
//!
//! Fatal problems (bad card files, IO, unreadable snapshots) are `MtgError`s.
//! Everything the core can recover from locally is a `Diagnostic`: it is
//! reported through the logger and never aborts a parse or a solve.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtgError {
    #[error("Invalid card format: {0}")]
    InvalidCardFormat(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MtgError>;

/// Non-fatal conditions surfaced while parsing text or solving costs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A line mentions "add" but matches none of the recognized phrasings
    #[error("unrecognized mana ability on {card}: {line}")]
    UnrecognizedAbilityText { card: String, line: String },

    /// A variable amount whose phrasing is not in the X table (resolves to 1)
    #[error("unrecognized X amount on {card}, defaulting to 1: {line}")]
    UnrecognizedVariableAmount { card: String, line: String },

    /// Cost text outside the recognized alphabet; `symbol` is the offending
    /// fragment, braced when it was a `{...}` symbol
    #[error("malformed cost text {symbol} in {text}")]
    MalformedCostText { text: String, symbol: String },

    /// A restricted choice with nothing left to choose from
    #[error("{card} produces no mana without a commander color identity")]
    EmptyColorIdentity { card: String },

    /// The exhaustive resolver ran out of search budget
    #[error("search budget of {budget} nodes exhausted for {cost}")]
    SearchBudgetExhausted { cost: String, budget: usize },
}

impl Diagnostic {
    /// Logger category for this diagnostic
    pub fn category(&self) -> &'static str {
        match self {
            Diagnostic::UnrecognizedAbilityText { .. }
            | Diagnostic::UnrecognizedVariableAmount { .. } => "parser",
            Diagnostic::MalformedCostText { .. } => "cost",
            Diagnostic::EmptyColorIdentity { .. } => "pool",
            Diagnostic::SearchBudgetExhausted { .. } => "solver",
        }
    }
}
