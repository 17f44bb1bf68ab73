//! Error types for the points ledger.

use crate::lot::Points;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while operating the ledger.
///
/// Every ledger rejection leaves the ledger untouched. Broken internal
/// invariants are not represented here; they panic.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A withdrawal would drive the payer's balance below zero
    #[error("Insufficient balance for payer {payer}: balance {balance}, requested change {points}")]
    InsufficientBalance {
        payer: String,
        balance: Points,
        points: Points,
    },

    /// A spend exceeds the unspent points across all payers
    #[error("Insufficient total balance: requested {requested}, available {available}")]
    InsufficientTotalBalance { requested: u64, available: i128 },

    /// Payer identifier is empty
    #[error("Payer identifier must not be empty")]
    EmptyPayer,

    /// Payer balance would not fit in the point type
    #[error("Points overflow for payer {payer}")]
    PointsOverflow { payer: String },

    /// Snapshot does not describe a consistent ledger
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A previous holder of the shared ledger panicked
    #[error("Shared ledger lock poisoned")]
    LockPoisoned,

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid event record
    #[error("Invalid event at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing input file argument
    #[error("Missing input file argument. Usage: points-ledger <events.csv>")]
    MissingArgument,
}
