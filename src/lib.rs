//! # Points Ledger
//!
//! Tracks one user's rewards points across many payers. Points are kept as
//! lots, one per accrual, and every withdrawal or spend consumes the oldest
//! lots first.
//!
//! ## Design Principles
//!
//! - **Oldest first**: Lots are ordered by event timestamp, not arrival order
//! - **Atomic rejections**: Failed operations leave the ledger untouched
//! - **Strict invariants**: Each payer's balance equals the sum of its lot
//!   remainders and is never negative
//! - **Storage agnostic**: State checkpoints through [`LedgerSnapshot`] with
//!   any serde format
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use points_ledger::Ledger;
//!
//! let mut ledger = Ledger::new();
//! let t1 = Utc.with_ymd_and_hms(2020, 10, 31, 10, 0, 0).unwrap();
//! let t2 = Utc.with_ymd_and_hms(2020, 10, 31, 11, 0, 0).unwrap();
//! ledger.record_transaction("DANNON", 300, t1).unwrap();
//! ledger.record_transaction("UNILEVER", 200, t2).unwrap();
//!
//! let spent = ledger.spend_points(400).unwrap();
//! assert_eq!(spent[0].points, -300);
//! assert_eq!(spent[1].points, -100);
//! assert_eq!(ledger.balance("UNILEVER"), 100);
//! ```

pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;
pub mod lot;
pub mod shared;
pub mod snapshot;

pub use engine::{PointsEngine, SpendReceipt};
pub use error::{LedgerError, Result};
pub use event::{Deduction, EventRecord, LedgerEvent};
pub use ledger::Ledger;
pub use lot::{Lot, Points};
pub use shared::SharedLedger;
pub use snapshot::LedgerSnapshot;
