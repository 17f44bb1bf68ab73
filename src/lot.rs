//! Point lot model.
//!
//! Maintains the invariant: `0 <= remaining <= total_points` at all times.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed point quantity.
pub type Points = i64;

/// The unspent remainder of one accrual.
///
/// # Invariants
///
/// - `total_points > 0` from creation
/// - `0 <= remaining <= total_points`, and `remaining` only ever decreases
///
/// Lots are never removed from the ledger. An exhausted lot stays in place
/// with `remaining == 0` and is skipped by every later deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Payer that issued the points.
    pub payer: String,

    /// Points credited by the accrual.
    pub total_points: Points,

    /// Event time of the accrual. Drives consumption order.
    pub timestamp: DateTime<Utc>,

    /// Points not yet withdrawn or spent.
    pub remaining: Points,
}

impl Lot {
    /// Creates a fresh, untouched lot.
    pub fn new(payer: impl Into<String>, points: Points, timestamp: DateTime<Utc>) -> Self {
        debug_assert!(points > 0, "lots are created from positive accruals only");
        Lot {
            payer: payer.into(),
            total_points: points,
            timestamp,
            remaining: points,
        }
    }

    /// Returns `true` once every point of the lot has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Takes up to `wanted` points from the lot.
    ///
    /// Returns how many points were actually taken, which is
    /// `min(remaining, wanted)`. A non-positive `wanted` takes nothing.
    pub fn take(&mut self, wanted: Points) -> Points {
        let taken = self.remaining.min(wanted).max(0);
        self.remaining -= taken;
        taken
    }

    /// Verifies the invariant: `0 <= remaining <= total_points`.
    pub fn check_invariant(&self) -> bool {
        self.total_points > 0 && self.remaining >= 0 && self.remaining <= self.total_points
    }
}
