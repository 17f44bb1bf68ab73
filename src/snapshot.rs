//! Serializable checkpoint of a ledger.
//!
//! The ledger does not pick a storage format; callers serialize a
//! [`LedgerSnapshot`] with whatever serde format they persist.

use crate::error::{LedgerError, Result};
use crate::ledger::{balances_match, derive_balances};
use crate::lot::{Lot, Points};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The lot collection and balance index of a ledger at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Lots in consumption order.
    pub lots: Vec<Lot>,

    /// Balance per payer.
    pub balances: BTreeMap<String, Points>,
}

impl LedgerSnapshot {
    /// Checks that the snapshot describes a consistent ledger.
    pub fn validate(&self) -> Result<()> {
        if let Some(lot) = self.lots.iter().find(|lot| lot.payer.trim().is_empty()) {
            return Err(LedgerError::InvalidSnapshot(format!(
                "lot at {} has an empty payer",
                lot.timestamp
            )));
        }

        if let Some(lot) = self.lots.iter().find(|lot| !lot.check_invariant()) {
            return Err(LedgerError::InvalidSnapshot(format!(
                "lot of {} at {} has remaining {} of {}",
                lot.payer, lot.timestamp, lot.remaining, lot.total_points
            )));
        }

        if self.balances.keys().any(|payer| payer.trim().is_empty()) {
            return Err(LedgerError::InvalidSnapshot(
                "balance index has an empty payer".to_string(),
            ));
        }

        if !balances_match(&self.balances, &derive_balances(&self.lots)) {
            return Err(LedgerError::InvalidSnapshot(
                "balances do not match lot remainders".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn lot(payer: &str, total: Points, remaining: Points, hour: u32) -> Lot {
        let timestamp = Utc.with_ymd_and_hms(2020, 11, 1, hour, 0, 0).unwrap();
        let mut lot = Lot::new(payer, total, timestamp);
        lot.remaining = remaining;
        lot
    }

    fn balances(entries: &[(&str, Points)]) -> BTreeMap<String, Points> {
        entries
            .iter()
            .map(|(payer, points)| (payer.to_string(), *points))
            .collect()
    }

    #[test]
    fn test_consistent_snapshot_is_valid() {
        let snapshot = LedgerSnapshot {
            lots: vec![lot("DANNON", 300, 100, 10), lot("UNILEVER", 200, 0, 11)],
            balances: balances(&[("DANNON", 100), ("UNILEVER", 0)]),
        };
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_mismatched_balance_is_invalid() {
        let snapshot = LedgerSnapshot {
            lots: vec![lot("DANNON", 300, 100, 10)],
            balances: balances(&[("DANNON", 300)]),
        };
        assert!(matches!(
            snapshot.validate(),
            Err(LedgerError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_unindexed_payer_is_invalid() {
        let snapshot = LedgerSnapshot {
            lots: vec![lot("DANNON", 300, 0, 10)],
            balances: BTreeMap::new(),
        };
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_overdrawn_lot_is_invalid() {
        let snapshot = LedgerSnapshot {
            lots: vec![lot("DANNON", 300, 400, 10)],
            balances: balances(&[("DANNON", 400)]),
        };
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("remaining 400 of 300"));
    }

    #[test]
    fn test_negative_balance_is_invalid() {
        let snapshot = LedgerSnapshot {
            lots: Vec::new(),
            balances: balances(&[("DANNON", -5)]),
        };
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_blank_payer_is_invalid() {
        let snapshot = LedgerSnapshot {
            lots: vec![lot("  ", 300, 300, 10)],
            balances: balances(&[("  ", 300)]),
        };
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("empty payer"));
    }

    #[test]
    fn test_blank_indexed_payer_is_invalid() {
        let snapshot = LedgerSnapshot {
            lots: Vec::new(),
            balances: balances(&[(" ", 0)]),
        };
        assert!(snapshot.validate().is_err());
    }
}
