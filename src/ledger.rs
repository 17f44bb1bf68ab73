//! Core points ledger.
//!
//! Owns the lot collection and the per-payer balance index, and applies
//! accruals, withdrawals and spends against them oldest points first.

use crate::error::{LedgerError, Result};
use crate::event::{Deduction, LedgerEvent};
use crate::lot::{Lot, Points};
use crate::snapshot::LedgerSnapshot;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;

/// The points ledger for a single user.
///
/// # Invariants
///
/// - `lots` is sorted by ascending timestamp; lots with equal timestamps keep
///   the order in which they were recorded
/// - For every payer, `balances[payer]` equals the sum of `remaining` over
///   that payer's lots
/// - No balance is ever negative
///
/// Every operation validates fully before mutating, so a rejected call leaves
/// both the lots and the balance index exactly as they were.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Lots in consumption order.
    lots: Vec<Lot>,

    /// Current balance per payer.
    balances: BTreeMap<String, Points>,
}

impl Ledger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Ledger {
            lots: Vec::new(),
            balances: BTreeMap::new(),
        }
    }

    /// Rebuilds a ledger by applying an ordered event log.
    ///
    /// Stops at the first rejected event and returns its error.
    pub fn replay<I>(events: I) -> Result<Self>
    where
        I: IntoIterator<Item = LedgerEvent>,
    {
        let mut ledger = Ledger::new();
        for event in events {
            ledger.apply(&event)?;
        }
        Ok(ledger)
    }

    /// Applies a single event, returning the spend breakdown.
    ///
    /// Transactions always return an empty breakdown.
    pub fn apply(&mut self, event: &LedgerEvent) -> Result<Vec<Deduction>> {
        match event {
            LedgerEvent::Transaction {
                payer,
                points,
                timestamp,
            } => {
                self.record_transaction(payer, *points, *timestamp)?;
                Ok(Vec::new())
            }
            LedgerEvent::Spend(points) => self.spend_points(*points),
        }
    }

    /// Records an accrual (`points > 0`), a withdrawal (`points < 0`) or a
    /// no-op (`points == 0`) for one payer.
    ///
    /// Accruals always create a new lot, even when an identical one exists.
    /// Withdrawals consume that payer's lots oldest first. Timestamps may
    /// arrive in any order; late accruals are slotted into place.
    pub fn record_transaction(
        &mut self,
        payer: &str,
        points: Points,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        if payer.trim().is_empty() {
            return Err(LedgerError::EmptyPayer);
        }

        let balance = self.balance(payer);
        let projected = balance
            .checked_add(points)
            .ok_or_else(|| LedgerError::PointsOverflow {
                payer: payer.to_string(),
            })?;

        if projected < 0 {
            return Err(LedgerError::InsufficientBalance {
                payer: payer.to_string(),
                balance,
                points,
            });
        }

        if points == 0 {
            return Ok(());
        }

        if points > 0 {
            self.insert_lot(Lot::new(payer, points, timestamp));
            debug!("Accrued {} points from {} at {}", points, payer, timestamp);
        } else {
            self.withdraw(payer, -points);
            debug!("Withdrew {} points from {}", -points, payer);
        }

        self.balances.insert(payer.to_string(), projected);
        Ok(())
    }

    /// Spends points across all payers, oldest lots first.
    ///
    /// Returns one entry per payer touched, in the order each payer was first
    /// deducted from, with the deducted amount as a negative number.
    pub fn spend_points(&mut self, points: u64) -> Result<Vec<Deduction>> {
        if points == 0 {
            return Ok(Vec::new());
        }

        let available = self.total_available();
        if i128::from(points) > available {
            return Err(LedgerError::InsufficientTotalBalance {
                requested: points,
                available,
            });
        }

        let mut outstanding = points;
        let mut deductions: Vec<Deduction> = Vec::new();

        for lot in self.lots.iter_mut() {
            if outstanding == 0 {
                break;
            }

            let taken = lot.take(Points::try_from(outstanding).unwrap_or(Points::MAX));
            if taken == 0 {
                continue;
            }
            outstanding -= taken.unsigned_abs();

            match deductions.iter_mut().find(|d| d.payer == lot.payer) {
                Some(deduction) => deduction.points -= taken,
                None => deductions.push(Deduction {
                    payer: lot.payer.clone(),
                    points: -taken,
                }),
            }
        }

        // `available` is summed from the same lots this pass walks, so the pass
        // always absorbs the request; only a bug in `Lot::take` can trip this.
        assert_eq!(
            outstanding, 0,
            "spend of {} points exhausted all lots; balance index out of sync",
            points
        );

        for deduction in &deductions {
            *self.balances.entry(deduction.payer.clone()).or_insert(0) += deduction.points;
        }

        debug!("Spent {} points across {} payers", points, deductions.len());
        Ok(deductions)
    }

    /// Returns a snapshot of every referenced payer's balance.
    pub fn get_balances(&self) -> BTreeMap<String, Points> {
        self.balances.clone()
    }

    /// Returns the balance of one payer, zero if never referenced.
    pub fn balance(&self, payer: &str) -> Points {
        self.balances.get(payer).copied().unwrap_or(0)
    }

    /// Returns the unspent points across all lots.
    pub fn total_available(&self) -> i128 {
        self.lots.iter().map(|lot| i128::from(lot.remaining)).sum()
    }

    /// Returns the lots in consumption order.
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Captures the lots and balance index for checkpointing.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            lots: self.lots.clone(),
            balances: self.balances.clone(),
        }
    }

    /// Rebuilds a ledger from a checkpoint.
    ///
    /// Lots are re-sorted stably by timestamp. The snapshot is rejected if it
    /// breaks any ledger invariant.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self> {
        snapshot.validate()?;

        let LedgerSnapshot { mut lots, balances } = snapshot;
        lots.sort_by_key(|lot| lot.timestamp);

        Ok(Ledger { lots, balances })
    }

    /// Verifies every ledger invariant by re-deriving balances from lots.
    pub fn check_invariants(&self) -> bool {
        if !self.lots.iter().all(Lot::check_invariant) {
            return false;
        }
        if self
            .lots
            .windows(2)
            .any(|pair| pair[0].timestamp > pair[1].timestamp)
        {
            return false;
        }

        balances_match(&self.balances, &derive_balances(&self.lots))
    }

    /// Inserts a lot after every lot with an earlier or equal timestamp.
    fn insert_lot(&mut self, lot: Lot) {
        let idx = self
            .lots
            .partition_point(|existing| existing.timestamp <= lot.timestamp);
        self.lots.insert(idx, lot);
    }

    /// Deducts `amount` from one payer's lots, oldest first.
    ///
    /// The caller has already checked the payer's balance covers `amount`.
    fn withdraw(&mut self, payer: &str, amount: Points) {
        let mut outstanding = amount;

        for lot in self.lots.iter_mut().filter(|lot| lot.payer == payer) {
            if outstanding == 0 {
                break;
            }
            outstanding -= lot.take(outstanding);
        }

        assert_eq!(
            outstanding, 0,
            "withdrawal of {} points exhausted lots of {}; balance index out of sync",
            amount, payer
        );
    }
}

/// Sums `remaining` per payer.
pub(crate) fn derive_balances(lots: &[Lot]) -> BTreeMap<String, i128> {
    let mut derived = BTreeMap::new();
    for lot in lots {
        *derived.entry(lot.payer.clone()).or_insert(0) += i128::from(lot.remaining);
    }
    derived
}

/// Checks a balance index against balances derived from lots.
///
/// Every balance must be non-negative, every payer with lots must be indexed,
/// and sums must agree. Indexed payers without lots must sit at zero.
pub(crate) fn balances_match(
    balances: &BTreeMap<String, Points>,
    derived: &BTreeMap<String, i128>,
) -> bool {
    balances.values().all(|balance| *balance >= 0)
        && derived.keys().all(|payer| balances.contains_key(payer))
        && balances.iter().all(|(payer, balance)| {
            i128::from(*balance) == derived.get(payer).copied().unwrap_or(0)
        })
}
