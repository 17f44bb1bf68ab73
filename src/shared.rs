//! Thread-safe handle to a ledger.
//!
//! Each operation holds one lock for its whole duration, so the balance check
//! and the mutation that follows it can never interleave with another caller.

use crate::error::{LedgerError, Result};
use crate::event::Deduction;
use crate::ledger::Ledger;
use crate::lot::Points;
use crate::snapshot::LedgerSnapshot;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A cloneable, shared ledger for use behind a service boundary.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    /// Creates a handle to a new empty ledger.
    pub fn new() -> Self {
        Self::from_ledger(Ledger::new())
    }

    /// Wraps an existing ledger, e.g. one restored from a snapshot.
    pub fn from_ledger(ledger: Ledger) -> Self {
        SharedLedger {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Records an accrual, withdrawal or no-op under the lock.
    pub fn record_transaction(
        &self,
        payer: &str,
        points: Points,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.lock()?.record_transaction(payer, points, timestamp)
    }

    /// Spends points oldest first under the lock.
    pub fn spend_points(&self, points: u64) -> Result<Vec<Deduction>> {
        self.lock()?.spend_points(points)
    }

    /// Returns a snapshot of every payer's balance.
    pub fn get_balances(&self) -> Result<BTreeMap<String, Points>> {
        Ok(self.lock()?.get_balances())
    }

    /// Captures a checkpoint of the whole ledger.
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    // A poisoned lock means an invariant assertion fired mid-operation; the
    // ledger state can no longer be trusted.
    fn lock(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }
}
