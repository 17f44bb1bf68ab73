//! CSV front end for the points ledger.
//!
//! Replays an event log row by row into a [`Ledger`]. Rejected or malformed
//! rows are logged and skipped; the ledger itself stays consistent because
//! every rejection is atomic.

use crate::error::{LedgerError, Result};
use crate::event::{Deduction, EventRecord, LedgerEvent};
use crate::ledger::Ledger;
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::io::{Read, Write};

/// Breakdown of one successful spend from the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendReceipt {
    /// CSV row the spend came from (1-indexed, header is row 1).
    pub row: usize,

    /// Points requested.
    pub points: u64,

    /// Per-payer deductions, in first-touch order.
    pub deductions: Vec<Deduction>,
}

/// Processes event logs against a single ledger.
///
/// # Output Ordering
///
/// Final balances are written sorted by payer name so output is reproducible.
pub struct PointsEngine {
    ledger: Ledger,

    receipts: Vec<SpendReceipt>,
}

impl PointsEngine {
    /// Creates an engine over an empty ledger.
    pub fn new() -> Self {
        Self::with_ledger(Ledger::new())
    }

    /// Creates an engine that continues from an existing ledger.
    pub fn with_ledger(ledger: Ledger) -> Self {
        PointsEngine {
            ledger,
            receipts: Vec::new(),
        }
    }

    /// Processes events from a CSV reader in streaming fashion.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<EventRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                    continue;
                }
            };

            let event = match record.parse() {
                Ok(event) => event,
                Err(message) => {
                    let e = LedgerError::InvalidRecord {
                        row: row_num,
                        message,
                    };
                    warn!("{}", e);
                    continue;
                }
            };

            if let Err(e) = self.process_event(&event, row_num) {
                warn!("Row {}: {}", row_num, e);
            }
        }

        Ok(())
    }

    fn process_event(&mut self, event: &LedgerEvent, row: usize) -> Result<()> {
        let deductions = self.ledger.apply(event)?;

        match event {
            LedgerEvent::Spend(points) => {
                info!(
                    "Row {}: Spent {} points: {}",
                    row,
                    points,
                    deductions
                        .iter()
                        .map(|d| format!("{} {}", d.payer, d.points))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                self.receipts.push(SpendReceipt {
                    row,
                    points: *points,
                    deductions,
                });
            }
            LedgerEvent::Transaction { payer, points, .. } => {
                debug!("Row {}: Recorded {} points for {}", row, points, payer);
            }
        }

        Ok(())
    }

    /// Writes final payer balances to CSV.
    pub fn write_output<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["payer", "points"])?;

        for (payer, points) in self.ledger.get_balances() {
            csv_writer.write_record([payer, points.to_string()])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Returns the underlying ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Returns the receipts of every successful spend, in log order.
    pub fn receipts(&self) -> &[SpendReceipt] {
        &self.receipts
    }
}

impl Default for PointsEngine {
    fn default() -> Self {
        Self::new()
    }
}
