//! Event models for CSV parsing and internal representation.

use crate::lot::Points;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw event record as read from CSV.
///
/// Every field but the type is optional at this stage: spends carry only a point
/// amount, transactions carry all three.
#[derive(Debug, Deserialize)]
pub struct EventRecord {
    /// Event type: transaction or spend
    #[serde(rename = "type")]
    pub event_type: String,

    /// Payer name (transactions only)
    pub payer: Option<String>,

    /// Signed points for transactions, non-negative points for spends
    pub points: Option<String>,

    /// RFC 3339 event time (transactions only)
    pub timestamp: Option<String>,
}

impl EventRecord {
    /// Parses the raw CSV record into a typed event.
    ///
    /// Returns a description of the problem if the record is invalid
    /// (unknown type, missing or malformed field).
    pub fn parse(&self) -> std::result::Result<LedgerEvent, String> {
        let event_type = self.event_type.trim().to_lowercase();

        match event_type.as_str() {
            "transaction" => {
                let payer = field(&self.payer).ok_or("missing payer")?;
                let points = field(&self.points)
                    .ok_or("missing points")?
                    .parse::<Points>()
                    .map_err(|e| format!("invalid points: {}", e))?;
                let timestamp = field(&self.timestamp).ok_or("missing timestamp")?;
                let timestamp = DateTime::parse_from_rfc3339(timestamp)
                    .map_err(|e| format!("invalid timestamp: {}", e))?
                    .with_timezone(&Utc);

                Ok(LedgerEvent::Transaction {
                    payer: payer.to_string(),
                    points,
                    timestamp,
                })
            }
            "spend" => {
                let points = field(&self.points)
                    .ok_or("missing points")?
                    .parse::<u64>()
                    .map_err(|e| format!("invalid spend points: {}", e))?;
                Ok(LedgerEvent::Spend(points))
            }
            other => Err(format!("unknown event type '{}'", other)),
        }
    }
}

/// Returns the trimmed field, treating blanks as absent.
fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A parsed and validated event ready to apply to a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// Accrual (positive points), withdrawal (negative points) or no-op (zero)
    /// for a single payer.
    Transaction {
        payer: String,
        points: Points,
        timestamp: DateTime<Utc>,
    },

    /// Payer-agnostic spend of the oldest available points.
    Spend(u64),
}

/// One row of a spend breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// Payer whose lots were consumed
    pub payer: String,

    /// Points deducted, always negative
    pub points: Points,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(event_type: &str, payer: &str, points: &str, timestamp: &str) -> EventRecord {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        EventRecord {
            event_type: event_type.to_string(),
            payer: opt(payer),
            points: opt(points),
            timestamp: opt(timestamp),
        }
    }

    #[test]
    fn test_parse_accrual() {
        let parsed = record("transaction", "DANNON", "300", "2020-10-31T10:00:00Z")
            .parse()
            .unwrap();
        assert_eq!(
            parsed,
            LedgerEvent::Transaction {
                payer: "DANNON".to_string(),
                points: 300,
                timestamp: Utc.with_ymd_and_hms(2020, 10, 31, 10, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_parse_withdrawal_with_offset() {
        let parsed = record("transaction", "DANNON", "-200", "2020-10-31T17:00:00+02:00")
            .parse()
            .unwrap();
        match parsed {
            LedgerEvent::Transaction {
                points, timestamp, ..
            } => {
                assert_eq!(points, -200);
                assert_eq!(timestamp, Utc.with_ymd_and_hms(2020, 10, 31, 15, 0, 0).unwrap());
            }
            _ => panic!("Expected Transaction"),
        }
    }

    #[test]
    fn test_parse_spend() {
        let parsed = record("spend", "", "5000", "").parse().unwrap();
        assert_eq!(parsed, LedgerEvent::Spend(5000));
    }

    #[test]
    fn test_parse_handles_whitespace_and_case() {
        let parsed = record("  Transaction ", "  MILLER COORS ", " 10 ", " 2020-11-01T14:00:00Z ")
            .parse()
            .unwrap();
        match parsed {
            LedgerEvent::Transaction { payer, points, .. } => {
                assert_eq!(payer, "MILLER COORS");
                assert_eq!(points, 10);
            }
            _ => panic!("Expected Transaction"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let err = record("refund", "DANNON", "10", "2020-11-01T14:00:00Z")
            .parse()
            .unwrap_err();
        assert!(err.contains("unknown event type"));
    }

    #[test]
    fn test_parse_rejects_negative_spend() {
        assert!(record("spend", "", "-10", "").parse().is_err());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(record("transaction", "", "10", "2020-11-01T14:00:00Z").parse().is_err());
        assert!(record("transaction", "DANNON", "", "2020-11-01T14:00:00Z").parse().is_err());
        assert!(record("transaction", "DANNON", "10", "").parse().is_err());
        assert!(record("spend", "", "", "").parse().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_timestamp() {
        let err = record("transaction", "DANNON", "10", "yesterday")
            .parse()
            .unwrap_err();
        assert!(err.contains("invalid timestamp"));
    }
}
