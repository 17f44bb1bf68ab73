//! Points Ledger CLI
//!
//! Replays a CSV event log of accruals, withdrawals and spends, then prints
//! each payer's final balance.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- events.csv > balances.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `info` to see spend breakdowns, `debug` or `warn` to
//!   control verbosity further

use points_ledger::{LedgerError, PointsEngine, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(LedgerError::MissingArgument);
    }

    let input_path = &args[1];
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let mut engine = PointsEngine::new();
    engine.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    engine.write_output(handle)?;

    Ok(())
}
