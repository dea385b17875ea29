// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use reward_ledger_rs::{
    PurchaseId, PurchaseLedger, RewardCatalog, RewardDraft, RewardId, UserDirectory, UserId,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Reward Ledger - Process reward-store operation CSV files
///
/// Reads operations from a CSV file and outputs the resulting purchase
/// ledger (or user balances) to stdout. Supports user registration, reward
/// definition, and the full purchase lifecycle.
#[derive(Parser, Debug)]
#[command(name = "reward-ledger-rs")]
#[command(about = "A reward store engine that processes operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,user,reward,purchase,name,price,stock,points
    /// Example: cargo run -- operations.csv > purchases.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output user balances instead of the purchase ledger
    #[arg(long)]
    balances: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let ledger = match process_operations(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    let result = if args.balances {
        write_balances(&ledger, std::io::stdout())
    } else {
        write_purchases(&ledger, std::io::stdout())
    };
    if let Err(e) = result {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, user, reward, purchase, name, price, stock, points`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    user: Option<u64>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    reward: Option<u64>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    purchase: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    price: Option<i64>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    stock: Option<i64>,
    #[serde(deserialize_with = "csv::invalid_option", default)]
    points: Option<i64>,
}

/// One parsed ledger operation.
#[derive(Debug)]
enum Operation {
    RegisterUser { user: UserId, points: i64 },
    DefineReward { name: String, price: i64, stock: Option<i64> },
    Purchase { user: UserId, reward: RewardId },
    Approve(PurchaseId),
    Reject(PurchaseId),
    Complete(PurchaseId),
    Cancel(PurchaseId),
}

impl CsvRecord {
    /// Converts the CSV record into an operation.
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        match self.op.to_lowercase().as_str() {
            "user" => Some(Operation::RegisterUser {
                user: UserId(self.user?),
                points: self.points?,
            }),
            "reward" => Some(Operation::DefineReward {
                name: self.name?,
                price: self.price?,
                stock: self.stock,
            }),
            "purchase" => Some(Operation::Purchase {
                user: UserId(self.user?),
                reward: RewardId(self.reward?),
            }),
            "approve" => Some(Operation::Approve(PurchaseId(self.purchase?))),
            "reject" => Some(Operation::Reject(PurchaseId(self.purchase?))),
            "complete" => Some(Operation::Complete(PurchaseId(self.purchase?))),
            "cancel" => Some(Operation::Cancel(PurchaseId(self.purchase?))),
            _ => None,
        }
    }
}

/// Row format for `--balances` output.
#[derive(Debug, Serialize)]
struct BalanceRecord {
    user: u64,
    points: i64,
}

/// Process operations from a CSV reader.
///
/// Streams the file row by row; malformed rows and failed operations are
/// skipped with a warning so one bad row never aborts the batch.
///
/// # CSV Format
///
/// Expected columns: `op, user, reward, purchase, name, price, stock, points`
/// - `op`: user | reward | purchase | approve | reject | complete | cancel
/// - unused columns may be left empty per row
///
/// # Example
///
/// ```csv
/// op,user,reward,purchase,name,price,stock,points
/// user,1,,,,,,200
/// reward,,,,Coffee voucher,80,,
/// purchase,1,1,,,,,
/// approve,,,1,,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_operations<R: Read>(reader: R) -> Result<PurchaseLedger, csv::Error> {
    let catalog = Arc::new(RewardCatalog::new());
    let directory = Arc::new(UserDirectory::new());
    let ledger = PurchaseLedger::new(Arc::clone(&catalog), Arc::clone(&directory));

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed row");
                continue;
            }
        };

        let Some(op) = record.into_operation() else {
            tracing::warn!("skipping invalid operation record");
            continue;
        };

        let outcome = match op {
            Operation::RegisterUser { user, points } => directory.register(user, points),
            Operation::DefineReward { name, price, stock } => catalog
                .create(RewardDraft {
                    name,
                    description: None,
                    price,
                    available: true,
                    stock,
                })
                .map(|_| ()),
            Operation::Purchase { user, reward } => ledger.create(user, reward).map(|_| ()),
            Operation::Approve(id) => ledger.approve(id).map(|_| ()),
            Operation::Reject(id) => ledger.reject(id).map(|_| ()),
            Operation::Complete(id) => ledger.complete(id).map(|_| ()),
            Operation::Cancel(id) => ledger.cancel(id).map(|_| ()),
        };

        if let Err(e) = outcome {
            tracing::warn!(error = %e, "skipping failed operation");
        }
    }

    Ok(ledger)
}

/// Write the purchase ledger to a CSV writer.
///
/// # CSV Format
///
/// Columns: `id, user_id, reward_id, reward_name, price, purchase_date, status`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_purchases<W: Write>(ledger: &PurchaseLedger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for purchase in ledger.list() {
        wtr.serialize(&purchase)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write user balances to a CSV writer.
///
/// # CSV Format
///
/// Columns: `user, points`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(ledger: &PurchaseLedger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut rows: Vec<BalanceRecord> = ledger
        .directory()
        .accounts()
        .map(|entry| BalanceRecord {
            user: entry.key().0,
            points: entry.value().balance(),
        })
        .collect();
    rows.sort_by_key(|r| r.user);

    for row in rows {
        wtr.serialize(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reward_ledger_rs::PurchaseStatus;
    use std::io::Cursor;

    #[test]
    fn parse_user_and_reward_and_purchase() {
        let csv = "op,user,reward,purchase,name,price,stock,points\n\
                   user,1,,,,,,200\n\
                   reward,,,,Coffee voucher,80,,\n\
                   purchase,1,1,,,,,\n";
        let ledger = process_operations(Cursor::new(csv)).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.directory().balance(UserId(1)).unwrap(), 120);
        let purchase = ledger.get(PurchaseId(1)).unwrap();
        assert_eq!(purchase.reward_name, "Coffee voucher");
        assert_eq!(purchase.price, 80);
        assert_eq!(purchase.status, PurchaseStatus::Pending);
    }

    #[test]
    fn parse_full_lifecycle() {
        let csv = "op,user,reward,purchase,name,price,stock,points\n\
                   user,1,,,,,,200\n\
                   reward,,,,Mug,80,,\n\
                   purchase,1,1,,,,,\n\
                   approve,,,1,,,,\n\
                   complete,,,1,,,,\n";
        let ledger = process_operations(Cursor::new(csv)).unwrap();

        let purchase = ledger.get(PurchaseId(1)).unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert_eq!(ledger.directory().balance(UserId(1)).unwrap(), 120);
    }

    #[test]
    fn reject_refunds_points() {
        let csv = "op,user,reward,purchase,name,price,stock,points\n\
                   user,1,,,,,,200\n\
                   reward,,,,Mug,80,,\n\
                   purchase,1,1,,,,,\n\
                   reject,,,1,,,,\n";
        let ledger = process_operations(Cursor::new(csv)).unwrap();

        let purchase = ledger.get(PurchaseId(1)).unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Rejected);
        assert_eq!(ledger.directory().balance(UserId(1)).unwrap(), 200);
    }

    #[test]
    fn parse_with_whitespace() {
        let csv = "op,user,reward,purchase,name,price,stock,points\n \
                   user , 1 ,,,,,, 200 \n";
        let ledger = process_operations(Cursor::new(csv)).unwrap();
        assert_eq!(ledger.directory().balance(UserId(1)).unwrap(), 200);
    }

    #[test]
    fn skip_malformed_and_failed_rows() {
        let csv = "op,user,reward,purchase,name,price,stock,points\n\
                   user,1,,,,,,50\n\
                   reward,,,,Mug,80,,\n\
                   purchase,1,1,,,,,\n\
                   unknown,row,data,,,,,\n\
                   user,2,,,,,,100\n";
        let ledger = process_operations(Cursor::new(csv)).unwrap();

        // Purchase failed (insufficient points), unknown op skipped; both
        // users registered.
        assert_eq!(ledger.len(), 0);
        assert_eq!(ledger.directory().len(), 2);
        assert_eq!(ledger.directory().balance(UserId(1)).unwrap(), 50);
    }

    #[test]
    fn write_purchases_emits_header_and_rows() {
        let csv = "op,user,reward,purchase,name,price,stock,points\n\
                   user,1,,,,,,200\n\
                   reward,,,,Mug,80,,\n\
                   purchase,1,1,,,,,\n";
        let ledger = process_operations(Cursor::new(csv)).unwrap();

        let mut output = Vec::new();
        write_purchases(&ledger, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("id,user_id,reward_id,reward_name,price,purchase_date,status"));
        assert!(output.contains("Mug"));
        assert!(output.contains("pending"));
    }

    #[test]
    fn write_balances_sorts_by_user() {
        let csv = "op,user,reward,purchase,name,price,stock,points\n\
                   user,3,,,,,,30\n\
                   user,1,,,,,,10\n\
                   user,2,,,,,,20\n";
        let ledger = process_operations(Cursor::new(csv)).unwrap();

        let mut output = Vec::new();
        write_balances(&ledger, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "user,points");
        assert_eq!(lines[1], "1,10");
        assert_eq!(lines[2], "2,20");
        assert_eq!(lines[3], "3,30");
    }
}
