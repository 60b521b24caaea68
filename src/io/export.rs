use anyhow::Result;
use std::io::Write;

use crate::domain::Transaction;

/// Layout of the `date` column, e.g. `2024-03-15 10:30:00 +0000`.
pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Column names of a history export.
pub const HISTORY_COLUMNS: [&str; 5] = [
    "transaction_id",
    "sender_id",
    "recipient_id",
    "amount",
    "date",
];

/// Convert a transaction into a history CSV row. A top-up has an empty sender.
pub fn history_record(tx: &Transaction) -> [String; 5] {
    [
        tx.id.to_string(),
        tx.from_wallet
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        tx.to_wallet.to_string(),
        tx.amount.to_string(),
        tx.date.format(HISTORY_TIMESTAMP_FORMAT).to_string(),
    ]
}

/// Write wallet history as CSV. Returns the number of data rows written.
///
/// The header row is optional: existing consumers expect bare data rows.
pub fn write_history_csv<W: Write>(
    writer: W,
    transactions: &[Transaction],
    header: bool,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if header {
        csv_writer.write_record(HISTORY_COLUMNS)?;
    }

    for tx in transactions {
        csv_writer.write_record(history_record(tx))?;
    }

    csv_writer.flush()?;
    Ok(transactions.len())
}
