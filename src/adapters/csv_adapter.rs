//! CSV export of the closed-trade history.

use crate::domain::error::LedgerError;
use crate::domain::trade::ClosedTrade;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 12] = [
    "id",
    "symbol",
    "direction",
    "entry_price",
    "entry_prices",
    "position_value",
    "exit_price",
    "opened_at",
    "closed_at",
    "net_result",
    "entry_fee",
    "exit_fee",
];

/// Write the closed-trade history as CSV. Entry fills are joined with `;`
/// inside their column so the row stays one record.
pub fn write_closed_trades<W: Write>(trades: &[ClosedTrade], writer: W) -> Result<(), LedgerError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(HEADER).map_err(csv_err)?;
    for trade in trades {
        let fills = trade
            .entry_prices
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(";");
        wtr.write_record([
            trade.id.to_string(),
            trade.symbol.clone(),
            trade.direction.to_string(),
            trade.entry_price.to_string(),
            fills,
            trade.position_value.to_string(),
            trade.exit_price.to_string(),
            trade.opened_at.to_rfc3339(),
            trade.closed_at.to_rfc3339(),
            trade.net_result.to_string(),
            trade.entry_fee.to_string(),
            trade.exit_fee.to_string(),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_to_path<P: AsRef<Path>>(
    trades: &[ClosedTrade],
    path: P,
) -> Result<(), LedgerError> {
    let file = std::fs::File::create(path)?;
    write_closed_trades(trades, file)
}

fn csv_err(e: csv::Error) -> LedgerError {
    LedgerError::Store {
        reason: format!("CSV write error: {e}"),
    }
}
