//! Retroactive consolidation of two closed trades.

use super::error::LedgerError;
use super::trade::ClosedTrade;

/// Separator written between the two notes of a merged trade.
pub const MERGE_MARKER: &str = "--- MERGED ---";

/// Combine `absorbed` into `base`, producing one closed record under the
/// base's id.
///
/// Entry and exit prices are quantity-weighted averages; fees and net result
/// are summed as-is since they are already fee-adjusted amounts. Neither
/// input is mutated; the caller persists the result and deletes the absorbed
/// record in one transaction.
pub fn merge_closed(
    base: &ClosedTrade,
    absorbed: &ClosedTrade,
) -> Result<ClosedTrade, LedgerError> {
    if base.symbol != absorbed.symbol || base.direction != absorbed.direction {
        return Err(LedgerError::IncompatibleMerge {
            base: base.id,
            absorbed: absorbed.id,
            reason: format!(
                "{} {} vs {} {}",
                base.direction, base.symbol, absorbed.direction, absorbed.symbol
            ),
        });
    }

    let base_qty = base.quantity();
    let absorbed_qty = absorbed.quantity();
    let total_qty = base_qty + absorbed_qty;
    let total_value = base.position_value + absorbed.position_value;

    let mut entry_prices = base.entry_prices.clone();
    entry_prices.extend_from_slice(&absorbed.entry_prices);

    Ok(ClosedTrade {
        id: base.id,
        symbol: base.symbol.clone(),
        direction: base.direction,
        entry_price: total_value / total_qty,
        entry_prices,
        stop_loss: base.stop_loss,
        target: base.target,
        position_value: total_value,
        opened_at: base.opened_at.min(absorbed.opened_at),
        note: format!("{}\n{MERGE_MARKER}\n{}", base.note, absorbed.note)
            .trim()
            .to_string(),
        exit_price: (base.exit_price * base_qty + absorbed.exit_price * absorbed_qty) / total_qty,
        closed_at: base.closed_at.max(absorbed.closed_at),
        net_result: base.net_result + absorbed.net_result,
        entry_fee: base.entry_fee + absorbed.entry_fee,
        exit_fee: base.exit_fee + absorbed.exit_fee,
    })
}
