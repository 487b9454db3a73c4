//! Field edits on open trades.
//!
//! Edits arrive as raw strings from the caller's input surface. Numeric
//! fields get a lenient decimal parse, a precision-aware no-op check so
//! cosmetic reformatting never pollutes the audit trail, a metrics recompute
//! and an audit line. The entry-price list is a batch replacement: it swaps
//! the recorded fills wholesale without reweighting the average entry, which
//! is a deliberately different path from the staggered-entry accumulator.

use chrono::{DateTime, Utc};

use super::error::LedgerError;
use super::metrics::TradeMetrics;
use super::trade::{audit_timestamp, OpenTrade, PRICE_PRECISION, SIZE_PRECISION};

/// Editable fields of an open trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Entry,
    StopLoss,
    Target,
    Size,
    EntryPrices,
}

impl EditField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditField::Entry => "entry",
            EditField::StopLoss => "stoploss",
            EditField::Target => "target",
            EditField::Size => "size",
            EditField::EntryPrices => "entry_prices",
        }
    }

    fn precision(&self) -> usize {
        match self {
            EditField::Entry | EditField::StopLoss | EditField::Target => PRICE_PRECISION,
            EditField::Size => SIZE_PRECISION,
            EditField::EntryPrices => 0,
        }
    }
}

impl std::str::FromStr for EditField {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entry" => Ok(EditField::Entry),
            "stoploss" | "stop" => Ok(EditField::StopLoss),
            "target" => Ok(EditField::Target),
            "size" => Ok(EditField::Size),
            "entry_prices" | "entries" => Ok(EditField::EntryPrices),
            other => Err(LedgerError::invalid_input(
                "field",
                format!("unknown editable field {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Updated,
    /// The new value rounds to the current one at display precision; nothing
    /// was touched, no audit line was written.
    Unchanged,
}

/// Parse a user-entered decimal, stripping currency symbols, grouping commas
/// and other stray characters.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a comma-delimited price list, keeping only positive finite entries.
pub fn parse_price_list(raw: &str) -> Vec<f64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect()
}

/// Apply a single field edit to an open trade.
///
/// On `InvalidInput` the trade is untouched; the caller restores its display
/// from the unmutated record.
pub fn apply_field_edit(
    trade: &mut OpenTrade,
    field: EditField,
    raw: &str,
    fee_rate: f64,
    now: DateTime<Utc>,
) -> Result<EditOutcome, LedgerError> {
    if field == EditField::EntryPrices {
        let prices = parse_price_list(raw);
        if prices.is_empty() {
            return Err(LedgerError::invalid_input(
                "entry_prices",
                "replacement list has no valid prices",
            ));
        }
        trade.entry_prices = prices;
        trade
            .note
            .push_str(&format!("\nEntry list updated {}", audit_timestamp(now)));
        return Ok(EditOutcome::Updated);
    }

    let new_value = parse_decimal(raw).ok_or_else(|| {
        LedgerError::invalid_input(field.as_str(), format!("not a number: {raw:?}"))
    })?;

    let precision = field.precision();
    let current = match field {
        EditField::Entry => trade.entry_price,
        EditField::StopLoss => trade.stop_loss,
        EditField::Target => trade.target,
        EditField::Size => trade.position_value,
        EditField::EntryPrices => unreachable!(),
    };

    if format!("{current:.precision$}") == format!("{new_value:.precision$}") {
        return Ok(EditOutcome::Unchanged);
    }

    match field {
        EditField::Entry => trade.entry_price = new_value,
        EditField::StopLoss => trade.stop_loss = new_value,
        EditField::Target => trade.target = new_value,
        EditField::Size => trade.position_value = new_value,
        EditField::EntryPrices => unreachable!(),
    }

    trade.metrics = TradeMetrics::compute(
        trade.entry_price,
        trade.stop_loss,
        trade.target,
        trade.position_value,
        trade.direction,
        fee_rate,
    );
    trade.note.push_str(&format!(
        "\n{} updated to {new_value:.precision$} on {}",
        field.as_str(),
        audit_timestamp(now)
    ));
    Ok(EditOutcome::Updated)
}
