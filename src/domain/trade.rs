//! Trade records and position arithmetic.
//!
//! A trade lives in exactly one collection at a time: [`OpenTrade`] until it
//! is closed, [`ClosedTrade`] afterwards. The id assigned at creation is
//! carried across the transition.

use chrono::{DateTime, Utc};

use super::error::LedgerError;
use super::metrics::TradeMetrics;

pub type TradeId = i64;

/// Display precision for price fields (entry, stop, target).
pub const PRICE_PRECISION: usize = 4;
/// Display precision for the position value.
pub const SIZE_PRECISION: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(LedgerError::invalid_input(
                "direction",
                format!("expected Long or Short, got {other:?}"),
            )),
        }
    }
}

/// Timestamp format used in note audit lines.
pub(crate) fn audit_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn require_positive(field: &str, value: f64) -> Result<(), LedgerError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::invalid_input(
            field,
            format!("must be a positive number, got {value}"),
        ))
    }
}

/// An open position.
///
/// `entry_price` is the size-weighted average of `entry_prices` against their
/// notional values at fill time; `position_value` is the summed notional.
/// `note` is an append-only audit trail: every mutating edit adds a
/// timestamped line.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub id: TradeId,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_prices: Vec<f64>,
    pub stop_loss: f64,
    pub target: f64,
    pub position_value: f64,
    pub metrics: TradeMetrics,
    pub opened_at: DateTime<Utc>,
    pub note: String,
}

impl OpenTrade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: &str,
        direction: Direction,
        entry: f64,
        stop_loss: f64,
        target: f64,
        position_value: f64,
        fee_rate: f64,
        opened_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if symbol.trim().is_empty() {
            return Err(LedgerError::invalid_input("symbol", "must not be empty"));
        }
        require_positive("entry", entry)?;
        require_positive("stoploss", stop_loss)?;
        require_positive("target", target)?;
        require_positive("size", position_value)?;

        Ok(OpenTrade {
            id: 0,
            symbol: symbol.trim().to_string(),
            direction,
            entry_price: entry,
            entry_prices: vec![entry],
            stop_loss,
            target,
            position_value,
            metrics: TradeMetrics::compute(
                entry,
                stop_loss,
                target,
                position_value,
                direction,
                fee_rate,
            ),
            opened_at,
            note: String::new(),
        })
    }

    pub fn quantity(&self) -> f64 {
        self.position_value / self.entry_price
    }

    /// Staggered entry: fold a new fill into the weighted-average cost basis.
    ///
    /// Stop and target are left untouched; risk is measured against the new
    /// average entry, so the effective risk:reward can change materially.
    pub fn add_entry(
        &mut self,
        price: f64,
        value: f64,
        fee_rate: f64,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        require_positive("price", price)?;
        require_positive("value", value)?;

        let total_value = self.position_value + value;
        let total_quantity = self.quantity() + value / price;

        self.entry_price = total_value / total_quantity;
        self.position_value = total_value;
        self.entry_prices.push(price);
        self.metrics = TradeMetrics::compute(
            self.entry_price,
            self.stop_loss,
            self.target,
            self.position_value,
            self.direction,
            fee_rate,
        );
        self.note.push_str(&format!(
            "\n+ Added ${value:.2} @ ${price:.4} on {}",
            audit_timestamp(now)
        ));
        Ok(())
    }

    /// Realize an exit price and produce the closed record.
    ///
    /// Gross result is directional and computed from quantity, not notional;
    /// the exit fee is charged on the notional at the exit price.
    pub fn close(
        &self,
        exit_price: f64,
        fee_rate: f64,
        closed_at: DateTime<Utc>,
    ) -> Result<ClosedTrade, LedgerError> {
        require_positive("exit price", exit_price)?;

        let quantity = self.quantity();
        let entry_fee = self.position_value * fee_rate;
        let exit_notional = (exit_price / self.entry_price) * self.position_value;
        let exit_fee = exit_notional * fee_rate;
        let gross_result = match self.direction {
            Direction::Long => quantity * (exit_price - self.entry_price),
            Direction::Short => quantity * (self.entry_price - exit_price),
        };

        Ok(ClosedTrade {
            id: self.id,
            symbol: self.symbol.clone(),
            direction: self.direction,
            entry_price: self.entry_price,
            entry_prices: self.entry_prices.clone(),
            stop_loss: self.stop_loss,
            target: self.target,
            position_value: self.position_value,
            opened_at: self.opened_at,
            note: self.note.clone(),
            exit_price,
            closed_at,
            net_result: gross_result - entry_fee - exit_fee,
            entry_fee,
            exit_fee,
        })
    }
}

/// A completed trade. Stop and target are kept for reference but may be stale.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub id: TradeId,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_prices: Vec<f64>,
    pub stop_loss: f64,
    pub target: f64,
    pub position_value: f64,
    pub opened_at: DateTime<Utc>,
    pub note: String,
    pub exit_price: f64,
    pub closed_at: DateTime<Utc>,
    pub net_result: f64,
    pub entry_fee: f64,
    pub exit_fee: f64,
}

impl ClosedTrade {
    pub fn quantity(&self) -> f64 {
        self.position_value / self.entry_price
    }
}
