//! Trade lifecycle over the persistence port.
//!
//! Every mutation is a read-modify-write against the store: fetch the
//! record, apply the pure domain operation, write the result back. Nothing
//! is written when the domain operation fails, so a rejected edit leaves the
//! persisted record untouched.

use chrono::Utc;

use super::edit::{apply_field_edit, EditField, EditOutcome};
use super::error::LedgerError;
use super::merge::merge_closed;
use super::summary::Summary;
use super::trade::{ClosedTrade, Direction, OpenTrade, TradeId};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;

/// Fee rate applied to notional value on both legs of every trade.
pub const DEFAULT_FEE_RATE: f64 = 0.00075;
/// Account balance before the first recorded trade.
pub const DEFAULT_STARTING_BALANCE: f64 = 3881.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerSettings {
    pub fee_rate: f64,
    pub starting_balance: f64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            fee_rate: DEFAULT_FEE_RATE,
            starting_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}

impl LedgerSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        LedgerSettings {
            fee_rate: config.get_double("ledger", "fee_rate", DEFAULT_FEE_RATE),
            starting_balance: config.get_double(
                "ledger",
                "starting_balance",
                DEFAULT_STARTING_BALANCE,
            ),
        }
    }
}

/// Which collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Open,
    Closed,
}

/// Request to open a new trade.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub symbol: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub size: f64,
}

/// Result of a field edit: the trade as persisted, and whether anything
/// actually changed.
#[derive(Debug, Clone, PartialEq)]
pub struct EditResult {
    pub trade: OpenTrade,
    pub outcome: EditOutcome,
}

pub struct Ledger<S> {
    store: S,
    settings: LedgerSettings,
}

impl<S: StorePort> Ledger<S> {
    pub fn new(store: S, settings: LedgerSettings) -> Self {
        Ledger { store, settings }
    }

    pub fn settings(&self) -> LedgerSettings {
        self.settings
    }

    /// Create an open trade from a new-trade submission.
    pub fn open_trade(&self, request: &NewTrade) -> Result<OpenTrade, LedgerError> {
        let mut trade = OpenTrade::new(
            &request.symbol,
            request.direction,
            request.entry,
            request.stop_loss,
            request.target,
            request.size,
            self.settings.fee_rate,
            Utc::now(),
        )?;
        trade.id = self.store.insert_open(&trade)?;
        Ok(trade)
    }

    /// Apply a raw field edit to an open trade. A value that rounds to the
    /// current one at display precision is a no-op and never hits the store.
    pub fn edit_field(
        &self,
        id: TradeId,
        field: EditField,
        raw: &str,
    ) -> Result<EditResult, LedgerError> {
        let mut trade = self
            .store
            .get_open(id)?
            .ok_or(LedgerError::NotFound { id })?;

        let outcome = apply_field_edit(&mut trade, field, raw, self.settings.fee_rate, Utc::now())?;
        if outcome == EditOutcome::Updated {
            self.store.update_open(&trade)?;
        }
        Ok(EditResult { trade, outcome })
    }

    /// Staggered entry: add a fill to an existing open position.
    pub fn add_entry(
        &self,
        id: TradeId,
        price: f64,
        value: f64,
    ) -> Result<OpenTrade, LedgerError> {
        let mut trade = self
            .store
            .get_open(id)?
            .ok_or(LedgerError::NotFound { id })?;

        trade.add_entry(price, value, self.settings.fee_rate, Utc::now())?;
        self.store.update_open(&trade)?;
        Ok(trade)
    }

    /// Close an open trade at the realized exit price. The move between
    /// collections is one store transaction; closing is one-directional.
    pub fn close_trade(&self, id: TradeId, exit_price: f64) -> Result<ClosedTrade, LedgerError> {
        let trade = self
            .store
            .get_open(id)?
            .ok_or(LedgerError::NotFound { id })?;

        let closed = trade.close(exit_price, self.settings.fee_rate, Utc::now())?;
        self.store.move_to_closed(&closed)?;
        Ok(closed)
    }

    /// Merge `absorbed` into `base`; the absorbed record is deleted in the
    /// same store transaction that writes the merged base.
    pub fn merge(&self, base: TradeId, absorbed: TradeId) -> Result<ClosedTrade, LedgerError> {
        if base == absorbed {
            return Err(LedgerError::IncompatibleMerge {
                base,
                absorbed,
                reason: "a trade cannot absorb itself".into(),
            });
        }
        let base_trade = self
            .store
            .get_closed(base)?
            .ok_or(LedgerError::NotFound { id: base })?;
        let absorbed_trade = self
            .store
            .get_closed(absorbed)?
            .ok_or(LedgerError::NotFound { id: absorbed })?;

        let merged = merge_closed(&base_trade, &absorbed_trade)?;
        self.store.commit_merge(&merged, absorbed)?;
        Ok(merged)
    }

    /// Delete a trade from either collection.
    pub fn delete(&self, id: TradeId, collection: Collection) -> Result<(), LedgerError> {
        let removed = match collection {
            Collection::Open => self.store.remove_open(id)?,
            Collection::Closed => self.store.remove_closed(id)?,
        };
        if removed {
            Ok(())
        } else {
            Err(LedgerError::NotFound { id })
        }
    }

    /// Replace a trade's free-form note wholesale (distinct from the
    /// append-only audit lines written by edits).
    pub fn set_note(
        &self,
        id: TradeId,
        collection: Collection,
        note: &str,
    ) -> Result<(), LedgerError> {
        match collection {
            Collection::Open => {
                let mut trade = self
                    .store
                    .get_open(id)?
                    .ok_or(LedgerError::NotFound { id })?;
                trade.note = note.to_string();
                self.store.update_open(&trade)
            }
            Collection::Closed => {
                let mut trade = self
                    .store
                    .get_closed(id)?
                    .ok_or(LedgerError::NotFound { id })?;
                trade.note = note.to_string();
                self.store.update_closed(&trade)
            }
        }
    }

    pub fn open_trades(&self) -> Result<Vec<OpenTrade>, LedgerError> {
        self.store.list_open()
    }

    pub fn closed_trades(&self) -> Result<Vec<ClosedTrade>, LedgerError> {
        self.store.list_closed()
    }

    /// Recompute the performance summary and persist the derived balance,
    /// which is the single source of truth for "current balance".
    pub fn summarize(&self) -> Result<Summary, LedgerError> {
        let closed = self.store.list_closed()?;
        let summary = Summary::compute(&closed, self.settings.starting_balance);
        self.store.set_balance(summary.balance)?;
        Ok(summary)
    }
}
