//! Persistence port for the trade collections and the derived balance.
//!
//! The store is an opaque keyed collaborator. A trade id names exactly one
//! record across both collections; the two multi-record operations
//! ([`StorePort::move_to_closed`], [`StorePort::commit_merge`]) must be
//! atomic so no observer sees a half-closed or half-merged state.

use crate::domain::error::LedgerError;
use crate::domain::trade::{ClosedTrade, OpenTrade, TradeId};

pub trait StorePort {
    /// Persist a new open trade, returning the id assigned to it.
    fn insert_open(&self, trade: &OpenTrade) -> Result<TradeId, LedgerError>;

    fn get_open(&self, id: TradeId) -> Result<Option<OpenTrade>, LedgerError>;

    fn update_open(&self, trade: &OpenTrade) -> Result<(), LedgerError>;

    /// Remove an open trade; `false` when the id was not present.
    fn remove_open(&self, id: TradeId) -> Result<bool, LedgerError>;

    fn list_open(&self) -> Result<Vec<OpenTrade>, LedgerError>;

    fn get_closed(&self, id: TradeId) -> Result<Option<ClosedTrade>, LedgerError>;

    fn update_closed(&self, trade: &ClosedTrade) -> Result<(), LedgerError>;

    fn remove_closed(&self, id: TradeId) -> Result<bool, LedgerError>;

    fn list_closed(&self) -> Result<Vec<ClosedTrade>, LedgerError>;

    /// Atomically delete the open record with `closed.id` and insert the
    /// closed record under the same id.
    fn move_to_closed(&self, closed: &ClosedTrade) -> Result<(), LedgerError>;

    /// Atomically replace the closed record with `merged.id` and delete the
    /// absorbed record.
    fn commit_merge(&self, merged: &ClosedTrade, absorbed: TradeId) -> Result<(), LedgerError>;

    /// Persist the derived account balance.
    fn set_balance(&self, balance: f64) -> Result<(), LedgerError>;

    fn get_balance(&self) -> Result<Option<f64>, LedgerError>;
}
