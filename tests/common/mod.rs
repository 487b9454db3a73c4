#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use tradelog::adapters::sqlite_store::SqliteStore;
use tradelog::domain::error::LedgerError;
use tradelog::domain::ledger::{Ledger, LedgerSettings, NewTrade};
use tradelog::domain::trade::{ClosedTrade, Direction, OpenTrade, TradeId};
use tradelog::ports::store_port::StorePort;

pub const FEE_RATE: f64 = 0.00075;
pub const STARTING_BALANCE: f64 = 3881.0;

/// In-process store double. Tracks write counts and can be told to fail all
/// writes, which the SQLite adapter cannot do on demand.
pub struct MockStore {
    pub open: RefCell<BTreeMap<TradeId, OpenTrade>>,
    pub closed: RefCell<BTreeMap<TradeId, ClosedTrade>>,
    pub balance: Cell<Option<f64>>,
    pub next_id: Cell<TradeId>,
    pub writes: Cell<usize>,
    pub write_error: RefCell<Option<String>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            open: RefCell::new(BTreeMap::new()),
            closed: RefCell::new(BTreeMap::new()),
            balance: Cell::new(None),
            next_id: Cell::new(1),
            writes: Cell::new(0),
            write_error: RefCell::new(None),
        }
    }

    pub fn with_closed(self, trades: Vec<ClosedTrade>) -> Self {
        {
            let mut closed = self.closed.borrow_mut();
            for trade in trades {
                closed.insert(trade.id, trade);
            }
        }
        self
    }

    pub fn fail_writes(&self, reason: &str) {
        *self.write_error.borrow_mut() = Some(reason.to_string());
    }

    fn check_write(&self) -> Result<(), LedgerError> {
        if let Some(reason) = self.write_error.borrow().as_ref() {
            return Err(LedgerError::Store {
                reason: reason.clone(),
            });
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl StorePort for &MockStore {
    fn insert_open(&self, trade: &OpenTrade) -> Result<TradeId, LedgerError> {
        self.check_write()?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let mut stored = trade.clone();
        stored.id = id;
        self.open.borrow_mut().insert(id, stored);
        Ok(id)
    }

    fn get_open(&self, id: TradeId) -> Result<Option<OpenTrade>, LedgerError> {
        Ok(self.open.borrow().get(&id).cloned())
    }

    fn update_open(&self, trade: &OpenTrade) -> Result<(), LedgerError> {
        self.check_write()?;
        match self.open.borrow_mut().get_mut(&trade.id) {
            Some(stored) => {
                *stored = trade.clone();
                Ok(())
            }
            None => Err(LedgerError::NotFound { id: trade.id }),
        }
    }

    fn remove_open(&self, id: TradeId) -> Result<bool, LedgerError> {
        self.check_write()?;
        Ok(self.open.borrow_mut().remove(&id).is_some())
    }

    fn list_open(&self) -> Result<Vec<OpenTrade>, LedgerError> {
        Ok(self.open.borrow().values().cloned().collect())
    }

    fn get_closed(&self, id: TradeId) -> Result<Option<ClosedTrade>, LedgerError> {
        Ok(self.closed.borrow().get(&id).cloned())
    }

    fn update_closed(&self, trade: &ClosedTrade) -> Result<(), LedgerError> {
        self.check_write()?;
        match self.closed.borrow_mut().get_mut(&trade.id) {
            Some(stored) => {
                *stored = trade.clone();
                Ok(())
            }
            None => Err(LedgerError::NotFound { id: trade.id }),
        }
    }

    fn remove_closed(&self, id: TradeId) -> Result<bool, LedgerError> {
        self.check_write()?;
        Ok(self.closed.borrow_mut().remove(&id).is_some())
    }

    fn list_closed(&self) -> Result<Vec<ClosedTrade>, LedgerError> {
        Ok(self.closed.borrow().values().cloned().collect())
    }

    fn move_to_closed(&self, closed: &ClosedTrade) -> Result<(), LedgerError> {
        self.check_write()?;
        if self.open.borrow_mut().remove(&closed.id).is_none() {
            return Err(LedgerError::NotFound { id: closed.id });
        }
        self.closed.borrow_mut().insert(closed.id, closed.clone());
        Ok(())
    }

    fn commit_merge(&self, merged: &ClosedTrade, absorbed: TradeId) -> Result<(), LedgerError> {
        self.check_write()?;
        if self.closed.borrow_mut().remove(&absorbed).is_none() {
            return Err(LedgerError::NotFound { id: absorbed });
        }
        self.closed.borrow_mut().insert(merged.id, merged.clone());
        Ok(())
    }

    fn set_balance(&self, balance: f64) -> Result<(), LedgerError> {
        self.check_write()?;
        self.balance.set(Some(balance));
        Ok(())
    }

    fn get_balance(&self) -> Result<Option<f64>, LedgerError> {
        Ok(self.balance.get())
    }
}

pub fn settings() -> LedgerSettings {
    LedgerSettings {
        fee_rate: FEE_RATE,
        starting_balance: STARTING_BALANCE,
    }
}

pub fn sqlite_ledger() -> Ledger<SqliteStore> {
    let store = SqliteStore::in_memory().unwrap();
    store.initialize_schema().unwrap();
    Ledger::new(store, settings())
}

pub fn mock_ledger(store: &MockStore) -> Ledger<&MockStore> {
    Ledger::new(store, settings())
}

pub fn long_request(symbol: &str) -> NewTrade {
    NewTrade {
        symbol: symbol.to_string(),
        direction: Direction::Long,
        entry: 100.0,
        stop_loss: 95.0,
        target: 120.0,
        size: 1000.0,
    }
}

pub fn short_request(symbol: &str) -> NewTrade {
    NewTrade {
        symbol: symbol.to_string(),
        direction: Direction::Short,
        entry: 100.0,
        stop_loss: 105.0,
        target: 80.0,
        size: 1000.0,
    }
}

/// Closed trade with a forced net result, for aggregator fixtures.
pub fn closed_with_net(id: TradeId, net: f64) -> ClosedTrade {
    use chrono::{TimeZone, Utc};
    let at = Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap();
    let mut trade = OpenTrade::new("BTC", Direction::Long, 100.0, 95.0, 120.0, 1000.0, FEE_RATE, at)
        .unwrap();
    trade.id = id;
    let mut closed = trade.close(110.0, FEE_RATE, at).unwrap();
    closed.net_result = net;
    closed
}
