//! SQLite persistence adapter for the trade collections.
//!
//! The two multi-record operations (close, merge) run inside a single
//! transaction so an observer never sees a trade in both collections or in
//! neither, and never sees a merged base alongside the absorbed record.

use crate::domain::error::LedgerError;
use crate::domain::trade::{ClosedTrade, Direction, OpenTrade, TradeId};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Transaction};

const OPEN_COLUMNS: &str = "id, symbol, direction, entry_price, entry_prices, stop_loss, target, \
     position_value, risk_reward, estimated_total_fee, expected_profit, expected_loss, \
     expected_profit_percent, expected_loss_percent, opened_at, note";

const CLOSED_COLUMNS: &str = "id, symbol, direction, entry_price, entry_prices, stop_loss, target, \
     position_value, opened_at, note, exit_price, closed_at, net_result, entry_fee, exit_fee";

fn store_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Store {
        reason: e.to_string(),
    }
}

fn query_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::StoreQuery {
        reason: e.to_string(),
    }
}

fn join_prices(prices: &[f64]) -> String {
    prices
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn split_prices(raw: &str) -> Result<Vec<f64>, LedgerError> {
    raw.split(',')
        .map(|part| {
            part.parse::<f64>()
                .map_err(|e| query_err(format!("bad stored price {part:?}: {e}")))
        })
        .collect()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| query_err(format!("bad stored timestamp {raw:?}: {e}")))
}

fn parse_direction(raw: &str) -> Result<Direction, LedgerError> {
    raw.parse::<Direction>()
        .map_err(|_| query_err(format!("bad stored direction {raw:?}")))
}

/// Raw open-trade row, converted after the rusqlite closure so conversion
/// failures surface as [`LedgerError::StoreQuery`].
struct OpenRow {
    id: TradeId,
    symbol: String,
    direction: String,
    entry_price: f64,
    entry_prices: String,
    stop_loss: f64,
    target: f64,
    position_value: f64,
    risk_reward: f64,
    estimated_total_fee: f64,
    expected_profit: f64,
    expected_loss: f64,
    expected_profit_percent: f64,
    expected_loss_percent: f64,
    opened_at: String,
    note: String,
}

impl OpenRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(OpenRow {
            id: row.get(0)?,
            symbol: row.get(1)?,
            direction: row.get(2)?,
            entry_price: row.get(3)?,
            entry_prices: row.get(4)?,
            stop_loss: row.get(5)?,
            target: row.get(6)?,
            position_value: row.get(7)?,
            risk_reward: row.get(8)?,
            estimated_total_fee: row.get(9)?,
            expected_profit: row.get(10)?,
            expected_loss: row.get(11)?,
            expected_profit_percent: row.get(12)?,
            expected_loss_percent: row.get(13)?,
            opened_at: row.get(14)?,
            note: row.get(15)?,
        })
    }

    fn into_trade(self) -> Result<OpenTrade, LedgerError> {
        Ok(OpenTrade {
            id: self.id,
            symbol: self.symbol,
            direction: parse_direction(&self.direction)?,
            entry_price: self.entry_price,
            entry_prices: split_prices(&self.entry_prices)?,
            stop_loss: self.stop_loss,
            target: self.target,
            position_value: self.position_value,
            metrics: crate::domain::metrics::TradeMetrics {
                risk_reward: self.risk_reward,
                estimated_total_fee: self.estimated_total_fee,
                expected_profit: self.expected_profit,
                expected_loss: self.expected_loss,
                expected_profit_percent: self.expected_profit_percent,
                expected_loss_percent: self.expected_loss_percent,
            },
            opened_at: parse_timestamp(&self.opened_at)?,
            note: self.note,
        })
    }
}

struct ClosedRow {
    id: TradeId,
    symbol: String,
    direction: String,
    entry_price: f64,
    entry_prices: String,
    stop_loss: f64,
    target: f64,
    position_value: f64,
    opened_at: String,
    note: String,
    exit_price: f64,
    closed_at: String,
    net_result: f64,
    entry_fee: f64,
    exit_fee: f64,
}

impl ClosedRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(ClosedRow {
            id: row.get(0)?,
            symbol: row.get(1)?,
            direction: row.get(2)?,
            entry_price: row.get(3)?,
            entry_prices: row.get(4)?,
            stop_loss: row.get(5)?,
            target: row.get(6)?,
            position_value: row.get(7)?,
            opened_at: row.get(8)?,
            note: row.get(9)?,
            exit_price: row.get(10)?,
            closed_at: row.get(11)?,
            net_result: row.get(12)?,
            entry_fee: row.get(13)?,
            exit_fee: row.get(14)?,
        })
    }

    fn into_trade(self) -> Result<ClosedTrade, LedgerError> {
        Ok(ClosedTrade {
            id: self.id,
            symbol: self.symbol,
            direction: parse_direction(&self.direction)?,
            entry_price: self.entry_price,
            entry_prices: split_prices(&self.entry_prices)?,
            stop_loss: self.stop_loss,
            target: self.target,
            position_value: self.position_value,
            opened_at: parse_timestamp(&self.opened_at)?,
            note: self.note,
            exit_price: self.exit_price,
            closed_at: parse_timestamp(&self.closed_at)?,
            net_result: self.net_result,
            entry_fee: self.entry_fee,
            exit_fee: self.exit_fee,
        })
    }
}

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LedgerError> {
        let db_path = config
            .get_string("store", "path")
            .ok_or_else(|| LedgerError::ConfigMissing {
                section: "store".into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int("store", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(store_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, LedgerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(store_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS open_trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                direction TEXT NOT NULL,
                entry_price REAL NOT NULL,
                entry_prices TEXT NOT NULL,
                stop_loss REAL NOT NULL,
                target REAL NOT NULL,
                position_value REAL NOT NULL,
                risk_reward REAL NOT NULL,
                estimated_total_fee REAL NOT NULL,
                expected_profit REAL NOT NULL,
                expected_loss REAL NOT NULL,
                expected_profit_percent REAL NOT NULL,
                expected_loss_percent REAL NOT NULL,
                opened_at TEXT NOT NULL,
                note TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS closed_trades (
                id INTEGER PRIMARY KEY,
                symbol TEXT NOT NULL,
                direction TEXT NOT NULL,
                entry_price REAL NOT NULL,
                entry_prices TEXT NOT NULL,
                stop_loss REAL NOT NULL,
                target REAL NOT NULL,
                position_value REAL NOT NULL,
                opened_at TEXT NOT NULL,
                note TEXT NOT NULL,
                exit_price REAL NOT NULL,
                closed_at TEXT NOT NULL,
                net_result REAL NOT NULL,
                entry_fee REAL NOT NULL,
                exit_fee REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS bank (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                current_balance REAL NOT NULL
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }

    fn insert_closed_tx(tx: &Transaction<'_>, trade: &ClosedTrade) -> Result<(), LedgerError> {
        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO closed_trades ({CLOSED_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                trade.id,
                trade.symbol,
                trade.direction.as_str(),
                trade.entry_price,
                join_prices(&trade.entry_prices),
                trade.stop_loss,
                trade.target,
                trade.position_value,
                trade.opened_at.to_rfc3339(),
                trade.note,
                trade.exit_price,
                trade.closed_at.to_rfc3339(),
                trade.net_result,
                trade.entry_fee,
                trade.exit_fee,
            ],
        )
        .map_err(query_err)?;
        Ok(())
    }
}

impl StorePort for SqliteStore {
    fn insert_open(&self, trade: &OpenTrade) -> Result<TradeId, LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;

        conn.execute(
            "INSERT INTO open_trades (symbol, direction, entry_price, entry_prices, stop_loss,
                 target, position_value, risk_reward, estimated_total_fee, expected_profit,
                 expected_loss, expected_profit_percent, expected_loss_percent, opened_at, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                trade.symbol,
                trade.direction.as_str(),
                trade.entry_price,
                join_prices(&trade.entry_prices),
                trade.stop_loss,
                trade.target,
                trade.position_value,
                trade.metrics.risk_reward,
                trade.metrics.estimated_total_fee,
                trade.metrics.expected_profit,
                trade.metrics.expected_loss,
                trade.metrics.expected_profit_percent,
                trade.metrics.expected_loss_percent,
                trade.opened_at.to_rfc3339(),
                trade.note,
            ],
        )
        .map_err(query_err)?;

        Ok(conn.last_insert_rowid())
    }

    fn get_open(&self, id: TradeId) -> Result<Option<OpenTrade>, LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;

        let row = conn
            .query_row(
                &format!("SELECT {OPEN_COLUMNS} FROM open_trades WHERE id = ?1"),
                params![id],
                OpenRow::from_row,
            )
            .optional()
            .map_err(query_err)?;

        row.map(OpenRow::into_trade).transpose()
    }

    fn update_open(&self, trade: &OpenTrade) -> Result<(), LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;

        let affected = conn
            .execute(
                "UPDATE open_trades
                 SET symbol = ?2, direction = ?3, entry_price = ?4, entry_prices = ?5,
                     stop_loss = ?6, target = ?7, position_value = ?8, risk_reward = ?9,
                     estimated_total_fee = ?10, expected_profit = ?11, expected_loss = ?12,
                     expected_profit_percent = ?13, expected_loss_percent = ?14, note = ?15
                 WHERE id = ?1",
                params![
                    trade.id,
                    trade.symbol,
                    trade.direction.as_str(),
                    trade.entry_price,
                    join_prices(&trade.entry_prices),
                    trade.stop_loss,
                    trade.target,
                    trade.position_value,
                    trade.metrics.risk_reward,
                    trade.metrics.estimated_total_fee,
                    trade.metrics.expected_profit,
                    trade.metrics.expected_loss,
                    trade.metrics.expected_profit_percent,
                    trade.metrics.expected_loss_percent,
                    trade.note,
                ],
            )
            .map_err(query_err)?;

        if affected == 0 {
            return Err(LedgerError::NotFound { id: trade.id });
        }
        Ok(())
    }

    fn remove_open(&self, id: TradeId) -> Result<bool, LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;
        let affected = conn
            .execute("DELETE FROM open_trades WHERE id = ?1", params![id])
            .map_err(query_err)?;
        Ok(affected > 0)
    }

    fn list_open(&self) -> Result<Vec<OpenTrade>, LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {OPEN_COLUMNS} FROM open_trades ORDER BY id"))
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], OpenRow::from_row)
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_err)?.into_trade()?);
        }
        Ok(trades)
    }

    fn get_closed(&self, id: TradeId) -> Result<Option<ClosedTrade>, LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;

        let row = conn
            .query_row(
                &format!("SELECT {CLOSED_COLUMNS} FROM closed_trades WHERE id = ?1"),
                params![id],
                ClosedRow::from_row,
            )
            .optional()
            .map_err(query_err)?;

        row.map(ClosedRow::into_trade).transpose()
    }

    fn update_closed(&self, trade: &ClosedTrade) -> Result<(), LedgerError> {
        let mut conn = self.pool.get().map_err(store_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        let present: bool = tx
            .query_row(
                "SELECT COUNT(*) FROM closed_trades WHERE id = ?1",
                params![trade.id],
                |row| row.get::<_, i64>(0),
            )
            .map_err(query_err)?
            > 0;
        if !present {
            return Err(LedgerError::NotFound { id: trade.id });
        }

        Self::insert_closed_tx(&tx, trade)?;
        tx.commit().map_err(query_err)?;
        Ok(())
    }

    fn remove_closed(&self, id: TradeId) -> Result<bool, LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;
        let affected = conn
            .execute("DELETE FROM closed_trades WHERE id = ?1", params![id])
            .map_err(query_err)?;
        Ok(affected > 0)
    }

    fn list_closed(&self) -> Result<Vec<ClosedTrade>, LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CLOSED_COLUMNS} FROM closed_trades ORDER BY closed_at, id"
            ))
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], ClosedRow::from_row)
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_err)?.into_trade()?);
        }
        Ok(trades)
    }

    fn move_to_closed(&self, closed: &ClosedTrade) -> Result<(), LedgerError> {
        let mut conn = self.pool.get().map_err(store_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        let affected = tx
            .execute("DELETE FROM open_trades WHERE id = ?1", params![closed.id])
            .map_err(query_err)?;
        if affected == 0 {
            return Err(LedgerError::NotFound { id: closed.id });
        }

        Self::insert_closed_tx(&tx, closed)?;
        tx.commit().map_err(query_err)?;
        Ok(())
    }

    fn commit_merge(&self, merged: &ClosedTrade, absorbed: TradeId) -> Result<(), LedgerError> {
        let mut conn = self.pool.get().map_err(store_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        Self::insert_closed_tx(&tx, merged)?;
        let affected = tx
            .execute("DELETE FROM closed_trades WHERE id = ?1", params![absorbed])
            .map_err(query_err)?;
        if affected == 0 {
            return Err(LedgerError::NotFound { id: absorbed });
        }

        tx.commit().map_err(query_err)?;
        Ok(())
    }

    fn set_balance(&self, balance: f64) -> Result<(), LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;
        conn.execute(
            "INSERT INTO bank (id, current_balance) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET current_balance = excluded.current_balance",
            params![balance],
        )
        .map_err(query_err)?;
        Ok(())
    }

    fn get_balance(&self) -> Result<Option<f64>, LedgerError> {
        let conn = self.pool.get().map_err(store_err)?;
        conn.query_row("SELECT current_balance FROM bank WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(query_err)
    }
}
