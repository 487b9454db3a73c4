//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_store::SqliteStore;
use crate::domain::edit::{EditField, EditOutcome};
use crate::domain::error::LedgerError;
use crate::domain::ledger::{Collection, Ledger, LedgerSettings, NewTrade};
use crate::domain::summary::Summary;
use crate::domain::trade::{ClosedTrade, Direction, OpenTrade, TradeId};

#[derive(Parser, Debug)]
#[command(name = "tradelog", about = "Personal trade ledger and P&L engine")]
pub struct Cli {
    /// Path to the INI config file
    #[arg(short, long, global = true, default_value = "tradelog.ini")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a new trade
    Add {
        #[arg(long)]
        symbol: String,
        /// Long or Short
        #[arg(long)]
        direction: String,
        #[arg(long)]
        entry: f64,
        #[arg(long)]
        stop: f64,
        #[arg(long)]
        target: f64,
        /// Position value in quote currency
        #[arg(long)]
        size: f64,
    },
    /// Edit one field of an open trade
    Edit {
        id: TradeId,
        /// entry, stoploss, target, size or entry_prices
        field: String,
        /// Raw value; stray characters are stripped from numbers
        value: String,
    },
    /// Add a staggered entry to an open position
    AddEntry {
        id: TradeId,
        #[arg(long)]
        price: f64,
        /// Value of the new fill in quote currency
        #[arg(long)]
        value: f64,
    },
    /// Close an open trade at an exit price
    Close {
        id: TradeId,
        #[arg(long)]
        exit: f64,
    },
    /// Merge a closed trade into another closed trade of the same
    /// symbol and direction
    Merge {
        #[arg(long)]
        base: TradeId,
        #[arg(long)]
        absorbed: TradeId,
    },
    /// Delete a trade
    Delete {
        id: TradeId,
        /// Target the closed collection instead of the open one
        #[arg(long)]
        closed: bool,
    },
    /// Replace a trade's note
    Note {
        id: TradeId,
        text: String,
        #[arg(long)]
        closed: bool,
    },
    /// List trades
    List {
        #[arg(long)]
        closed: bool,
    },
    /// Show the performance summary and persist the derived balance
    Summary,
    /// Export closed trades to CSV
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let ledger = match build_ledger(&cli.config) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match dispatch(&ledger, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn build_ledger(config_path: &PathBuf) -> Result<Ledger<SqliteStore>, LedgerError> {
    let adapter =
        FileConfigAdapter::from_file(config_path).map_err(|e| LedgerError::ConfigParse {
            file: config_path.display().to_string(),
            reason: e.to_string(),
        })?;

    let store = SqliteStore::from_config(&adapter)?;
    store.initialize_schema()?;
    Ok(Ledger::new(store, LedgerSettings::from_config(&adapter)))
}

fn dispatch(ledger: &Ledger<SqliteStore>, command: Command) -> Result<(), LedgerError> {
    match command {
        Command::Add {
            symbol,
            direction,
            entry,
            stop,
            target,
            size,
        } => {
            let direction: Direction = direction.parse()?;
            let trade = ledger.open_trade(&NewTrade {
                symbol,
                direction,
                entry,
                stop_loss: stop,
                target,
                size,
            })?;
            println!(
                "opened trade {} {} {} entry {:.4} size {:.2} rr {:.2}",
                trade.id,
                trade.direction,
                trade.symbol,
                trade.entry_price,
                trade.position_value,
                trade.metrics.risk_reward
            );
            Ok(())
        }
        Command::Edit { id, field, value } => {
            let field: EditField = field.parse()?;
            let result = ledger.edit_field(id, field, &value)?;
            match result.outcome {
                EditOutcome::Updated => print_open_trade(&result.trade),
                EditOutcome::Unchanged => {
                    println!("trade {id}: {} unchanged", field.as_str())
                }
            }
            Ok(())
        }
        Command::AddEntry { id, price, value } => {
            let trade = ledger.add_entry(id, price, value)?;
            println!(
                "trade {}: {} fills, avg entry {:.4}, size {:.2}",
                trade.id,
                trade.entry_prices.len(),
                trade.entry_price,
                trade.position_value
            );
            Ok(())
        }
        Command::Close { id, exit } => {
            let closed = ledger.close_trade(id, exit)?;
            println!(
                "closed trade {} at {:.4}: net {:+.2} (fees {:.2})",
                closed.id,
                closed.exit_price,
                closed.net_result,
                closed.entry_fee + closed.exit_fee
            );
            print_summary(&ledger.summarize()?);
            Ok(())
        }
        Command::Merge { base, absorbed } => {
            let merged = ledger.merge(base, absorbed)?;
            println!(
                "merged trade {absorbed} into {}: entry {:.4}, exit {:.4}, net {:+.2}",
                merged.id, merged.entry_price, merged.exit_price, merged.net_result
            );
            print_summary(&ledger.summarize()?);
            Ok(())
        }
        Command::Delete { id, closed } => {
            let collection = if closed {
                Collection::Closed
            } else {
                Collection::Open
            };
            ledger.delete(id, collection)?;
            println!("deleted trade {id}");
            if closed {
                print_summary(&ledger.summarize()?);
            }
            Ok(())
        }
        Command::Note { id, text, closed } => {
            let collection = if closed {
                Collection::Closed
            } else {
                Collection::Open
            };
            ledger.set_note(id, collection, &text)?;
            println!("trade {id}: note replaced");
            Ok(())
        }
        Command::List { closed } => {
            if closed {
                let trades = ledger.closed_trades()?;
                eprintln!("{} closed trades", trades.len());
                for trade in &trades {
                    print_closed_trade(trade);
                }
            } else {
                let trades = ledger.open_trades()?;
                eprintln!("{} open trades", trades.len());
                for trade in &trades {
                    print_open_trade(trade);
                }
            }
            Ok(())
        }
        Command::Summary => {
            print_summary(&ledger.summarize()?);
            Ok(())
        }
        Command::Export { output } => {
            let trades = ledger.closed_trades()?;
            csv_adapter::export_to_path(&trades, &output)?;
            eprintln!("exported {} closed trades to {}", trades.len(), output.display());
            Ok(())
        }
    }
}

fn print_open_trade(trade: &OpenTrade) {
    println!(
        "{:>4}  {:<6} {:<5} entry {:<10.4} stop {:<10.4} target {:<10.4} size {:<10.2} rr {:.2}",
        trade.id,
        trade.symbol,
        trade.direction.as_str(),
        trade.entry_price,
        trade.stop_loss,
        trade.target,
        trade.position_value,
        trade.metrics.risk_reward
    );
}

fn print_closed_trade(trade: &ClosedTrade) {
    println!(
        "{:>4}  {:<6} {:<5} entry {:<10.4} exit {:<10.4} size {:<10.2} net {:+.2}",
        trade.id,
        trade.symbol,
        trade.direction.as_str(),
        trade.entry_price,
        trade.exit_price,
        trade.position_value,
        trade.net_result
    );
}

fn print_summary(summary: &Summary) {
    let profit_factor = if summary.profit_factor.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", summary.profit_factor)
    };
    println!(
        "trades {} (W {} / L {})  win rate {:.1}%  profit factor {}",
        summary.wins + summary.losses,
        summary.wins,
        summary.losses,
        summary.win_rate,
        profit_factor
    );
    println!(
        "avg win {:.2}  avg loss {:.2}  reward:risk {:.2}",
        summary.avg_win, summary.avg_loss, summary.reward_risk
    );
    println!(
        "total P&L {:+.2}  balance {:.2}",
        summary.total_pl, summary.balance
    );
}
