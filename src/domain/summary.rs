//! Portfolio-level statistics over the closed-trade collection.

use super::trade::ClosedTrade;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub wins: usize,
    pub losses: usize,
    pub gross_profit: f64,
    pub gross_loss: f64,
    /// Percent of closed trades with a strictly positive net result.
    pub win_rate: f64,
    /// `f64::INFINITY` when there are wins but no gross loss.
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub reward_risk: f64,
    pub total_pl: f64,
    /// `starting_balance + total_pl`; derived, the canonical account balance.
    pub balance: f64,
}

impl Summary {
    /// Recompute the full summary from scratch.
    ///
    /// A trade counts as a win only when `net_result > 0`; a zero net result
    /// is a loss (the fees decided the trade).
    pub fn compute(closed: &[ClosedTrade], starting_balance: f64) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;

        for trade in closed {
            if trade.net_result > 0.0 {
                wins += 1;
                gross_profit += trade.net_result;
            } else {
                losses += 1;
                gross_loss += trade.net_result.abs();
            }
        }

        let total = wins + losses;
        let win_rate = if total > 0 {
            wins as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if wins > 0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if wins > 0 {
            gross_profit / wins as f64
        } else {
            0.0
        };
        let avg_loss = if losses > 0 {
            gross_loss / losses as f64
        } else {
            0.0
        };
        let reward_risk = if avg_loss > 0.0 { avg_win / avg_loss } else { 0.0 };

        let total_pl = gross_profit - gross_loss;

        Summary {
            wins,
            losses,
            gross_profit,
            gross_loss,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            reward_risk,
            total_pl,
            balance: starting_balance + total_pl,
        }
    }
}
