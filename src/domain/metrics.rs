//! Risk/reward and fee-adjusted expectancy for a single trade.

use super::trade::Direction;

/// Derived per-trade metrics. Recomputed from the trade's fields on every
/// mutation, never edited independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TradeMetrics {
    pub risk_reward: f64,
    pub estimated_total_fee: f64,
    pub expected_profit: f64,
    pub expected_loss: f64,
    pub expected_profit_percent: f64,
    pub expected_loss_percent: f64,
}

impl TradeMetrics {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Compute metrics for an entry/stop/target/size combination.
    ///
    /// Pure and deterministic. Called speculatively while the user is still
    /// typing, so invalid inputs (non-finite or non-positive) produce all-zero
    /// metrics rather than an error.
    pub fn compute(
        entry: f64,
        stop_loss: f64,
        target: f64,
        position_value: f64,
        direction: Direction,
        fee_rate: f64,
    ) -> Self {
        if [entry, stop_loss, target, position_value]
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.0)
        {
            return Self::zero();
        }

        let quantity = position_value / entry;
        let entry_fee = position_value * fee_rate;

        let (potential_profit, potential_loss) = match direction {
            Direction::Long => (
                quantity * (target - entry),
                quantity * (entry - stop_loss),
            ),
            Direction::Short => (
                quantity * (entry - target),
                quantity * (stop_loss - entry),
            ),
        };

        let risk_reward = if potential_loss > 0.0 {
            potential_profit / potential_loss
        } else {
            0.0
        };

        // Exit fees are estimated on the notional the position would have at
        // the exit price, not the notional at entry.
        let exit_fee_at_target = (target / entry) * position_value * fee_rate;
        let exit_fee_at_stop = (stop_loss / entry) * position_value * fee_rate;

        let estimated_total_fee = entry_fee + exit_fee_at_target;
        let expected_profit = potential_profit - estimated_total_fee;
        let expected_loss = potential_loss + entry_fee + exit_fee_at_stop;

        TradeMetrics {
            risk_reward,
            estimated_total_fee,
            expected_profit,
            expected_loss,
            expected_profit_percent: expected_profit / position_value * 100.0,
            expected_loss_percent: expected_loss / position_value * 100.0,
        }
    }
}
