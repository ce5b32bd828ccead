use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smc_trade_core::ClosedTrade;

/// Aggregate performance of one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    /// Gross profit over gross loss; `+inf` when there are no losing
    /// trades but positive profit, 0 otherwise.
    pub profit_factor: f64,
    /// Mean net PnL per trade.
    pub expectancy: Decimal,
    pub max_drawdown_pct: f64,
    pub net_pnl: Decimal,
    pub final_balance: Decimal,
}

impl BacktestReport {
    /// Builds the report from realized trades and the drawdown observed
    /// during the run.
    #[must_use]
    pub fn from_trades(
        trades: &[ClosedTrade],
        final_balance: Decimal,
        max_drawdown: Decimal,
    ) -> Self {
        let wins = trades.iter().filter(|t| t.net_pnl > Decimal::ZERO).count();
        let losses = trades.iter().filter(|t| t.net_pnl < Decimal::ZERO).count();

        let gross_profit: Decimal = trades
            .iter()
            .filter(|t| t.net_pnl > Decimal::ZERO)
            .map(|t| t.net_pnl)
            .sum();
        let gross_loss: Decimal = trades
            .iter()
            .filter(|t| t.net_pnl < Decimal::ZERO)
            .map(|t| -t.net_pnl)
            .sum();

        let profit_factor = if gross_loss > Decimal::ZERO {
            (gross_profit / gross_loss).to_f64().unwrap_or(0.0)
        } else if gross_profit > Decimal::ZERO {
            f64::INFINITY
        } else {
            0.0
        };

        #[allow(clippy::cast_precision_loss)]
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            wins as f64 / trades.len() as f64
        };

        let net_pnl: Decimal = trades.iter().map(|t| t.net_pnl).sum();
        let expectancy = if trades.is_empty() {
            Decimal::ZERO
        } else {
            net_pnl / Decimal::from(trades.len())
        };

        Self {
            total_trades: trades.len(),
            wins,
            losses,
            win_rate,
            profit_factor,
            expectancy,
            max_drawdown_pct: (max_drawdown * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0),
            net_pnl,
            final_balance,
        }
    }
}
