//! Deterministic fold over a historical candle array.
//!
//! The backtest trades the liquidity-sweep + break-of-structure strategy
//! with a resting limit order and a bar-range fill model; it is
//! intentionally a separate strategy from the live engine's confluence
//! entries. Per bar, in order: manage the active trade, update drawdown,
//! apply the daily-loss gate, manage the pending order, then look for a
//! new setup.

use crate::report::BacktestReport;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smc_trade_core::{
    aggregate, Candle, CloseReason, ClosedTrade, PendingOrder, Side, Timeframe,
};
use smc_trade_strategy::{atr, bos_order_block, liquidity_sweep};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Working timeframe the source candles are aggregated into.
    pub interval: Timeframe,
    pub initial_balance: Decimal,
    pub fee_rate: Decimal,
    /// Fixed fractional risk capital per trade; fill size is
    /// `risk_per_trade / stop_distance`.
    pub risk_per_trade: Decimal,
    /// Bars a pending order may rest before it expires.
    pub max_pending_bars: usize,
    /// Minimum reward:risk ratio a setup must offer.
    pub min_reward_risk: Decimal,
    /// Realized loss in a UTC day that blocks new entries until rollover.
    pub daily_loss_limit: Decimal,
    /// Allowed entry window `[start, end)` in UTC hours.
    pub trading_hours_utc: (u32, u32),
    pub sweep_lookback: usize,
    pub swing_lookback: usize,
    pub atr_period: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            interval: Timeframe::M15,
            initial_balance: Decimal::from(10_000),
            fee_rate: Decimal::new(4, 4),
            risk_per_trade: Decimal::from(100),
            max_pending_bars: 12,
            min_reward_risk: Decimal::new(15, 1),
            daily_loss_limit: Decimal::from(300),
            trading_hours_utc: (0, 24),
            sweep_lookback: 20,
            swing_lookback: 10,
            atr_period: 14,
        }
    }
}

/// A filled backtest trade awaiting its exit.
#[derive(Debug, Clone)]
struct ActiveTrade {
    side: Side,
    entry_price: Decimal,
    sl_price: Decimal,
    tp_price: Decimal,
    /// Units (quantity), not notional.
    quantity: Decimal,
    open_fee: Decimal,
    open_time: chrono::DateTime<chrono::Utc>,
}

/// A qualified sweep + order-block setup.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TradeSetup {
    side: Side,
    entry_price: Decimal,
    sl_price: Decimal,
    tp_price: Decimal,
}

/// Runs the simulator over source candles and aggregates the outcome.
#[must_use]
pub fn run(source: &[Candle], config: &BacktestConfig) -> BacktestReport {
    let candles = aggregate(source, config.interval);

    let mut balance = config.initial_balance;
    let mut peak_equity = balance;
    let mut max_drawdown = Decimal::ZERO;
    let mut trades: Vec<ClosedTrade> = Vec::new();
    let mut active: Option<ActiveTrade> = None;
    let mut pending: Option<PendingOrder> = None;
    let mut day: Option<NaiveDate> = None;
    let mut pnl_today = Decimal::ZERO;
    let mut entries_blocked = false;

    for (i, bar) in candles.iter().enumerate() {
        debug_assert!(
            !(active.is_some() && pending.is_some()),
            "active trade and pending order may never coexist"
        );

        let bar_day = bar.time.date_naive();
        if day != Some(bar_day) {
            day = Some(bar_day);
            pnl_today = Decimal::ZERO;
            entries_blocked = false;
        }

        // 1. Manage the active trade against the bar's full range.
        if let Some(trade) = active.take() {
            if let Some((exit_price, reason)) = exit_on_bar(&trade, bar) {
                let closed = realize(&trade, exit_price, reason, config.fee_rate, bar);
                balance += closed.net_pnl;
                pnl_today += closed.net_pnl;
                trades.push(closed);
            } else {
                active = Some(trade);
            }
        }

        // 2. Drawdown tracking on realized equity.
        if balance > peak_equity {
            peak_equity = balance;
        }
        if peak_equity > Decimal::ZERO {
            let drawdown = (peak_equity - balance) / peak_equity;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        // 3. Daily-loss gate: no new entries for the rest of the day.
        if !entries_blocked && pnl_today <= -config.daily_loss_limit {
            entries_blocked = true;
            if pending.take().is_some() {
                tracing::debug!(day = %bar_day, "pending order cancelled by daily-loss gate");
            }
        }

        // 4. Manage the pending order: expire, invalidate, or fill.
        if active.is_none() {
            if let Some(order) = pending.take() {
                if i.saturating_sub(order.setup_index) >= config.max_pending_bars {
                    tracing::debug!(entry = %order.entry_price, "pending order expired");
                } else if stop_breached(&order, bar) {
                    tracing::debug!(entry = %order.entry_price, "pending order invalidated");
                } else if bar.low <= order.entry_price && order.entry_price <= bar.high {
                    active = Some(fill(&order, config, bar));
                } else {
                    pending = Some(order);
                }
            }
        }

        // 5. Look for a new setup when flat and inside trading hours.
        if active.is_none()
            && pending.is_none()
            && !entries_blocked
            && in_trading_hours(bar, config.trading_hours_utc)
        {
            if let Some(setup) = find_setup(&candles[..=i], config) {
                pending = Some(PendingOrder {
                    side: setup.side,
                    entry_price: setup.entry_price,
                    sl_price: setup.sl_price,
                    tp_price: setup.tp_price,
                    setup_index: i,
                });
            }
        }
    }

    // Force-close anything still open on the final bar.
    if let (Some(trade), Some(last)) = (active, candles.last()) {
        let closed = realize(&trade, last.close, CloseReason::EndOfData, config.fee_rate, last);
        balance += closed.net_pnl;
        trades.push(closed);
    }

    BacktestReport::from_trades(&trades, balance, max_drawdown)
}

/// Stop/target check against the bar's high/low. The stop is checked
/// first: when one bar spans both levels the conservative assumption is
/// that the stop was hit.
fn exit_on_bar(trade: &ActiveTrade, bar: &Candle) -> Option<(Decimal, CloseReason)> {
    match trade.side {
        Side::Long => {
            if bar.low <= trade.sl_price {
                Some((trade.sl_price, CloseReason::StopLoss))
            } else if bar.high >= trade.tp_price {
                Some((trade.tp_price, CloseReason::TakeProfit))
            } else {
                None
            }
        }
        Side::Short => {
            if bar.high >= trade.sl_price {
                Some((trade.sl_price, CloseReason::StopLoss))
            } else if bar.low <= trade.tp_price {
                Some((trade.tp_price, CloseReason::TakeProfit))
            } else {
                None
            }
        }
    }
}

/// A pending order dies when the bar trades through its stop level before
/// the entry could fill.
fn stop_breached(order: &PendingOrder, bar: &Candle) -> bool {
    match order.side {
        Side::Long => bar.low <= order.sl_price,
        Side::Short => bar.high >= order.sl_price,
    }
}

fn fill(order: &PendingOrder, config: &BacktestConfig, bar: &Candle) -> ActiveTrade {
    let stop_distance = (order.entry_price - order.sl_price).abs();
    let quantity = config.risk_per_trade / stop_distance;
    let open_fee = order.entry_price * quantity * config.fee_rate;
    tracing::debug!(
        side = ?order.side,
        entry = %order.entry_price,
        qty = %quantity,
        "pending order filled"
    );
    ActiveTrade {
        side: order.side,
        entry_price: order.entry_price,
        sl_price: order.sl_price,
        tp_price: order.tp_price,
        quantity,
        open_fee,
        open_time: bar.time,
    }
}

fn realize(
    trade: &ActiveTrade,
    exit_price: Decimal,
    reason: CloseReason,
    fee_rate: Decimal,
    bar: &Candle,
) -> ClosedTrade {
    let gross = match trade.side {
        Side::Long => (exit_price - trade.entry_price) * trade.quantity,
        Side::Short => (trade.entry_price - exit_price) * trade.quantity,
    };
    let close_fee = exit_price * trade.quantity * fee_rate;

    ClosedTrade {
        side: trade.side,
        entry_price: trade.entry_price,
        exit_price,
        size: trade.entry_price * trade.quantity,
        net_pnl: gross - trade.open_fee - close_fee,
        reason,
        open_time: trade.open_time,
        close_time: bar.time,
    }
}

fn in_trading_hours(bar: &Candle, (start, end): (u32, u32)) -> bool {
    use chrono::Timelike;
    let hour = bar.time.hour();
    hour >= start && hour < end
}

/// A valid setup needs a liquidity sweep and a BOS-validated order block
/// agreeing on direction, with the zone midpoint as entry, the far edge
/// of the zone as stop, the recent extreme as target, and a reward:risk
/// at or above the configured minimum.
fn find_setup(window: &[Candle], config: &BacktestConfig) -> Option<TradeSetup> {
    let atr_value = atr(window, config.atr_period);
    let sweep = liquidity_sweep(window, config.sweep_lookback, atr_value)?;
    let zone = bos_order_block(window, config.swing_lookback)?;
    if zone.side != sweep.side {
        return None;
    }

    let recent = &window[window.len().saturating_sub(config.swing_lookback + 1)..];
    let entry = zone.midpoint;
    let (stop, target) = match zone.side {
        Side::Long => (
            zone.low,
            recent.iter().map(|c| c.high).max().unwrap_or(entry),
        ),
        Side::Short => (
            zone.high,
            recent.iter().map(|c| c.low).min().unwrap_or(entry),
        ),
    };

    let risk = (entry - stop).abs();
    if risk == Decimal::ZERO {
        return None;
    }
    let reward = match zone.side {
        Side::Long => target - entry,
        Side::Short => entry - target,
    };
    if reward <= Decimal::ZERO || reward / risk < config.min_reward_risk {
        return None;
    }

    tracing::debug!(
        side = ?zone.side,
        entry = %entry,
        stop = %stop,
        target = %target,
        pool = %sweep.pool_level,
        "sweep setup found"
    );
    Some(TradeSetup {
        side: zone.side,
        entry_price: entry,
        sl_price: stop,
        tp_price: target,
    })
}
