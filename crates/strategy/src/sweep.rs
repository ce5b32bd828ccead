//! Liquidity-sweep and break-of-structure detection.
//!
//! These are the stricter recognizers the backtest strategy trades:
//! a sweep of a pool of equal highs/lows, confirmed by the close
//! rejecting back inside, paired with an order block validated by a
//! break of structure. Intentionally separate from the live engine's
//! simpler gap/order-block detector.

use rust_decimal::Decimal;
use smc_trade_core::{Candle, Side};

/// Minimum number of approximately equal extremes to form a pool.
const MIN_POOL_SIZE: usize = 2;

/// A confirmed stop-hunt beyond a pool of equal highs or lows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSignal {
    /// Trade direction the sweep implies (a swept high pool signals
    /// Short, a swept low pool signals Long).
    pub side: Side,
    pub pool_level: Decimal,
}

/// An order block validated by a break of structure; its body span is the
/// candidate entry zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBlockZone {
    pub side: Side,
    pub low: Decimal,
    pub high: Decimal,
    pub midpoint: Decimal,
}

/// Price tolerance for "approximately equal" extremes:
/// `max(0.2 * ATR, 0.08% of price)`.
#[must_use]
pub fn pool_tolerance(atr_value: Decimal, price: Decimal) -> Decimal {
    let atr_part = atr_value * Decimal::new(2, 1);
    let pct_part = price * Decimal::new(8, 4);
    atr_part.max(pct_part)
}

/// Detects a liquidity sweep on the current (last) candle against a pool
/// of equal highs or lows in the preceding `lookback` candles.
///
/// A high pool is swept when the candle's high exceeds the pool by more
/// than the tolerance but the close falls back below the pool level;
/// mirrored for lows. The high-side check runs first.
#[must_use]
pub fn liquidity_sweep(candles: &[Candle], lookback: usize, atr_value: Decimal) -> Option<SweepSignal> {
    if candles.len() < lookback + 1 || lookback < MIN_POOL_SIZE {
        return None;
    }
    let current = &candles[candles.len() - 1];
    let window = &candles[candles.len() - 1 - lookback..candles.len() - 1];
    let tolerance = pool_tolerance(atr_value, current.close);

    let pool_high = window
        .iter()
        .map(|c| c.high)
        .max()
        .unwrap_or(Decimal::ZERO);
    let equal_highs = window
        .iter()
        .filter(|c| pool_high - c.high <= tolerance)
        .count();
    if equal_highs >= MIN_POOL_SIZE
        && current.high > pool_high + tolerance
        && current.close < pool_high
    {
        return Some(SweepSignal {
            side: Side::Short,
            pool_level: pool_high,
        });
    }

    let pool_low = window.iter().map(|c| c.low).min().unwrap_or(Decimal::ZERO);
    let equal_lows = window
        .iter()
        .filter(|c| c.low - pool_low <= tolerance)
        .count();
    if equal_lows >= MIN_POOL_SIZE
        && current.low < pool_low - tolerance
        && current.close > pool_low
    {
        return Some(SweepSignal {
            side: Side::Long,
            pool_level: pool_low,
        });
    }

    None
}

/// Finds an order block validated by a break of structure.
///
/// A Long zone requires the last close to break above the prior swing
/// high of the `swing_lookback` candles before it; the block is the
/// nearest red candle preceding the break. Mirrored for Short.
#[must_use]
pub fn bos_order_block(candles: &[Candle], swing_lookback: usize) -> Option<OrderBlockZone> {
    if swing_lookback == 0 || candles.len() < swing_lookback + 1 {
        return None;
    }
    let last = &candles[candles.len() - 1];
    let window = &candles[candles.len() - 1 - swing_lookback..candles.len() - 1];

    let swing_high = window
        .iter()
        .map(|c| c.high)
        .max()
        .unwrap_or(Decimal::ZERO);
    if last.close > swing_high {
        return nearest_block(candles, Side::Long);
    }

    let swing_low = window.iter().map(|c| c.low).min().unwrap_or(Decimal::ZERO);
    if last.close < swing_low {
        return nearest_block(candles, Side::Short);
    }

    None
}

/// The nearest opposite-colored candle preceding the breaking candle.
fn nearest_block(candles: &[Candle], side: Side) -> Option<OrderBlockZone> {
    let before_break = &candles[..candles.len() - 1];
    let block = before_break.iter().rev().find(|c| match side {
        Side::Long => c.is_red(),
        Side::Short => c.is_green(),
    })?;

    Some(OrderBlockZone {
        side,
        low: block.low,
        high: block.high,
        midpoint: (block.low + block.high) / Decimal::from(2),
    })
}
