//! Stateless numeric indicators over price/volume series.
//!
//! All functions are pure and total over their declared domains: a series
//! too short for the requested window yields the documented neutral value
//! instead of an error, so a frequently ticking caller recovers once more
//! history accumulates.

use rust_decimal::Decimal;
use smc_trade_core::Candle;

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

/// Arithmetic mean of the last `period` values; zero when the series is
/// shorter than `period` (or `period` is zero).
#[must_use]
pub fn sma(values: &[Decimal], period: usize) -> Decimal {
    if period == 0 || values.len() < period {
        return Decimal::ZERO;
    }
    let window = &values[values.len() - period..];
    let sum: Decimal = window.iter().copied().sum();
    sum / Decimal::from(period)
}

/// Exponential moving average, seeded with the first value:
/// `ema[i] = v[i]*k + ema[i-1]*(1-k)` with `k = 2/(period+1)`.
#[must_use]
pub fn ema(values: &[Decimal], period: usize) -> Decimal {
    let Some(first) = values.first() else {
        return Decimal::ZERO;
    };
    let k = Decimal::from(2) / Decimal::from(period + 1);
    let mut current = *first;
    for value in &values[1..] {
        current = *value * k + current * (Decimal::ONE - k);
    }
    current
}

/// The full recursive EMA series for each input index.
#[must_use]
pub fn ema_series(values: &[Decimal], period: usize) -> Vec<Decimal> {
    let Some(first) = values.first() else {
        return Vec::new();
    };
    let k = Decimal::from(2) / Decimal::from(period + 1);
    let mut out = Vec::with_capacity(values.len());
    let mut current = *first;
    out.push(current);
    for value in &values[1..] {
        current = *value * k + current * (Decimal::ONE - k);
        out.push(current);
    }
    out
}

/// Wilder RSI: average gain/loss over the trailing `period` deltas, then a
/// single incremental Wilder step for the most recent delta.
///
/// Returns 50 when there are fewer than `period` deltas, and 100 when the
/// average loss is exactly zero.
#[must_use]
pub fn rsi(values: &[Decimal], period: usize) -> Decimal {
    let fifty = Decimal::from(50);
    if period == 0 || values.len() < period + 1 {
        return fifty;
    }

    let deltas: Vec<Decimal> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let p = Decimal::from(period);

    let seed_over = |window: &[Decimal]| -> (Decimal, Decimal) {
        let mut gains = Decimal::ZERO;
        let mut losses = Decimal::ZERO;
        for delta in window {
            if *delta > Decimal::ZERO {
                gains += *delta;
            } else {
                losses += -*delta;
            }
        }
        (gains / p, losses / p)
    };

    let (avg_gain, avg_loss) = if deltas.len() == period {
        seed_over(&deltas)
    } else {
        // Seed over the `period` deltas preceding the last, then one
        // Wilder smoothing step with the most recent delta.
        let last = deltas[deltas.len() - 1];
        let seed_window = &deltas[deltas.len() - 1 - period..deltas.len() - 1];
        let (seed_gain, seed_loss) = seed_over(seed_window);
        let (gain, loss) = if last > Decimal::ZERO {
            (last, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -last)
        };
        (
            (seed_gain * (p - Decimal::ONE) + gain) / p,
            (seed_loss * (p - Decimal::ONE) + loss) / p,
        )
    };

    if avg_loss == Decimal::ZERO {
        return Decimal::ONE_HUNDRED;
    }
    let rs = avg_gain / avg_loss;
    Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs)
}

/// MACD line, signal line, and histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Macd {
    pub line: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// MACD(12, 26, 9): fast EMA minus slow EMA, its own EMA as the signal,
/// histogram = line − signal. Zeroed when history is shorter than the
/// slow period.
#[must_use]
pub fn macd(values: &[Decimal]) -> Macd {
    if values.len() < MACD_SLOW {
        return Macd::default();
    }

    let fast = ema_series(values, MACD_FAST);
    let slow = ema_series(values, MACD_SLOW);
    let line_series: Vec<Decimal> = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| *f - *s)
        .collect();

    let line = *line_series.last().unwrap_or(&Decimal::ZERO);
    let signal = ema(&line_series, MACD_SIGNAL);
    Macd {
        line,
        signal,
        histogram: line - signal,
    }
}

/// Wilder-smoothed Average True Range with a simple average over the seed
/// window; zero when there are fewer than `period` true ranges.
#[must_use]
pub fn atr(candles: &[Candle], period: usize) -> Decimal {
    if period == 0 || candles.len() < period + 1 {
        return Decimal::ZERO;
    }

    let true_ranges: Vec<Decimal> = candles
        .windows(2)
        .map(|w| {
            let prev_close = w[0].close;
            let c = &w[1];
            (c.high - c.low)
                .max((c.high - prev_close).abs())
                .max((c.low - prev_close).abs())
        })
        .collect();

    let p = Decimal::from(period);
    let seed: Decimal = true_ranges[..period].iter().copied().sum::<Decimal>() / p;
    true_ranges[period..]
        .iter()
        .fold(seed, |acc, tr| (acc * (p - Decimal::ONE) + *tr) / p)
}
