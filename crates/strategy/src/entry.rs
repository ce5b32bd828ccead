//! Live entry decision: turns an analysis snapshot plus sentiment into an
//! entry signal when every precondition holds.

use crate::scoring::Analysis;
use crate::sentiment::alignment_ok;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use smc_trade_core::{Candle, Sentiment, Side, Timeframe};
use std::collections::HashMap;

/// Thresholds gating a live entry.
#[derive(Debug, Clone)]
pub struct EntryParams {
    /// Minimum absolute confluence score; its sign picks the direction.
    pub score_threshold: i32,
    /// Current volume must reach `volume_sma * multiplier` (the filter
    /// passes when the SMA is still zero).
    pub volume_multiplier: Decimal,
    pub rsi_oversold: Decimal,
    pub rsi_overbought: Decimal,
    /// Minimum seconds between signals.
    pub cooldown_secs: i64,
}

impl Default for EntryParams {
    fn default() -> Self {
        Self {
            score_threshold: 3,
            volume_multiplier: Decimal::new(15, 1),
            rsi_oversold: Decimal::from(30),
            rsi_overbought: Decimal::from(70),
            cooldown_secs: 60,
        }
    }
}

/// A qualified entry decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySignal {
    pub side: Side,
    pub price: Decimal,
    pub score: i32,
    pub time: DateTime<Utc>,
}

/// Evaluates all entry preconditions in order: score threshold, volume
/// filter, RSI exhaustion veto, multi-timeframe alignment, cooldown.
/// Returns `None` as soon as one fails. The caller guarantees no position
/// is currently open.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn evaluate_entry(
    analysis: &Analysis,
    candles: &[Candle],
    sentiment: &HashMap<Timeframe, Sentiment>,
    confirm: &[Timeframe],
    veto: Timeframe,
    params: &EntryParams,
    last_signal_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<EntrySignal> {
    let last = candles.last()?;

    let side = if analysis.score >= params.score_threshold {
        Side::Long
    } else if analysis.score <= -params.score_threshold {
        Side::Short
    } else {
        return None;
    };

    if analysis.volume_sma > Decimal::ZERO
        && last.volume < analysis.volume_sma * params.volume_multiplier
    {
        tracing::debug!(
            volume = %last.volume,
            required = %(analysis.volume_sma * params.volume_multiplier),
            "entry rejected by volume filter"
        );
        return None;
    }

    // Exhaustion veto: never buy into overbought or sell into oversold.
    let exhausted = match side {
        Side::Long => analysis.rsi >= params.rsi_overbought,
        Side::Short => analysis.rsi <= params.rsi_oversold,
    };
    if exhausted {
        return None;
    }

    if !alignment_ok(sentiment, side, confirm, veto) {
        return None;
    }

    if let Some(previous) = last_signal_time {
        if (now - previous).num_seconds() < params.cooldown_secs {
            return None;
        }
    }

    Some(EntrySignal {
        side,
        price: last.close,
        score: analysis.score,
        time: now,
    })
}
