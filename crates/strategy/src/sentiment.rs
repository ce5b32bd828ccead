//! Multi-timeframe sentiment classification and the entry alignment gate.

use crate::indicators::ema;
use rust_decimal::Decimal;
use smc_trade_core::{Candle, Sentiment, Side, Timeframe};
use std::collections::HashMap;

/// Classifies one timeframe by comparing its last close to the EMA of its
/// own window. Equal is neutral; fewer candles than the EMA period is
/// neutral (not enough history to trust the average).
#[must_use]
pub fn classify(candles: &[Candle], ema_period: usize) -> Sentiment {
    if candles.len() < ema_period {
        return Sentiment::Neutral;
    }
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let Some(last) = closes.last() else {
        return Sentiment::Neutral;
    };
    let average = ema(&closes, ema_period);

    if *last > average {
        Sentiment::Bullish
    } else if *last < average {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    }
}

/// Recomputes the whole sentiment map from per-timeframe windows. Each
/// timeframe is independent; there is no cross-timeframe smoothing.
#[must_use]
pub fn sentiment_map(
    windows: &HashMap<Timeframe, Vec<Candle>>,
    ema_period: usize,
) -> HashMap<Timeframe, Sentiment> {
    windows
        .iter()
        .map(|(tf, candles)| (*tf, classify(candles, ema_period)))
        .collect()
}

/// Alignment gate: every confirm timeframe must agree with the proposed
/// direction, and the veto timeframe must not be the opposite. A missing
/// timeframe counts as neutral (fails confirmation, passes the veto).
#[must_use]
pub fn alignment_ok(
    map: &HashMap<Timeframe, Sentiment>,
    side: Side,
    confirm: &[Timeframe],
    veto: Timeframe,
) -> bool {
    let wanted = match side {
        Side::Long => Sentiment::Bullish,
        Side::Short => Sentiment::Bearish,
    };
    let opposite = match side {
        Side::Long => Sentiment::Bearish,
        Side::Short => Sentiment::Bullish,
    };

    let confirmed = confirm
        .iter()
        .all(|tf| map.get(tf).copied().unwrap_or(Sentiment::Neutral) == wanted);
    let vetoed = map.get(&veto).copied().unwrap_or(Sentiment::Neutral) == opposite;

    confirmed && !vetoed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn flat_candles(close: i64, count: usize) -> Vec<Candle> {
        vec![
            Candle {
                time: Utc::now(),
                open: Decimal::from(close),
                high: Decimal::from(close + 1),
                low: Decimal::from(close - 1),
                close: Decimal::from(close),
                volume: dec!(10),
            };
            count
        ]
    }

    #[test]
    fn classify_neutral_on_short_history() {
        assert_eq!(classify(&flat_candles(100, 3), 5), Sentiment::Neutral);
        assert_eq!(classify(&[], 5), Sentiment::Neutral);
    }

    #[test]
    fn classify_neutral_when_close_equals_ema() {
        // Constant closes: EMA equals the close exactly.
        assert_eq!(classify(&flat_candles(100, 10), 5), Sentiment::Neutral);
    }

    #[test]
    fn classify_bullish_when_close_above_ema() {
        let mut candles = flat_candles(100, 10);
        candles.last_mut().unwrap().close = dec!(110);
        assert_eq!(classify(&candles, 5), Sentiment::Bullish);
    }

    #[test]
    fn classify_bearish_when_close_below_ema() {
        let mut candles = flat_candles(100, 10);
        candles.last_mut().unwrap().close = dec!(90);
        assert_eq!(classify(&candles, 5), Sentiment::Bearish);
    }

    #[test]
    fn alignment_requires_all_confirm_timeframes() {
        let mut map = HashMap::new();
        map.insert(Timeframe::M5, Sentiment::Bullish);
        map.insert(Timeframe::M15, Sentiment::Bullish);
        map.insert(Timeframe::H1, Sentiment::Neutral);

        let confirm = [Timeframe::M5, Timeframe::M15];
        assert!(alignment_ok(&map, Side::Long, &confirm, Timeframe::H1));

        map.insert(Timeframe::M15, Sentiment::Neutral);
        assert!(!alignment_ok(&map, Side::Long, &confirm, Timeframe::H1));
    }

    #[test]
    fn alignment_fails_on_veto_contradiction() {
        let mut map = HashMap::new();
        map.insert(Timeframe::M5, Sentiment::Bullish);
        map.insert(Timeframe::M15, Sentiment::Bullish);
        map.insert(Timeframe::H1, Sentiment::Bearish);

        let confirm = [Timeframe::M5, Timeframe::M15];
        assert!(!alignment_ok(&map, Side::Long, &confirm, Timeframe::H1));
    }

    #[test]
    fn alignment_short_mirrors_long() {
        let mut map = HashMap::new();
        map.insert(Timeframe::M5, Sentiment::Bearish);
        map.insert(Timeframe::M15, Sentiment::Bearish);

        let confirm = [Timeframe::M5, Timeframe::M15];
        // Missing veto timeframe counts as neutral: passes.
        assert!(alignment_ok(&map, Side::Short, &confirm, Timeframe::H1));
        assert!(!alignment_ok(&map, Side::Long, &confirm, Timeframe::H1));
    }
}
