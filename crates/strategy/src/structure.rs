//! Market-structure pattern recognizers over a trailing candle window.

use rust_decimal::Decimal;
use smc_trade_core::{Candle, Polarity, Trend};

/// Candles scanned for an impulse-reversal order block.
const ORDER_BLOCK_LOOKBACK: usize = 10;

/// Fair value gap over the last five candles: compares the candle at
/// offset −4 with the one at offset −2, skipping −3. Bullish when the
/// newer candle's low clears the older candle's high; bearish mirrored.
#[must_use]
pub fn fair_value_gap(candles: &[Candle]) -> Option<Polarity> {
    if candles.len() < 5 {
        return None;
    }
    let older = &candles[candles.len() - 4];
    let newer = &candles[candles.len() - 2];

    if newer.low > older.high {
        Some(Polarity::Bullish)
    } else if newer.high < older.low {
        Some(Polarity::Bearish)
    } else {
        None
    }
}

/// Impulse-reversal order block: the most recent red candle immediately
/// followed by two consecutive greens (bullish), or the mirror (bearish).
/// Scans a short trailing window newest-first, so the most recent
/// qualifying instance of either polarity wins.
#[must_use]
pub fn order_block(candles: &[Candle]) -> Option<Polarity> {
    if candles.len() < 3 {
        return None;
    }
    let window_start = candles.len().saturating_sub(ORDER_BLOCK_LOOKBACK);

    for i in (window_start..=candles.len() - 3).rev() {
        let (block, a, b) = (&candles[i], &candles[i + 1], &candles[i + 2]);
        if block.is_red() && a.is_green() && b.is_green() {
            return Some(Polarity::Bullish);
        }
        if block.is_green() && a.is_red() && b.is_red() {
            return Some(Polarity::Bearish);
        }
    }
    None
}

/// Swing trend bias from the last three candles: rising highs and lows
/// are an up-structure, falling highs and lows a down-structure.
/// Otherwise falls back to close versus the long EMA; a zero EMA (not
/// enough history) or an exact tie is neutral.
#[must_use]
pub fn trend_bias(candles: &[Candle], long_ema: Decimal) -> Trend {
    if candles.len() >= 3 {
        let a = &candles[candles.len() - 3];
        let b = &candles[candles.len() - 2];
        let c = &candles[candles.len() - 1];

        if c.high > b.high && b.high > a.high && c.low > b.low && b.low > a.low {
            return Trend::Up;
        }
        if c.high < b.high && b.high < a.high && c.low < b.low && b.low < a.low {
            return Trend::Down;
        }
    }

    let Some(last) = candles.last() else {
        return Trend::Neutral;
    };
    if long_ema == Decimal::ZERO {
        return Trend::Neutral;
    }
    if last.close > long_ema {
        Trend::Up
    } else if last.close < long_ema {
        Trend::Down
    } else {
        Trend::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn candle(open: i64, high: i64, low: i64, close: i64) -> Candle {
        Candle {
            time: Utc::now(),
            open: Decimal::from(open),
            high: Decimal::from(high),
            low: Decimal::from(low),
            close: Decimal::from(close),
            volume: dec!(100),
        }
    }

    #[test]
    fn fvg_bullish_when_gap_up() {
        // Offset -4 high = 102; offset -2 low = 105 leaves a gap.
        let candles = vec![
            candle(100, 102, 99, 101),  // -5
            candle(100, 102, 99, 101),  // -4
            candle(102, 106, 101, 105), // -3
            candle(106, 110, 105, 109), // -2, low 105 > 102
            candle(109, 111, 108, 110), // -1
        ];
        assert_eq!(fair_value_gap(&candles), Some(Polarity::Bullish));
    }

    #[test]
    fn fvg_bearish_when_gap_down() {
        let candles = vec![
            candle(110, 112, 108, 109), // -5
            candle(109, 111, 107, 108), // -4, low 107
            candle(106, 107, 102, 103), // -3
            candle(103, 105, 100, 101), // -2, high 105 < 107
            candle(101, 102, 99, 100),  // -1
        ];
        assert_eq!(fair_value_gap(&candles), Some(Polarity::Bearish));
    }

    #[test]
    fn fvg_none_without_gap() {
        let candles = vec![candle(100, 105, 95, 102); 5];
        assert_eq!(fair_value_gap(&candles), None);
    }

    #[test]
    fn fvg_none_with_short_window() {
        let candles = vec![candle(100, 105, 95, 102); 4];
        assert_eq!(fair_value_gap(&candles), None);
    }

    #[test]
    fn order_block_bullish_red_then_two_greens() {
        let candles = vec![
            candle(100, 102, 98, 99),   // red
            candle(99, 103, 98, 102),   // green
            candle(102, 106, 101, 105), // green
        ];
        assert_eq!(order_block(&candles), Some(Polarity::Bullish));
    }

    #[test]
    fn order_block_bearish_green_then_two_reds() {
        let candles = vec![
            candle(100, 104, 99, 103), // green
            candle(103, 104, 99, 100), // red
            candle(100, 101, 96, 97),  // red
        ];
        assert_eq!(order_block(&candles), Some(Polarity::Bearish));
    }

    #[test]
    fn order_block_prefers_most_recent_instance() {
        let candles = vec![
            // Older bearish pattern.
            candle(100, 104, 99, 103),
            candle(103, 104, 99, 100),
            candle(100, 101, 96, 97),
            // Newer bullish pattern.
            candle(97, 98, 94, 95),
            candle(95, 99, 94, 98),
            candle(98, 102, 97, 101),
        ];
        assert_eq!(order_block(&candles), Some(Polarity::Bullish));
    }

    #[test]
    fn order_block_none_without_pattern() {
        // Strictly alternating colors never yield two same-colored
        // candles after a reversal.
        let candles = vec![
            candle(100, 102, 98, 101),
            candle(101, 102, 98, 99),
            candle(99, 102, 98, 101),
            candle(101, 102, 98, 99),
        ];
        assert_eq!(order_block(&candles), None);
    }

    #[test]
    fn trend_up_on_rising_highs_and_lows() {
        let candles = vec![
            candle(100, 103, 99, 102),
            candle(102, 105, 101, 104),
            candle(104, 107, 103, 106),
        ];
        assert_eq!(trend_bias(&candles, Decimal::ZERO), Trend::Up);
    }

    #[test]
    fn trend_down_on_falling_highs_and_lows() {
        let candles = vec![
            candle(106, 107, 103, 104),
            candle(104, 105, 101, 102),
            candle(102, 103, 99, 100),
        ];
        assert_eq!(trend_bias(&candles, Decimal::ZERO), Trend::Down);
    }

    #[test]
    fn trend_falls_back_to_long_ema() {
        // Mixed structure: last three candles neither rise nor fall
        // together, so the EMA comparison decides.
        let candles = vec![
            candle(100, 105, 95, 102),
            candle(102, 104, 96, 98),
            candle(98, 106, 97, 103),
        ];
        assert_eq!(trend_bias(&candles, dec!(90)), Trend::Up);
        assert_eq!(trend_bias(&candles, dec!(110)), Trend::Down);
        assert_eq!(trend_bias(&candles, dec!(103)), Trend::Neutral);
    }

    #[test]
    fn trend_neutral_without_history() {
        assert_eq!(trend_bias(&[], dec!(100)), Trend::Neutral);
        let candles = vec![candle(100, 105, 95, 102)];
        assert_eq!(trend_bias(&candles, Decimal::ZERO), Trend::Neutral);
    }
}
