//! Per-tick analysis snapshot and the confluence scoring function.

use crate::indicators::{atr, ema, macd, rsi, sma, Macd};
use crate::structure::{fair_value_gap, order_block, trend_bias};
use rust_decimal::Decimal;
use smc_trade_core::{Candle, Polarity, Trend};

/// Indicator windows used to build an [`Analysis`].
#[derive(Debug, Clone)]
pub struct AnalysisParams {
    pub rsi_period: usize,
    pub atr_period: usize,
    pub trend_ema_period: usize,
    pub volume_sma_period: usize,
    pub rsi_oversold: Decimal,
    pub rsi_overbought: Decimal,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            atr_period: 14,
            trend_ema_period: 200,
            volume_sma_period: 20,
            rsi_oversold: Decimal::from(30),
            rsi_overbought: Decimal::from(70),
        }
    }
}

/// Everything the decision engine needs from one evaluation of the
/// trailing candle window. Derived fresh each tick and never persisted;
/// it is recomputable from candles alone.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Analysis {
    pub rsi: Decimal,
    pub ema: Decimal,
    pub macd: Macd,
    pub atr: Decimal,
    pub volume_sma: Decimal,
    pub trend: Trend,
    pub fvg: Option<Polarity>,
    pub order_block: Option<Polarity>,
    pub score: i32,
}

/// Builds the analysis snapshot for the current window.
#[must_use]
pub fn analyze(candles: &[Candle], params: &AnalysisParams) -> Analysis {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();

    let long_ema = if closes.len() >= params.trend_ema_period {
        ema(&closes, params.trend_ema_period)
    } else {
        Decimal::ZERO
    };

    let rsi_value = rsi(&closes, params.rsi_period);
    let macd_value = macd(&closes);
    let trend = trend_bias(candles, long_ema);
    let fvg = fair_value_gap(candles);
    let block = order_block(candles);

    let score = confluence_score(
        trend,
        macd_value.histogram,
        rsi_value,
        fvg,
        block,
        params.rsi_oversold,
        params.rsi_overbought,
    );

    Analysis {
        rsi: rsi_value,
        ema: long_ema,
        macd: macd_value,
        atr: atr(candles, params.atr_period),
        volume_sma: sma(&volumes, params.volume_sma_period),
        trend,
        fvg,
        order_block: block,
        score,
    }
}

/// Combines the five signals into a bounded integer score in [-5, 5]:
/// one signed point each from trend, MACD histogram sign, RSI extremity
/// (oversold adds, overbought subtracts), FVG polarity, and order-block
/// polarity. A component contributing exactly zero adds nothing.
#[must_use]
pub fn confluence_score(
    trend: Trend,
    macd_histogram: Decimal,
    rsi_value: Decimal,
    fvg: Option<Polarity>,
    block: Option<Polarity>,
    rsi_oversold: Decimal,
    rsi_overbought: Decimal,
) -> i32 {
    let mut score = 0;

    score += match trend {
        Trend::Up => 1,
        Trend::Down => -1,
        Trend::Neutral => 0,
    };

    if macd_histogram > Decimal::ZERO {
        score += 1;
    } else if macd_histogram < Decimal::ZERO {
        score -= 1;
    }

    if rsi_value < rsi_oversold {
        score += 1;
    } else if rsi_value > rsi_overbought {
        score -= 1;
    }

    score += polarity_point(fvg);
    score += polarity_point(block);

    score
}

const fn polarity_point(polarity: Option<Polarity>) -> i32 {
    match polarity {
        Some(Polarity::Bullish) => 1,
        Some(Polarity::Bearish) => -1,
        None => 0,
    }
}
