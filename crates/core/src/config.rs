use crate::candle::Timeframe;
use crate::error::EngineError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable strategy/engine configuration. Supplied once at construction;
/// the engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub symbol: String,

    /// Working timeframe the decision engine trades on.
    #[serde(default = "default_interval")]
    pub interval: Timeframe,

    /// Higher timeframes tracked for sentiment.
    #[serde(default = "default_sentiment_timeframes")]
    pub sentiment_timeframes: Vec<Timeframe>,
    /// Timeframes that must both agree with the trade direction.
    #[serde(default = "default_confirm_timeframes")]
    pub confirm_timeframes: Vec<Timeframe>,
    /// Timeframe that must not contradict the trade direction.
    #[serde(default = "default_veto_timeframe")]
    pub veto_timeframe: Timeframe,
    #[serde(default = "default_sentiment_ema_period")]
    pub sentiment_ema_period: usize,

    /// Candles fetched per timeframe each tick.
    #[serde(default = "default_candle_window")]
    pub candle_window: usize,

    // Entry filters
    #[serde(default = "default_score_threshold")]
    pub score_threshold: i32,
    #[serde(default = "default_volume_multiplier")]
    pub volume_multiplier: Decimal,
    #[serde(default = "default_volume_sma_period")]
    pub volume_sma_period: usize,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: Decimal,
    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: Decimal,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: i64,

    // Position sizing and exits
    #[serde(default = "default_margin")]
    pub margin: Decimal,
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    #[serde(default = "default_tp_pct")]
    pub tp_pct: Decimal,
    #[serde(default = "default_sl_pct")]
    pub sl_pct: Decimal,
    /// Multiple of the initial risk distance at which the stop moves to
    /// entry.
    #[serde(default = "default_breakeven_trigger_rr")]
    pub breakeven_trigger_rr: Decimal,

    // Daily risk guards
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    #[serde(default = "default_max_trades_per_day")]
    pub max_trades_per_day: u32,
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    /// Seconds between engine ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

const fn default_interval() -> Timeframe {
    Timeframe::M1
}

fn default_sentiment_timeframes() -> Vec<Timeframe> {
    vec![Timeframe::M5, Timeframe::M15, Timeframe::H1]
}

fn default_confirm_timeframes() -> Vec<Timeframe> {
    vec![Timeframe::M5, Timeframe::M15]
}

const fn default_veto_timeframe() -> Timeframe {
    Timeframe::H1
}

const fn default_sentiment_ema_period() -> usize {
    50
}

const fn default_candle_window() -> usize {
    250
}

const fn default_score_threshold() -> i32 {
    3
}

fn default_volume_multiplier() -> Decimal {
    Decimal::new(15, 1) // 1.5
}

const fn default_volume_sma_period() -> usize {
    20
}

const fn default_rsi_period() -> usize {
    14
}

fn default_rsi_oversold() -> Decimal {
    Decimal::from(30)
}

fn default_rsi_overbought() -> Decimal {
    Decimal::from(70)
}

const fn default_cooldown_secs() -> i64 {
    60
}

fn default_margin() -> Decimal {
    Decimal::from(50)
}

const fn default_leverage() -> u32 {
    20
}

fn default_fee_rate() -> Decimal {
    Decimal::new(4, 4) // 0.0004
}

fn default_tp_pct() -> Decimal {
    Decimal::new(8, 3) // 0.008
}

fn default_sl_pct() -> Decimal {
    Decimal::new(4, 3) // 0.004
}

fn default_breakeven_trigger_rr() -> Decimal {
    Decimal::new(15, 1) // 1.5
}

fn default_initial_balance() -> Decimal {
    Decimal::from(1000)
}

fn default_max_daily_loss() -> Decimal {
    Decimal::from(100)
}

const fn default_max_trades_per_day() -> u32 {
    10
}

const fn default_max_consecutive_errors() -> u32 {
    5
}

const fn default_tick_interval_secs() -> u64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: default_interval(),
            sentiment_timeframes: default_sentiment_timeframes(),
            confirm_timeframes: default_confirm_timeframes(),
            veto_timeframe: default_veto_timeframe(),
            sentiment_ema_period: default_sentiment_ema_period(),
            candle_window: default_candle_window(),
            score_threshold: default_score_threshold(),
            volume_multiplier: default_volume_multiplier(),
            volume_sma_period: default_volume_sma_period(),
            rsi_period: default_rsi_period(),
            rsi_oversold: default_rsi_oversold(),
            rsi_overbought: default_rsi_overbought(),
            cooldown_secs: default_cooldown_secs(),
            margin: default_margin(),
            leverage: default_leverage(),
            fee_rate: default_fee_rate(),
            tp_pct: default_tp_pct(),
            sl_pct: default_sl_pct(),
            breakeven_trigger_rr: default_breakeven_trigger_rr(),
            initial_balance: default_initial_balance(),
            max_daily_loss: default_max_daily_loss(),
            max_trades_per_day: default_max_trades_per_day(),
            max_consecutive_errors: default_max_consecutive_errors(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl EngineConfig {
    /// Sanity-checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Configuration` on the first violated bound.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.leverage == 0 {
            return Err(EngineError::configuration("leverage must be at least 1"));
        }
        if self.margin <= Decimal::ZERO {
            return Err(EngineError::configuration("margin must be positive"));
        }
        if self.tp_pct <= Decimal::ZERO || self.sl_pct <= Decimal::ZERO {
            return Err(EngineError::configuration(
                "tp_pct and sl_pct must be positive",
            ));
        }
        if self.score_threshold < 1 || self.score_threshold > 5 {
            return Err(EngineError::configuration(
                "score_threshold must be within [1, 5]",
            ));
        }
        if self.confirm_timeframes.is_empty() {
            return Err(EngineError::configuration(
                "at least one confirm timeframe is required",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tp_pct, dec!(0.008));
        assert_eq!(config.sl_pct, dec!(0.004));
        assert_eq!(config.volume_multiplier, dec!(1.5));
    }

    #[test]
    fn validate_rejects_zero_leverage() {
        let config = EngineConfig {
            leverage: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let config = EngineConfig {
            score_threshold: 6,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_field_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"symbol":"ETHUSDT"}"#).unwrap();
        assert_eq!(config.symbol, "ETHUSDT");
        assert_eq!(config.interval, Timeframe::M1);
        assert_eq!(config.leverage, 20);
        assert_eq!(config.confirm_timeframes, vec![Timeframe::M5, Timeframe::M15]);
    }

    #[test]
    fn timeframe_labels_deserialize() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","interval":"15m","veto_timeframe":"4h"}"#)
                .unwrap();
        assert_eq!(config.interval, Timeframe::M15);
        assert_eq!(config.veto_timeframe, Timeframe::H4);
    }
}
