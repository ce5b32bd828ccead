use crate::error::EngineError;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single OHLCV candle. Immutable once closed; a live feed may replace
/// the most recent candle (same `time`) until the interval rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// A candle is green when it closed at or above its open.
    #[must_use]
    pub fn is_green(&self) -> bool {
        self.close >= self.open
    }

    #[must_use]
    pub fn is_red(&self) -> bool {
        !self.is_green()
    }

    /// Full high-to-low extent of the candle.
    #[must_use]
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Absolute open-to-close distance.
    #[must_use]
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// Checks the OHLC bounds a well-formed candle must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCandle` when the high is below the
    /// body or the low is above it.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.high < self.open.max(self.close) {
            return Err(EngineError::invalid_candle(format!(
                "high {} below body at {}",
                self.high, self.time
            )));
        }
        if self.low > self.open.min(self.close) {
            return Err(EngineError::invalid_candle(format!(
                "low {} above body at {}",
                self.low, self.time
            )));
        }
        Ok(())
    }
}

/// Candle interval labels tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    #[must_use]
    pub const fn duration_ms(self) -> i64 {
        match self {
            Self::M1 => 60_000,
            Self::M5 => 300_000,
            Self::M15 => 900_000,
            Self::M30 => 1_800_000,
            Self::H1 => 3_600_000,
            Self::H4 => 14_400_000,
            Self::D1 => 86_400_000,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::M1),
            "5m" => Ok(Self::M5),
            "15m" => Ok(Self::M15),
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            "4h" => Ok(Self::H4),
            "1d" => Ok(Self::D1),
            other => Err(EngineError::unknown_timeframe(other)),
        }
    }
}

/// Buckets finer-grained candles into `timeframe` bars.
///
/// Bucket key is `floor(time_ms / interval_ms) * interval_ms`; within a
/// bucket open is the first value, close the last, high/low the extremes,
/// volume the sum. Input must be ordered by time (the feed contract).
#[must_use]
pub fn aggregate(candles: &[Candle], timeframe: Timeframe) -> Vec<Candle> {
    let interval = timeframe.duration_ms();
    let mut out: Vec<Candle> = Vec::new();

    for candle in candles {
        let bucket_ms = candle.time.timestamp_millis().div_euclid(interval) * interval;
        let bucket_time = Utc.timestamp_millis_opt(bucket_ms).unwrap();

        match out.last_mut() {
            Some(current) if current.time == bucket_time => {
                current.high = current.high.max(candle.high);
                current.low = current.low.min(candle.low);
                current.close = candle.close;
                current.volume += candle.volume;
            }
            _ => out.push(Candle {
                time: bucket_time,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
            }),
        }
    }

    out
}
