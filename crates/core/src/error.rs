//! Typed errors for the trading core.
//!
//! Insufficient candle history is deliberately NOT an error: indicators
//! return neutral defaults so a frequently ticking caller recovers as
//! history accumulates. These variants cover data that is actually
//! malformed and configuration that cannot be used.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A candle violated its OHLC bounds.
    #[error("invalid candle: {0}")]
    InvalidCandle(String),

    /// An interval label the engine does not track.
    #[error("unknown timeframe: {label}")]
    UnknownTimeframe {
        /// The label that failed to parse.
        label: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    pub fn invalid_candle(reason: impl Into<String>) -> Self {
        Self::InvalidCandle(reason.into())
    }

    pub fn unknown_timeframe(label: impl Into<String>) -> Self {
        Self::UnknownTimeframe {
            label: label.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_timeframe_display() {
        let err = EngineError::unknown_timeframe("7m");
        assert!(err.to_string().contains("7m"));
    }

    #[test]
    fn test_configuration_display() {
        let err = EngineError::configuration("leverage must be at least 1");
        assert!(err.to_string().contains("leverage"));
    }
}
