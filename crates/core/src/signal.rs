use serde::{Deserialize, Serialize};

/// Directional polarity of a detected structure (gap, order block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Bullish,
    Bearish,
}

/// Swing-structure trend bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Per-timeframe sentiment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

/// Which strategy produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupKind {
    /// Live confluence-score entry (FVG / order block / momentum).
    Confluence,
    /// Backtest liquidity-sweep + break-of-structure entry.
    LiquiditySweep,
}

/// Structured signal metadata carried on position events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDetail {
    pub setup: SetupKind,
    pub score: i32,
    pub is_breakeven: bool,
}
