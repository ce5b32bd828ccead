pub mod entry;
pub mod indicators;
pub mod scoring;
pub mod sentiment;
pub mod structure;
pub mod sweep;

pub use entry::{evaluate_entry, EntryParams, EntrySignal};
pub use indicators::{atr, ema, ema_series, macd, rsi, sma, Macd};
pub use scoring::{analyze, confluence_score, Analysis, AnalysisParams};
pub use sentiment::{alignment_ok, classify, sentiment_map};
pub use structure::{fair_value_gap, order_block, trend_bias};
pub use sweep::{bos_order_block, liquidity_sweep, pool_tolerance, OrderBlockZone, SweepSignal};
