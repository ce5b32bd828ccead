use crate::candle::{Candle, Timeframe};
use anyhow::Result;
use async_trait::async_trait;

/// Source of candle history for the engine. Implementations own all
/// network I/O; the engine only awaits them inline from its tick.
#[async_trait]
pub trait CandleFeed: Send + Sync {
    /// The most recent `limit` candles for `timeframe`, oldest first.
    /// The sequence must be ordered by time and each candle must satisfy
    /// the OHLC bounds.
    async fn candles(&mut self, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>>;
}
