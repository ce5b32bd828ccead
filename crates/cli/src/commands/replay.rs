use anyhow::Result;
use async_trait::async_trait;
use smc_trade_backtest::load_candles_csv;
use smc_trade_core::{
    aggregate, Candle, CandleFeed, ConfigLoader, EngineEvent, Timeframe,
};
use smc_trade_engine::Engine;
use tokio::sync::broadcast;

/// In-memory feed over a historical tape. Serves windows ending at an
/// advancing cursor, aggregating on the fly for higher timeframes, so the
/// engine sees exactly what it would have seen live.
pub struct ReplayFeed {
    source: Vec<Candle>,
    cursor: usize,
}

impl ReplayFeed {
    #[must_use]
    pub fn new(source: Vec<Candle>, cursor: usize) -> Self {
        Self { source, cursor }
    }

    /// Reveals the next candle. Returns false once the tape is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.source.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn current_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.source.get(self.cursor.checked_sub(1)?).map(|c| c.time)
    }
}

#[async_trait]
impl CandleFeed for ReplayFeed {
    async fn candles(&mut self, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let visible = &self.source[..self.cursor];
        let bars = aggregate(visible, timeframe);
        let start = bars.len().saturating_sub(limit);
        Ok(bars[start..].to_vec())
    }
}

pub async fn run(data: &str, config_path: &str, warmup: usize) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let source = load_candles_csv(data)?;
    anyhow::ensure!(
        source.len() > warmup,
        "tape has {} candles, warmup needs more than {warmup}",
        source.len()
    );

    let (event_tx, mut events) = broadcast::channel::<EngineEvent>(1024);
    let total = source.len();

    // Ticks are driven manually with the tape's own timestamps so the
    // run is deterministic.
    let mut engine = Engine::new(config, ReplayFeed::new(source, warmup), event_tx.clone());
    engine.start();

    let mut steps = 0usize;
    loop {
        let Some(now) = engine.feed_mut().current_time() else {
            break;
        };
        engine.tick(now).await;
        steps += 1;
        if !engine.feed_mut().advance() {
            break;
        }
        if !engine.is_running() {
            tracing::warn!("engine paused during replay, stopping early");
            break;
        }
    }

    drop(event_tx);
    let mut opened = 0usize;
    let mut closed = 0usize;
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::PositionOpened { .. } => opened += 1,
            EngineEvent::PositionClosed { .. } => closed += 1,
            _ => {}
        }
    }

    let status = engine.status();
    println!("=== Replay Summary ===");
    println!("Candles replayed:  {steps} of {total}");
    println!("Positions opened:  {opened}");
    println!("Positions closed:  {closed}");
    println!("Final balance:     {:.4}", status.balance);
    println!("Trades today:      {}", status.trades_today);
    if let Some(reason) = status.paused_reason {
        println!("Paused:            {reason}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn minute_candle(i: i64, close: i64) -> Candle {
        Candle {
            time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::minutes(i),
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: rust_decimal::Decimal::from(close),
            volume: dec!(10),
        }
    }

    #[tokio::test]
    async fn feed_serves_windows_up_to_the_cursor() {
        let source: Vec<Candle> = (0..20).map(|i| minute_candle(i, 100)).collect();
        let mut feed = ReplayFeed::new(source, 10);

        let window = feed.candles(Timeframe::M1, 5).await.unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(
            window.last().unwrap().time,
            minute_candle(9, 100).time
        );

        assert!(feed.advance());
        let window = feed.candles(Timeframe::M1, 50).await.unwrap();
        assert_eq!(window.len(), 11);
    }

    #[tokio::test]
    async fn feed_aggregates_higher_timeframes() {
        let source: Vec<Candle> = (0..15).map(|i| minute_candle(i, 100)).collect();
        let mut feed = ReplayFeed::new(source, 15);

        let bars = feed.candles(Timeframe::M5, 10).await.unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].volume, dec!(50));
    }

    #[test]
    fn advance_stops_at_the_end() {
        let source: Vec<Candle> = (0..3).map(|i| minute_candle(i, 100)).collect();
        let mut feed = ReplayFeed::new(source, 2);
        assert!(feed.advance());
        assert!(!feed.advance());
        assert_eq!(feed.current_time(), Some(minute_candle(2, 100).time));
    }
}
