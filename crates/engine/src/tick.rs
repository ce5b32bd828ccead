//! The tick pipeline: one pass of guard checks, candle fetch, analysis,
//! and position management. Owned by a single task; nothing else mutates
//! engine state.

use crate::risk::RiskGuard;
use crate::session::TradeSession;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smc_trade_core::{
    CandleFeed, EngineConfig, EngineEvent, Position, SetupKind, SignalDetail,
};
use smc_trade_strategy::{
    analyze, evaluate_entry, sentiment_map, AnalysisParams, EntryParams,
};
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Point-in-time status snapshot published over the watch channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub running: bool,
    pub balance: rust_decimal::Decimal,
    pub pnl_today: rust_decimal::Decimal,
    pub trades_today: u32,
    pub paused_reason: Option<String>,
    pub open_position: Option<Position>,
    pub last_update: DateTime<Utc>,
}

/// The live decision engine. Single-owner state driven by [`tick`];
/// all external I/O goes through the injected [`CandleFeed`], all output
/// through the event broadcast.
///
/// [`tick`]: Engine::tick
pub struct Engine<F: CandleFeed> {
    config: EngineConfig,
    session: TradeSession,
    guard: RiskGuard,
    feed: F,
    events: broadcast::Sender<EngineEvent>,
    running: bool,
}

impl<F: CandleFeed> Engine<F> {
    #[must_use]
    pub fn new(config: EngineConfig, feed: F, events: broadcast::Sender<EngineEvent>) -> Self {
        let session = TradeSession::new(config.initial_balance, Utc::now());
        let guard = RiskGuard::from_config(&config);
        Self {
            config,
            session,
            guard,
            feed,
            events,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.session.account.paused_reason = None;
        self.running = true;
        tracing::info!(symbol = %self.config.symbol, "engine started");
    }

    pub fn stop(&mut self) {
        self.running = false;
        tracing::info!(symbol = %self.config.symbol, "engine stopped");
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn session(&self) -> &TradeSession {
        &self.session
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutable access to the injected feed (replay drivers advance their
    /// cursor between ticks).
    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            running: self.running,
            balance: self.session.account.balance,
            pnl_today: self.session.account.pnl_today,
            trades_today: self.session.account.trades_today,
            paused_reason: self.session.account.paused_reason.clone(),
            open_position: self.session.position.clone(),
            last_update: Utc::now(),
        }
    }

    /// Runs one engine tick. Risk guards run first and may pause the
    /// engine before any trading logic; a failed tick feeds the circuit
    /// breaker, a successful one resets it.
    pub async fn tick(&mut self, now: DateTime<Utc>) {
        if !self.running {
            return;
        }

        if let Some(reason) = self.guard.check_day(&mut self.session.account, now) {
            self.pause(reason, now);
            return;
        }

        match self.tick_inner(now).await {
            Ok(()) => self.guard.on_tick_success(&mut self.session.account),
            Err(error) => {
                tracing::error!(error = %error, "tick failed");
                let tripped = self.guard.on_tick_failure(&mut self.session.account);
                self.emit(EngineEvent::TickFailed {
                    message: format!("{error:#}"),
                    consecutive: self.session.account.consecutive_errors,
                    time: now,
                });
                if let Some(reason) = tripped {
                    self.pause(reason, now);
                }
            }
        }
    }

    async fn tick_inner(&mut self, now: DateTime<Utc>) -> Result<()> {
        let candles = self
            .feed
            .candles(self.config.interval, self.config.candle_window)
            .await
            .context("fetch working-timeframe candles")?;
        let last = candles
            .last()
            .copied()
            .context("feed returned no candles")?;
        let price = last.close;

        if self.session.position.is_some() {
            if let Some(trade) =
                self.session
                    .manage_exit(price, self.config.fee_rate, now)
            {
                tracing::info!(
                    reason = trade.reason.as_str(),
                    pnl = %trade.net_pnl,
                    exit = %trade.exit_price,
                    "position closed"
                );
                self.emit(EngineEvent::PositionClosed {
                    side: trade.side,
                    entry_price: trade.entry_price,
                    exit_price: trade.exit_price,
                    pnl: trade.net_pnl,
                    reason: trade.reason,
                    time: now,
                });
                return Ok(());
            }

            if let Some(old_sl) = self
                .session
                .apply_breakeven(price, self.config.breakeven_trigger_rr)
            {
                let entry_price = self
                    .session
                    .position
                    .as_ref()
                    .map(|p| p.entry_price)
                    .unwrap_or_default();
                tracing::info!(%old_sl, "stop moved to breakeven");
                self.emit(EngineEvent::BreakevenMoved {
                    entry_price,
                    old_sl,
                    time: now,
                });
            }
            return Ok(());
        }

        // Flat: evaluate a new entry.
        let mut windows: HashMap<_, _> = HashMap::new();
        for timeframe in &self.config.sentiment_timeframes {
            let window = self
                .feed
                .candles(*timeframe, self.config.candle_window)
                .await
                .with_context(|| format!("fetch {timeframe} sentiment candles"))?;
            windows.insert(*timeframe, window);
        }
        let sentiment = sentiment_map(&windows, self.config.sentiment_ema_period);

        let analysis = analyze(&candles, &self.analysis_params());
        let Some(signal) = evaluate_entry(
            &analysis,
            &candles,
            &sentiment,
            &self.config.confirm_timeframes,
            self.config.veto_timeframe,
            &self.entry_params(),
            self.session.last_signal_time,
            now,
        ) else {
            return Ok(());
        };

        let position = self.session.open_position(&signal, &self.config).clone();
        tracing::info!(
            side = ?position.side,
            entry = %position.entry_price,
            tp = %position.tp_price,
            sl = %position.sl_price,
            score = signal.score,
            "position opened"
        );
        self.emit(EngineEvent::PositionOpened {
            side: position.side,
            entry_price: position.entry_price,
            size: position.size,
            tp_price: position.tp_price,
            sl_price: position.sl_price,
            detail: SignalDetail {
                setup: SetupKind::Confluence,
                score: signal.score,
                is_breakeven: false,
            },
            time: now,
        });
        Ok(())
    }

    fn pause(&mut self, reason: String, now: DateTime<Utc>) {
        tracing::warn!(reason = %reason, "engine paused by risk guard");
        self.session.account.paused_reason = Some(reason.clone());
        self.running = false;
        self.emit(EngineEvent::EnginePaused { reason, time: now });
    }

    fn emit(&self, event: EngineEvent) {
        // Broadcast errors only mean nobody is listening.
        let _ = self.events.send(event);
    }

    fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            rsi_period: self.config.rsi_period,
            volume_sma_period: self.config.volume_sma_period,
            rsi_oversold: self.config.rsi_oversold,
            rsi_overbought: self.config.rsi_overbought,
            ..AnalysisParams::default()
        }
    }

    fn entry_params(&self) -> EntryParams {
        EntryParams {
            score_threshold: self.config.score_threshold,
            volume_multiplier: self.config.volume_multiplier,
            rsi_oversold: self.config.rsi_oversold,
            rsi_overbought: self.config.rsi_overbought,
            cooldown_secs: self.config.cooldown_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use smc_trade_core::{Candle, CloseReason, Side, Timeframe};

    /// Serves the same preset windows for every timeframe, or fails.
    struct StubFeed {
        candles: Vec<Candle>,
        fail: bool,
    }

    #[async_trait]
    impl CandleFeed for StubFeed {
        async fn candles(&mut self, _tf: Timeframe, limit: usize) -> Result<Vec<Candle>> {
            if self.fail {
                anyhow::bail!("connection reset");
            }
            let start = self.candles.len().saturating_sub(limit);
            Ok(self.candles[start..].to_vec())
        }
    }

    fn candle_at(i: i64, open: &str, high: &str, low: &str, close: &str, volume: i64) -> Candle {
        Candle {
            time: Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap(),
            open: open.parse().unwrap(),
            high: high.parse().unwrap(),
            low: low.parse().unwrap(),
            close: close.parse().unwrap(),
            volume: Decimal::from(volume),
        }
    }

    /// A decline into a base, then a breakout: the sell-off keeps RSI out
    /// of the overbought zone at entry, the reversal leaves a
    /// red-then-two-green order block, a bullish gap, rising swing
    /// structure, and a volume spike on the breakout candle.
    fn breakout_candles() -> Vec<Candle> {
        let declining_closes = [
            "105.0", "104.0", "103.0", "102.0", "101.0", "100.5", "100.2", "100.0", "99.95",
            "99.9", "99.85",
        ];
        let mut candles = Vec::new();
        let mut prev_close = "106.0";
        for (i, close) in declining_closes.into_iter().enumerate() {
            let open = prev_close;
            let high = format!("{}", open.parse::<Decimal>().unwrap() + dec!(0.3));
            let low = format!("{}", close.parse::<Decimal>().unwrap() - dec!(0.3));
            candles.push(candle_at(i as i64, open, &high, &low, close, 100));
            prev_close = close;
        }
        // Red order-block candle at the bottom of the base.
        candles.push(candle_at(11, "99.85", "100.1", "99.6", "99.8", 110));
        // Two green impulse candles off the block.
        candles.push(candle_at(12, "99.8", "101.5", "99.7", "101.4", 150));
        candles.push(candle_at(13, "101.4", "102.6", "101.3", "102.5", 180));
        // Continuation: offset -2 low (103.5) clears the offset -4 high
        // (102.6), a bullish fair value gap.
        candles.push(candle_at(14, "102.5", "103.8", "102.4", "103.6", 200));
        candles.push(candle_at(15, "103.6", "104.9", "103.5", "104.7", 260));
        // Breakout close with the volume spike.
        candles.push(candle_at(16, "104.7", "106.2", "104.6", "106.0", 400));
        candles
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            symbol: "TESTUSDT".to_string(),
            score_threshold: 3,
            candle_window: 50,
            max_consecutive_errors: 2,
            sentiment_timeframes: vec![Timeframe::M5, Timeframe::M15, Timeframe::H1],
            sentiment_ema_period: 10,
            ..EngineConfig::default()
        }
    }

    fn engine_with(candles: Vec<Candle>, fail: bool) -> Engine<StubFeed> {
        let (tx, _rx) = broadcast::channel(64);
        let mut engine = Engine::new(test_config(), StubFeed { candles, fail }, tx);
        engine.start();
        engine
    }

    #[tokio::test]
    async fn breakout_setup_opens_long_with_percent_offsets() {
        // Sentiment windows reuse the breakout candles: close far above
        // the EMA on every timeframe reads bullish.
        let mut engine = engine_with(breakout_candles(), false);
        let now = Utc::now();

        engine.tick(now).await;

        let position = engine.session().position.as_ref().expect("long opened");
        assert_eq!(position.side, Side::Long);
        assert_eq!(position.entry_price, dec!(106.0));
        assert_eq!(position.tp_price, dec!(106.0) * dec!(1.008));
        assert_eq!(position.sl_price, dec!(106.0) * dec!(0.996));
    }

    #[tokio::test]
    async fn no_second_position_while_one_is_open() {
        let mut engine = engine_with(breakout_candles(), false);
        let now = Utc::now();
        engine.tick(now).await;
        assert!(engine.session().position.is_some());
        let opened = engine.session().position.clone();

        engine.tick(now + Duration::seconds(120)).await;
        // Price still inside the band: same position, not a new one.
        assert_eq!(engine.session().position, opened);
        assert_eq!(engine.session().closed_trades.len(), 0);
    }

    #[tokio::test]
    async fn take_profit_closes_on_later_tick() {
        let mut engine = engine_with(breakout_candles(), false);
        let now = Utc::now();
        engine.tick(now).await;
        assert!(engine.session().position.is_some());

        // Push the close beyond the TP and tick again.
        let mut rally = breakout_candles();
        rally.push(candle_at(17, "106.0", "107.5", "105.9", "107.2", 300));
        engine.feed.candles = rally;

        engine.tick(now + Duration::seconds(60)).await;

        assert!(engine.session().position.is_none());
        let trade = engine.session().closed_trades.last().expect("closed");
        assert_eq!(trade.reason, CloseReason::TakeProfit);
        assert!(trade.net_pnl > Decimal::ZERO);
    }

    #[tokio::test]
    async fn failed_ticks_trip_the_circuit_breaker() {
        let mut engine = engine_with(breakout_candles(), true);
        let now = Utc::now();

        engine.tick(now).await;
        assert!(engine.is_running());
        assert_eq!(engine.session().account.consecutive_errors, 1);

        engine.tick(now + Duration::seconds(60)).await;
        assert!(!engine.is_running());
        let reason = engine.session().account.paused_reason.clone().unwrap();
        assert!(reason.contains("circuit breaker"));
    }

    #[tokio::test]
    async fn successful_tick_resets_error_streak() {
        let mut engine = engine_with(breakout_candles(), true);
        let now = Utc::now();
        engine.tick(now).await;
        assert_eq!(engine.session().account.consecutive_errors, 1);

        engine.feed.fail = false;
        engine.tick(now + Duration::seconds(60)).await;
        assert_eq!(engine.session().account.consecutive_errors, 0);
    }

    #[tokio::test]
    async fn daily_loss_guard_blocks_new_entries() {
        let mut engine = engine_with(breakout_candles(), false);
        let now = Utc::now();
        // Book a loss past the limit directly into today's counters.
        engine.session.account.record_trade(dec!(-150));

        engine.tick(now).await;

        assert!(!engine.is_running());
        assert!(engine.session().position.is_none());
        let reason = engine.session().account.paused_reason.clone().unwrap();
        assert!(reason.contains("daily loss"));

        // Even another explicit tick while stopped does nothing.
        engine.tick(now + Duration::seconds(60)).await;
        assert!(engine.session().position.is_none());
    }
}
