//! Engine actor: owns the engine state on a single task and processes
//! commands between ticks. Ticks therefore never overlap, and a stop
//! command takes effect only after an in-flight tick completes, so
//! callers must tolerate one final decision after requesting a stop.

use crate::tick::{Engine, EngineStatus};
use anyhow::Result;
use chrono::Utc;
use smc_trade_core::{CandleFeed, EngineConfig, EngineEvent};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub enum EngineCommand {
    Start,
    Stop,
    Status(oneshot::Sender<EngineStatus>),
    Shutdown,
}

/// Client side of a spawned engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
    events: broadcast::Sender<EngineEvent>,
    status_rx: watch::Receiver<EngineStatus>,
}

impl EngineHandle {
    /// # Errors
    ///
    /// Returns an error if the actor has shut down.
    pub async fn start(&self) -> Result<()> {
        self.tx.send(EngineCommand::Start).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the actor has shut down.
    pub async fn stop(&self) -> Result<()> {
        self.tx.send(EngineCommand::Stop).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the actor has shut down.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(EngineCommand::Shutdown).await?;
        Ok(())
    }

    /// Requests a fresh status snapshot from the actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has shut down.
    pub async fn status(&self) -> Result<EngineStatus> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(EngineCommand::Status(tx)).await?;
        Ok(rx.await?)
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// The latest published status without a round trip to the actor.
    #[must_use]
    pub fn last_status(&self) -> EngineStatus {
        self.status_rx.borrow().clone()
    }
}

pub struct EngineActor<F: CandleFeed> {
    engine: Engine<F>,
    rx: mpsc::Receiver<EngineCommand>,
    status_tx: watch::Sender<EngineStatus>,
    tick_interval: Duration,
}

/// Spawns the engine on its own task and returns the handle.
pub fn spawn<F: CandleFeed + 'static>(
    config: EngineConfig,
    feed: F,
) -> (EngineHandle, JoinHandle<Result<()>>) {
    let (tx, rx) = mpsc::channel(32);
    let (event_tx, _) = broadcast::channel(256);
    let tick_interval = Duration::from_secs(config.tick_interval_secs);

    let engine = Engine::new(config, feed, event_tx.clone());
    let (status_tx, status_rx) = watch::channel(engine.status());

    let actor = EngineActor {
        engine,
        rx,
        status_tx,
        tick_interval,
    };
    let handle = EngineHandle {
        tx,
        events: event_tx,
        status_rx,
    };
    (handle, tokio::spawn(actor.run()))
}

impl<F: CandleFeed> EngineActor<F> {
    /// Runs the actor loop until shutdown or all handles are dropped.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for fatal
    /// initialization failures.
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(EngineCommand::Start) => {
                        self.engine.start();
                        self.publish_status();
                    }
                    Some(EngineCommand::Stop) => {
                        self.engine.stop();
                        self.publish_status();
                    }
                    Some(EngineCommand::Status(reply)) => {
                        let _ = reply.send(self.engine.status());
                    }
                    Some(EngineCommand::Shutdown) | None => break,
                },
                _ = ticker.tick() => {
                    if self.engine.is_running() {
                        self.engine.tick(Utc::now()).await;
                        self.publish_status();
                    }
                }
            }
        }

        tracing::info!("engine actor stopped");
        Ok(())
    }

    fn publish_status(&self) {
        let _ = self.status_tx.send(self.engine.status());
    }
}
