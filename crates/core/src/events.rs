use crate::position::{CloseReason, Side};
use crate::signal::SignalDetail;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Events broadcast by the engine for collaborators (notifier, persistence)
/// to act on. The engine itself performs no network or disk I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A position was opened.
    PositionOpened {
        side: Side,
        entry_price: Decimal,
        size: Decimal,
        tp_price: Decimal,
        sl_price: Decimal,
        detail: SignalDetail,
        time: DateTime<Utc>,
    },

    /// A position was closed and its PnL realized.
    PositionClosed {
        side: Side,
        entry_price: Decimal,
        exit_price: Decimal,
        pnl: Decimal,
        reason: CloseReason,
        time: DateTime<Utc>,
    },

    /// The stop was trailed to entry.
    BreakevenMoved {
        entry_price: Decimal,
        old_sl: Decimal,
        time: DateTime<Utc>,
    },

    /// A risk guard stopped the engine.
    EnginePaused {
        reason: String,
        time: DateTime<Utc>,
    },

    /// A tick failed upstream (e.g. candle fetch); counted toward the
    /// circuit breaker.
    TickFailed {
        message: String,
        consecutive: u32,
        time: DateTime<Utc>,
    },
}
