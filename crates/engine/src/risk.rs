//! Daily-limit and circuit-breaker guards, run before any tick's trading
//! logic. Limit breaches are expected terminal transitions, not errors:
//! they pause the engine with a human-readable reason.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use smc_trade_core::{AccountState, EngineConfig};

#[derive(Debug, Clone)]
pub struct RiskGuard {
    pub max_daily_loss: Decimal,
    pub max_trades_per_day: u32,
    pub max_consecutive_errors: u32,
}

impl RiskGuard {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_daily_loss: config.max_daily_loss,
            max_trades_per_day: config.max_trades_per_day,
            max_consecutive_errors: config.max_consecutive_errors,
        }
    }

    /// Rolls the day key, then checks the daily limits. Returns the pause
    /// reason when a limit is breached.
    pub fn check_day(&self, account: &mut AccountState, now: DateTime<Utc>) -> Option<String> {
        account.roll_day(now);

        if account.pnl_today <= -self.max_daily_loss {
            return Some(format!(
                "daily loss limit reached: {} <= -{}",
                account.pnl_today, self.max_daily_loss
            ));
        }
        if account.trades_today >= self.max_trades_per_day {
            return Some(format!(
                "daily trade limit reached: {} trades",
                account.trades_today
            ));
        }
        None
    }

    /// Books a failed tick. Returns the pause reason when the breaker
    /// trips.
    pub fn on_tick_failure(&self, account: &mut AccountState) -> Option<String> {
        account.consecutive_errors += 1;
        if account.consecutive_errors >= self.max_consecutive_errors {
            return Some(format!(
                "circuit breaker: {} consecutive tick failures",
                account.consecutive_errors
            ));
        }
        None
    }

    /// Any successful tick resets the error streak.
    pub fn on_tick_success(&self, account: &mut AccountState) {
        account.consecutive_errors = 0;
    }
}
