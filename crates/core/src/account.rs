use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account balance and daily risk counters. Owned by the trade session and
/// mutated only by the risk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: Decimal,
    pub realized_pnl_total: Decimal,
    /// UTC calendar day the daily counters belong to.
    pub day_key: NaiveDate,
    pub pnl_today: Decimal,
    pub trades_today: u32,
    pub consecutive_errors: u32,
    /// Set when a risk guard has stopped the engine; non-empty implies the
    /// engine is not running.
    pub paused_reason: Option<String>,
}

impl AccountState {
    #[must_use]
    pub fn new(balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            balance,
            realized_pnl_total: Decimal::ZERO,
            day_key: now.date_naive(),
            pnl_today: Decimal::ZERO,
            trades_today: 0,
            consecutive_errors: 0,
            paused_reason: None,
        }
    }

    /// Rolls the day key forward if `now` is on a new UTC date, resetting
    /// the daily counters and clearing any pause. Returns whether a
    /// rollover happened.
    pub fn roll_day(&mut self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        if today == self.day_key {
            return false;
        }
        tracing::info!(
            from = %self.day_key,
            to = %today,
            "daily counters reset"
        );
        self.day_key = today;
        self.pnl_today = Decimal::ZERO;
        self.trades_today = 0;
        self.paused_reason = None;
        true
    }

    /// Books a realized trade into the running totals.
    pub fn record_trade(&mut self, net_pnl: Decimal) {
        self.realized_pnl_total += net_pnl;
        self.pnl_today += net_pnl;
        self.trades_today += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn roll_day_resets_counters_once_per_boundary() {
        let day1 = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        let mut account = AccountState::new(dec!(1000), day1);
        account.record_trade(dec!(-40));
        account.paused_reason = Some("daily loss limit".to_string());

        // Same day, later tick: nothing resets.
        assert!(!account.roll_day(Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 30).unwrap()));
        assert_eq!(account.pnl_today, dec!(-40));
        assert_eq!(account.trades_today, 1);

        // First tick of the next UTC day.
        assert!(account.roll_day(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 10).unwrap()));
        assert_eq!(account.pnl_today, Decimal::ZERO);
        assert_eq!(account.trades_today, 0);
        assert_eq!(account.paused_reason, None);

        // Second tick of the same day must not reset again.
        account.record_trade(dec!(7));
        assert!(!account.roll_day(Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()));
        assert_eq!(account.pnl_today, dec!(7));
    }

    #[test]
    fn record_trade_accumulates_totals() {
        let mut account = AccountState::new(dec!(500), Utc::now());
        account.record_trade(dec!(10));
        account.record_trade(dec!(-4));
        assert_eq!(account.realized_pnl_total, dec!(6));
        assert_eq!(account.pnl_today, dec!(6));
        assert_eq!(account.trades_today, 2);
    }
}
