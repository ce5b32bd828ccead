//! The trade session: single owner of position, account, and cooldown
//! state, passed by reference through the tick pipeline. Constructed once
//! per engine instance so concurrent backtests or multiple instruments
//! each hold independent state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use smc_trade_core::{
    AccountState, CloseReason, ClosedTrade, EngineConfig, Position, Side,
};
use smc_trade_strategy::EntrySignal;

#[derive(Debug, Clone)]
pub struct TradeSession {
    pub account: AccountState,
    pub position: Option<Position>,
    pub last_signal_time: Option<DateTime<Utc>>,
    pub closed_trades: Vec<ClosedTrade>,
}

impl TradeSession {
    #[must_use]
    pub fn new(initial_balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            account: AccountState::new(initial_balance, now),
            position: None,
            last_signal_time: None,
            closed_trades: Vec::new(),
        }
    }

    /// Returns the session to its freshly constructed state.
    pub fn reset(&mut self, initial_balance: Decimal, now: DateTime<Utc>) {
        *self = Self::new(initial_balance, now);
    }

    /// Opens a position from an entry signal, deducting margin and entry
    /// fee from the balance in the same step. The caller guarantees no
    /// position is open.
    pub fn open_position(&mut self, signal: &EntrySignal, config: &EngineConfig) -> &Position {
        debug_assert!(self.position.is_none(), "second concurrent position");

        let position = Position::open(
            signal.side,
            signal.price,
            config.margin,
            config.leverage,
            config.tp_pct,
            config.sl_pct,
            config.fee_rate,
            signal.time,
        );
        self.account.balance -= position.margin + position.open_fee;
        self.last_signal_time = Some(signal.time);
        self.position.insert(position)
    }

    /// Checks the open position against the latest close price and
    /// realizes it when an exit condition fires. Balance, daily PnL, and
    /// history are updated in one step: margin plus gross PnL minus the
    /// close fee returns to the balance, so after a round trip
    /// `balance == balance_before_open + net_pnl`.
    pub fn manage_exit(
        &mut self,
        price: Decimal,
        fee_rate: Decimal,
        now: DateTime<Utc>,
    ) -> Option<ClosedTrade> {
        let reason = self.position.as_ref()?.exit_reason(price)?;
        Some(self.close_position(price, reason, fee_rate, now))
    }

    /// Realizes the open position at `exit_price`.
    ///
    /// # Panics
    ///
    /// Panics if no position is open; callers check first.
    pub fn close_position(
        &mut self,
        exit_price: Decimal,
        reason: CloseReason,
        fee_rate: Decimal,
        now: DateTime<Utc>,
    ) -> ClosedTrade {
        let position = self.position.take().expect("no open position to close");

        let gross = position.gross_pnl(exit_price);
        let close_fee = position.size * fee_rate;
        let net = gross - position.open_fee - close_fee;

        self.account.balance += position.margin + gross - close_fee;
        self.account.record_trade(net);

        let trade = ClosedTrade {
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            size: position.size,
            net_pnl: net,
            reason,
            open_time: position.open_time,
            close_time: now,
        };
        self.closed_trades.push(trade.clone());
        trade
    }

    /// One-shot breakeven trail: once the favorable excursion reaches
    /// `trigger_rr` times the initial risk distance, the stop moves to
    /// entry. The stop only ever tightens. Returns the old stop when the
    /// move happens.
    pub fn apply_breakeven(&mut self, price: Decimal, trigger_rr: Decimal) -> Option<Decimal> {
        let position = self.position.as_mut()?;
        if position.is_breakeven {
            return None;
        }
        if position.favorable_excursion(price) < position.risk_distance() * trigger_rr {
            return None;
        }

        let tightens = match position.side {
            Side::Long => position.entry_price > position.sl_price,
            Side::Short => position.entry_price < position.sl_price,
        };
        if !tightens {
            return None;
        }

        let old_sl = position.sl_price;
        position.sl_price = position.entry_price;
        position.is_breakeven = true;
        Some(old_sl)
    }
}
