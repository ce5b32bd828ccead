use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

/// Why a position was closed. `EndOfData` is produced only by the backtest
/// when it force-closes the last open trade on the final bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    TakeProfit,
    StopLoss,
    Liquidation,
    EndOfData,
}

impl CloseReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TakeProfit => "take profit",
            Self::StopLoss => "stop loss",
            Self::Liquidation => "liquidation",
            Self::EndOfData => "end of data",
        }
    }
}

/// An open leveraged position. At most one exists at any time; it is
/// mutated only by the risk manager (breakeven trail) and destroyed on
/// close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_price: Decimal,
    pub margin: Decimal,
    /// Notional value, `margin * leverage`.
    pub size: Decimal,
    pub tp_price: Decimal,
    pub sl_price: Decimal,
    pub liquidation_price: Decimal,
    pub open_fee: Decimal,
    pub open_time: DateTime<Utc>,
    pub is_breakeven: bool,
}

impl Position {
    /// Builds a position from entry parameters. TP/SL are fixed
    /// percentage offsets from entry; liquidation sits at `1/leverage`
    /// away against the trade.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        side: Side,
        entry_price: Decimal,
        margin: Decimal,
        leverage: u32,
        tp_pct: Decimal,
        sl_pct: Decimal,
        fee_rate: Decimal,
        open_time: DateTime<Utc>,
    ) -> Self {
        let size = margin * Decimal::from(leverage);
        let liq_offset = Decimal::ONE / Decimal::from(leverage.max(1));
        let (tp_price, sl_price, liquidation_price) = match side {
            Side::Long => (
                entry_price * (Decimal::ONE + tp_pct),
                entry_price * (Decimal::ONE - sl_pct),
                entry_price * (Decimal::ONE - liq_offset),
            ),
            Side::Short => (
                entry_price * (Decimal::ONE - tp_pct),
                entry_price * (Decimal::ONE + sl_pct),
                entry_price * (Decimal::ONE + liq_offset),
            ),
        };

        Self {
            side,
            entry_price,
            margin,
            size,
            tp_price,
            sl_price,
            liquidation_price,
            open_fee: size * fee_rate,
            open_time,
            is_breakeven: false,
        }
    }

    /// Gross PnL at `exit_price`: price delta times notional units
    /// (`size / entry_price`), signed by side.
    #[must_use]
    pub fn gross_pnl(&self, exit_price: Decimal) -> Decimal {
        let units = self.size / self.entry_price;
        match self.side {
            Side::Long => (exit_price - self.entry_price) * units,
            Side::Short => (self.entry_price - exit_price) * units,
        }
    }

    /// Distance between entry and the current stop.
    #[must_use]
    pub fn risk_distance(&self) -> Decimal {
        (self.entry_price - self.sl_price).abs()
    }

    /// Price excursion in the trade's favor (never negative).
    #[must_use]
    pub fn favorable_excursion(&self, price: Decimal) -> Decimal {
        let delta = match self.side {
            Side::Long => price - self.entry_price,
            Side::Short => self.entry_price - price,
        };
        delta.max(Decimal::ZERO)
    }

    /// Exit check against a single price (the live fill model).
    /// Priority: liquidation, then take profit, then stop loss; the first
    /// matching reason wins.
    #[must_use]
    pub fn exit_reason(&self, price: Decimal) -> Option<CloseReason> {
        match self.side {
            Side::Long => {
                if price <= self.liquidation_price {
                    Some(CloseReason::Liquidation)
                } else if price >= self.tp_price {
                    Some(CloseReason::TakeProfit)
                } else if price <= self.sl_price {
                    Some(CloseReason::StopLoss)
                } else {
                    None
                }
            }
            Side::Short => {
                if price >= self.liquidation_price {
                    Some(CloseReason::Liquidation)
                } else if price <= self.tp_price {
                    Some(CloseReason::TakeProfit)
                } else if price >= self.sl_price {
                    Some(CloseReason::StopLoss)
                } else {
                    None
                }
            }
        }
    }
}

/// A resting limit order awaiting a touch (backtest only). Never
/// concurrent with an open trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub side: Side,
    pub entry_price: Decimal,
    pub sl_price: Decimal,
    pub tp_price: Decimal,
    /// Bar index at which the setup was armed, used for expiry.
    pub setup_index: usize,
}

/// A realized trade, appended to history on close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub side: Side,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    /// Notional value at entry.
    pub size: Decimal,
    pub net_pnl: Decimal,
    pub reason: CloseReason,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_long() -> Position {
        Position::open(
            Side::Long,
            dec!(100),
            dec!(50),
            50,
            dec!(0.008),
            dec!(0.004),
            dec!(0.0004),
            Utc::now(),
        )
    }

    #[test]
    fn open_derives_prices_from_percent_offsets() {
        let pos = open_long();
        assert_eq!(pos.size, dec!(2500));
        assert_eq!(pos.tp_price, dec!(100.800));
        assert_eq!(pos.sl_price, dec!(99.600));
        assert_eq!(pos.liquidation_price, dec!(98.00));
        assert_eq!(pos.open_fee, dec!(1.0000));
    }

    #[test]
    fn short_mirrors_price_offsets() {
        let pos = Position::open(
            Side::Short,
            dec!(200),
            dec!(100),
            10,
            dec!(0.01),
            dec!(0.005),
            dec!(0.0004),
            Utc::now(),
        );
        assert_eq!(pos.tp_price, dec!(198.00));
        assert_eq!(pos.sl_price, dec!(201.000));
        assert_eq!(pos.liquidation_price, dec!(220.0));
    }

    #[test]
    fn gross_pnl_scales_with_notional_units() {
        let pos = open_long();
        // 2500 notional at entry 100 = 25 units; +5 move = 125.
        assert_eq!(pos.gross_pnl(dec!(105)), dec!(125));
        assert_eq!(pos.gross_pnl(dec!(99)), dec!(-25));
    }

    #[test]
    fn exit_reason_priority_long() {
        let pos = open_long();
        assert_eq!(pos.exit_reason(dec!(100.5)), None);
        assert_eq!(pos.exit_reason(dec!(100.8)), Some(CloseReason::TakeProfit));
        assert_eq!(pos.exit_reason(dec!(99.5)), Some(CloseReason::StopLoss));
        // At or below the liquidation price the stop no longer matters.
        assert_eq!(pos.exit_reason(dec!(98)), Some(CloseReason::Liquidation));
    }

    #[test]
    fn exit_reason_priority_short() {
        let pos = Position::open(
            Side::Short,
            dec!(100),
            dec!(50),
            50,
            dec!(0.008),
            dec!(0.004),
            dec!(0.0004),
            Utc::now(),
        );
        assert_eq!(pos.exit_reason(dec!(99.2)), Some(CloseReason::TakeProfit));
        assert_eq!(pos.exit_reason(dec!(100.4)), Some(CloseReason::StopLoss));
        assert_eq!(pos.exit_reason(dec!(102)), Some(CloseReason::Liquidation));
    }

    #[test]
    fn favorable_excursion_is_never_negative() {
        let pos = open_long();
        assert_eq!(pos.favorable_excursion(dec!(101)), dec!(1));
        assert_eq!(pos.favorable_excursion(dec!(99)), Decimal::ZERO);
    }
}
