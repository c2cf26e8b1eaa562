//! Cash/coin ledger and trade execution.
//!
//! The ledger checks its contract before any mutation: a buy that cannot
//! afford one whole unit plus fee, or a sell with nothing held, is a no-op
//! rather than an error. A sell always liquidates the entire held quantity.

use chrono::NaiveDateTime;
use std::fmt;

/// Mutable per-run state, owned by the run controller and threaded through
/// every operation. Never a process-wide singleton: independent runs each
/// hold their own instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingState {
    pub balance: f64,
    pub coin_quantity: f64,
    /// Trailing low armed by the buy ratchet; `None` until the first
    /// candidate buy bar.
    pub trailing_min: Option<f64>,
    /// Trailing high armed by the sell ratchet.
    pub trailing_max: Option<f64>,
    pub start_price: f64,
    pub end_price: f64,
    pub total_fee: f64,
    pub trade_count: usize,
}

impl TradingState {
    pub fn new(initial_balance: f64) -> Self {
        TradingState {
            balance: initial_balance,
            coin_quantity: 0.0,
            trailing_min: None,
            trailing_max: None,
            start_price: 0.0,
            end_price: 0.0,
            total_fee: 0.0,
            trade_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// One executed trade. Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: f64,
    pub gross: f64,
    pub fee: f64,
}

pub fn trade_fee(gross: f64, fee_rate: f64) -> f64 {
    gross * fee_rate
}

/// Buy as many whole units as the balance covers.
///
/// Rejects when the balance cannot afford a single unit, or when
/// gross + fee exceeds the balance. On success the fee is deducted from the
/// cash side.
pub fn execute_buy(
    state: &mut TradingState,
    price: f64,
    timestamp: NaiveDateTime,
    fee_rate: f64,
) -> Option<TradeRecord> {
    if !(state.balance > price) || price <= 0.0 {
        return None;
    }

    let quantity = (state.balance / price).floor();
    let gross = quantity * price;
    let fee = trade_fee(gross, fee_rate);

    if state.balance < gross + fee {
        return None;
    }

    state.coin_quantity += quantity;
    state.balance -= gross + fee;
    state.total_fee += fee;
    state.trade_count += 1;

    Some(TradeRecord {
        timestamp,
        side: TradeSide::Buy,
        price,
        quantity,
        gross,
        fee,
    })
}

/// Sell the entire held quantity. There is no partial-sell path.
pub fn execute_sell(
    state: &mut TradingState,
    price: f64,
    timestamp: NaiveDateTime,
    fee_rate: f64,
) -> Option<TradeRecord> {
    if !(state.coin_quantity > 0.0) {
        return None;
    }

    let quantity = state.coin_quantity;
    let gross = quantity * price;
    let fee = trade_fee(gross, fee_rate);

    state.balance += gross - fee;
    state.coin_quantity = 0.0;
    state.total_fee += fee;
    state.trade_count += 1;

    Some(TradeRecord {
        timestamp,
        side: TradeSide::Sell,
        price,
        quantity,
        gross,
        fee,
    })
}
