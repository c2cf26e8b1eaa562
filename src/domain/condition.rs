//! Per-bar buy/sell/hold decision.
//!
//! Three layers combine into one decision:
//! - the oscillator gate (fast vs slow crossover inside the oversold or
//!   overbought band, agreeing with the trend signal);
//! - the trailing-extremum ratchet, which waits for a bounce off the
//!   trailing low before buying and a fade off the trailing high before
//!   selling;
//! - the pattern score, which can force a decision on a strong signal or
//!   mark a ratchet decision as confirmed on a medium one.
//!
//! Buy and sell gates cannot both hold on one bar (k > d excludes k < d),
//! so at most one side is ever considered.

use crate::domain::bar::Bar;
use crate::domain::config::EngineConfig;
use crate::domain::ledger::TradingState;
use crate::domain::pattern::PatternOutcome;

/// What carried an accepted decision over the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The ratchet test alone.
    Ratchet,
    /// The ratchet test, reinforced by a medium pattern score.
    RatchetConfirmed,
    /// A strong pattern score, bypassing the ratchet.
    PatternForced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy(Trigger),
    Sell(Trigger),
    Hold,
}

impl Decision {
    pub fn is_buy(&self) -> bool {
        matches!(self, Decision::Buy(_))
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Decision::Sell(_))
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Decision::Hold)
    }
}

/// Decide for one bar, advancing the ratchet state as a side effect.
///
/// A bar with an undefined oscillator is a forced hold and leaves the
/// ratchet untouched. Ungated bars never move the ratchet either: the
/// trailing extrema only track prices on bars where the respective side was
/// actually a candidate.
pub fn decide(
    bar: &Bar,
    pattern: &PatternOutcome,
    state: &mut TradingState,
    config: &EngineConfig,
) -> Decision {
    let Some((k, d)) = bar.oscillator() else {
        return Decision::Hold;
    };
    let price = bar.close;

    if k > d && k < config.oversold_threshold && bar.trend > 0 {
        let accepted = buy_ratchet(state, price, config);
        let score = pattern.buy_score();
        if accepted {
            if score >= config.confirm_signal_score {
                return Decision::Buy(Trigger::RatchetConfirmed);
            }
            return Decision::Buy(Trigger::Ratchet);
        }
        if score >= config.strong_signal_score {
            return Decision::Buy(Trigger::PatternForced);
        }
        return Decision::Hold;
    }

    if k < d && k > config.overbought_threshold && bar.trend < 0 {
        let accepted = sell_ratchet(state, price, config);
        let score = pattern.sell_score();
        if accepted {
            if score >= config.confirm_signal_score {
                return Decision::Sell(Trigger::RatchetConfirmed);
            }
            return Decision::Sell(Trigger::Ratchet);
        }
        if score >= config.strong_signal_score {
            return Decision::Sell(Trigger::PatternForced);
        }
        return Decision::Hold;
    }

    Decision::Hold
}

/// Continuous-trailing buy ratchet.
///
/// Unset: arm at the current price and defer. Armed: accept once the price
/// has risen off the trailing low by more than the configured rate. The
/// extremum is reset to the current price on every gated bar, accepted or
/// not.
fn buy_ratchet(state: &mut TradingState, price: f64, config: &EngineConfig) -> bool {
    match state.trailing_min {
        None => {
            state.trailing_min = Some(price);
            false
        }
        Some(min) => {
            let accepted = min * config.buy_price_change_rate < price;
            state.trailing_min = Some(price);
            accepted
        }
    }
}

/// Mirror of [`buy_ratchet`]: accept once the price has faded below the
/// trailing high scaled by the configured rate.
fn sell_ratchet(state: &mut TradingState, price: f64, config: &EngineConfig) -> bool {
    match state.trailing_max {
        None => {
            state.trailing_max = Some(price);
            false
        }
        Some(max) => {
            let accepted = max * config.sell_price_change_rate > price;
            state.trailing_max = Some(price);
            accepted
        }
    }
}
