//! Run controller: drives the per-bar loop over one input series.
//!
//! A run walks Init → Running → Liquidating → Done. Each run owns its own
//! [`TradingState`]; nothing is shared between runs, so independent runs
//! are safe to execute in parallel.

use chrono::NaiveDateTime;

use crate::domain::bar::Bar;
use crate::domain::condition::{self, Decision};
use crate::domain::config::EngineConfig;
use crate::domain::ledger::{self, TradeRecord, TradeSide, TradingState};
use crate::domain::pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Running,
    Liquidating,
    Done,
}

/// Final figures of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Realized profit over the initial balance, in percent.
    pub profit_rate: f64,
    /// Price change of the asset itself over the same window, in percent.
    pub coin_change_rate: f64,
    pub start_price: f64,
    pub end_price: f64,
    /// Set when the requested window contained no bars at all.
    pub no_data: bool,
}

impl RunResult {
    pub fn empty() -> Self {
        RunResult {
            profit_rate: 0.0,
            coin_change_rate: 0.0,
            start_price: 0.0,
            end_price: 0.0,
            no_data: true,
        }
    }
}

/// One row of the per-bar decision trace, kept for downstream charting.
/// Bars where nothing executed are recorded too.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub decision: Decision,
    pub executed: Option<TradeSide>,
    pub buy_score: u32,
    pub sell_score: u32,
}

/// Everything a run produces: the summary result, the executed trades, the
/// per-bar trace, and the final ledger state for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub result: RunResult,
    pub trades: Vec<TradeRecord>,
    pub trace: Vec<TraceEntry>,
    pub final_state: TradingState,
}

pub struct Backtest {
    config: EngineConfig,
    state: TradingState,
    phase: RunPhase,
}

impl Backtest {
    pub fn new(config: EngineConfig) -> Self {
        let state = TradingState::new(config.initial_balance);
        Backtest {
            config,
            state,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run the engine over a prepared series.
    ///
    /// State is reseeded on entry, so the same instance can drive
    /// consecutive runs. An empty series short-circuits to a zero result
    /// without entering the running phase. Any position still open after
    /// the last bar is liquidated at the last finite close, bypassing all
    /// gating.
    pub fn run(&mut self, bars: &[Bar]) -> RunReport {
        self.state = TradingState::new(self.config.initial_balance);
        self.phase = RunPhase::Init;

        let mut trades: Vec<TradeRecord> = Vec::new();
        let mut trace: Vec<TraceEntry> = Vec::with_capacity(bars.len());

        if bars.is_empty() {
            self.phase = RunPhase::Done;
            return RunReport {
                result: RunResult::empty(),
                trades,
                trace,
                final_state: self.state.clone(),
            };
        }

        self.phase = RunPhase::Running;

        // Last bar with a usable price; start/end prices and the forced
        // liquidation all come from here, never from a broken row.
        let mut last_valid: Option<(NaiveDateTime, f64)> = None;

        for (i, bar) in bars.iter().enumerate() {
            // A bar with a broken price is recorded as no-trade and skipped;
            // one bad row must not abort the run.
            if !bar.close.is_finite() {
                trace.push(TraceEntry {
                    timestamp: bar.timestamp,
                    close: bar.close,
                    decision: Decision::Hold,
                    executed: None,
                    buy_score: 0,
                    sell_score: 0,
                });
                continue;
            }

            if last_valid.is_none() {
                self.state.start_price = bar.close;
            }
            last_valid = Some((bar.timestamp, bar.close));
            self.state.end_price = bar.close;

            let outcome = pattern::analyze(bars, i, &self.config);
            let decision = condition::decide(bar, &outcome, &mut self.state, &self.config);

            let executed = match decision {
                Decision::Buy(_) => ledger::execute_buy(
                    &mut self.state,
                    bar.close,
                    bar.timestamp,
                    self.config.fee_rate,
                ),
                Decision::Sell(_) => ledger::execute_sell(
                    &mut self.state,
                    bar.close,
                    bar.timestamp,
                    self.config.fee_rate,
                ),
                Decision::Hold => None,
            };

            trace.push(TraceEntry {
                timestamp: bar.timestamp,
                close: bar.close,
                decision,
                executed: executed.as_ref().map(|t| t.side),
                buy_score: outcome.buy_score(),
                sell_score: outcome.sell_score(),
            });

            if let Some(trade) = executed {
                trades.push(trade);
            }
        }

        self.phase = RunPhase::Liquidating;

        // A position can only exist if at least one bar was usable, so
        // last_valid is set whenever there is anything to liquidate.
        if self.state.coin_quantity > 0.0 {
            if let Some((timestamp, close)) = last_valid {
                if let Some(trade) =
                    ledger::execute_sell(&mut self.state, close, timestamp, self.config.fee_rate)
                {
                    trades.push(trade);
                }
            }
        }

        self.phase = RunPhase::Done;

        let initial = self.config.initial_balance;
        let profit_rate = if initial > 0.0 {
            (self.state.balance - initial) * 100.0 / initial
        } else {
            0.0
        };
        let coin_change_rate = if self.state.start_price > 0.0 {
            (self.state.end_price - self.state.start_price) * 100.0 / self.state.start_price
        } else {
            0.0
        };

        RunReport {
            result: RunResult {
                profit_rate,
                coin_change_rate,
                start_price: self.state.start_price,
                end_price: self.state.end_price,
                no_data: false,
            },
            trades,
            trace,
            final_state: self.state.clone(),
        }
    }
}
