//! Aggregation of many run results by ticker, interval, year, and month.
//!
//! Merging is associative and order-independent, so partial result sets
//! can be combined as runs complete in any order.

use std::collections::BTreeMap;

use crate::domain::bar::Interval;
use crate::domain::runner::RunResult;

/// One result slot per (ticker, interval, period). The interval is part of
/// the key: the same ticker and month backtested at 60m and 240m are two
/// distinct runs and must never overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunKey {
    pub ticker: String,
    pub interval: Interval,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResults {
    results: BTreeMap<RunKey, RunResult>,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: RunKey, result: RunResult) {
        self.results.insert(key, result);
    }

    pub fn merge(&mut self, other: BatchResults) {
        self.results.extend(other.results);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RunKey, &RunResult)> {
        self.results.iter()
    }

    /// Per-ticker roll-up in ticker order.
    pub fn ticker_summaries(&self) -> Vec<TickerSummary> {
        let mut by_ticker: BTreeMap<&str, TickerSummary> = BTreeMap::new();

        for (key, result) in &self.results {
            let summary = by_ticker
                .entry(key.ticker.as_str())
                .or_insert_with(|| TickerSummary::new(key.ticker.clone()));
            summary.periods += 1;
            summary.total_profit_rate += result.profit_rate;
            summary.total_coin_change_rate += result.coin_change_rate;
            if result.profit_rate > 0.0 {
                summary.profitable_periods += 1;
            }
        }

        by_ticker.into_values().collect()
    }
}

/// Roll-up of one ticker's periods.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSummary {
    pub ticker: String,
    pub periods: usize,
    pub profitable_periods: usize,
    pub total_profit_rate: f64,
    pub total_coin_change_rate: f64,
}

impl TickerSummary {
    fn new(ticker: String) -> Self {
        TickerSummary {
            ticker,
            periods: 0,
            profitable_periods: 0,
            total_profit_rate: 0.0,
            total_coin_change_rate: 0.0,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.periods > 0 {
            self.profitable_periods as f64 * 100.0 / self.periods as f64
        } else {
            0.0
        }
    }

    pub fn avg_profit_rate(&self) -> f64 {
        if self.periods > 0 {
            self.total_profit_rate / self.periods as f64
        } else {
            0.0
        }
    }

    pub fn avg_coin_change_rate(&self) -> f64 {
        if self.periods > 0 {
            self.total_coin_change_rate / self.periods as f64
        } else {
            0.0
        }
    }

    /// Excess of the strategy's average return over just holding the coin.
    pub fn alpha(&self) -> f64 {
        self.avg_profit_rate() - self.avg_coin_change_rate()
    }
}
