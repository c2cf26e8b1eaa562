#![allow(dead_code)]

use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;

pub use wavetrader::domain::bar::{Bar, Interval};
use wavetrader::domain::config::EngineConfig;
use wavetrader::domain::error::WavetraderError;
use wavetrader::ports::bar_port::BarPort;

pub struct MockBarPort {
    pub series: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockBarPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.series.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl BarPort for MockBarPort {
    fn fetch_bars(
        &self,
        ticker: &str,
        _interval: Interval,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, WavetraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(WavetraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .series
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.timestamp >= start && b.timestamp < end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, WavetraderError> {
        let mut tickers: Vec<String> = self.series.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn make_bar(timestamp: &str, close: f64, osc: Option<(f64, f64)>, trend: i32) -> Bar {
    Bar {
        timestamp: dt(timestamp),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        osc_k: osc.map(|(k, _)| k),
        osc_d: osc.map(|(_, d)| d),
        trend,
    }
}

/// Hourly bars from `start`, with closes and indicator columns supplied by
/// the callback.
pub fn generate_bars<F>(start: &str, count: usize, mut f: F) -> Vec<Bar>
where
    F: FnMut(usize) -> (f64, Option<(f64, f64)>, i32),
{
    let start = dt(start);
    (0..count)
        .map(|i| {
            let (close, osc, trend) = f(i);
            Bar {
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                osc_k: osc.map(|(k, _)| k),
                osc_d: osc.map(|(_, d)| d),
                trend,
            }
        })
        .collect()
}

pub fn sample_config() -> EngineConfig {
    EngineConfig {
        initial_balance: 10_000_000.0,
        ..EngineConfig::default()
    }
}
