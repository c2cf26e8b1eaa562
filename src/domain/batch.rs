//! Batch orchestration: tickers × intervals × periods.
//!
//! Each run spec is independent, so the batch fans out across a thread
//! pool and merges partial results as they complete. A spec whose data
//! fetch fails or comes back empty yields an empty result and never
//! aborts its siblings.

use rayon::prelude::*;
use std::collections::HashSet;

use crate::domain::aggregate::{BatchResults, RunKey};
use crate::domain::bar::Interval;
use crate::domain::config::EngineConfig;
use crate::domain::error::WavetraderError;
use crate::domain::period::TradingPeriod;
use crate::domain::runner::{Backtest, RunResult};
use crate::ports::bar_port::BarPort;

#[derive(Debug, Clone)]
pub struct RunSpec {
    pub ticker: String,
    pub interval: Interval,
    pub period: TradingPeriod,
}

/// Cartesian product of tickers, intervals, and periods, in input order.
pub fn build_specs(
    tickers: &[String],
    intervals: &[Interval],
    periods: &[TradingPeriod],
) -> Vec<RunSpec> {
    let mut specs = Vec::with_capacity(tickers.len() * intervals.len() * periods.len());
    for ticker in tickers {
        for &interval in intervals {
            for period in periods {
                specs.push(RunSpec {
                    ticker: ticker.clone(),
                    interval,
                    period: period.clone(),
                });
            }
        }
    }
    specs
}

/// Parse a comma-separated ticker list. Tokens are trimmed and uppercased;
/// empty tokens and duplicates are rejected.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, WavetraderError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WavetraderError::ConfigInvalid {
                section: "batch".to_string(),
                key: "tickers".to_string(),
                reason: "empty token in ticker list".to_string(),
            });
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(WavetraderError::ConfigInvalid {
                section: "batch".to_string(),
                key: "tickers".to_string(),
                reason: format!("duplicate ticker: {}", ticker),
            });
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

/// Execute all specs in parallel and merge their keyed results.
///
/// Merge order is arbitrary; [`BatchResults::merge`] is order-independent,
/// so the outcome is deterministic regardless of scheduling.
pub fn run_batch(
    port: &(dyn BarPort + Sync),
    specs: &[RunSpec],
    config: &EngineConfig,
) -> BatchResults {
    specs
        .par_iter()
        .map(|spec| {
            let result = run_one(port, spec, config);
            let mut partial = BatchResults::new();
            partial.insert(
                RunKey {
                    ticker: spec.ticker.clone(),
                    interval: spec.interval,
                    year: spec.period.year,
                    month: spec.period.month,
                },
                result,
            );
            partial
        })
        .reduce(BatchResults::new, |mut acc, partial| {
            acc.merge(partial);
            acc
        })
}

fn run_one(port: &(dyn BarPort + Sync), spec: &RunSpec, config: &EngineConfig) -> RunResult {
    let bars = match port.fetch_bars(
        &spec.ticker,
        spec.interval,
        spec.period.start,
        spec.period.end,
    ) {
        Ok(bars) => bars,
        Err(e) => {
            eprintln!(
                "Warning: skipping {} {}m {}/{:02} ({})",
                spec.ticker, spec.interval, spec.period.year, spec.period.month, e
            );
            return RunResult::empty();
        }
    };

    if bars.is_empty() {
        eprintln!(
            "Warning: no data for {} {}m {}/{:02}",
            spec.ticker, spec.interval, spec.period.year, spec.period.month
        );
        return RunResult::empty();
    }

    Backtest::new(config.clone()).run(&bars).result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::period::month_window;
    use chrono::NaiveDateTime;
    use std::collections::HashMap;

    struct MapPort {
        series: HashMap<String, Vec<Bar>>,
    }

    impl BarPort for MapPort {
        fn fetch_bars(
            &self,
            ticker: &str,
            _interval: Interval,
            start: NaiveDateTime,
            end: NaiveDateTime,
        ) -> Result<Vec<Bar>, WavetraderError> {
            match self.series.get(ticker) {
                Some(bars) => Ok(bars
                    .iter()
                    .filter(|b| b.timestamp >= start && b.timestamp < end)
                    .cloned()
                    .collect()),
                None => Err(WavetraderError::NoData {
                    ticker: ticker.to_string(),
                    interval: "60".to_string(),
                }),
            }
        }

        fn list_tickers(&self) -> Result<Vec<String>, WavetraderError> {
            let mut tickers: Vec<String> = self.series.keys().cloned().collect();
            tickers.sort();
            Ok(tickers)
        }
    }

    fn flat_bars(start: NaiveDateTime, n: usize, close: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                timestamp: start + chrono::Duration::hours(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                osc_k: None,
                osc_d: None,
                trend: 0,
            })
            .collect()
    }

    fn period(year: i32, month: u32) -> TradingPeriod {
        let (start, end) = month_window(year, month).unwrap();
        TradingPeriod {
            year,
            month,
            start,
            end,
        }
    }

    #[test]
    fn parse_tickers_basic() {
        let result = parse_tickers("KRW-BTC, krw-eth ,KRW-XRP").unwrap();
        assert_eq!(result, vec!["KRW-BTC", "KRW-ETH", "KRW-XRP"]);
    }

    #[test]
    fn parse_tickers_rejects_empty_token() {
        let err = parse_tickers("KRW-BTC,,KRW-ETH").unwrap_err();
        assert!(matches!(err, WavetraderError::ConfigInvalid { key, .. } if key == "tickers"));
    }

    #[test]
    fn parse_tickers_rejects_duplicate() {
        let err = parse_tickers("KRW-BTC,krw-btc").unwrap_err();
        assert!(
            matches!(err, WavetraderError::ConfigInvalid { reason, .. } if reason.contains("KRW-BTC"))
        );
    }

    #[test]
    fn build_specs_is_full_product() {
        let tickers = vec!["KRW-BTC".to_string(), "KRW-ETH".to_string()];
        let intervals = vec![Interval::Min60, Interval::Min240];
        let periods = vec![period(2024, 1), period(2024, 2), period(2024, 3)];

        let specs = build_specs(&tickers, &intervals, &periods);
        assert_eq!(specs.len(), 12);
        assert_eq!(specs[0].ticker, "KRW-BTC");
        assert_eq!(specs[11].ticker, "KRW-ETH");
        assert_eq!(specs[11].period.month, 3);
    }

    #[test]
    fn batch_covers_every_spec() {
        let p = period(2024, 1);
        let mut series = HashMap::new();
        series.insert("KRW-BTC".to_string(), flat_bars(p.start, 48, 100.0));
        series.insert("KRW-ETH".to_string(), flat_bars(p.start, 48, 50.0));
        let port = MapPort { series };

        let specs = build_specs(
            &["KRW-BTC".to_string(), "KRW-ETH".to_string()],
            &[Interval::Min60],
            &[p],
        );
        let results = run_batch(&port, &specs, &EngineConfig::default());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| !r.no_data));
    }

    #[test]
    fn same_month_at_two_intervals_yields_two_results() {
        let p = period(2024, 1);
        let mut series = HashMap::new();
        series.insert("KRW-BTC".to_string(), flat_bars(p.start, 48, 100.0));
        let port = MapPort { series };

        let specs = build_specs(
            &["KRW-BTC".to_string()],
            &[Interval::Min60, Interval::Min240],
            &[p],
        );
        let results = run_batch(&port, &specs, &EngineConfig::default());
        assert_eq!(results.len(), specs.len());

        let intervals: Vec<Interval> = results.iter().map(|(k, _)| k.interval).collect();
        assert_eq!(intervals, vec![Interval::Min60, Interval::Min240]);
    }

    #[test]
    fn failed_fetch_yields_empty_result_not_abort() {
        let p = period(2024, 1);
        let mut series = HashMap::new();
        series.insert("KRW-BTC".to_string(), flat_bars(p.start, 48, 100.0));
        let port = MapPort { series };

        let specs = build_specs(
            &["KRW-BTC".to_string(), "KRW-MISSING".to_string()],
            &[Interval::Min60],
            &[p],
        );
        let results = run_batch(&port, &specs, &EngineConfig::default());
        assert_eq!(results.len(), 2);

        let missing = results
            .iter()
            .find(|(k, _)| k.ticker == "KRW-MISSING")
            .map(|(_, r)| r.clone())
            .unwrap();
        assert!(missing.no_data);

        let present = results
            .iter()
            .find(|(k, _)| k.ticker == "KRW-BTC")
            .map(|(_, r)| r.clone())
            .unwrap();
        assert!(!present.no_data);
    }

    #[test]
    fn window_outside_data_is_no_data() {
        let p1 = period(2024, 1);
        let p2 = period(2024, 2);
        let mut series = HashMap::new();
        series.insert("KRW-BTC".to_string(), flat_bars(p1.start, 48, 100.0));
        let port = MapPort { series };

        let specs = build_specs(&["KRW-BTC".to_string()], &[Interval::Min60], &[p2]);
        let results = run_batch(&port, &specs, &EngineConfig::default());
        assert_eq!(results.len(), 1);
        assert!(results.iter().all(|(_, r)| r.no_data));
    }

    #[test]
    fn batch_matches_sequential_runs() {
        let p = period(2024, 1);
        let mut series = HashMap::new();
        series.insert("KRW-BTC".to_string(), flat_bars(p.start, 100, 100.0));
        let port = MapPort { series };
        let config = EngineConfig::default();

        let specs = build_specs(&["KRW-BTC".to_string()], &[Interval::Min60], &[p.clone()]);
        let parallel = run_batch(&port, &specs, &config);

        let bars = port
            .fetch_bars("KRW-BTC", Interval::Min60, p.start, p.end)
            .unwrap();
        let sequential = Backtest::new(config).run(&bars).result;

        let (_, from_batch) = parallel.iter().next().unwrap();
        assert_eq!(*from_batch, sequential);
    }
}
