//! CSV candle file adapter.
//!
//! Reads prepared candle files named `{ticker}_{minutes}m.csv` with the
//! indicator columns already attached. Indicator cells are empty during
//! the warm-up window and map to `None`.

use crate::domain::bar::{check_strictly_increasing, Bar, Interval};
use crate::domain::error::WavetraderError;
use crate::ports::bar_port::BarPort;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvBarAdapter {
    base_path: PathBuf,
}

impl CsvBarAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str, interval: Interval) -> PathBuf {
        self.base_path
            .join(format!("{}_{}m.csv", ticker, interval.minutes()))
    }
}

fn data_err(reason: String) -> WavetraderError {
    WavetraderError::Data { reason }
}

fn required_f64(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, WavetraderError> {
    record
        .get(index)
        .ok_or_else(|| data_err(format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| data_err(format!("invalid {} value: {}", name, e)))
}

/// Empty cell means the indicator is not yet defined.
fn optional_f64(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<Option<f64>, WavetraderError> {
    match record.get(index) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| data_err(format!("invalid {} value: {}", name, e))),
    }
}

impl BarPort for CsvBarAdapter {
    fn fetch_bars(
        &self,
        ticker: &str,
        interval: Interval,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, WavetraderError> {
        let path = self.csv_path(ticker, interval);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;

            let ts_str = record
                .get(0)
                .ok_or_else(|| data_err("missing timestamp column".into()))?;
            let timestamp = NaiveDateTime::parse_from_str(ts_str.trim(), TIMESTAMP_FORMAT)
                .map_err(|e| data_err(format!("invalid timestamp {:?}: {}", ts_str, e)))?;

            if timestamp < start || timestamp >= end {
                continue;
            }

            let trend: i32 = match record.get(7) {
                None => 0,
                Some(s) if s.trim().is_empty() => 0,
                Some(s) => s
                    .trim()
                    .parse()
                    .map_err(|e| data_err(format!("invalid trend value: {}", e)))?,
            };

            bars.push(Bar {
                timestamp,
                open: required_f64(&record, 1, "open")?,
                high: required_f64(&record, 2, "high")?,
                low: required_f64(&record, 3, "low")?,
                close: required_f64(&record, 4, "close")?,
                osc_k: optional_f64(&record, 5, "osc_k")?,
                osc_d: optional_f64(&record, 6, "osc_d")?,
                trend,
            });
        }

        if let Err(position) = check_strictly_increasing(&bars) {
            return Err(WavetraderError::UnorderedSeries {
                ticker: ticker.to_string(),
                position,
            });
        }

        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, WavetraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_err(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_err(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            let Some(stem) = name_str.strip_suffix(".csv") else {
                continue;
            };
            let Some((ticker, interval)) = stem.rsplit_once('_') else {
                continue;
            };
            if interval.parse::<Interval>().is_ok() {
                tickers.insert(ticker.to_string());
            }
        }

        Ok(tickers.into_iter().collect())
    }
}
