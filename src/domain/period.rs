//! Calendar-month test periods.
//!
//! Batch runs are selected as `{year: [months]}`; each selection expands to
//! a half-open `[start, end)` window covering the whole month.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TradingPeriod {
    pub year: i32,
    pub month: u32,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// `[first of month 00:00, first of next month 00:00)`.
pub fn month_window(year: i32, month: u32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some((
        start.and_hms_opt(0, 0, 0)?,
        end.and_hms_opt(0, 0, 0)?,
    ))
}

/// Expand year/month selections into periods, sorted by (year, month).
/// Invalid months are skipped.
pub fn expand_periods(selections: &BTreeMap<i32, Vec<u32>>) -> Vec<TradingPeriod> {
    let mut periods = Vec::new();
    for (&year, months) in selections {
        let mut months = months.clone();
        months.sort_unstable();
        months.dedup();
        for month in months {
            if let Some((start, end)) = month_window(year, month) {
                periods.push(TradingPeriod {
                    year,
                    month,
                    start,
                    end,
                });
            }
        }
    }
    periods
}
