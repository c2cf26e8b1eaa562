//! Candle bar representation with attached indicator columns.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

/// Candle interval in minutes. Matches the granularities the candle feed
/// serves; everything else is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interval {
    Min1,
    Min3,
    Min5,
    Min10,
    Min15,
    Min30,
    Min60,
    Min240,
}

impl Interval {
    pub fn minutes(&self) -> u32 {
        match self {
            Interval::Min1 => 1,
            Interval::Min3 => 3,
            Interval::Min5 => 5,
            Interval::Min10 => 10,
            Interval::Min15 => 15,
            Interval::Min30 => 30,
            Interval::Min60 => 60,
            Interval::Min240 => 240,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.minutes())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Accept both "60" and "60m".
        match s.strip_suffix('m').unwrap_or(s) {
            "1" => Ok(Interval::Min1),
            "3" => Ok(Interval::Min3),
            "5" => Ok(Interval::Min5),
            "10" => Ok(Interval::Min10),
            "15" => Ok(Interval::Min15),
            "30" => Ok(Interval::Min30),
            "60" => Ok(Interval::Min60),
            "240" => Ok(Interval::Min240),
            other => Err(format!("unsupported interval: {other} minutes")),
        }
    }
}

/// One time step of the input series.
///
/// Oscillator values are `None` during the indicator warm-up window; the
/// decision engine treats such bars as forced holds. `trend` is the moving
/// average crossover signal: +1 bullish, -1 bearish, 0 undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub osc_k: Option<f64>,
    pub osc_d: Option<f64>,
    pub trend: i32,
}

impl Bar {
    /// Both oscillator values, when defined and finite.
    ///
    /// A NaN smuggled in through the feed counts as undefined, so the
    /// forced-hold rule covers it too.
    pub fn oscillator(&self) -> Option<(f64, f64)> {
        match (self.osc_k, self.osc_d) {
            (Some(k), Some(d)) if k.is_finite() && d.is_finite() => Some((k, d)),
            _ => None,
        }
    }
}

/// Check that timestamps are strictly increasing.
///
/// Returns the index of the first offending bar on failure.
pub fn check_strictly_increasing(bars: &[Bar]) -> Result<(), usize> {
    for i in 1..bars.len() {
        if bars[i].timestamp <= bars[i - 1].timestamp {
            return Err(i);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn sample_bar() -> Bar {
        Bar {
            timestamp: ts("2024-01-15 09:00:00"),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            osc_k: Some(25.0),
            osc_d: Some(20.0),
            trend: 1,
        }
    }

    #[test]
    fn interval_minutes() {
        assert_eq!(Interval::Min1.minutes(), 1);
        assert_eq!(Interval::Min60.minutes(), 60);
        assert_eq!(Interval::Min240.minutes(), 240);
    }

    #[test]
    fn interval_from_str() {
        assert_eq!("60".parse::<Interval>().unwrap(), Interval::Min60);
        assert_eq!(" 15 ".parse::<Interval>().unwrap(), Interval::Min15);
        assert_eq!("240m".parse::<Interval>().unwrap(), Interval::Min240);
        assert!("7".parse::<Interval>().is_err());
        assert!("".parse::<Interval>().is_err());
    }

    #[test]
    fn interval_display_roundtrip() {
        for s in ["1", "3", "5", "10", "15", "30", "60", "240"] {
            let interval: Interval = s.parse().unwrap();
            assert_eq!(interval.to_string(), s);
        }
    }

    #[test]
    fn oscillator_defined() {
        let bar = sample_bar();
        let (k, d) = bar.oscillator().unwrap();
        assert!((k - 25.0).abs() < f64::EPSILON);
        assert!((d - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn oscillator_missing_either_side() {
        let mut bar = sample_bar();
        bar.osc_k = None;
        assert!(bar.oscillator().is_none());

        let mut bar = sample_bar();
        bar.osc_d = None;
        assert!(bar.oscillator().is_none());
    }

    #[test]
    fn oscillator_nan_is_undefined() {
        let mut bar = sample_bar();
        bar.osc_k = Some(f64::NAN);
        assert!(bar.oscillator().is_none());
    }

    #[test]
    fn strictly_increasing_ok() {
        let bars: Vec<Bar> = (0..3)
            .map(|i| {
                let mut b = sample_bar();
                b.timestamp = ts(&format!("2024-01-15 09:0{}:00", i));
                b
            })
            .collect();
        assert!(check_strictly_increasing(&bars).is_ok());
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let bars = vec![sample_bar(), sample_bar()];
        assert_eq!(check_strictly_increasing(&bars), Err(1));
    }

    #[test]
    fn backwards_timestamp_rejected() {
        let mut early = sample_bar();
        early.timestamp = ts("2024-01-15 08:00:00");
        let bars = vec![sample_bar(), early];
        assert_eq!(check_strictly_increasing(&bars), Err(1));
    }

    #[test]
    fn empty_and_single_series_are_ordered() {
        assert!(check_strictly_increasing(&[]).is_ok());
        assert!(check_strictly_increasing(&[sample_bar()]).is_ok());
    }
}
