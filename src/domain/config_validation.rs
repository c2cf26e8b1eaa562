//! Configuration validation.
//!
//! Validates all config fields before any run starts, so a bad batch
//! fails up front instead of half-way through.

use crate::domain::bar::Interval;
use crate::domain::error::WavetraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    validate_initial_balance(config)?;
    validate_fee_rate(config)?;
    validate_change_rates(config)?;
    validate_oscillator_thresholds(config)?;
    validate_windows(config)?;
    Ok(())
}

pub fn validate_batch_config(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    validate_data_path(config)?;
    validate_tickers(config)?;
    validate_intervals(config)?;
    validate_periods(config)?;
    Ok(())
}

fn invalid(key: &str, reason: &str) -> WavetraderError {
    WavetraderError::ConfigInvalid {
        section: "engine".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    let value = config.get_double("engine", "initial_balance", 10_000_000.0);
    if value <= 0.0 {
        return Err(invalid("initial_balance", "initial_balance must be positive"));
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    let value = config.get_double("engine", "fee_rate", 0.0005);
    if value < 0.0 || value >= 1.0 {
        return Err(invalid("fee_rate", "fee_rate must be between 0 and 1"));
    }
    Ok(())
}

fn validate_change_rates(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    let buy = config.get_double("engine", "buy_price_change_rate", 1.01);
    if buy <= 1.0 {
        return Err(invalid(
            "buy_price_change_rate",
            "buy_price_change_rate must be greater than 1.0",
        ));
    }
    let sell = config.get_double("engine", "sell_price_change_rate", 1.01);
    if sell <= 1.0 {
        return Err(invalid(
            "sell_price_change_rate",
            "sell_price_change_rate must be greater than 1.0",
        ));
    }
    Ok(())
}

fn validate_oscillator_thresholds(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    let oversold = config.get_double("engine", "oversold_threshold", 30.0);
    if !(0.0..=100.0).contains(&oversold) {
        return Err(invalid(
            "oversold_threshold",
            "oversold_threshold must be between 0 and 100",
        ));
    }
    let overbought = config.get_double("engine", "overbought_threshold", 70.0);
    if !(0.0..=100.0).contains(&overbought) {
        return Err(invalid(
            "overbought_threshold",
            "overbought_threshold must be between 0 and 100",
        ));
    }
    if oversold >= overbought {
        return Err(invalid(
            "oversold_threshold",
            "oversold_threshold must be below overbought_threshold",
        ));
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    let wave = config.get_int("engine", "wave_window", 5);
    if wave < 2 {
        return Err(invalid("wave_window", "wave_window must be at least 2"));
    }
    let lookback = config.get_int("engine", "retracement_lookback", 20);
    if lookback < 2 {
        return Err(invalid(
            "retracement_lookback",
            "retracement_lookback must be at least 2",
        ));
    }
    Ok(())
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(WavetraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    match config.get_string("batch", "tickers") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(WavetraderError::ConfigMissing {
            section: "batch".to_string(),
            key: "tickers".to_string(),
        }),
    }
}

fn validate_intervals(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    let raw = match config.get_string("batch", "intervals") {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return Err(WavetraderError::ConfigMissing {
                section: "batch".to_string(),
                key: "intervals".to_string(),
            })
        }
    };

    for token in raw.split(',') {
        let trimmed = token.trim();
        if trimmed.parse::<Interval>().is_err() {
            return Err(WavetraderError::ConfigInvalid {
                section: "batch".to_string(),
                key: "intervals".to_string(),
                reason: format!("unknown interval: {}", trimmed),
            });
        }
    }
    Ok(())
}

/// `[periods]` keys are years, values comma-separated month numbers.
fn validate_periods(config: &dyn ConfigPort) -> Result<(), WavetraderError> {
    let years = config.section_keys("periods");
    if years.is_empty() {
        return Err(WavetraderError::ConfigMissing {
            section: "periods".to_string(),
            key: "<year>".to_string(),
        });
    }

    for year in years {
        if year.parse::<i32>().is_err() {
            return Err(WavetraderError::ConfigInvalid {
                section: "periods".to_string(),
                key: year.clone(),
                reason: "period keys must be years".to_string(),
            });
        }
        let months = config.get_string("periods", &year).unwrap_or_default();
        for token in months.split(',') {
            match token.trim().parse::<u32>() {
                Ok(m) if (1..=12).contains(&m) => {}
                _ => {
                    return Err(WavetraderError::ConfigInvalid {
                        section: "periods".to_string(),
                        key: year.clone(),
                        reason: format!("invalid month: {}", token.trim()),
                    })
                }
            }
        }
    }
    Ok(())
}
