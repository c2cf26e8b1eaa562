//! Domain error types.
//!
//! Only infrastructure-level failures live here: I/O, configuration, and
//! malformed input series. Insufficient lookback history, warm-up bars with
//! undefined oscillator values, and empty run windows are defined neutral
//! outcomes in the engine, never errors.

/// Top-level error type for wavetrader.
#[derive(Debug, thiserror::Error)]
pub enum WavetraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {ticker} at {interval}m")]
    NoData { ticker: String, interval: String },

    #[error("series for {ticker} is not strictly increasing at row {position}")]
    UnorderedSeries { ticker: String, position: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&WavetraderError> for std::process::ExitCode {
    fn from(err: &WavetraderError) -> Self {
        let code: u8 = match err {
            WavetraderError::Io(_) => 1,
            WavetraderError::ConfigParse { .. }
            | WavetraderError::ConfigMissing { .. }
            | WavetraderError::ConfigInvalid { .. } => 2,
            WavetraderError::Data { .. } | WavetraderError::UnorderedSeries { .. } => 3,
            WavetraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
