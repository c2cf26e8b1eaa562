//! CLI definition and dispatch.

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_bar_adapter::CsvBarAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::trace_csv_adapter::TraceCsvAdapter;
use crate::domain::bar::Interval;
use crate::domain::batch::{self, build_specs};
use crate::domain::config::EngineConfig;
use crate::domain::config_validation::{validate_batch_config, validate_engine_config};
use crate::domain::error::WavetraderError;
use crate::domain::period::{expand_periods, TradingPeriod};
use crate::domain::runner::{Backtest, RunReport};
use crate::ports::bar_port::BarPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "wavetrader", about = "Rule-based trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest over one ticker and window
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long, default_value = "60")]
        interval: String,
        /// Window start, YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS"
        #[arg(long)]
        start: String,
        /// Window end (exclusive), same formats as start
        #[arg(long)]
        end: String,
        /// Write the per-bar decision trace to this CSV file
        #[arg(long)]
        trace: Option<PathBuf>,
        /// Write the executed trades to this CSV file
        #[arg(long)]
        trades: Option<PathBuf>,
    },
    /// Run the configured batch: tickers x intervals x periods
    Batch {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers with candle files in the data directory
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            ticker,
            interval,
            start,
            end,
            trace,
            trades,
        } => run_backtest(
            &config,
            &ticker,
            &interval,
            &start,
            &end,
            trace.as_ref(),
            trades.as_ref(),
        ),
        Command::Batch { config } => run_batch(&config),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { config } => run_list_tickers(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = WavetraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Assemble the engine config from the `[engine]` section. Every key is
/// optional and falls back to its default.
pub fn build_engine_config(adapter: &dyn ConfigPort) -> EngineConfig {
    let defaults = EngineConfig::default();
    EngineConfig {
        initial_balance: adapter.get_double("engine", "initial_balance", defaults.initial_balance),
        buy_price_change_rate: adapter.get_double(
            "engine",
            "buy_price_change_rate",
            defaults.buy_price_change_rate,
        ),
        sell_price_change_rate: adapter.get_double(
            "engine",
            "sell_price_change_rate",
            defaults.sell_price_change_rate,
        ),
        oversold_threshold: adapter.get_double(
            "engine",
            "oversold_threshold",
            defaults.oversold_threshold,
        ),
        overbought_threshold: adapter.get_double(
            "engine",
            "overbought_threshold",
            defaults.overbought_threshold,
        ),
        fee_rate: adapter.get_double("engine", "fee_rate", defaults.fee_rate),
        strong_signal_score: adapter.get_int(
            "engine",
            "strong_signal_score",
            defaults.strong_signal_score as i64,
        ) as u32,
        confirm_signal_score: adapter.get_int(
            "engine",
            "confirm_signal_score",
            defaults.confirm_signal_score as i64,
        ) as u32,
        wave_window: adapter.get_int("engine", "wave_window", defaults.wave_window as i64) as usize,
        retracement_lookback: adapter.get_int(
            "engine",
            "retracement_lookback",
            defaults.retracement_lookback as i64,
        ) as usize,
    }
}

/// Parse a window bound, accepting a bare date (midnight) or a full
/// timestamp.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, WavetraderError> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(WavetraderError::Data {
        reason: format!(
            "invalid datetime {:?}, expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
            value
        ),
    })
}

fn build_bar_adapter(adapter: &dyn ConfigPort) -> Result<CsvBarAdapter, WavetraderError> {
    let path = adapter
        .get_string("data", "path")
        .ok_or_else(|| WavetraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        })?;
    Ok(CsvBarAdapter::new(PathBuf::from(path)))
}

fn load_intervals(adapter: &dyn ConfigPort) -> Result<Vec<Interval>, WavetraderError> {
    let raw = adapter
        .get_string("batch", "intervals")
        .ok_or_else(|| WavetraderError::ConfigMissing {
            section: "batch".to_string(),
            key: "intervals".to_string(),
        })?;

    let mut intervals = Vec::new();
    for token in raw.split(',') {
        let interval =
            token
                .trim()
                .parse::<Interval>()
                .map_err(|reason| WavetraderError::ConfigInvalid {
                    section: "batch".to_string(),
                    key: "intervals".to_string(),
                    reason,
                })?;
        intervals.push(interval);
    }
    Ok(intervals)
}

fn load_periods(adapter: &dyn ConfigPort) -> Result<Vec<TradingPeriod>, WavetraderError> {
    let mut selections: BTreeMap<i32, Vec<u32>> = BTreeMap::new();

    for year_key in adapter.section_keys("periods") {
        let year: i32 = year_key
            .parse()
            .map_err(|_| WavetraderError::ConfigInvalid {
                section: "periods".to_string(),
                key: year_key.clone(),
                reason: "period keys must be years".to_string(),
            })?;

        let raw = adapter.get_string("periods", &year_key).unwrap_or_default();
        let mut months = Vec::new();
        for token in raw.split(',') {
            let month: u32 =
                token
                    .trim()
                    .parse()
                    .map_err(|_| WavetraderError::ConfigInvalid {
                        section: "periods".to_string(),
                        key: year_key.clone(),
                        reason: format!("invalid month: {}", token.trim()),
                    })?;
            months.push(month);
        }
        selections.insert(year, months);
    }

    Ok(expand_periods(&selections))
}

fn print_run_summary(ticker: &str, config: &EngineConfig, report: &RunReport) {
    let state = &report.final_state;
    eprintln!("\n=== {} ===", ticker);
    eprintln!("Initial balance:  {:.0}", config.initial_balance);
    eprintln!("Final balance:    {:.0}", state.balance);
    eprintln!(
        "Net profit:       {:.0} ({:.2}%)",
        state.balance - config.initial_balance,
        report.result.profit_rate
    );
    eprintln!(
        "Price change:     {:.2}% ({:.0} -> {:.0})",
        report.result.coin_change_rate, report.result.start_price, report.result.end_price
    );
    eprintln!("Trades:           {}", state.trade_count);
    eprintln!("Total fees:       {:.0}", state.total_fee);
}

fn run_backtest(
    config_path: &PathBuf,
    ticker: &str,
    interval: &str,
    start: &str,
    end: &str,
    trace_path: Option<&PathBuf>,
    trades_path: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_engine_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let interval: Interval = match interval.parse() {
        Ok(i) => i,
        Err(reason) => {
            eprintln!("error: {reason}");
            return ExitCode::from(2);
        }
    };
    let (start, end) = match (parse_datetime(start), parse_datetime(end)) {
        (Ok(s), Ok(e)) if s < e => (s, e),
        (Ok(_), Ok(_)) => {
            eprintln!("error: start must be before end");
            return ExitCode::from(2);
        }
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let bar_port = match build_bar_adapter(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let ticker = ticker.to_uppercase();
    let bars = match bar_port.fetch_bars(&ticker, interval, start, end) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if bars.is_empty() {
        let err = WavetraderError::NoData {
            ticker,
            interval: interval.to_string(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    }

    let engine_config = build_engine_config(&adapter);
    eprintln!(
        "Running {} at {}m: {} bars, {} to {}",
        ticker,
        interval,
        bars.len(),
        start,
        end
    );

    let report = Backtest::new(engine_config.clone()).run(&bars);
    print_run_summary(&ticker, &engine_config, &report);

    let report_port = TraceCsvAdapter;
    if let Some(path) = trace_path {
        if let Err(e) = report_port.write_trace(&report, &path.display().to_string()) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Trace written to: {}", path.display());
    }
    if let Some(path) = trades_path {
        if let Err(e) = report_port.write_trades(&report, &path.display().to_string()) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Trades written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_batch(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_engine_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_batch_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let tickers = match adapter
        .get_string("batch", "tickers")
        .ok_or_else(|| WavetraderError::ConfigMissing {
            section: "batch".to_string(),
            key: "tickers".to_string(),
        })
        .and_then(|raw| batch::parse_tickers(&raw))
    {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let intervals = match load_intervals(&adapter) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let periods = match load_periods(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let bar_port = match build_bar_adapter(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let engine_config = build_engine_config(&adapter);
    let specs = build_specs(&tickers, &intervals, &periods);
    eprintln!(
        "Running batch: {} tickers x {} intervals x {} periods = {} runs",
        tickers.len(),
        intervals.len(),
        periods.len(),
        specs.len()
    );

    let results = batch::run_batch(&bar_port, &specs, &engine_config);

    eprintln!("\n=== Period Results ===");
    for (key, result) in results.iter() {
        if result.no_data {
            eprintln!(
                "  {} {}m {}/{:02}: no data",
                key.ticker, key.interval, key.year, key.month
            );
        } else {
            eprintln!(
                "  {} {}m {}/{:02}: profit {:+.2}%, price {:+.2}%",
                key.ticker, key.interval, key.year, key.month, result.profit_rate,
                result.coin_change_rate
            );
        }
    }

    eprintln!("\n=== Ticker Summary ===");
    for summary in results.ticker_summaries() {
        eprintln!(
            "  {}: {} periods, {:.1}% win rate, avg profit {:+.2}%, avg price {:+.2}%, alpha {:+.2}%",
            summary.ticker,
            summary.periods,
            summary.win_rate(),
            summary.avg_profit_rate(),
            summary.avg_coin_change_rate(),
            summary.alpha()
        );
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_engine_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_batch_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}

fn run_list_tickers(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bar_port = match build_bar_adapter(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let tickers = match bar_port.list_tickers() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if tickers.is_empty() {
        eprintln!("No candle files found");
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    ExitCode::SUCCESS
}
