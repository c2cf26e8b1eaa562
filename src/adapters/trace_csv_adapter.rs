//! CSV report adapter for run traces and trade lists.

use crate::domain::condition::{Decision, Trigger};
use crate::domain::error::WavetraderError;
use crate::domain::runner::RunReport;
use crate::ports::report_port::ReportPort;

pub struct TraceCsvAdapter;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn decision_label(decision: Decision) -> &'static str {
    match decision {
        Decision::Buy(Trigger::Ratchet) => "BUY",
        Decision::Buy(Trigger::RatchetConfirmed) => "BUY_CONFIRMED",
        Decision::Buy(Trigger::PatternForced) => "BUY_FORCED",
        Decision::Sell(Trigger::Ratchet) => "SELL",
        Decision::Sell(Trigger::RatchetConfirmed) => "SELL_CONFIRMED",
        Decision::Sell(Trigger::PatternForced) => "SELL_FORCED",
        Decision::Hold => "HOLD",
    }
}

fn csv_err(e: csv::Error) -> WavetraderError {
    WavetraderError::Data {
        reason: format!("CSV write error: {}", e),
    }
}

impl ReportPort for TraceCsvAdapter {
    fn write_trace(&self, report: &RunReport, output_path: &str) -> Result<(), WavetraderError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(csv_err)?;
        wtr.write_record(["timestamp", "close", "decision", "executed", "buy_score", "sell_score"])
            .map_err(csv_err)?;

        for entry in &report.trace {
            wtr.write_record([
                entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                entry.close.to_string(),
                decision_label(entry.decision).to_string(),
                entry.executed.map(|s| s.to_string()).unwrap_or_default(),
                entry.buy_score.to_string(),
                entry.sell_score.to_string(),
            ])
            .map_err(csv_err)?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_trades(&self, report: &RunReport, output_path: &str) -> Result<(), WavetraderError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(csv_err)?;
        wtr.write_record(["timestamp", "side", "price", "quantity", "gross", "fee"])
            .map_err(csv_err)?;

        for trade in &report.trades {
            wtr.write_record([
                trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                trade.side.to_string(),
                trade.price.to_string(),
                trade.quantity.to_string(),
                trade.gross.to_string(),
                trade.fee.to_string(),
            ])
            .map_err(csv_err)?;
        }

        wtr.flush()?;
        Ok(())
    }
}
