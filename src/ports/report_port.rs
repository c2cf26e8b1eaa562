//! Report output port trait.

use crate::domain::error::WavetraderError;
use crate::domain::runner::RunReport;

/// Port for writing run artifacts.
pub trait ReportPort {
    /// Per-bar decision trace, one row per input bar.
    fn write_trace(&self, report: &RunReport, output_path: &str) -> Result<(), WavetraderError>;

    /// Executed trades only.
    fn write_trades(&self, report: &RunReport, output_path: &str) -> Result<(), WavetraderError>;
}
