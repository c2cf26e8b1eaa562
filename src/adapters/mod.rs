//! Concrete adapter implementations for ports.

pub mod csv_bar_adapter;
pub mod file_config_adapter;
pub mod trace_csv_adapter;
