//! wavetrader: rule-based trading strategy backtester for candle series.
//!
//! Hexagonal architecture: decision-engine core in [`domain`], port traits
//! in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
