pub mod aggregate;
pub mod bar;
pub mod batch;
pub mod condition;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod ledger;
pub mod pattern;
pub mod period;
pub mod runner;
