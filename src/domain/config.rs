//! Engine configuration bundle.
//!
//! Strategy variants are configuration instances of the one evaluator, not
//! code forks: thresholds, ratchet rates, fee rate, and pattern windows all
//! live here.

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Ratchet multiplier for buys: accept once the price rises off the
    /// trailing low by more than this factor (1.01 = 1%).
    pub buy_price_change_rate: f64,
    /// Ratchet multiplier for sells, mirrored against the trailing high.
    pub sell_price_change_rate: f64,
    pub oversold_threshold: f64,
    pub overbought_threshold: f64,
    pub fee_rate: f64,
    /// Pattern score at or above which a decision is forced regardless of
    /// the ratchet.
    pub strong_signal_score: u32,
    /// Pattern score at or above which an accepted ratchet decision is
    /// marked as pattern-confirmed. Never forces a decision alone.
    pub confirm_signal_score: u32,
    /// Trailing window for wave direction and strength analysis.
    pub wave_window: usize,
    /// Independent lookback for retracement level detection.
    pub retracement_lookback: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_balance: 10_000_000.0,
            buy_price_change_rate: 1.01,
            sell_price_change_rate: 1.01,
            oversold_threshold: 30.0,
            overbought_threshold: 70.0,
            fee_rate: 0.0005,
            strong_signal_score: 50,
            confirm_signal_score: 30,
            wave_window: 5,
            retracement_lookback: 20,
        }
    }
}
