//! Price-structure analysis over a trailing window of closes.
//!
//! Two independent detectors feed a composite per-side score:
//! - a 5-segment directional wave compared against the canonical
//!   alternating template (up, down, up, down, up), plus a 3-segment
//!   trend-exhaustion reversal for the sell side;
//! - retracement levels computed from the window high/low at the standard
//!   ratios, with a 1%-of-range tolerance band.
//!
//! Insufficient history is a typed outcome, not an error, so callers can
//! tell a neutral signal from a window that was too short to analyze.

use crate::domain::bar::Bar;
use crate::domain::config::EngineConfig;

pub const WAVE_PATTERN_LEN: usize = 5;

const CANONICAL_WAVE: [Direction; WAVE_PATTERN_LEN] = [
    Direction::Up,
    Direction::Down,
    Direction::Up,
    Direction::Down,
    Direction::Up,
];

const SELL_REVERSAL: [Direction; 3] = [Direction::Up, Direction::Up, Direction::Down];

pub const RETRACEMENT_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

/// Tolerance for "at a level", as a fraction of the window range.
const LEVEL_TOLERANCE: f64 = 0.01;

const PATTERN_MATCH_SCORE: u32 = 30;
const WAVE_STRENGTH_SCORE: u32 = 20;
const LEVEL_SCORE: u32 = 15;
const STRENGTH_FLOOR: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveMetrics {
    /// Mean absolute per-step change (%), scaled by overall window return.
    pub strength: f64,
    /// Mean absolute per-step change (%), unscaled.
    pub volatility: f64,
    /// Total window return (%), first close to last close.
    pub total_change_pct: f64,
    pub direction: Direction,
}

impl WaveMetrics {
    fn flat() -> Self {
        WaveMetrics {
            strength: 0.0,
            volatility: 0.0,
            total_change_pct: 0.0,
            direction: Direction::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    Support,
    Resistance,
}

/// A retracement level the current price sits on.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTouch {
    pub ratio: f64,
    pub price: f64,
    pub kind: LevelKind,
}

/// Qualitative signal set plus the composite per-side scores derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSignal {
    pub buy_score: u32,
    pub sell_score: u32,
    pub buy_pattern: bool,
    pub sell_pattern: bool,
    pub wave: WaveMetrics,
    pub level: Option<LevelTouch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternOutcome {
    Signal(PatternSignal),
    InsufficientHistory { have: usize, need: usize },
}

impl PatternOutcome {
    pub fn buy_score(&self) -> u32 {
        match self {
            PatternOutcome::Signal(s) => s.buy_score,
            PatternOutcome::InsufficientHistory { .. } => 0,
        }
    }

    pub fn sell_score(&self) -> u32 {
        match self {
            PatternOutcome::Signal(s) => s.sell_score,
            PatternOutcome::InsufficientHistory { .. } => 0,
        }
    }
}

/// Direction of each close-to-close step over the trailing window ending at
/// `index`. A step touching bar 0 has no predecessor and is skipped, so the
/// vector holds at most `WAVE_PATTERN_LEN` entries.
fn wave_directions(bars: &[Bar], index: usize) -> Vec<Direction> {
    let from = index.saturating_sub(WAVE_PATTERN_LEN - 1);
    let mut directions = Vec::with_capacity(WAVE_PATTERN_LEN);
    for i in from..=index {
        if i == 0 {
            continue;
        }
        if bars[i].close > bars[i - 1].close {
            directions.push(Direction::Up);
        } else {
            directions.push(Direction::Down);
        }
    }
    directions
}

/// Suffix or prefix partial match against the canonical alternating wave.
fn matches_buy_wave(directions: &[Direction]) -> bool {
    let n = directions.len();
    if n < WAVE_PATTERN_LEN - 1 {
        return false;
    }
    directions == &CANONICAL_WAVE[WAVE_PATTERN_LEN - n..]
        || directions == &CANONICAL_WAVE[..n]
}

/// Exact full-wave completion, or a trailing up-up-down reversal.
fn matches_sell_wave(directions: &[Direction]) -> bool {
    if directions.len() < WAVE_PATTERN_LEN {
        return false;
    }
    if directions == &CANONICAL_WAVE[..] {
        return true;
    }
    directions[directions.len() - SELL_REVERSAL.len()..] == SELL_REVERSAL[..]
}

fn wave_metrics(bars: &[Bar], index: usize, window: usize) -> WaveMetrics {
    if window < 2 || index + 1 < window {
        return WaveMetrics::flat();
    }

    let closes: Vec<f64> = bars[index + 1 - window..=index]
        .iter()
        .map(|b| b.close)
        .collect();

    let mut change_sum = 0.0;
    let mut changes = 0usize;
    for i in 1..closes.len() {
        if closes[i - 1] != 0.0 {
            change_sum += ((closes[i] - closes[i - 1]) / closes[i - 1] * 100.0).abs();
            changes += 1;
        }
    }
    let volatility = if changes > 0 {
        change_sum / changes as f64
    } else {
        0.0
    };

    let first = closes[0];
    let total_change_pct = if first != 0.0 {
        (closes[closes.len() - 1] - first) / first * 100.0
    } else {
        0.0
    };

    let direction = if total_change_pct > 0.0 {
        Direction::Up
    } else if total_change_pct < 0.0 {
        Direction::Down
    } else {
        Direction::Neutral
    };

    WaveMetrics {
        strength: volatility * (1.0 + total_change_pct.abs() / 100.0),
        volatility,
        total_change_pct,
        direction,
    }
}

/// Find a retracement level the current close sits on, if any.
///
/// Levels are `high - range * ratio` over the lookback window; the first
/// ratio within tolerance wins. Support below the window midpoint,
/// resistance above.
fn retracement_touch(bars: &[Bar], index: usize, lookback: usize) -> Option<LevelTouch> {
    if lookback < 2 || index + 1 < lookback {
        return None;
    }

    let window = &bars[index + 1 - lookback..=index];
    let high = window.iter().map(|b| b.close).fold(f64::MIN, f64::max);
    let low = window.iter().map(|b| b.close).fold(f64::MAX, f64::min);
    let range = high - low;
    let current = bars[index].close;
    let tolerance = range * LEVEL_TOLERANCE;

    for ratio in RETRACEMENT_RATIOS {
        let level = high - range * ratio;
        if (current - level).abs() <= tolerance {
            let kind = if current <= (high + low) / 2.0 {
                LevelKind::Support
            } else {
                LevelKind::Resistance
            };
            return Some(LevelTouch {
                ratio,
                price: level,
                kind,
            });
        }
    }
    None
}

/// Analyze the trailing price structure at `index`.
///
/// Requires `WAVE_PATTERN_LEN` prior bars; anything shorter yields
/// [`PatternOutcome::InsufficientHistory`], which scores zero on both sides.
pub fn analyze(bars: &[Bar], index: usize, config: &EngineConfig) -> PatternOutcome {
    if index >= bars.len() || index < WAVE_PATTERN_LEN {
        return PatternOutcome::InsufficientHistory {
            have: index.min(bars.len()),
            need: WAVE_PATTERN_LEN,
        };
    }

    let directions = wave_directions(bars, index);
    let buy_pattern = matches_buy_wave(&directions);
    let sell_pattern = matches_sell_wave(&directions);
    let wave = wave_metrics(bars, index, config.wave_window);
    let level = retracement_touch(bars, index, config.retracement_lookback);

    let mut buy_score = 0;
    let mut sell_score = 0;

    if buy_pattern {
        buy_score += PATTERN_MATCH_SCORE;
    }
    if sell_pattern {
        sell_score += PATTERN_MATCH_SCORE;
    }

    if wave.strength > STRENGTH_FLOOR {
        match wave.direction {
            Direction::Up => buy_score += WAVE_STRENGTH_SCORE,
            Direction::Down => sell_score += WAVE_STRENGTH_SCORE,
            Direction::Neutral => {}
        }
    }

    match level {
        Some(LevelTouch {
            kind: LevelKind::Support,
            ..
        }) => buy_score += LEVEL_SCORE,
        Some(LevelTouch {
            kind: LevelKind::Resistance,
            ..
        }) => sell_score += LEVEL_SCORE,
        None => {}
    }

    PatternOutcome::Signal(PatternSignal {
        buy_score,
        sell_score,
        buy_pattern,
        sell_pattern,
        wave,
        level,
    })
}
