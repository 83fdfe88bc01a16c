// Tap tempo - BPM estimation from freehand taps

use crate::feedback::millis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tap tempo tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapTempoConfig {
    /// Taps older than this (relative to the newest tap) are ignored
    #[serde(with = "millis")]
    pub window: Duration,
    /// Silence after which the whole tap session is cleared
    #[serde(with = "millis")]
    pub inactivity_timeout: Duration,
    /// Number of recent taps kept for the BPM history display
    pub history_depth: usize,
    /// Coefficient of variation (%) below which timing is "good"
    pub good_cv_percent: f64,
    /// Coefficient of variation (%) below which timing is "medium"
    pub medium_cv_percent: f64,
}

impl Default for TapTempoConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(3000),
            inactivity_timeout: Duration::from_millis(3000),
            history_depth: 8,
            good_cv_percent: 3.0,
            medium_cv_percent: 8.0,
        }
    }
}

/// Tap timing consistency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapStability {
    Good,
    Medium,
    Poor,
}

/// Result of a single tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapEstimate {
    /// round(60000 / mean interval ms); None until two taps are in the window
    pub candidate_bpm: Option<u32>,
    /// Needs at least three intervals
    pub stability: Option<TapStability>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TapRecord {
    time: Duration,
    bpm: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct TapTempo {
    config: TapTempoConfig,
    taps: Vec<Duration>,
    history: Vec<TapRecord>,
}

impl TapTempo {
    pub fn new(config: TapTempoConfig) -> Self {
        Self {
            config,
            taps: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn config(&self) -> &TapTempoConfig {
        &self.config
    }

    /// Record a tap at wall time `now` and estimate the tempo
    pub fn tap(&mut self, now: Duration) -> TapEstimate {
        let window = self.config.window;
        self.taps.retain(|&t| now.saturating_sub(t) < window);
        self.history.retain(|r| now.saturating_sub(r.time) < window);

        self.taps.push(now);
        self.history.push(TapRecord {
            time: now,
            bpm: None,
        });

        if self.taps.len() < 2 {
            return TapEstimate::default();
        }

        let intervals: Vec<f64> = self
            .taps
            .windows(2)
            .map(|pair| pair[1].saturating_sub(pair[0]).as_secs_f64() * 1000.0)
            .collect();

        let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        if mean <= 0.0 {
            return TapEstimate::default();
        }

        let bpm = (60_000.0 / mean).round() as u32;
        if let Some(last) = self.history.last_mut() {
            last.bpm = Some(bpm);
        }

        TapEstimate {
            candidate_bpm: Some(bpm),
            stability: self.classify(&intervals, mean),
        }
    }

    fn classify(&self, intervals: &[f64], mean: f64) -> Option<TapStability> {
        if intervals.len() < 3 {
            return None;
        }
        let variance =
            intervals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
        let cv = variance.sqrt() / mean * 100.0;

        Some(if cv < self.config.good_cv_percent {
            TapStability::Good
        } else if cv < self.config.medium_cv_percent {
            TapStability::Medium
        } else {
            TapStability::Poor
        })
    }

    /// Clear the whole tap session
    pub fn reset(&mut self) {
        self.taps.clear();
        self.history.clear();
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    /// BPMs computed for the most recent taps, oldest first
    pub fn recent_bpms(&self) -> Vec<u32> {
        let skip = self.history.len().saturating_sub(self.config.history_depth);
        self.history[skip..].iter().filter_map(|r| r.bpm).collect()
    }

    /// Rounded mean of `recent_bpms`
    pub fn average_bpm(&self) -> Option<u32> {
        let recent = self.recent_bpms();
        if recent.is_empty() {
            return None;
        }
        let sum: u64 = recent.iter().map(|&b| b as u64).sum();
        Some((sum as f64 / recent.len() as f64).round() as u32)
    }
}
