// Configuration - Scheduler timing and initial metronome settings

use crate::error::MetronomeError;
use crate::feedback::{FeedbackSettings, millis};
use crate::host::storage::app_config_dir;
use crate::sequencer::click::Timbre;
use crate::sequencer::tap_tempo::TapTempoConfig;
use crate::sequencer::timeline::{Subdivision, Tempo, TimeSignature};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";

const MIN_LOOKAHEAD: Duration = Duration::from_millis(1);
/// Beyond this, tempo changes take too long to be heard
const MAX_SCHEDULE_AHEAD: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    /// Poll period of the scheduler loop
    #[serde(with = "millis")]
    pub lookahead: Duration,
    /// How far ahead of the audio clock beats are queued, in seconds
    pub schedule_ahead: f64,
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    pub subdivision: Subdivision,
    pub timbre: Timbre,
    pub feedback: FeedbackSettings,
    pub tap: TapTempoConfig,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_millis(25),
            schedule_ahead: 0.1,
            tempo: Tempo::default(),
            time_signature: TimeSignature::default(),
            subdivision: Subdivision::default(),
            timbre: Timbre::default(),
            feedback: FeedbackSettings::default(),
            tap: TapTempoConfig::default(),
        }
    }
}

impl MetronomeConfig {
    /// Parse a (possibly partial) JSON document; missing fields use defaults
    /// Values that would stall or break the scheduler are replaced
    pub fn from_json(json: &str) -> Result<Self, MetronomeError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Bring timing values back into their working range, logging each fix
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.lookahead < MIN_LOOKAHEAD {
            log::warn!(
                "lookahead {:?} is too short, using {:?}",
                self.lookahead,
                MIN_LOOKAHEAD
            );
            self.lookahead = MIN_LOOKAHEAD;
        }

        if !self.schedule_ahead.is_finite() || self.schedule_ahead <= 0.0 {
            log::warn!(
                "schedule_ahead {} is invalid, using {}",
                self.schedule_ahead,
                defaults.schedule_ahead
            );
            self.schedule_ahead = defaults.schedule_ahead;
        } else if self.schedule_ahead > MAX_SCHEDULE_AHEAD {
            log::warn!(
                "schedule_ahead {} is too long, using {}",
                self.schedule_ahead,
                MAX_SCHEDULE_AHEAD
            );
            self.schedule_ahead = MAX_SCHEDULE_AHEAD;
        }

        let tap = &mut self.tap;
        if tap.history_depth == 0 {
            log::warn!("tap history_depth 0 is invalid, using 1");
            tap.history_depth = 1;
        }
        if !tap.good_cv_percent.is_finite() || tap.good_cv_percent < 0.0 {
            log::warn!("tap good_cv_percent {} is invalid", tap.good_cv_percent);
            tap.good_cv_percent = defaults.tap.good_cv_percent;
        }
        if !tap.medium_cv_percent.is_finite() || tap.medium_cv_percent < 0.0 {
            log::warn!("tap medium_cv_percent {} is invalid", tap.medium_cv_percent);
            tap.medium_cv_percent = defaults.tap.medium_cv_percent;
        }
        if tap.good_cv_percent > tap.medium_cv_percent {
            log::warn!(
                "tap good_cv_percent {} exceeds medium_cv_percent {}",
                tap.good_cv_percent,
                tap.medium_cv_percent
            );
            tap.good_cv_percent = tap.medium_cv_percent;
        }

        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MetronomeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Settings from the per-user config directory, or defaults
    pub fn load_or_default() -> Self {
        let Some(path) = app_config_dir().map(|dir| dir.join(SETTINGS_FILE)) else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MetronomeConfig::default();
        assert_eq!(config.lookahead, Duration::from_millis(25));
        assert_eq!(config.schedule_ahead, 0.1);
        assert_eq!(config.tempo.bpm(), 120);
        assert_eq!(config.time_signature, TimeSignature::FourFour);
        assert_eq!(config.subdivision, Subdivision::None);
        assert_eq!(config.tap.window, Duration::from_millis(3000));
    }

    #[test]
    fn test_partial_json() {
        let config = MetronomeConfig::from_json(
            r#"{
                "tempo": 90,
                "time_signature": "six_eight",
                "timbre": "woodblock",
                "tap": { "window": 2000, "good_cv_percent": 2.5 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.tempo.bpm(), 90);
        assert_eq!(config.time_signature, TimeSignature::SixEight);
        assert_eq!(config.timbre, Timbre::Woodblock);
        assert_eq!(config.tap.window, Duration::from_millis(2000));
        assert_eq!(config.tap.good_cv_percent, 2.5);
        assert_eq!(config.tap.medium_cv_percent, 8.0);
        assert_eq!(config.lookahead, Duration::from_millis(25));
    }

    #[test]
    fn test_out_of_range_tempo_is_clamped() {
        let config = MetronomeConfig::from_json(r#"{ "tempo": 999 }"#).unwrap();
        assert_eq!(config.tempo.bpm(), 220);
    }

    #[test]
    fn test_invalid_timing_values_are_corrected() {
        let config = MetronomeConfig::from_json(
            r#"{
                "lookahead": 0,
                "schedule_ahead": 1e308,
                "tap": { "history_depth": 0, "good_cv_percent": 12.0, "medium_cv_percent": -1.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.lookahead, Duration::from_millis(1));
        assert_eq!(config.schedule_ahead, 1.0);
        assert_eq!(config.tap.history_depth, 1);
        assert_eq!(config.tap.medium_cv_percent, 8.0);
        assert_eq!(config.tap.good_cv_percent, 8.0);
    }

    #[test]
    fn test_non_positive_schedule_ahead_uses_default() {
        for value in ["0", "-0.5"] {
            let json = format!(r#"{{ "schedule_ahead": {} }}"#, value);
            let config = MetronomeConfig::from_json(&json).unwrap();
            assert_eq!(config.schedule_ahead, 0.1);
        }

        let config = MetronomeConfig {
            schedule_ahead: f64::NAN,
            ..MetronomeConfig::default()
        }
        .sanitized();
        assert_eq!(config.schedule_ahead, 0.1);
    }

    #[test]
    fn test_valid_config_is_unchanged() {
        let config = MetronomeConfig::default();
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            MetronomeConfig::from_json("{"),
            Err(MetronomeError::Json(_))
        ));
    }
}
