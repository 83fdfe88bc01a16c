// Feedback - Visual and haptic beat feedback
//
// The scheduler core never touches the UI directly. It calls a `FeedbackSink`
// at the moment a beat becomes audible; the sink only toggles state.

use crate::sequencer::scheduler::{AccentLevel, BeatRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, Ordering};
use std::time::Duration;

/// UI collaborator receiving beat feedback
pub trait FeedbackSink {
    /// A main beat is audible now
    fn on_beat(&mut self, role: BeatRole, accent: AccentLevel);

    /// The beat indicator's on-time elapsed, or playback stopped
    fn on_beat_end(&mut self);

    /// Full-surface flash on
    fn on_flash(&mut self);

    fn on_flash_end(&mut self);

    /// Haptic pulse of the given length, if the host supports it
    fn on_vibrate(&mut self, duration: Duration);

    /// Measure counter changed
    fn on_measure(&mut self, _measure: u16) {}
}

/// Feedback toggles and timings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    pub flash_enabled: bool,
    pub vibration_enabled: bool,
    /// How long the beat indicator and the flash stay on
    #[serde(with = "millis")]
    pub on_duration: Duration,
    #[serde(with = "millis")]
    pub accent_vibration: Duration,
    #[serde(with = "millis")]
    pub beat_vibration: Duration,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            flash_enabled: false,
            vibration_enabled: false,
            on_duration: Duration::from_millis(100),
            accent_vibration: Duration::from_millis(80),
            beat_vibration: Duration::from_millis(50),
        }
    }
}

impl FeedbackSettings {
    pub fn vibration_for(&self, accent: AccentLevel) -> Duration {
        if accent.is_accented() {
            self.accent_vibration
        } else {
            self.beat_vibration
        }
    }
}

/// Serde adapter storing a `Duration` as integer milliseconds
pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Lock-free indicator state shared with the UI thread
#[derive(Clone, Debug, Default)]
pub struct IndicatorState {
    inner: Arc<IndicatorInner>,
}

#[derive(Debug, Default)]
struct IndicatorInner {
    beat_active: AtomicBool,
    accent: AtomicU8,
    flash_active: AtomicBool,
    measure: AtomicU16,
}

fn accent_to_u8(accent: AccentLevel) -> u8 {
    match accent {
        AccentLevel::None => 0,
        AccentLevel::Medium => 1,
        AccentLevel::Strong => 2,
    }
}

fn accent_from_u8(value: u8) -> AccentLevel {
    match value {
        2 => AccentLevel::Strong,
        1 => AccentLevel::Medium,
        _ => AccentLevel::None,
    }
}

impl IndicatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beat_active(&self) -> bool {
        self.inner.beat_active.load(Ordering::Relaxed)
    }

    pub fn accent(&self) -> AccentLevel {
        accent_from_u8(self.inner.accent.load(Ordering::Relaxed))
    }

    pub fn flash_active(&self) -> bool {
        self.inner.flash_active.load(Ordering::Relaxed)
    }

    pub fn measure(&self) -> u16 {
        self.inner.measure.load(Ordering::Relaxed)
    }
}

impl FeedbackSink for IndicatorState {
    fn on_beat(&mut self, _role: BeatRole, accent: AccentLevel) {
        self.inner.accent.store(accent_to_u8(accent), Ordering::Relaxed);
        self.inner.beat_active.store(true, Ordering::Relaxed);
    }

    fn on_beat_end(&mut self) {
        self.inner.beat_active.store(false, Ordering::Relaxed);
        self.inner.accent.store(0, Ordering::Relaxed);
    }

    fn on_flash(&mut self) {
        self.inner.flash_active.store(true, Ordering::Relaxed);
    }

    fn on_flash_end(&mut self) {
        self.inner.flash_active.store(false, Ordering::Relaxed);
    }

    fn on_vibrate(&mut self, duration: Duration) {
        log::trace!("Vibration requested ({} ms), no haptics on this host", duration.as_millis());
    }

    fn on_measure(&mut self, measure: u16) {
        self.inner.measure.store(measure, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_toggles_are_idempotent() {
        let mut indicator = IndicatorState::new();
        let ui_side = indicator.clone();

        indicator.on_beat(BeatRole::Main, AccentLevel::Strong);
        indicator.on_beat(BeatRole::Main, AccentLevel::Strong);
        assert!(ui_side.beat_active());
        assert_eq!(ui_side.accent(), AccentLevel::Strong);

        indicator.on_beat_end();
        indicator.on_beat_end();
        assert!(!ui_side.beat_active());
        assert_eq!(ui_side.accent(), AccentLevel::None);
    }

    #[test]
    fn test_indicator_flash_and_measure() {
        let mut indicator = IndicatorState::new();
        indicator.on_flash();
        assert!(indicator.flash_active());
        indicator.on_flash_end();
        assert!(!indicator.flash_active());

        indicator.on_measure(42);
        assert_eq!(indicator.measure(), 42);
    }

    #[test]
    fn test_vibration_lengths() {
        let settings = FeedbackSettings::default();
        assert_eq!(settings.vibration_for(AccentLevel::Strong), Duration::from_millis(80));
        assert_eq!(settings.vibration_for(AccentLevel::Medium), Duration::from_millis(80));
        assert_eq!(settings.vibration_for(AccentLevel::None), Duration::from_millis(50));
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: FeedbackSettings =
            serde_json::from_str(r#"{"flash_enabled": true, "on_duration": 150}"#).unwrap();
        assert!(settings.flash_enabled);
        assert!(!settings.vibration_enabled);
        assert_eq!(settings.on_duration, Duration::from_millis(150));
    }
}
