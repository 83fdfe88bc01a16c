// Click sounds - Maps beat events to tones
// Each timbre is a fixed (waveform, frequency, decay) voice; accent and
// subdivision only change pitch, level and length.

use super::scheduler::{AccentLevel, BeatEvent, BeatRole};
use crate::audio::clock::ToneSpec;
use crate::audio::waveform::WaveformType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selectable click sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timbre {
    #[default]
    Click,
    Beep,
    Woodblock,
    Digital,
}

/// Fixed parameters of one timbre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub waveform: WaveformType,
    pub normal_frequency: f32,
    pub accent_frequency: f32,
    /// Multiplier applied to the role's base level
    pub gain: f32,
    /// Decay of a main beat, in seconds
    pub decay: f32,
}

const STRONG_LEVEL: f32 = 0.7;
const MEDIUM_LEVEL: f32 = 0.6;
const NORMAL_LEVEL: f32 = 0.5;
const SUBDIVISION_LEVEL: f32 = 0.25;
const SUBDIVISION_DECAY_SCALE: f32 = 0.6;

impl Timbre {
    pub const ALL: [Timbre; 4] = [Timbre::Click, Timbre::Beep, Timbre::Woodblock, Timbre::Digital];

    pub fn voice(&self) -> Voice {
        match self {
            Timbre::Click => Voice {
                waveform: WaveformType::Sine,
                normal_frequency: 1000.0,
                accent_frequency: 1200.0,
                gain: 1.0,
                decay: 0.05,
            },
            Timbre::Beep => Voice {
                waveform: WaveformType::Square,
                normal_frequency: 800.0,
                accent_frequency: 1000.0,
                gain: 0.6,
                decay: 0.075,
            },
            Timbre::Woodblock => Voice {
                waveform: WaveformType::Triangle,
                normal_frequency: 600.0,
                accent_frequency: 700.0,
                gain: 1.0,
                decay: 0.03,
            },
            Timbre::Digital => Voice {
                waveform: WaveformType::Sawtooth,
                normal_frequency: 1200.0,
                accent_frequency: 1500.0,
                gain: 0.5,
                decay: 0.04,
            },
        }
    }

    /// Tone for a beat event, starting exactly at the event's target time
    pub fn tone_for(&self, event: &BeatEvent) -> ToneSpec {
        let voice = self.voice();

        let (frequency, level, decay) = match (event.role, event.accent) {
            (BeatRole::Subdivision, _) => (
                voice.normal_frequency,
                SUBDIVISION_LEVEL,
                voice.decay * SUBDIVISION_DECAY_SCALE,
            ),
            (BeatRole::Main, AccentLevel::Strong) => {
                (voice.accent_frequency, STRONG_LEVEL, voice.decay)
            }
            (BeatRole::Main, AccentLevel::Medium) => {
                (voice.accent_frequency, MEDIUM_LEVEL, voice.decay)
            }
            (BeatRole::Main, AccentLevel::None) => {
                (voice.normal_frequency, NORMAL_LEVEL, voice.decay)
            }
        };

        ToneSpec {
            start: event.time,
            waveform: voice.waveform,
            frequency,
            peak: level * voice.gain,
            decay,
        }
    }
}

impl fmt::Display for Timbre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Timbre::Click => "Click",
            Timbre::Beep => "Beep",
            Timbre::Woodblock => "Woodblock",
            Timbre::Digital => "Digital",
        };
        f.write_str(name)
    }
}
