// Waveforms - Oscillator shapes for click synthesis

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformType {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl WaveformType {
    /// Waveform value at a normalized phase in [0, 1)
    #[inline]
    pub fn sample_at(&self, phase: f32) -> f32 {
        match self {
            WaveformType::Sine => (phase * 2.0 * PI).sin(),
            WaveformType::Square => {
                if phase < 0.5 { 1.0 } else { -1.0 }
            }
            WaveformType::Sawtooth => (phase * 2.0) - 1.0,
            WaveformType::Triangle => {
                if phase < 0.5 {
                    (phase * 4.0) - 1.0
                } else {
                    3.0 - (phase * 4.0)
                }
            }
        }
    }

    /// Waveform value `elapsed` seconds after the tone started
    #[inline]
    pub fn sample_since_start(&self, frequency: f32, elapsed: f64) -> f32 {
        let cycles = elapsed * frequency as f64;
        self.sample_at(cycles.fract() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    #[test]
    fn test_waveforms_stay_in_range() {
        for waveform in [
            WaveformType::Sine,
            WaveformType::Square,
            WaveformType::Sawtooth,
            WaveformType::Triangle,
        ] {
            for i in 0..1000 {
                let sample = waveform.sample_at(i as f32 / 1000.0);
                assert!((-1.0..=1.0).contains(&sample), "{waveform:?} out of range");
            }
        }
    }

    #[test]
    fn test_waveform_shapes() {
        assert!(WaveformType::Sine.sample_at(0.0).abs() < EPSILON);
        assert!((WaveformType::Sine.sample_at(0.25) - 1.0).abs() < EPSILON);
        assert_eq!(WaveformType::Square.sample_at(0.1), 1.0);
        assert_eq!(WaveformType::Square.sample_at(0.6), -1.0);
        assert!((WaveformType::Sawtooth.sample_at(0.0) + 1.0).abs() < EPSILON);
        assert!((WaveformType::Triangle.sample_at(0.5) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_sample_since_start_uses_frequency() {
        // Quarter period of a 1 kHz sine = 0.25 ms
        let sample = WaveformType::Sine.sample_since_start(1000.0, 0.000_25);
        assert!((sample - 1.0).abs() < EPSILON);
    }
}
