// Timeline - Musical time representation
// Tempo, meter and subdivision, plus the interval math the scheduler relies on

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time signature (beats per measure)
/// `SixEight` is compound meter: each beat is a dotted-quarter pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSignature {
    TwoFour,
    ThreeFour,
    #[default]
    FourFour,
    SixEight,
}

impl TimeSignature {
    pub const ALL: [TimeSignature; 4] = [
        TimeSignature::FourFour,
        TimeSignature::ThreeFour,
        TimeSignature::TwoFour,
        TimeSignature::SixEight,
    ];

    /// Beats per measure as counted by the scheduler (2, 3, 4 or 6)
    pub fn beats_per_measure(&self) -> u64 {
        match self {
            TimeSignature::TwoFour => 2,
            TimeSignature::ThreeFour => 3,
            TimeSignature::FourFour => 4,
            TimeSignature::SixEight => 6,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, TimeSignature::SixEight)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeSignature::TwoFour => "2/4",
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::FourFour => "4/4",
            TimeSignature::SixEight => "6/8",
        };
        f.write_str(label)
    }
}

/// Clicks per beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subdivision {
    #[default]
    None,
    Eighth,
    Triplet,
    Sixteenth,
}

impl Subdivision {
    pub const ALL: [Subdivision; 4] = [
        Subdivision::None,
        Subdivision::Eighth,
        Subdivision::Triplet,
        Subdivision::Sixteenth,
    ];

    pub fn clicks_per_beat(&self) -> u32 {
        match self {
            Subdivision::None => 1,
            Subdivision::Eighth => 2,
            Subdivision::Triplet => 3,
            Subdivision::Sixteenth => 4,
        }
    }
}

/// Tempo in BPM (Beats Per Minute), always within [MIN_BPM, MAX_BPM]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u16")]
pub struct Tempo {
    bpm: u16,
}

impl Tempo {
    pub const MIN_BPM: u16 = 40;
    pub const MAX_BPM: u16 = 220;
    pub const DEFAULT_BPM: u16 = 120;

    /// Creates a new tempo, clamping out-of-range values to the nearest bound
    pub fn new(bpm: i64) -> Self {
        let clamped = bpm.clamp(Self::MIN_BPM as i64, Self::MAX_BPM as i64);
        Self { bpm: clamped as u16 }
    }

    /// Whether a raw BPM value lies inside the accepted range without clamping
    pub fn in_range(bpm: i64) -> bool {
        (Self::MIN_BPM as i64..=Self::MAX_BPM as i64).contains(&bpm)
    }

    /// Parse free text input; unparseable input falls back to the default tempo
    pub fn parse_lossy(input: &str) -> Self {
        match input.trim().parse::<i64>() {
            Ok(bpm) => Self::new(bpm),
            Err(_) => Self::default(),
        }
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Duration of one quarter note in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Distance between two scheduled beats in the given meter
    /// 6/8 counts dotted-quarter pulses: 60 / (bpm * 2/3)
    pub fn beat_interval(&self, time_signature: TimeSignature) -> f64 {
        if time_signature.is_compound() {
            60.0 / (self.bpm as f64 * 2.0 / 3.0)
        } else {
            self.beat_duration_seconds()
        }
    }

    /// Distance between two subdivision clicks
    pub fn subdivision_interval(&self, subdivision: Subdivision) -> f64 {
        60.0 / (self.bpm as f64 * subdivision.clicks_per_beat() as f64)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: Self::DEFAULT_BPM,
        }
    }
}

impl From<i64> for Tempo {
    fn from(bpm: i64) -> Self {
        Self::new(bpm)
    }
}

impl From<Tempo> for u16 {
    fn from(tempo: Tempo) -> Self {
        tempo.bpm
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_in_range_is_exact() {
        for bpm in 40..=220 {
            assert_eq!(Tempo::new(bpm).bpm() as i64, bpm);
        }
    }

    #[test]
    fn test_tempo_clamps_to_bounds() {
        assert_eq!(Tempo::new(0).bpm(), 40);
        assert_eq!(Tempo::new(-5).bpm(), 40);
        assert_eq!(Tempo::new(39).bpm(), 40);
        assert_eq!(Tempo::new(221).bpm(), 220);
        assert_eq!(Tempo::new(10_000).bpm(), 220);
    }

    #[test]
    fn test_tempo_parse_lossy() {
        assert_eq!(Tempo::parse_lossy("95").bpm(), 95);
        assert_eq!(Tempo::parse_lossy(" 300 ").bpm(), 220);
        assert_eq!(Tempo::parse_lossy("fast").bpm(), 120);
        assert_eq!(Tempo::parse_lossy("").bpm(), 120);
    }

    #[test]
    fn test_beat_interval_simple_meter() {
        let tempo = Tempo::new(120);
        assert!((tempo.beat_interval(TimeSignature::FourFour) - 0.5).abs() < 1e-12);
        assert!((tempo.beat_interval(TimeSignature::ThreeFour) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_beat_interval_compound_meter() {
        let tempo = Tempo::new(120);
        assert!((tempo.beat_interval(TimeSignature::SixEight) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_subdivision_interval() {
        let tempo = Tempo::new(120);
        assert!((tempo.subdivision_interval(Subdivision::Eighth) - 0.25).abs() < 1e-12);
        assert!((tempo.subdivision_interval(Subdivision::Triplet) - 1.0 / 6.0).abs() < 1e-12);
        assert!((tempo.subdivision_interval(Subdivision::Sixteenth) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_time_signature_labels() {
        assert_eq!(TimeSignature::FourFour.to_string(), "4/4");
        assert_eq!(TimeSignature::SixEight.to_string(), "6/8");
    }

    #[test]
    fn test_tempo_deserialize_clamps() {
        let tempo: Tempo = serde_json::from_str("500").unwrap();
        assert_eq!(tempo.bpm(), 220);
        assert_eq!(serde_json::to_string(&Tempo::new(90)).unwrap(), "90");
    }
}
