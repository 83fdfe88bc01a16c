// Audio clock - Collaborator interface to the host audio output
//
// The clock is the only source of truth for when sound plays. Tones are handed
// over with an absolute start time; the host renders them sample-accurately.

use crate::audio::waveform::WaveformType;
use crate::error::MetronomeError;

/// Lifecycle of the audio output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Running,
    Suspended,
}

/// Amplitude envelope floor; the exponential decay ramps towards this value
pub const ENVELOPE_FLOOR: f32 = 0.001;

/// A single click tone scheduled on the audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    /// Start time in audio-clock seconds
    pub start: f64,
    pub waveform: WaveformType,
    pub frequency: f32,
    /// Peak amplitude reached at `start`
    pub peak: f32,
    /// Seconds from peak to `ENVELOPE_FLOOR`; the tone stops afterwards
    pub decay: f32,
}

impl ToneSpec {
    pub fn end(&self) -> f64 {
        self.start + self.decay as f64
    }

    /// Exponential envelope value at absolute time `t` (0 outside the tone)
    #[inline]
    pub fn envelope_at(&self, t: f64) -> f32 {
        if t < self.start || self.peak <= 0.0 {
            return 0.0;
        }
        // Compared at the decay's own precision so `start + decay` is silent
        let elapsed = (t - self.start) as f32;
        if elapsed >= self.decay {
            return 0.0;
        }
        let progress = elapsed / self.decay;
        self.peak * (ENVELOPE_FLOOR / self.peak).powf(progress)
    }

    /// Rendered sample value at absolute time `t`
    #[inline]
    pub fn sample_at(&self, t: f64) -> f32 {
        let envelope = self.envelope_at(t);
        if envelope == 0.0 {
            return 0.0;
        }
        self.waveform.sample_since_start(self.frequency, t - self.start) * envelope
    }
}

/// Host audio clock: monotonic time plus a tone scheduling primitive
pub trait AudioClock {
    /// Current audio-clock time in seconds
    fn current_time(&self) -> f64;

    fn state(&self) -> ClockState;

    /// Resume a suspended clock
    fn resume(&mut self) -> Result<(), MetronomeError>;

    /// Queue a tone for playback at `tone.start`
    fn schedule_tone(&mut self, tone: ToneSpec);
}

/// Factory for the process-wide audio clock
/// Called lazily on the first user gesture, then the clock is reused.
pub trait AudioBackend {
    fn open(&mut self) -> Result<Box<dyn AudioClock>, MetronomeError>;
}
