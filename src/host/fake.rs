// Test doubles for the host collaborators
// Deterministic audio clock, recording feedback sink and counting keep-awake

use super::{KeepAwake, WakeHandle};
use crate::audio::clock::{AudioBackend, AudioClock, ClockState, ToneSpec};
use crate::error::{HostError, MetronomeError};
use crate::feedback::FeedbackSink;
use crate::sequencer::scheduler::{AccentLevel, BeatRole};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct FakeAudioState {
    time: f64,
    state: ClockState,
    available: bool,
    opens: usize,
    resumes: usize,
    tones: Vec<ToneSpec>,
}

/// Audio backend whose clock time is set by the test
#[derive(Clone, Debug)]
pub struct FakeAudioBackend {
    shared: Arc<Mutex<FakeAudioState>>,
}

impl FakeAudioBackend {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(FakeAudioState {
                time: 0.0,
                state: ClockState::Running,
                available: true,
                opens: 0,
                resumes: 0,
                tones: Vec::new(),
            })),
        }
    }

    /// Backend that fails to open, as on a host without audio output
    pub fn unavailable() -> Self {
        let backend = Self::new();
        lock(&backend.shared).available = false;
        backend
    }

    /// Backend whose clock starts suspended (autoplay policy)
    pub fn suspended() -> Self {
        let backend = Self::new();
        lock(&backend.shared).state = ClockState::Suspended;
        backend
    }

    pub fn set_time(&self, seconds: f64) {
        lock(&self.shared).time = seconds;
    }

    pub fn advance(&self, seconds: f64) {
        lock(&self.shared).time += seconds;
    }

    pub fn time(&self) -> f64 {
        lock(&self.shared).time
    }

    pub fn state(&self) -> ClockState {
        lock(&self.shared).state
    }

    pub fn opens(&self) -> usize {
        lock(&self.shared).opens
    }

    pub fn resumes(&self) -> usize {
        lock(&self.shared).resumes
    }

    /// Every tone scheduled so far, in scheduling order
    pub fn tones(&self) -> Vec<ToneSpec> {
        lock(&self.shared).tones.clone()
    }
}

impl Default for FakeAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for FakeAudioBackend {
    fn open(&mut self) -> Result<Box<dyn AudioClock>, MetronomeError> {
        let mut state = lock(&self.shared);
        if !state.available {
            return Err(MetronomeError::AudioUnavailable(
                "fake backend has no output".to_string(),
            ));
        }
        state.opens += 1;
        Ok(Box::new(FakeAudioClock {
            shared: self.shared.clone(),
        }))
    }
}

struct FakeAudioClock {
    shared: Arc<Mutex<FakeAudioState>>,
}

impl AudioClock for FakeAudioClock {
    fn current_time(&self) -> f64 {
        lock(&self.shared).time
    }

    fn state(&self) -> ClockState {
        lock(&self.shared).state
    }

    fn resume(&mut self) -> Result<(), MetronomeError> {
        let mut state = lock(&self.shared);
        state.resumes += 1;
        state.state = ClockState::Running;
        Ok(())
    }

    fn schedule_tone(&mut self, tone: ToneSpec) {
        lock(&self.shared).tones.push(tone);
    }
}

/// One call received by `RecordingFeedback`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedbackRecord {
    Beat(BeatRole, AccentLevel),
    BeatEnd,
    Flash,
    FlashEnd,
    Vibrate(Duration),
    Measure(u16),
}

/// Feedback sink that records every call
#[derive(Clone, Debug, Default)]
pub struct RecordingFeedback {
    records: Arc<Mutex<Vec<FeedbackRecord>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FeedbackRecord> {
        lock(&self.records).clone()
    }

    pub fn beats(&self) -> Vec<AccentLevel> {
        lock(&self.records)
            .iter()
            .filter_map(|r| match r {
                FeedbackRecord::Beat(_, accent) => Some(*accent),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }

    fn push(&self, record: FeedbackRecord) {
        lock(&self.records).push(record);
    }
}

impl FeedbackSink for RecordingFeedback {
    fn on_beat(&mut self, role: BeatRole, accent: AccentLevel) {
        self.push(FeedbackRecord::Beat(role, accent));
    }

    fn on_beat_end(&mut self) {
        self.push(FeedbackRecord::BeatEnd);
    }

    fn on_flash(&mut self) {
        self.push(FeedbackRecord::Flash);
    }

    fn on_flash_end(&mut self) {
        self.push(FeedbackRecord::FlashEnd);
    }

    fn on_vibrate(&mut self, duration: Duration) {
        self.push(FeedbackRecord::Vibrate(duration));
    }

    fn on_measure(&mut self, measure: u16) {
        self.push(FeedbackRecord::Measure(measure));
    }
}

#[derive(Debug, Default)]
struct KeepAwakeCounts {
    acquires: usize,
    releases: usize,
    held: usize,
    fail_acquire: bool,
    fail_release: bool,
    next_handle: u64,
}

/// Keep-awake provider counting acquire/release attempts
#[derive(Clone, Debug, Default)]
pub struct CountingKeepAwake {
    counts: Arc<Mutex<KeepAwakeCounts>>,
}

impl CountingKeepAwake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_acquire() -> Self {
        let provider = Self::new();
        lock(&provider.counts).fail_acquire = true;
        provider
    }

    pub fn failing_release() -> Self {
        let provider = Self::new();
        lock(&provider.counts).fail_release = true;
        provider
    }

    pub fn acquires(&self) -> usize {
        lock(&self.counts).acquires
    }

    pub fn releases(&self) -> usize {
        lock(&self.counts).releases
    }

    /// Locks currently held
    pub fn held(&self) -> usize {
        lock(&self.counts).held
    }
}

impl KeepAwake for CountingKeepAwake {
    fn acquire(&mut self) -> Result<WakeHandle, HostError> {
        let mut counts = lock(&self.counts);
        counts.acquires += 1;
        if counts.fail_acquire {
            return Err(HostError::Failed("wake lock denied".to_string()));
        }
        counts.held += 1;
        counts.next_handle += 1;
        Ok(WakeHandle(counts.next_handle))
    }

    fn release(&mut self, _handle: WakeHandle) -> Result<(), HostError> {
        let mut counts = lock(&self.counts);
        counts.releases += 1;
        if counts.fail_release {
            return Err(HostError::Failed("wake lock already released".to_string()));
        }
        counts.held = counts.held.saturating_sub(1);
        Ok(())
    }
}
