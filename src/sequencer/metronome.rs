// Metronome - Scheduler core
// Owns tempo state, the beat cursor and every timer of the single cooperative
// timeline. Host features (audio clock, keep-awake, storage, UI feedback) are
// injected so the whole loop runs deterministically under test.

use super::click::Timbre;
use super::scheduler::{AccentLevel, BeatEvent, BeatRole, BeatScheduler};
use super::tap_tempo::{TapStability, TapTempo};
use super::timeline::{Subdivision, Tempo, TimeSignature};
use crate::audio::clock::{AudioBackend, AudioClock, ClockState};
use crate::config::MetronomeConfig;
use crate::error::MetronomeError;
use crate::feedback::{FeedbackSettings, FeedbackSink};
use crate::host::{KeepAwake, Storage, WakeHandle};
use crate::presets::PresetSet;
use crate::theme::Theme;
use crate::timer::{PollTimer, TimerId, TimerQueue};
use std::time::Duration;

/// Injected host collaborators
pub struct Collaborators {
    pub audio: Box<dyn AudioBackend>,
    pub keep_awake: Box<dyn KeepAwake>,
    pub storage: Box<dyn Storage>,
    pub feedback: Box<dyn FeedbackSink>,
}

/// Deferred work on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    SchedulerTick,
    BeatFeedback(AccentLevel),
    BeatEnd,
    FlashEnd,
    TapReset,
}

/// Outcome of a tap-tempo tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapReport {
    pub candidate_bpm: Option<u32>,
    /// Whether the candidate was in range and became the tempo
    pub applied: bool,
    pub stability: Option<TapStability>,
}

pub struct Metronome {
    config: MetronomeConfig,
    tempo: Tempo,
    time_signature: TimeSignature,
    subdivision: Subdivision,
    timbre: Timbre,
    feedback_settings: FeedbackSettings,
    playing: bool,

    scheduler: BeatScheduler,
    events: Vec<BeatEvent>,
    timers: TimerQueue<Task>,
    poll_timer: PollTimer,

    tap: TapTempo,
    tap_timer: Option<TimerId>,
    presets: PresetSet,
    theme: Theme,

    audio: Box<dyn AudioBackend>,
    clock: Option<Box<dyn AudioClock>>,
    keep_awake: Box<dyn KeepAwake>,
    wake_handle: Option<WakeHandle>,
    storage: Box<dyn Storage>,
    feedback: Box<dyn FeedbackSink>,
}

impl Metronome {
    /// Create a stopped metronome; presets and theme are read from storage
    pub fn new(config: MetronomeConfig, host: Collaborators) -> Self {
        let config = config.sanitized();
        let presets = PresetSet::load(host.storage.as_ref());
        let theme = Theme::load(host.storage.as_ref());

        Self {
            tempo: config.tempo,
            time_signature: config.time_signature,
            subdivision: config.subdivision,
            timbre: config.timbre,
            feedback_settings: config.feedback,
            playing: false,
            scheduler: BeatScheduler::new(),
            events: Vec::with_capacity(16),
            timers: TimerQueue::new(),
            poll_timer: PollTimer::new(config.lookahead),
            tap: TapTempo::new(config.tap),
            tap_timer: None,
            presets,
            theme,
            audio: host.audio,
            clock: None,
            keep_awake: host.keep_awake,
            wake_handle: None,
            storage: host.storage,
            feedback: host.feedback,
            config,
        }
    }

    // ---- Transport ----

    /// Start playback at wall time `now`
    ///
    /// Fails with `AudioUnavailable` if no audio clock can be created; the
    /// metronome then stays stopped.
    pub fn start(&mut self, now: Duration) -> Result<(), MetronomeError> {
        if self.playing {
            return Ok(());
        }

        let audio_now = self.prepare_clock()?.current_time();
        self.scheduler.reset(audio_now);
        self.playing = true;
        self.feedback.on_measure(self.scheduler.measure_count());

        log::info!(
            "Metronome started: {}, {}, {:?}",
            self.tempo,
            self.time_signature,
            self.subdivision
        );

        self.scheduler_tick(now);
        self.acquire_keep_awake();
        Ok(())
    }

    /// Stop playback; a second call is a no-op
    /// Feedback already queued for earlier beats may still fire.
    pub fn stop(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.poll_timer.cancel(&mut self.timers);
        self.feedback.on_beat_end();
        self.release_keep_awake();

        log::info!(
            "Metronome stopped after {} beats",
            self.scheduler.beat_count()
        );
    }

    pub fn toggle(&mut self, now: Duration) -> Result<(), MetronomeError> {
        if self.playing {
            self.stop();
            Ok(())
        } else {
            self.start(now)
        }
    }

    /// First user gesture: create and resume the audio clock ahead of playback
    pub fn unlock_audio(&mut self) {
        if let Err(e) = self.prepare_clock() {
            log::warn!("Audio unlock failed: {}", e);
        }
    }

    /// Fire every timer due at or before wall time `now`
    pub fn poll(&mut self, now: Duration) {
        while let Some((_, task)) = self.timers.pop_due(now) {
            match task {
                Task::SchedulerTick => {
                    self.poll_timer.fired();
                    if self.playing {
                        self.scheduler_tick(now);
                    }
                }
                Task::BeatFeedback(accent) => self.fire_beat_feedback(now, accent),
                Task::BeatEnd => self.feedback.on_beat_end(),
                Task::FlashEnd => self.feedback.on_flash_end(),
                Task::TapReset => {
                    self.tap_timer = None;
                    self.tap.reset();
                }
            }
        }
    }

    /// Wall time of the next pending timer, for hosts that sleep between polls
    pub fn next_wakeup(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    fn prepare_clock(&mut self) -> Result<&mut Box<dyn AudioClock>, MetronomeError> {
        let clock = match self.clock.take() {
            Some(clock) => clock,
            None => {
                let clock = self.audio.open()?;
                log::debug!("Audio clock created at {:.3}s", clock.current_time());
                clock
            }
        };
        let clock = self.clock.insert(clock);

        if clock.state() == ClockState::Suspended {
            if let Err(e) = clock.resume() {
                log::warn!("Audio clock resume failed: {}", e);
            }
        }
        Ok(clock)
    }

    /// Queue every beat inside the look-ahead window, then re-arm the poll
    fn scheduler_tick(&mut self, now: Duration) {
        let Some(clock) = self.clock.as_mut() else {
            return;
        };
        let audio_now = clock.current_time();

        self.events.clear();
        let measure_changed = self.scheduler.fill(
            audio_now,
            self.config.schedule_ahead,
            self.tempo,
            self.time_signature,
            self.subdivision,
            &mut self.events,
        );

        for event in &self.events {
            clock.schedule_tone(self.timbre.tone_for(event));

            // Feedback follows the sound, not the scheduling
            if event.role == BeatRole::Main {
                let delay = Duration::from_secs_f64((event.time - audio_now).max(0.0));
                self.timers
                    .schedule(now, delay, Task::BeatFeedback(event.accent));
            }
        }

        if measure_changed {
            self.feedback.on_measure(self.scheduler.measure_count());
        }

        self.poll_timer
            .arm(&mut self.timers, now, Task::SchedulerTick);
    }

    fn fire_beat_feedback(&mut self, now: Duration, accent: AccentLevel) {
        let settings = self.feedback_settings;

        self.feedback.on_beat(BeatRole::Main, accent);
        self.timers.schedule(now, settings.on_duration, Task::BeatEnd);

        if settings.vibration_enabled {
            self.feedback.on_vibrate(settings.vibration_for(accent));
        }
        if settings.flash_enabled {
            self.feedback.on_flash();
            self.timers.schedule(now, settings.on_duration, Task::FlashEnd);
        }
    }

    fn acquire_keep_awake(&mut self) {
        if self.wake_handle.is_some() {
            return;
        }
        match self.keep_awake.acquire() {
            Ok(handle) => self.wake_handle = Some(handle),
            Err(e) => log::warn!("Wake lock error: {}", e),
        }
    }

    fn release_keep_awake(&mut self) {
        if let Some(handle) = self.wake_handle.take() {
            if let Err(e) = self.keep_awake.release(handle) {
                log::warn!("Wake lock release error: {}", e);
            }
        }
    }

    // ---- Tempo and meter ----

    /// Set the tempo (clamped to [40, 220]); applies from the next beat
    pub fn set_tempo(&mut self, bpm: i64) -> Tempo {
        self.tempo = Tempo::new(bpm);
        self.tempo
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    pub fn set_subdivision(&mut self, subdivision: Subdivision) {
        self.subdivision = subdivision;
    }

    pub fn set_timbre(&mut self, timbre: Timbre) {
        self.timbre = timbre;
    }

    pub fn set_vibration_enabled(&mut self, enabled: bool) {
        self.feedback_settings.vibration_enabled = enabled;
    }

    pub fn set_flash_enabled(&mut self, enabled: bool) {
        self.feedback_settings.flash_enabled = enabled;
    }

    // ---- Tap tempo ----

    /// Register a tap at wall time `now`
    /// The tempo only changes when the estimate lies in [40, 220].
    pub fn tap(&mut self, now: Duration) -> TapReport {
        let estimate = self.tap.tap(now);

        if let Some(id) = self.tap_timer.take() {
            self.timers.cancel(id);
        }
        let timeout = self.tap.config().inactivity_timeout;
        self.tap_timer = Some(self.timers.schedule(now, timeout, Task::TapReset));

        let applied = match estimate.candidate_bpm {
            Some(bpm) if Tempo::in_range(bpm as i64) => {
                self.set_tempo(bpm as i64);
                log::debug!("Tap tempo set {}", self.tempo);
                true
            }
            _ => false,
        };

        TapReport {
            candidate_bpm: estimate.candidate_bpm,
            applied,
            stability: estimate.stability,
        }
    }

    pub fn reset_taps(&mut self) {
        if let Some(id) = self.tap_timer.take() {
            self.timers.cancel(id);
        }
        self.tap.reset();
    }

    pub fn tap_history(&self) -> Vec<u32> {
        self.tap.recent_bpms()
    }

    pub fn tap_average(&self) -> Option<u32> {
        self.tap.average_bpm()
    }

    pub fn tap_count(&self) -> usize {
        self.tap.tap_count()
    }

    // ---- Presets and theme ----

    /// Save the current tempo; false if it was already saved
    pub fn save_preset(&mut self) -> bool {
        let added = self.presets.add(self.tempo);
        if added {
            self.presets.save(self.storage.as_mut());
        }
        added
    }

    pub fn delete_preset(&mut self, bpm: u16) -> bool {
        let removed = self.presets.remove(bpm);
        if removed {
            self.presets.save(self.storage.as_mut());
        }
        removed
    }

    pub fn select_preset(&mut self, bpm: u16) -> Tempo {
        self.set_tempo(bpm as i64)
    }

    pub fn presets(&self) -> &PresetSet {
        &self.presets
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme.save(self.storage.as_mut());
        self.theme
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    // ---- State ----

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn subdivision(&self) -> Subdivision {
        self.subdivision
    }

    pub fn timbre(&self) -> Timbre {
        self.timbre
    }

    pub fn feedback_settings(&self) -> &FeedbackSettings {
        &self.feedback_settings
    }

    pub fn config(&self) -> &MetronomeConfig {
        &self.config
    }

    pub fn measure_label(&self) -> String {
        self.time_signature.to_string()
    }

    pub fn beat_count(&self) -> u64 {
        self.scheduler.beat_count()
    }

    pub fn measure_count(&self) -> u16 {
        self.scheduler.measure_count()
    }

    pub fn next_note_time(&self) -> f64 {
        self.scheduler.next_note_time()
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.release_keep_awake();
    }
}
