// Beat scheduler - Look-ahead beat generation
// Turns tempo + meter into precisely timed beat events on the audio clock.
// The poll timer only decides when to top up the queue; event times come
// from the cursor, never from the poll.

use super::timeline::{Subdivision, Tempo, TimeSignature};

/// Role of a scheduled click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatRole {
    /// Main beat (accented or not)
    Main,
    /// Intermediate click between main beats
    Subdivision,
}

/// Accent strength of a main beat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccentLevel {
    None,
    /// Second dotted-quarter pulse of a 6/8 measure
    Medium,
    /// First beat of a measure
    Strong,
}

impl AccentLevel {
    pub fn is_accented(&self) -> bool {
        !matches!(self, AccentLevel::None)
    }
}

/// One click to render at an exact audio-clock time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Target time in audio-clock seconds
    pub time: f64,
    pub role: BeatRole,
    pub accent: AccentLevel,
    /// Index of the main beat this click belongs to
    pub beat_index: u64,
}

/// Scheduler cursor: where the next unscheduled beat lands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerCursor {
    pub next_note_time: f64,
    pub beat_count: u64,
    pub measure_count: u16,
}

impl SchedulerCursor {
    pub const MAX_MEASURE: u16 = 999;

    pub fn new(start_time: f64) -> Self {
        Self {
            next_note_time: start_time,
            beat_count: 0,
            measure_count: 1,
        }
    }
}

impl Default for SchedulerCursor {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Accent for the beat at `beat_count` in the given meter
pub fn accent_for_beat(beat_count: u64, time_signature: TimeSignature) -> AccentLevel {
    let position = beat_count % time_signature.beats_per_measure();
    match position {
        0 => AccentLevel::Strong,
        3 if time_signature.is_compound() => AccentLevel::Medium,
        _ => AccentLevel::None,
    }
}

/// Look-ahead beat scheduler
/// Owns the cursor; tempo and meter are read at each beat so a change only
/// affects beats that are not yet committed.
#[derive(Debug, Clone, Default)]
pub struct BeatScheduler {
    cursor: SchedulerCursor,
}

impl BeatScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the cursor for a new run starting at `start_time`
    pub fn reset(&mut self, start_time: f64) {
        self.cursor = SchedulerCursor::new(start_time);
    }

    pub fn cursor(&self) -> &SchedulerCursor {
        &self.cursor
    }

    pub fn next_note_time(&self) -> f64 {
        self.cursor.next_note_time
    }

    pub fn beat_count(&self) -> u64 {
        self.cursor.beat_count
    }

    pub fn measure_count(&self) -> u16 {
        self.cursor.measure_count
    }

    /// Emit every beat whose target time falls before `now + schedule_ahead`
    ///
    /// Events are appended to `events` in time order (main beat first, then its
    /// subdivisions). Beats that fell more than one window behind `now` (a
    /// starved poll) advance the counters but are not emitted, so a late
    /// caller does not get a burst of stale clicks. Returns true if the
    /// measure counter changed.
    pub fn fill(
        &mut self,
        now: f64,
        schedule_ahead: f64,
        tempo: Tempo,
        time_signature: TimeSignature,
        subdivision: Subdivision,
        events: &mut Vec<BeatEvent>,
    ) -> bool {
        let mut measure_changed = false;
        let horizon = now + schedule_ahead;

        while self.cursor.next_note_time < horizon {
            let beat_index = self.cursor.beat_count;
            let beat_time = self.cursor.next_note_time;
            let stale = beat_time + schedule_ahead < now;

            if !stale {
                self.push_beat(beat_index, beat_time, tempo, time_signature, subdivision, events);
            }

            self.cursor.beat_count += 1;
            self.cursor.next_note_time += tempo.beat_interval(time_signature);

            if self.cursor.beat_count % time_signature.beats_per_measure() == 0 {
                self.cursor.measure_count =
                    (self.cursor.measure_count % SchedulerCursor::MAX_MEASURE) + 1;
                measure_changed = true;
            }
        }

        measure_changed
    }

    fn push_beat(
        &self,
        beat_index: u64,
        beat_time: f64,
        tempo: Tempo,
        time_signature: TimeSignature,
        subdivision: Subdivision,
        events: &mut Vec<BeatEvent>,
    ) {
        events.push(BeatEvent {
            time: beat_time,
            role: BeatRole::Main,
            accent: accent_for_beat(beat_index, time_signature),
            beat_index,
        });

        let clicks = subdivision.clicks_per_beat();
        if clicks > 1 {
            let step = tempo.subdivision_interval(subdivision);
            for k in 1..clicks {
                events.push(BeatEvent {
                    time: beat_time + step * k as f64,
                    role: BeatRole::Subdivision,
                    accent: AccentLevel::None,
                    beat_index,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_beats(events: &[BeatEvent]) -> Vec<&BeatEvent> {
        events.iter().filter(|e| e.role == BeatRole::Main).collect()
    }

    #[test]
    fn test_fill_respects_window() {
        let mut scheduler = BeatScheduler::new();
        scheduler.reset(10.0);
        let mut events = Vec::new();

        // Window [10.0, 10.1): only the first beat
        scheduler.fill(
            10.0,
            0.1,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::None,
            &mut events,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time, 10.0);
        assert_eq!(scheduler.next_note_time(), 10.5);

        // Nothing new until the next beat enters the window
        events.clear();
        scheduler.fill(
            10.3,
            0.1,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::None,
            &mut events,
        );
        assert!(events.is_empty());

        scheduler.fill(
            10.45,
            0.1,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::None,
            &mut events,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time, 10.5);
    }

    #[test]
    fn test_four_four_accent_pattern() {
        let mut scheduler = BeatScheduler::new();
        let mut events = Vec::new();
        scheduler.fill(
            0.0,
            3.9,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::None,
            &mut events,
        );

        let accents: Vec<AccentLevel> = events.iter().map(|e| e.accent).collect();
        assert_eq!(
            accents,
            vec![
                AccentLevel::Strong,
                AccentLevel::None,
                AccentLevel::None,
                AccentLevel::None,
                AccentLevel::Strong,
                AccentLevel::None,
                AccentLevel::None,
                AccentLevel::None,
            ]
        );
        for (i, event) in events.iter().enumerate() {
            assert!((event.time - i as f64 * 0.5).abs() < 1e-9);
        }
        assert_eq!(scheduler.measure_count(), 3);
    }

    #[test]
    fn test_six_eight_pulses() {
        let mut scheduler = BeatScheduler::new();
        let mut events = Vec::new();
        scheduler.fill(
            0.0,
            4.4,
            Tempo::new(120),
            TimeSignature::SixEight,
            Subdivision::None,
            &mut events,
        );

        assert_eq!(events.len(), 6);
        assert!((events[1].time - 0.75).abs() < 1e-9);
        assert_eq!(events[0].accent, AccentLevel::Strong);
        assert_eq!(events[1].accent, AccentLevel::None);
        assert_eq!(events[3].accent, AccentLevel::Medium);
        assert_eq!(events[5].accent, AccentLevel::None);
        assert_eq!(scheduler.measure_count(), 2);
    }

    #[test]
    fn test_subdivisions_do_not_count_as_beats() {
        let mut scheduler = BeatScheduler::new();
        let mut events = Vec::new();
        scheduler.fill(
            0.0,
            0.1,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::Triplet,
            &mut events,
        );

        assert_eq!(events.len(), 3);
        assert_eq!(main_beats(&events).len(), 1);
        assert_eq!(events[1].role, BeatRole::Subdivision);
        assert!((events[1].time - 1.0 / 6.0).abs() < 1e-9);
        assert!((events[2].time - 2.0 / 6.0).abs() < 1e-9);
        assert_eq!(events[1].accent, AccentLevel::None);
        assert_eq!(scheduler.beat_count(), 1);
    }

    #[test]
    fn test_tempo_change_applies_to_next_beat_only() {
        let mut scheduler = BeatScheduler::new();
        let mut events = Vec::new();
        scheduler.fill(
            0.0,
            0.1,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::None,
            &mut events,
        );
        // Next beat was committed at 0.5 under the old tempo
        assert_eq!(scheduler.next_note_time(), 0.5);

        events.clear();
        scheduler.fill(
            0.45,
            0.1,
            Tempo::new(60),
            TimeSignature::FourFour,
            Subdivision::None,
            &mut events,
        );
        assert_eq!(events[0].time, 0.5);
        assert_eq!(scheduler.next_note_time(), 1.5);
    }

    #[test]
    fn test_measure_wraps_after_999() {
        let mut scheduler = BeatScheduler::new();
        scheduler.cursor.measure_count = 999;
        scheduler.cursor.beat_count = 3;
        let mut events = Vec::new();
        let changed = scheduler.fill(
            0.0,
            0.1,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::None,
            &mut events,
        );
        assert!(changed);
        assert_eq!(scheduler.measure_count(), 1);
    }

    #[test]
    fn test_late_fill_skips_stale_beats() {
        // A starved poll only emits beats that can still sound
        let mut scheduler = BeatScheduler::new();
        let mut events = Vec::new();
        scheduler.fill(
            2.0,
            0.1,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::Eighth,
            &mut events,
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].time, 2.0);
        assert_eq!(events[0].beat_index, 4);
        assert_eq!(events[0].accent, AccentLevel::Strong);
        assert_eq!(scheduler.beat_count(), 5);
        assert_eq!(scheduler.measure_count(), 2);
    }

    #[test]
    fn test_long_stall_keeps_counting_measures() {
        let mut scheduler = BeatScheduler::new();
        let mut events = Vec::new();
        let changed = scheduler.fill(
            5.0,
            0.1,
            Tempo::new(120),
            TimeSignature::FourFour,
            Subdivision::None,
            &mut events,
        );
        assert!(changed);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time, 5.0);
        assert_eq!(scheduler.beat_count(), 11);
        assert_eq!(scheduler.measure_count(), 3);
    }
}
