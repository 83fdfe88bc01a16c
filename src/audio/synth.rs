// Click synth - Real-time mixer for scheduled click tones
//
// Runs inside the audio callback: no allocations, no locks. Tones arrive
// through a ring buffer with absolute start times and are mixed sample by
// sample once the clock reaches them.

use crate::audio::clock::ToneSpec;
use crate::audio::timing::SampleClock;
use crate::messaging::channels::ToneConsumer;
use ringbuf::traits::Consumer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum number of tones alive at once (pending + sounding)
pub const MAX_ACTIVE_TONES: usize = 64;

pub struct ClickSynth {
    tone_rx: ToneConsumer,
    clock: SampleClock,
    active: Vec<ToneSpec>,
    dropped: Arc<AtomicU64>,
}

impl ClickSynth {
    pub fn new(tone_rx: ToneConsumer, clock: SampleClock) -> Self {
        Self {
            tone_rx,
            clock,
            active: Vec::with_capacity(MAX_ACTIVE_TONES),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Tones rejected because the active list was full
    pub fn dropped_tones(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Watch the drop count from outside the audio thread
    pub fn drop_monitor(&self) -> DropMonitor {
        DropMonitor {
            dropped: Arc::clone(&self.dropped),
            reported: 0,
        }
    }

    pub fn active_tones(&self) -> usize {
        self.active.len()
    }

    fn drain_queue(&mut self) {
        while let Some(tone) = self.tone_rx.try_pop() {
            if self.active.len() < MAX_ACTIVE_TONES {
                self.active.push(tone);
            } else {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Render `frames` mono samples through `write`, then advance the clock
    pub fn render<F>(&mut self, frames: usize, mut write: F)
    where
        F: FnMut(usize, f32),
    {
        self.drain_queue();

        let start_sample = self.clock.current_sample();
        for frame in 0..frames {
            let t = self.clock.samples_to_seconds(start_sample + frame as u64);
            let mut sample = 0.0f32;
            for tone in &self.active {
                sample += tone.sample_at(t);
            }
            write(frame, sample.clamp(-1.0, 1.0));
        }

        self.clock.advance(frames);
        let now = self.clock.seconds();
        self.active.retain(|tone| tone.end() > now);
    }
}

/// Reports tones the synth had to drop, once each
#[derive(Debug)]
pub struct DropMonitor {
    dropped: Arc<AtomicU64>,
    reported: u64,
}

impl DropMonitor {
    /// Tones dropped since the previous call
    pub fn take_new(&mut self) -> u64 {
        let total = self.dropped.load(Ordering::Relaxed);
        let new = total.saturating_sub(self.reported);
        self.reported = total;
        new
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::waveform::WaveformType;
    use crate::messaging::channels::create_tone_channel;
    use ringbuf::traits::Producer;

    const SAMPLE_RATE: f64 = 48000.0;

    fn click_at(start: f64) -> ToneSpec {
        ToneSpec {
            start,
            waveform: WaveformType::Square,
            frequency: 1000.0,
            peak: 0.5,
            decay: 0.01,
        }
    }

    fn render_block(synth: &mut ClickSynth, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames];
        synth.render(frames, |i, s| out[i] = s);
        out
    }

    #[test]
    fn test_silence_without_tones() {
        let (_tx, rx) = create_tone_channel(8);
        let mut synth = ClickSynth::new(rx, SampleClock::new(SAMPLE_RATE));
        let out = render_block(&mut synth, 512);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_tone_starts_at_scheduled_sample() {
        let (mut tx, rx) = create_tone_channel(8);
        let clock = SampleClock::new(SAMPLE_RATE);
        let mut synth = ClickSynth::new(rx, clock.clone());

        // 240 samples into the buffer
        let _ = tx.try_push(click_at(0.005));
        let out = render_block(&mut synth, 512);

        assert!(out[..240].iter().all(|&s| s == 0.0));
        assert!(out[240].abs() > 0.4);
        assert_eq!(clock.current_sample(), 512);
    }

    #[test]
    fn test_tone_spans_buffers_and_expires() {
        let (mut tx, rx) = create_tone_channel(8);
        let mut synth = ClickSynth::new(rx, SampleClock::new(SAMPLE_RATE));

        // 10 ms tone starting at 8 ms crosses the 512-sample boundary (~10.7 ms)
        let _ = tx.try_push(click_at(0.008));
        let first = render_block(&mut synth, 512);
        assert!(first.iter().any(|&s| s != 0.0));
        assert_eq!(synth.active_tones(), 1);

        let second = render_block(&mut synth, 512);
        assert!(second.iter().any(|&s| s != 0.0));
        assert_eq!(synth.active_tones(), 0);

        let third = render_block(&mut synth, 512);
        assert!(third.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_output_is_clamped() {
        let (mut tx, rx) = create_tone_channel(8);
        let mut synth = ClickSynth::new(rx, SampleClock::new(SAMPLE_RATE));
        for _ in 0..4 {
            let _ = tx.try_push(click_at(0.0));
        }
        let out = render_block(&mut synth, 64);
        assert!(out.iter().all(|&s| (-1.0..=1.0).contains(&s)));
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn test_overflowing_tones_are_counted_once() {
        let (mut tx, rx) = create_tone_channel(MAX_ACTIVE_TONES * 2);
        let mut synth = ClickSynth::new(rx, SampleClock::new(SAMPLE_RATE));
        let mut monitor = synth.drop_monitor();

        // Far-future tones stay active, so the list fills up
        for _ in 0..MAX_ACTIVE_TONES + 3 {
            let _ = tx.try_push(click_at(10.0));
        }
        render_block(&mut synth, 64);

        assert_eq!(synth.active_tones(), MAX_ACTIVE_TONES);
        assert_eq!(synth.dropped_tones(), 3);
        assert_eq!(monitor.take_new(), 3);
        assert_eq!(monitor.take_new(), 0);

        let _ = tx.try_push(click_at(10.0));
        render_block(&mut synth, 64);
        assert_eq!(monitor.take_new(), 1);
    }
}
