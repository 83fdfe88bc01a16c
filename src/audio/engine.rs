// Audio engine - CPAL-backed audio clock
//
// The output stream is created once (on the first user gesture) and kept for
// the whole process; the metronome only suspends/resumes it. The callback
// renders tones queued through a lock-free ring buffer, and the number of
// frames it has rendered is the audio clock.
//
// Supported device formats: F32, I16, U16. Rendering is done in f32 and
// converted with `Sample::from_sample` when writing the interleaved frame.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::Producer;
use std::sync::{Arc, Mutex};

use crate::audio::clock::{AudioBackend, AudioClock, ClockState, ToneSpec};
use crate::audio::synth::{ClickSynth, DropMonitor, MAX_ACTIVE_TONES};
use crate::audio::timing::SampleClock;
use crate::error::MetronomeError;
use crate::messaging::channels::{NotificationProducer, ToneProducer, create_tone_channel};
use crate::messaging::notification::{Notification, NotificationCategory};

/// Opens the default output device on demand
pub struct CpalBackend {
    notification_tx: Arc<Mutex<NotificationProducer>>,
}

impl CpalBackend {
    pub fn new(notification_tx: Arc<Mutex<NotificationProducer>>) -> Self {
        Self { notification_tx }
    }
}

impl AudioBackend for CpalBackend {
    fn open(&mut self) -> Result<Box<dyn AudioClock>, MetronomeError> {
        let clock = CpalClock::new(self.notification_tx.clone())?;
        Ok(Box::new(clock))
    }
}

pub struct CpalClock {
    _device: Device,
    stream: Stream,
    clock: SampleClock,
    tone_tx: ToneProducer,
    drops: DropMonitor,
    notification_tx: Arc<Mutex<NotificationProducer>>,
    state: ClockState,
}

impl CpalClock {
    pub fn new(notification_tx: Arc<Mutex<NotificationProducer>>) -> Result<Self, MetronomeError> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| MetronomeError::AudioUnavailable("no output device found".to_string()))?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| MetronomeError::AudioUnavailable(format!("configuration error: {}", e)))?;

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f64;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        log::debug!("Audio config: {:?}, format {:?}", config, sample_format);

        let clock = SampleClock::new(sample_rate);
        let (tone_tx, tone_rx) = create_tone_channel(MAX_ACTIVE_TONES);
        let synth = ClickSynth::new(tone_rx, clock.clone());
        let drops = synth.drop_monitor();

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config, channels, synth, notification_tx.clone())
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config, channels, synth, notification_tx.clone())
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config, channels, synth, notification_tx.clone())
            }
            _ => {
                return Err(MetronomeError::AudioUnavailable(format!(
                    "unsupported sample format: {:?}. Supported formats: F32, I16, U16",
                    sample_format
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| MetronomeError::AudioUnavailable(format!("stream start failed: {}", e)))?;

        log::info!("Audio clock started: {} Hz, {} channels", sample_rate, channels);

        Ok(Self {
            _device: device,
            stream,
            clock,
            tone_tx,
            drops,
            notification_tx,
            state: ClockState::Running,
        })
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut synth: ClickSynth,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Stream, MetronomeError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocations, no I/O, no blocking locks in here
                    let frames = data.len() / channels;
                    synth.render(frames, |frame, sample| {
                        let value = T::from_sample(sample);
                        let start = frame * channels;
                        for out in &mut data[start..start + channels] {
                            *out = value;
                        }
                    });
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                    if let Ok(mut tx) = notification_tx.try_lock() {
                        let notif = Notification::error(
                            NotificationCategory::Audio,
                            format!("Audio stream error: {}", err),
                        );
                        let _ = tx.try_push(notif);
                    }
                },
                None,
            )
            .map_err(|e| MetronomeError::AudioUnavailable(format!("stream creation failed: {}", e)))
    }

    pub fn sample_rate(&self) -> f64 {
        self.clock.sample_rate()
    }

    /// Surface tones the callback dropped since the last check
    fn report_drops(&mut self) {
        let dropped = self.drops.take_new();
        if dropped == 0 {
            return;
        }
        log::warn!("Audio callback dropped {} click(s): too many active tones", dropped);
        if let Ok(mut tx) = self.notification_tx.try_lock() {
            let notif = Notification::warning(
                NotificationCategory::Audio,
                format!("{} click(s) dropped, too many overlapping sounds", dropped),
            );
            let _ = tx.try_push(notif);
        }
    }
}

impl AudioClock for CpalClock {
    fn current_time(&self) -> f64 {
        self.clock.seconds()
    }

    fn state(&self) -> ClockState {
        self.state
    }

    fn resume(&mut self) -> Result<(), MetronomeError> {
        self.stream
            .play()
            .map_err(|e| MetronomeError::Stream(e.to_string()))?;
        self.state = ClockState::Running;
        Ok(())
    }

    fn schedule_tone(&mut self, tone: ToneSpec) {
        self.report_drops();
        if self.tone_tx.try_push(tone).is_err() {
            log::warn!("Tone queue full, dropping click at {:.3}s", tone.start);
        }
    }
}
