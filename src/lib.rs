// MyMusic Metronome - Library exports for tests and benchmarks

pub mod audio;
pub mod config;
pub mod error;
pub mod feedback;
pub mod host;
pub mod messaging;
pub mod presets;
pub mod sequencer;
pub mod theme;
pub mod timer;
pub mod ui;

// Re-export commonly used types for convenience
pub use audio::clock::{AudioBackend, AudioClock, ClockState, ToneSpec};
pub use audio::engine::CpalBackend;
pub use audio::timing::SampleClock;
pub use audio::waveform::WaveformType;
pub use config::MetronomeConfig;
pub use error::{HostError, MetronomeError};
pub use feedback::{FeedbackSettings, FeedbackSink, IndicatorState};
pub use host::{
    FileStorage, KeepAwake, MemoryStorage, Storage, SystemKeepAwake, UnsupportedKeepAwake,
    WakeHandle,
};
pub use messaging::channels::{create_notification_channel, create_tone_channel};
pub use presets::PresetSet;
pub use sequencer::{
    AccentLevel, BeatEvent, BeatRole, BeatScheduler, Collaborators, Metronome, Subdivision,
    TapReport, TapStability, Tempo, Timbre, TimeSignature,
};
pub use theme::Theme;
