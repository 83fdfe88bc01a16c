// Sequencer module
// Tempo and meter, look-ahead beat scheduling, click sounds and tap tempo

pub mod click;
pub mod metronome;
pub mod scheduler;
pub mod tap_tempo;
pub mod timeline;

pub use click::{Timbre, Voice};
pub use metronome::{Collaborators, Metronome, TapReport};
pub use scheduler::{AccentLevel, BeatEvent, BeatRole, BeatScheduler, SchedulerCursor};
pub use tap_tempo::{TapEstimate, TapStability, TapTempo, TapTempoConfig};
pub use timeline::{Subdivision, Tempo, TimeSignature};
