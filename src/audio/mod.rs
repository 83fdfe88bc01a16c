// Audio module - Audio clock abstraction and the CPAL click renderer

pub mod clock;
pub mod engine;
pub mod synth;
pub mod timing;
pub mod waveform;
