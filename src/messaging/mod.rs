// Messaging - Lock-free channels between the audio thread and the UI

pub mod channels;
pub mod notification;
