// Communication channels lock-free

use crate::audio::clock::ToneSpec;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

/// Scheduler → audio callback: tones with absolute start times
pub type ToneProducer = ringbuf::HeapProd<ToneSpec>;
pub type ToneConsumer = ringbuf::HeapCons<ToneSpec>;

pub fn create_tone_channel(capacity: usize) -> (ToneProducer, ToneConsumer) {
    let rb = HeapRb::<ToneSpec>::new(capacity);
    rb.split()
}

/// Audio thread → UI: stream errors and status
pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}
