// Timers - Cancellable one-shot timers on a single cooperative timeline
//
// Wall time is supplied by the caller (`Duration` since an arbitrary origin),
// so the queue is deterministic under test. Timers due at the same instant
// fire in the order they were scheduled.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    due: Duration,
    id: TimerId,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.id).cmp(&(other.due, other.id))
    }
}

/// Queue of pending one-shot timers
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    cancelled: HashSet<TimerId>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_id: 0,
        }
    }

    /// Schedule `task` to fire `delay` after `now`
    pub fn schedule(&mut self, now: Duration, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry {
            due: now + delay,
            id,
            task,
        }));
        id
    }

    /// Cancel a pending timer; cancelling a fired or unknown timer is a no-op
    pub fn cancel(&mut self, id: TimerId) {
        if self.heap.iter().any(|Reverse(entry)| entry.id == id) {
            self.cancelled.insert(id);
        }
    }

    /// Pop the earliest timer due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        loop {
            let due = match self.heap.peek() {
                Some(Reverse(entry)) if entry.due <= now => entry.due,
                _ => return None,
            };
            let Reverse(entry) = self.heap.pop()?;
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            return Some((due, entry.task));
        }
    }

    /// Due time of the earliest live timer
    pub fn next_due(&self) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|Reverse(entry)| !self.cancelled.contains(&entry.id))
            .map(|Reverse(entry)| entry.due)
            .min()
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.heap.len() - self.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-armable fixed-period timer backed by a `TimerQueue`
#[derive(Debug, Clone)]
pub struct PollTimer {
    period: Duration,
    pending: Option<TimerId>,
}

impl PollTimer {
    /// Shortest period; a zero period would re-fire within the same poll forever
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Self::MIN_PERIOD),
            pending: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm for one period from `now`, replacing any pending arm
    pub fn arm<T>(&mut self, queue: &mut TimerQueue<T>, now: Duration, task: T) {
        self.cancel(queue);
        self.pending = Some(queue.schedule(now, self.period, task));
    }

    /// Mark the pending arm as consumed (called when it fires)
    pub fn fired(&mut self) {
        self.pending = None;
    }

    pub fn cancel<T>(&mut self, queue: &mut TimerQueue<T>) {
        if let Some(id) = self.pending.take() {
            queue.cancel(id);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}
