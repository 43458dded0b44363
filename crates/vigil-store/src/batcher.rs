//! Pure batching state for the remote adapter: no clocks, no I/O, so the
//! retry and overflow rules are testable in isolation.

use std::collections::VecDeque;

use vigil_core::types::ActivityEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub session_id: String,
    pub event: ActivityEvent,
}

/// FIFO buffer with a flush threshold and a hard cap.
///
/// A failed flush is pushed back to the front so original capture order is
/// preserved on retry. When the cap is exceeded the *oldest* entries are
/// dropped: under a sustained outage the most recent telemetry is the most
/// valuable.
#[derive(Debug)]
pub struct EventBatcher {
    buffer: VecDeque<PendingEvent>,
    batch_size: usize,
    max_buffered: usize,
    dropped: u64,
}

impl EventBatcher {
    pub fn new(batch_size: usize, max_buffered: usize) -> Self {
        Self {
            buffer: VecDeque::new(),
            batch_size: batch_size.max(1),
            max_buffered: max_buffered.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, pending: PendingEvent) {
        self.buffer.push_back(pending);
        self.enforce_cap();
    }

    /// Whether the size threshold has been reached.
    pub fn is_full_batch(&self) -> bool {
        self.buffer.len() >= self.batch_size
    }

    /// Drain the whole buffer for a flush attempt.
    pub fn take_all(&mut self) -> Vec<PendingEvent> {
        self.buffer.drain(..).collect()
    }

    /// Return a failed flush to the front of the buffer, before anything
    /// enqueued since the flush started.
    pub fn requeue_front(&mut self, batch: Vec<PendingEvent>) {
        for pending in batch.into_iter().rev() {
            self.buffer.push_front(pending);
        }
        self.enforce_cap();
    }

    fn enforce_cap(&mut self) {
        while self.buffer.len() > self.max_buffered {
            self.buffer.pop_front();
            self.dropped += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total events dropped to the cap since construction.
    pub fn dropped_total(&self) -> u64 {
        self.dropped
    }
}
