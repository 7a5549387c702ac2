use huddle_core::Envelope;
use std::collections::VecDeque;
use tracing::warn;

/// Bounded FIFO of envelopes waiting for the signaling channel. When full, the oldest
/// entry is evicted so that pushing never blocks.
#[derive(Debug)]
pub struct OutboundQueue {
    items: VecDeque<Envelope>,
    capacity: usize,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `envelope`, returning the evicted entry if the queue was full.
    pub fn push(&mut self, envelope: Envelope) -> Option<Envelope> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        if let Some(dropped) = &evicted {
            warn!(
                "Outbound queue full ({}), dropping oldest `{}` envelope",
                self.capacity,
                dropped.kind()
            );
        }
        self.items.push_back(envelope);
        evicted
    }

    /// Removes every queued envelope, oldest first.
    pub fn drain(&mut self) -> Vec<Envelope> {
        self.items.drain(..).collect()
    }

    pub fn retain(&mut self, keep: impl FnMut(&Envelope) -> bool) {
        self.items.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
