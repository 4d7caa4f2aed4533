// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The in-process mailbox bus.

use hashbrown::HashMap;
use uuid::Uuid;

use setpiece_graph::{Clock, Stamp};

use crate::message::{Envelope, Payload};

/// Per-recipient FIFO mailboxes.
///
/// [`Bus::post`] stamps and enqueues; [`Bus::drain`] atomically takes a
/// recipient's queue. The bus owns its own clock so message stamps — and
/// the relation stamps derived from them at acceptance — are monotone
/// across the whole negotiation.
#[derive(Debug, Default)]
pub struct Bus {
    clock: Clock,
    queues: HashMap<String, Vec<Envelope>>,
}

impl Bus {
    /// An empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a fresh timestamp from the bus clock.
    pub fn stamp(&mut self) -> Stamp {
        self.clock.stamp()
    }

    /// Aligns the bus clock with an external seconds value (never
    /// backwards).
    pub fn advance_clock_to(&mut self, seconds: f64) {
        self.clock.advance_to(seconds);
    }

    /// Builds an envelope around `payload` and appends it to the receiver's
    /// queue. Returns the assigned message id.
    pub fn post(
        &mut self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        payload: Payload,
    ) -> Uuid {
        let envelope = Envelope {
            mid: Uuid::new_v4(),
            ts: self.clock.stamp(),
            sender: sender.into(),
            receiver: receiver.into(),
            payload,
        };
        let mid = envelope.mid;
        self.send(envelope);
        mid
    }

    /// Appends a pre-built envelope to its receiver's queue.
    pub fn send(&mut self, envelope: Envelope) {
        self.queues
            .entry(envelope.receiver.clone())
            .or_default()
            .push(envelope);
    }

    /// Takes and clears the receiver's queue, oldest first.
    pub fn drain(&mut self, receiver: &str) -> Vec<Envelope> {
        self.queues.remove(receiver).unwrap_or_default()
    }

    /// Messages currently queued for `receiver`.
    #[must_use]
    pub fn pending(&self, receiver: &str) -> usize {
        self.queues.get(receiver).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(n: u32) -> Payload {
        Payload::StateUpdate {
            node_id: format!("n{n}"),
            fields: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn queues_are_fifo_per_receiver() {
        let mut bus = Bus::new();
        bus.post("a", "b", ping(1));
        bus.post("a", "b", ping(2));
        bus.post("a", "c", ping(3));

        assert_eq!(bus.pending("b"), 2);
        let drained = bus.drain("b");
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].payload, ping(1));
        assert_eq!(drained[1].payload, ping(2));
        assert!(drained[0].ts < drained[1].ts);

        // Drain is destructive and scoped to one receiver.
        assert_eq!(bus.pending("b"), 0);
        assert_eq!(bus.pending("c"), 1);
    }

    #[test]
    fn every_message_gets_a_distinct_id() {
        let mut bus = Bus::new();
        let first = bus.post("a", "b", ping(1));
        let second = bus.post("a", "b", ping(1));
        assert_ne!(first, second);
    }
}
