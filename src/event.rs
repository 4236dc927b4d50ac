//! Module implementing the event types exchanged between nodes and connections.
//!
//! Events form a closed tagged union: a node ingests them through a single
//! [`handle`](crate::nodes::Node::handle) entry point and dispatches on the
//! discriminant, so the event set is checked exhaustively at compile time.

use serde::{Deserialize, Serialize};

/// Identifies a node within the simulation.
pub type NodeId = usize;

/// A receptor port on a node. Port 0 is reserved; spike receptors are numbered
/// from 1 up to the node's configured receptor count.
pub type Port = usize;

/// The kind of event a connection intends to deliver, used at connection-check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Spike,
    Current,
}

/// A weighted spike delivered to a receptor port of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    port: Port,
    weight: f64,
    multiplicity: u32,
    /// Delivery offset in steps: relative to the slice origin on the receiver
    /// side, or the connection delay on the sender side.
    rel_steps: usize,
}

impl SpikeEvent {
    pub fn new(port: Port, weight: f64, multiplicity: u32, rel_steps: usize) -> Self {
        SpikeEvent {
            port,
            weight,
            multiplicity,
            rel_steps,
        }
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn multiplicity(&self) -> u32 {
        self.multiplicity
    }

    pub fn rel_steps(&self) -> usize {
        self.rel_steps
    }

    /// Returns the same event re-addressed to the given delivery offset.
    pub fn at_offset(mut self, rel_steps: usize) -> Self {
        self.rel_steps = rel_steps;
        self
    }
}

/// A weighted current sample delivered to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentEvent {
    current: f64,
    weight: f64,
    rel_steps: usize,
}

impl CurrentEvent {
    pub fn new(current: f64, weight: f64, rel_steps: usize) -> Self {
        CurrentEvent {
            current,
            weight,
            rel_steps,
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn rel_steps(&self) -> usize {
        self.rel_steps
    }

    /// Returns the same event re-addressed to the given delivery offset.
    pub fn at_offset(mut self, rel_steps: usize) -> Self {
        self.rel_steps = rel_steps;
        self
    }
}

/// A request to start or stop recording the node's observables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggingRequest {
    enabled: bool,
}

impl LoggingRequest {
    pub fn new(enabled: bool) -> Self {
        LoggingRequest { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

/// The closed set of events a node can ingest.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Spike(SpikeEvent),
    Current(CurrentEvent),
    Logging(LoggingRequest),
}

impl Event {
    /// Returns the same event re-addressed to the given delivery offset.
    pub fn at_offset(self, rel_steps: usize) -> Self {
        match self {
            Event::Spike(e) => Event::Spike(e.at_offset(rel_steps)),
            Event::Current(e) => Event::Current(e.at_offset(rel_steps)),
            Event::Logging(e) => Event::Logging(e),
        }
    }
}

/// Sink for outgoing events, supplied by the scheduler driving the models.
///
/// A node reports its own threshold crossings through [`emit_spike`]; a synapse
/// forwards (possibly rescaled) spike events to its target through [`deliver`].
///
/// [`emit_spike`]: EventSink::emit_spike
/// [`deliver`]: EventSink::deliver
pub trait EventSink {
    /// The updating node fired during step `lag` of the current slice.
    fn emit_spike(&mut self, lag: usize);

    /// Forward a spike event to the given target node, to be delivered after
    /// the event's `rel_steps` delay.
    fn deliver(&mut self, target: NodeId, event: SpikeEvent);
}

/// An [`EventSink`] that collects everything it receives; used by the harness
/// and by tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectSink {
    pub spikes: Vec<usize>,
    pub delivered: Vec<(NodeId, SpikeEvent)>,
}

impl EventSink for CollectSink {
    fn emit_spike(&mut self, lag: usize) {
        self.spikes.push(lag);
    }

    fn deliver(&mut self, target: NodeId, event: SpikeEvent) {
        self.delivered.push((target, event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_offset() {
        let e = SpikeEvent::new(1, 0.5, 2, 0);
        let e = e.at_offset(3);
        assert_eq!(e.rel_steps(), 3);
        assert_eq!(e.port(), 1);

        let e = Event::Current(CurrentEvent::new(10.0, 1.0, 0)).at_offset(2);
        match e {
            Event::Current(c) => assert_eq!(c.rel_steps(), 2),
            _ => panic!("expected a current event"),
        }
    }

    #[test]
    fn test_collect_sink() {
        let mut sink = CollectSink::default();
        sink.emit_spike(4);
        sink.deliver(7, SpikeEvent::new(1, 1.0, 1, 5));
        assert_eq!(sink.spikes, vec![4]);
        assert_eq!(sink.delivered.len(), 1);
        assert_eq!(sink.delivered[0].0, 7);
    }
}
