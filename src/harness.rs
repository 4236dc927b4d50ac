//! Minimal fixed-step scheduler driving node and synapse models.
//!
//! This is the reference driver used by the integration tests and demos, not
//! a production simulator: it owns the nodes and connections, delivers
//! pending events at their step offsets before each slice, steps all nodes
//! across the slice (data-parallel across nodes, never across the steps of
//! one node), and routes emitted spikes through the outgoing connections in
//! stamp order.

use itertools::Itertools;
use log::info;
use rayon::prelude::*;

use crate::error::SNNError;
use crate::event::{CollectSink, Event, LoggingRequest, NodeId, Port, SpikeEvent};
use crate::nodes::Node;
use crate::synapses::Synapse;
use crate::time::TimeGrid;

struct PendingEvent {
    due: i64,
    target: NodeId,
    event: Event,
}

/// Reference scheduler owning a set of nodes and the connections between them.
pub struct Harness {
    grid: TimeGrid,
    nodes: Vec<Box<dyn Node>>,
    synapses: Vec<Box<dyn Synapse>>,
    outgoing: Vec<Vec<usize>>,
    pending: Vec<PendingEvent>,
    origin: i64,
}

impl Harness {
    pub fn new(grid: TimeGrid) -> Self {
        Harness {
            grid,
            nodes: vec![],
            synapses: vec![],
            outgoing: vec![],
            pending: vec![],
            origin: 0,
        }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Returns the step index at which the next slice starts.
    pub fn origin(&self) -> i64 {
        self.origin
    }

    /// Returns the simulated time in ms at the start of the next slice.
    pub fn now_ms(&self) -> f64 {
        self.grid.step_to_ms(self.origin)
    }

    /// Add a node to the simulation, calibrating it against the grid.
    pub fn add_node(&mut self, mut node: Box<dyn Node>) -> Result<NodeId, SNNError> {
        node.calibrate(&self.grid)?;
        self.nodes.push(node);
        self.outgoing.push(vec![]);
        Ok(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &dyn Node {
        self.nodes[id].as_ref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut dyn Node {
        self.nodes[id].as_mut()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Add a connection, validating it against its target node. For plastic
    /// connections this also registers history interest before any spike is
    /// routed.
    pub fn connect(&mut self, mut synapse: Box<dyn Synapse>) -> Result<usize, SNNError> {
        let source = synapse.core().source();
        let target = synapse.core().target();
        if source >= self.nodes.len() || target >= self.nodes.len() {
            return Err(SNNError::OutOfBounds(format!(
                "connection {} -> {} references an unknown node",
                source, target
            )));
        }
        if synapse.core().delay_steps() < self.grid.min_delay() {
            return Err(SNNError::InvalidParameter(
                "connection delay must be at least the minimum delay".to_string(),
            ));
        }
        let t_lastspike = self.grid.step_to_ms(self.origin);
        synapse.check_connection(self.nodes[target].as_mut(), &self.grid, t_lastspike)?;
        self.outgoing[source].push(self.synapses.len());
        self.synapses.push(synapse);
        Ok(self.synapses.len() - 1)
    }

    pub fn synapse(&self, index: usize) -> &dyn Synapse {
        self.synapses[index].as_ref()
    }

    /// Queue an external spike for delivery to `target` at the given step.
    pub fn schedule_spike(
        &mut self,
        target: NodeId,
        port: Port,
        weight: f64,
        due_step: i64,
    ) -> Result<(), SNNError> {
        if target >= self.nodes.len() {
            return Err(SNNError::OutOfBounds(format!("unknown node {}", target)));
        }
        debug_assert!(due_step >= self.origin);
        self.pending.push(PendingEvent {
            due: due_step,
            target,
            event: Event::Spike(SpikeEvent::new(port, weight, 1, 0)),
        });
        Ok(())
    }

    /// Queue an external current sample for delivery to `target` at the given step.
    pub fn schedule_current(
        &mut self,
        target: NodeId,
        current: f64,
        due_step: i64,
    ) -> Result<(), SNNError> {
        if target >= self.nodes.len() {
            return Err(SNNError::OutOfBounds(format!("unknown node {}", target)));
        }
        debug_assert!(due_step >= self.origin);
        self.pending.push(PendingEvent {
            due: due_step,
            target,
            event: Event::Current(crate::event::CurrentEvent::new(current, 1.0, 0)),
        });
        Ok(())
    }

    /// Start recording the observables of the given node.
    pub fn enable_logging(&mut self, node: NodeId) {
        self.nodes[node].handle(Event::Logging(LoggingRequest::new(true)));
    }

    /// Advance the simulation by `n` slices of `min_delay` steps each.
    pub fn run_slices(&mut self, n: usize) {
        for _ in 0..n {
            self.advance_slice();
        }
        info!(
            "simulated up to {} ms ({} pending events)",
            self.now_ms(),
            self.pending.len()
        );
    }

    fn advance_slice(&mut self) {
        let origin = self.origin;
        let horizon = self.grid.min_delay() as i64;

        // deliver everything due within this slice; buffer writes must
        // strictly precede the drains of the same step indices below
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due < origin + horizon {
                let pending = self.pending.swap_remove(i);
                debug_assert!(pending.due >= origin);
                let rel = (pending.due - origin) as usize;
                self.nodes[pending.target].handle(pending.event.at_offset(rel));
            } else {
                i += 1;
            }
        }

        // data-parallel across nodes; each node's phases stay sequential
        let emitted: Vec<Vec<usize>> = self
            .nodes
            .par_iter_mut()
            .map(|node| {
                let mut sink = CollectSink::default();
                node.update(origin, 0, horizon as usize, &mut sink);
                sink.spikes
            })
            .collect();

        // route the emitted spikes through the outgoing connections, in stamp
        // order so plasticity walks see presynaptic spikes chronologically
        let fired = emitted
            .iter()
            .enumerate()
            .flat_map(|(id, lags)| lags.iter().map(move |&lag| (lag, id)))
            .sorted_unstable();

        for (lag, source) in fired {
            let stamp = origin + lag as i64 + 1;
            let t_spike = self.grid.step_to_ms(stamp);
            for &si in &self.outgoing[source] {
                let synapse = &mut self.synapses[si];
                let target = synapse.core().target();
                let mut sink = CollectSink::default();
                synapse.send(
                    t_spike,
                    &self.grid,
                    self.nodes[target].history_mut(),
                    &mut sink,
                );
                for (tgt, event) in sink.delivered {
                    // the event influences the target from `stamp + delay - 1`,
                    // always beyond the current slice since delay >= min_delay
                    let due = stamp + event.rel_steps() as i64 - 1;
                    self.pending.push(PendingEvent {
                        due,
                        target: tgt,
                        event: Event::Spike(event),
                    });
                }
            }
        }

        self.origin += horizon;
    }
}

#[cfg(test)]
mod tests {
    use crate::nodes::IafAlpha;
    use crate::synapses::{StaticSynapse, StdpSynapse};

    use super::*;

    fn alpha_pair(grid: TimeGrid) -> (Harness, NodeId, NodeId) {
        let mut net = Harness::new(grid);
        let recordables = IafAlpha::recordables();
        let source = net
            .add_node(Box::new(IafAlpha::new(recordables.clone())))
            .unwrap();
        let target = net.add_node(Box::new(IafAlpha::new(recordables))).unwrap();
        (net, source, target)
    }

    #[test]
    fn test_static_synapse_propagates_activity() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        let (mut net, source, target) = alpha_pair(grid);
        net.connect(Box::new(
            StaticSynapse::build(source, target, 500.0, 10, 1).unwrap(),
        ))
        .unwrap();

        // kick the source hard enough to fire
        net.schedule_spike(source, 1, 1.0e5, 5).unwrap();
        net.run_slices(20);

        assert!(net.node(source).history().last_spike() > 0.0);
        assert!(net.node(target).get_recordable("I_syn").unwrap() != 0.0);
    }

    #[test]
    fn test_connect_rejects_bad_receptor() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        let (mut net, source, target) = alpha_pair(grid);
        let result = net.connect(Box::new(
            StaticSynapse::build(source, target, 1.0, 10, 7).unwrap(),
        ));
        assert_eq!(
            result,
            Err(SNNError::IncompatibleReceptor {
                receptor: 7,
                num_receptors: 2
            })
        );
    }

    #[test]
    fn test_connect_rejects_unknown_node() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        let (mut net, source, _) = alpha_pair(grid);
        let result = net.connect(Box::new(
            StaticSynapse::build(source, 99, 1.0, 10, 1).unwrap(),
        ));
        assert!(matches!(result, Err(SNNError::OutOfBounds(_))));
    }

    #[test]
    fn test_stdp_weight_moves_and_stays_bounded() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        let (mut net, source, target) = alpha_pair(grid);
        let synapse = net
            .connect(Box::new(
                StdpSynapse::build(source, target, 5.0, 10, 1).unwrap(),
            ))
            .unwrap();

        // drive both nodes so pre- and postsynaptic spikes interleave
        for k in 0..40 {
            net.schedule_spike(source, 1, 1.0e5, 5 + 50 * k).unwrap();
            net.schedule_spike(target, 2, 1.0e5, 20 + 50 * k).unwrap();
        }
        net.run_slices(250);

        let weight = net.synapse(synapse).core().weight();
        assert!(weight != 5.0);
        assert!((0.0..=100.0).contains(&weight));
    }

    #[test]
    fn test_time_advances_by_slices() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        let (mut net, _, _) = alpha_pair(grid);
        assert_eq!(net.origin(), 0);
        net.run_slices(3);
        assert_eq!(net.origin(), 30);
        assert_eq!(net.now_ms(), 3.0);
    }
}
