//! Synapse models.
//!
//! Every synapse owns the bookkeeping of one directed connection — target,
//! weight, delay and receptor port — through [`ConnectionCore`], composed into
//! the concrete types rather than inherited. Plastic variants additionally
//! keep spike-timing state and update their weight on every presynaptic spike
//! by walking the target's spike history.

use serde::{Deserialize, Serialize};

use crate::error::SNNError;
use crate::event::{EventKind, EventSink, NodeId, Port};
use crate::history::SpikeHistory;
use crate::nodes::Node;
use crate::status::StatusDict;
use crate::time::TimeGrid;

pub mod static_;
pub mod stdp_alpha;
pub mod stdp_multi;

pub use static_::StaticSynapse;
pub use stdp_alpha::StdpAlphaSynapse;
pub use stdp_multi::StdpSynapse;

/// Weight, delay and routing data shared by all synapse types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionCore {
    source: NodeId,
    target: NodeId,
    weight: f64,
    delay_steps: usize,
    port: Port,
}

impl ConnectionCore {
    /// Create the bookkeeping record of a directed connection.
    /// The function returns an error if the delay is not at least one step:
    /// events must never be deliverable within the slice that produced them.
    pub fn build(
        source: NodeId,
        target: NodeId,
        weight: f64,
        delay_steps: usize,
        port: Port,
    ) -> Result<Self, SNNError> {
        if delay_steps == 0 {
            return Err(SNNError::InvalidParameter(
                "connection delay must be at least one step".to_string(),
            ));
        }
        Ok(ConnectionCore {
            source,
            target,
            weight,
            delay_steps,
            port,
        })
    }

    /// Returns the ID of the source node.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Returns the ID of the target node.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Returns the weight of the connection.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Set the weight of the connection.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Returns the delay of the connection in steps.
    pub fn delay_steps(&self) -> usize {
        self.delay_steps
    }

    /// Returns the receptor port targeted on the receiving node.
    pub fn port(&self) -> Port {
        self.port
    }

    /// Returns the dendritic delay of the connection in ms.
    pub fn dendritic_delay(&self, grid: &TimeGrid) -> f64 {
        self.delay_steps as f64 * grid.resolution()
    }
}

/// The connection-side contract of the spike router.
pub trait Synapse: Send {
    fn core(&self) -> &ConnectionCore;

    fn core_mut(&mut self) -> &mut ConnectionCore;

    /// Validate the connection against its target at creation time: check the
    /// receptor port and, for plastic types, register interest in the target's
    /// spike history before the first read.
    fn check_connection(
        &mut self,
        target: &mut dyn Node,
        grid: &TimeGrid,
        t_lastspike: f64,
    ) -> Result<(), SNNError> {
        target.connect_sender(EventKind::Spike, self.core().port())?;
        let _ = (grid, t_lastspike);
        Ok(())
    }

    /// Route a presynaptic spike stamped at `t_spike` (ms): run the learning
    /// pass over the target's history, then forward the event if the synapse
    /// emits.
    fn send(
        &mut self,
        t_spike: f64,
        grid: &TimeGrid,
        target_history: &mut SpikeHistory,
        sink: &mut dyn EventSink,
    );

    /// Expose the named parameters of the connection.
    fn get_status(&self) -> StatusDict;

    /// Ingest a (partial) parameter dictionary, all-or-nothing.
    fn set_status(&mut self, d: &StatusDict) -> Result<(), SNNError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_core_build() {
        let core = ConnectionCore::build(0, 1, 0.5, 10, 2).unwrap();
        assert_eq!(core.source(), 0);
        assert_eq!(core.target(), 1);
        assert_eq!(core.weight(), 0.5);
        assert_eq!(core.delay_steps(), 10);
        assert_eq!(core.port(), 2);
    }

    #[test]
    fn test_connection_core_rejects_zero_delay() {
        assert_eq!(
            ConnectionCore::build(0, 1, 0.5, 0, 1),
            Err(SNNError::InvalidParameter(
                "connection delay must be at least one step".to_string()
            ))
        );
    }

    #[test]
    fn test_dendritic_delay() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        let core = ConnectionCore::build(0, 1, 1.0, 15, 1).unwrap();
        assert_eq!(core.dendritic_delay(&grid), 1.5);
    }
}
