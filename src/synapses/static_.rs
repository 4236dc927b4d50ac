//! Non-plastic connection: forwards every presynaptic spike with a fixed
//! weight, delay and receptor port. The degenerate member of the synapse
//! family, used to drive sensor receptors.

use serde::{Deserialize, Serialize};

use crate::error::SNNError;
use crate::event::{EventSink, NodeId, Port, SpikeEvent};
use crate::history::SpikeHistory;
use crate::status::{self, StatusDict};
use crate::time::TimeGrid;

use super::{ConnectionCore, Synapse};

/// Fixed-weight forwarding connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSynapse {
    core: ConnectionCore,
}

impl StaticSynapse {
    pub fn build(
        source: NodeId,
        target: NodeId,
        weight: f64,
        delay_steps: usize,
        port: Port,
    ) -> Result<Self, SNNError> {
        Ok(StaticSynapse {
            core: ConnectionCore::build(source, target, weight, delay_steps, port)?,
        })
    }
}

impl Synapse for StaticSynapse {
    fn core(&self) -> &ConnectionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ConnectionCore {
        &mut self.core
    }

    fn send(
        &mut self,
        _t_spike: f64,
        _grid: &TimeGrid,
        _target_history: &mut SpikeHistory,
        sink: &mut dyn EventSink,
    ) {
        sink.deliver(
            self.core.target(),
            SpikeEvent::new(
                self.core.port(),
                self.core.weight(),
                1,
                self.core.delay_steps(),
            ),
        );
    }

    fn get_status(&self) -> StatusDict {
        let mut d = StatusDict::new();
        status::insert_f64(&mut d, "weight", self.core.weight());
        status::insert_usize(&mut d, "delay", self.core.delay_steps());
        status::insert_usize(&mut d, "receptor", self.core.port());
        d
    }

    fn set_status(&mut self, d: &StatusDict) -> Result<(), SNNError> {
        let mut weight = self.core.weight();
        status::update_f64(d, "weight", &mut weight)?;
        self.core.set_weight(weight);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::event::CollectSink;

    use super::*;

    #[test]
    fn test_forwards_with_fixed_weight() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        let mut syn = StaticSynapse::build(0, 3, 0.75, 5, 2).unwrap();
        let mut history = SpikeHistory::new();
        let mut sink = CollectSink::default();
        syn.send(1.0, &grid, &mut history, &mut sink);
        syn.send(2.0, &grid, &mut history, &mut sink);
        assert_eq!(sink.delivered.len(), 2);
        let (target, event) = &sink.delivered[0];
        assert_eq!(*target, 3);
        assert_eq!(event.weight(), 0.75);
        assert_eq!(event.port(), 2);
        assert_eq!(event.rel_steps(), 5);
    }

    #[test]
    fn test_status_updates_weight_only() {
        let mut syn = StaticSynapse::build(0, 1, 0.5, 5, 1).unwrap();
        let mut d = StatusDict::new();
        status::insert_f64(&mut d, "weight", 1.5);
        syn.set_status(&d).unwrap();
        assert_eq!(syn.core().weight(), 1.5);
        assert_eq!(syn.get_status()["delay"], 5);
    }
}
