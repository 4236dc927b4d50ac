//! Spike-timing dependent plasticity with an exponential multiplicative rule
//! for potentiation and a linear multiplicative rule for depression.
//!
//! On every presynaptic spike the synapse walks the postsynaptic spike history
//! accumulated since its previous presynaptic spike, shifted by the dendritic
//! delay, and applies one weight update per visited entry. The weight is
//! threaded through the walk: each update starts from the result of the
//! previous one. The updated weight is clamped to `[0, w_max]`.
//!
//! A synapse with `emit` unset is a silent plastic link: it learns on every
//! presynaptic spike but never forwards an event.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::SNNError;
use crate::event::{EventKind, EventSink, NodeId, Port, SpikeEvent};
use crate::history::SpikeHistory;
use crate::nodes::Node;
use crate::status::{self, StatusDict};
use crate::time::TimeGrid;

use super::{ConnectionCore, Synapse};

/// Plasticity constants of the exponential/linear rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdpParameters {
    /// Amplitude of potentiation.
    pub a_plus: f64,
    /// Amplitude of depression.
    pub a_minus: f64,
    /// Time constant of potentiation in ms.
    pub tau_plus: f64,
    /// Time constant of depression in ms.
    pub tau_minus: f64,
    /// Upper weight bound.
    pub w_max: f64,
    /// Output scaling applied to the weight when forwarding spikes.
    pub scale: f64,
    /// Whether the synapse forwards spikes at all.
    pub emit: bool,
}

impl Default for StdpParameters {
    fn default() -> Self {
        StdpParameters {
            a_plus: 0.1,
            a_minus: 0.055,
            tau_plus: 20.0,
            tau_minus: 20.0,
            w_max: 100.0,
            scale: 1.0,
            emit: true,
        }
    }
}

impl StdpParameters {
    pub(super) fn validate(&self) -> Result<(), SNNError> {
        if self.tau_plus <= 0.0 {
            return Err(SNNError::InvalidParameter(
                "potentiation time constant must be > 0".to_string(),
            ));
        }
        if self.tau_minus <= 0.0 {
            return Err(SNNError::InvalidParameter(
                "depression time constant must be > 0".to_string(),
            ));
        }
        if self.w_max < 0.0 {
            return Err(SNNError::InvalidParameter(
                "maximum weight must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    pub(super) fn get(&self, d: &mut StatusDict) {
        status::insert_f64(d, "a_plus", self.a_plus);
        status::insert_f64(d, "a_minus", self.a_minus);
        status::insert_f64(d, "tau_plus", self.tau_plus);
        status::insert_f64(d, "tau_minus", self.tau_minus);
        status::insert_f64(d, "w_max", self.w_max);
        status::insert_f64(d, "scale", self.scale);
        status::insert_bool(d, "emit", self.emit);
    }

    pub(super) fn set(&mut self, d: &StatusDict) -> Result<(), SNNError> {
        status::update_f64(d, "a_plus", &mut self.a_plus)?;
        status::update_f64(d, "a_minus", &mut self.a_minus)?;
        status::update_f64(d, "tau_plus", &mut self.tau_plus)?;
        status::update_f64(d, "tau_minus", &mut self.tau_minus)?;
        status::update_f64(d, "w_max", &mut self.w_max)?;
        status::update_f64(d, "scale", &mut self.scale)?;
        status::update_bool(d, "emit", &mut self.emit)?;
        Ok(())
    }
}

/// Plastic connection with the exponential/linear multiplicative rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdpSynapse {
    core: ConnectionCore,
    params: StdpParameters,
    t_last_pre: f64,
}

impl StdpSynapse {
    /// Create a plastic connection with default plasticity constants.
    pub fn build(
        source: NodeId,
        target: NodeId,
        weight: f64,
        delay_steps: usize,
        port: Port,
    ) -> Result<Self, SNNError> {
        Ok(StdpSynapse {
            core: ConnectionCore::build(source, target, weight, delay_steps, port)?,
            params: StdpParameters::default(),
            t_last_pre: 0.0,
        })
    }

    pub fn params(&self) -> &StdpParameters {
        &self.params
    }

    /// One weight update for a postsynaptic spike at offset `dt` from the
    /// previous presynaptic reference: `dt > 0` potentiates with an
    /// exponential multiplicative term, `dt <= 0` depresses with a linear
    /// multiplicative term; the result is clamped to `[0, w_max]`.
    pub fn learn(&self, weight: f64, dt: f64) -> f64 {
        let (delta, decay) = if dt > 0.0 {
            (
                (-weight).exp() * self.params.a_plus,
                (1.0 - 1.0 / self.params.tau_plus).powf(dt),
            )
        } else {
            (
                -weight * self.params.a_minus,
                (1.0 - 1.0 / self.params.tau_minus).powf(-dt),
            )
        };
        (weight + delta * decay).clamp(0.0, self.params.w_max)
    }
}

impl Synapse for StdpSynapse {
    fn core(&self) -> &ConnectionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ConnectionCore {
        &mut self.core
    }

    fn check_connection(
        &mut self,
        target: &mut dyn Node,
        grid: &TimeGrid,
        t_lastspike: f64,
    ) -> Result<(), SNNError> {
        target.connect_sender(EventKind::Spike, self.core.port())?;
        // registration must precede the first history read, so the entries
        // this connection will walk cannot be pruned in the meantime
        target
            .history_mut()
            .register(t_lastspike - self.core.dendritic_delay(grid));
        self.t_last_pre = t_lastspike;
        Ok(())
    }

    fn send(
        &mut self,
        t_spike: f64,
        grid: &TimeGrid,
        target_history: &mut SpikeHistory,
        sink: &mut dyn EventSink,
    ) {
        let dendritic_delay = self.core.dendritic_delay(grid);
        let t_last = self.t_last_pre;

        // postsynaptic spikes since the previous presynaptic spike, both
        // endpoints shifted back by the dendritic delay
        for post_t in target_history.read_range(t_last - dendritic_delay, t_spike - dendritic_delay)
        {
            let dt = t_last - (post_t + dendritic_delay);
            let weight = self.learn(self.core.weight(), dt);
            self.core.set_weight(weight);
        }
        self.t_last_pre = t_spike;
        trace!(
            "stdp synapse {} -> {}: weight {} after spike at {} ms",
            self.core.source(),
            self.core.target(),
            self.core.weight(),
            t_spike
        );

        if self.params.emit {
            sink.deliver(
                self.core.target(),
                SpikeEvent::new(
                    self.core.port(),
                    self.core.weight() * self.params.scale,
                    1,
                    self.core.delay_steps(),
                ),
            );
        }
    }

    fn get_status(&self) -> StatusDict {
        let mut d = StatusDict::new();
        status::insert_f64(&mut d, "weight", self.core.weight());
        status::insert_usize(&mut d, "delay", self.core.delay_steps());
        status::insert_usize(&mut d, "receptor", self.core.port());
        self.params.get(&mut d);
        d
    }

    fn set_status(&mut self, d: &StatusDict) -> Result<(), SNNError> {
        let mut params = self.params.clone();
        params.set(d)?;
        params.validate()?;
        self.params = params;
        let mut weight = self.core.weight();
        status::update_f64(d, "weight", &mut weight)?;
        self.core.set_weight(weight);
        Ok(())
    }
}
