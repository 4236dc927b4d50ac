//! Spike-timing dependent plasticity with alpha-kernel-weighted updates.
//!
//! Same history walk, sequential weight threading and `[0, w_max]` clamp as
//! the exponential/linear rule, but the magnitude of each update is weighted
//! by an alpha function of the spike-time offset instead of a raw power of it:
//! pairings near the kernel peak move the weight most, simultaneous or very
//! distant pairings barely at all.

use serde::{Deserialize, Serialize};

use crate::error::SNNError;
use crate::event::{EventKind, EventSink, NodeId, Port, SpikeEvent};
use crate::history::SpikeHistory;
use crate::nodes::Node;
use crate::propagators::alpha_kernel;
use crate::status::{self, StatusDict};
use crate::time::TimeGrid;

use super::stdp_multi::StdpParameters;
use super::{ConnectionCore, Synapse};

/// Plastic connection with the alpha-kernel rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdpAlphaSynapse {
    core: ConnectionCore,
    params: StdpParameters,
    t_last_pre: f64,
}

impl StdpAlphaSynapse {
    /// Create a plastic connection with default plasticity constants.
    pub fn build(
        source: NodeId,
        target: NodeId,
        weight: f64,
        delay_steps: usize,
        port: Port,
    ) -> Result<Self, SNNError> {
        Ok(StdpAlphaSynapse {
            core: ConnectionCore::build(source, target, weight, delay_steps, port)?,
            params: StdpParameters::default(),
            t_last_pre: 0.0,
        })
    }

    pub fn params(&self) -> &StdpParameters {
        &self.params
    }

    /// One alpha-weighted update; `dt > 0` potentiates, `dt <= 0` depresses.
    pub fn learn(&self, weight: f64, dt: f64) -> f64 {
        let (delta, kernel) = if dt > 0.0 {
            (
                (-weight).exp() * self.params.a_plus,
                alpha_kernel(dt, self.params.tau_plus),
            )
        } else {
            (
                -weight * self.params.a_minus,
                alpha_kernel(-dt, self.params.tau_minus),
            )
        };
        (weight + delta * kernel).clamp(0.0, self.params.w_max)
    }
}

impl Synapse for StdpAlphaSynapse {
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

        for post_t in target_history.read_range(t_last - dendritic_delay, t_spike - dendritic_delay)
        {
            let dt = t_last - (post_t + dendritic_delay);
            let weight = self.learn(self.core.weight(), dt);
            self.core.set_weight(weight);
        }
        self.t_last_pre = t_spike;

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

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::event::CollectSink;

    use super::*;

    fn synapse(weight: f64) -> StdpAlphaSynapse {
        StdpAlphaSynapse::build(0, 1, weight, 10, 1).unwrap()
    }

    #[test]
    fn test_update_peaks_at_kernel_time_constant() {
        let syn = synapse(1.0);
        let at_peak = syn.learn(1.0, 20.0) - 1.0;
        let early = syn.learn(1.0, 2.0) - 1.0;
        let late = syn.learn(1.0, 200.0) - 1.0;
        assert!(at_peak > early);
        assert!(at_peak > late);
        assert_relative_eq!(
            at_peak,
            (-1.0_f64).exp() * 0.1, // full-amplitude potentiation at the peak
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_simultaneous_pairing_is_neutral() {
        let syn = synapse(3.0);
        assert_eq!(syn.learn(3.0, 0.0), 3.0);
    }

    #[test]
    fn test_depression_direction() {
        let syn = synapse(3.0);
        assert!(syn.learn(3.0, -20.0) < 3.0);
    }

    #[test]
    fn test_weight_stays_bounded_for_any_dt_sequence() {
        let syn = synapse(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut weight = 1.0;
        for _ in 0..10_000 {
            let dt: f64 = rng.gen_range(-100.0..100.0);
            weight = syn.learn(weight, dt);
            assert!((0.0..=syn.params().w_max).contains(&weight));
        }
    }

    #[test]
    fn test_send_threads_weight_and_forwards() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        let mut syn = synapse(2.0);
        let mut history = SpikeHistory::new();
        history.register(f64::NEG_INFINITY);
        history.append(2.0);
        history.append(4.0);

        let d = syn.core().dendritic_delay(&grid);
        let mut expected = 2.0;
        for post_t in [2.0, 4.0] {
            expected = syn.learn(expected, 0.0 - (post_t + d));
        }

        let mut sink = CollectSink::default();
        syn.send(10.0, &grid, &mut history, &mut sink);
        assert_relative_eq!(syn.core().weight(), expected, epsilon = 1e-12);
        assert_eq!(sink.delivered.len(), 1);
    }
}
