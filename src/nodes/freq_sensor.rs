//! Frequency-sensor node.
//!
//! The sensor reconstructs the signal carried by a sparse spike code: a
//! Gaussian-derived (Ricker) kernel is evaluated around an input-arrival
//! reference time, integrated per step with Simpson's rule into a slow trace,
//! and the trace in turn drives a leaky membrane through a gate seeded by
//! encoding spikes. A threshold crossing of the membrane reports the detected
//! frequency event.
//!
//! Receptor 1 opens the integration window (it resets the reconstruction
//! traces and records the arrival reference time); receptor 2 delivers the
//! encoding spikes (it seeds the gate and resets the membrane). Both can fire
//! in the same step independently.

use std::f64::consts::PI;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::buffer::RingBuffer;
use crate::error::SNNError;
use crate::event::{Event, EventKind, EventSink, Port};
use crate::history::SpikeHistory;
use crate::propagators::{clamp_min, simpson};
use crate::recordables::{DataLogger, RecordablesMap};
use crate::status::{self, StatusDict};
use crate::time::TimeGrid;
use crate::BUFFER_SPIKE_MIN;

use super::Node;

/// Model parameters. Potential-like values (`v_reset`, `theta`, `lower_bound`)
/// are stored relative to the resting potential `e_l`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Membrane time constant in ms.
    pub tau_m: f64,
    /// Membrane capacitance in pF.
    pub c_m: f64,
    /// Refractory period in ms.
    pub t_ref: f64,
    /// Resting potential in mV.
    pub e_l: f64,
    /// Constant external input current in pA.
    pub i_e: f64,
    /// Reset value of the membrane after an encoding spike, relative to `e_l`.
    pub v_reset: f64,
    /// Spike threshold, relative to `e_l`.
    pub theta: f64,
    /// Lower bound on the state variables, relative to `e_l`.
    pub lower_bound: f64,
    /// Width of the reconstruction kernel in ms.
    pub sigma: f64,
    /// Length of the integration window in ms.
    pub ti: f64,
    /// Number of spike receptors.
    pub num_receptors: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            tau_m: 30.0,
            c_m: 1.0,
            t_ref: 2.0,
            e_l: 0.0,
            i_e: 0.0,
            v_reset: -10.0,
            theta: -1.0,
            lower_bound: f64::NEG_INFINITY,
            sigma: 30.0,
            ti: 50.0,
            num_receptors: 2,
        }
    }
}

impl Parameters {
    fn validate(&self) -> Result<(), SNNError> {
        if self.c_m <= 0.0 {
            return Err(SNNError::InvalidParameter(
                "capacitance must be > 0".to_string(),
            ));
        }
        if self.tau_m <= 0.0 {
            return Err(SNNError::InvalidParameter(
                "membrane time constant must be > 0".to_string(),
            ));
        }
        if self.ti <= 0.0 {
            return Err(SNNError::InvalidParameter(
                "integration window must be > 0".to_string(),
            ));
        }
        if self.t_ref < 0.0 {
            return Err(SNNError::InvalidParameter(
                "refractory duration must be non-negative".to_string(),
            ));
        }
        if self.num_receptors < 2 {
            return Err(SNNError::InvalidParameter(
                "the sensor needs at least two receptors".to_string(),
            ));
        }
        Ok(())
    }

    fn get(&self, d: &mut StatusDict) {
        status::insert_f64(d, "E_L", self.e_l);
        status::insert_f64(d, "I_e", self.i_e);
        // potential-like values are reported absolute
        status::insert_f64(d, "V_th", self.theta + self.e_l);
        status::insert_f64(d, "V_reset", self.v_reset + self.e_l);
        status::insert_f64(d, "V_min", self.lower_bound + self.e_l);
        status::insert_f64(d, "C_m", self.c_m);
        status::insert_f64(d, "tau_m", self.tau_m);
        status::insert_f64(d, "t_ref", self.t_ref);
        status::insert_f64(d, "sigma", self.sigma);
        status::insert_f64(d, "t_i", self.ti);
        status::insert_usize(d, "n_receptors", self.num_receptors);
    }

    fn set(&mut self, d: &StatusDict) -> Result<(), SNNError> {
        status::update_f64(d, "E_L", &mut self.e_l)?;
        status::update_f64(d, "I_e", &mut self.i_e)?;
        status::update_f64(d, "V_th", &mut self.theta)?;
        status::update_f64(d, "V_reset", &mut self.v_reset)?;
        status::update_f64(d, "V_min", &mut self.lower_bound)?;
        status::update_f64(d, "C_m", &mut self.c_m)?;
        status::update_f64(d, "tau_m", &mut self.tau_m)?;
        status::update_f64(d, "t_ref", &mut self.t_ref)?;
        status::update_f64(d, "sigma", &mut self.sigma)?;
        status::update_f64(d, "t_i", &mut self.ti)?;
        status::update_usize(d, "n_receptors", &mut self.num_receptors)?;
        Ok(())
    }
}

/// Model state. Mutated only by [`FreqSensor::update`] and the status surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Input current drained from the current buffer.
    y0: f64,
    /// Gate trace seeded by encoding spikes.
    y1: f64,
    /// Integrated reconstructed signal.
    y2: f64,
    /// Membrane potential, relative to the resting potential.
    y3: f64,
    /// Reconstructed kernel signal at the last evaluation point.
    currents: f64,
    /// Reference time of the last integration-window arrival.
    ti: f64,
    /// Remaining refractory steps.
    r: usize,
}

impl Default for State {
    fn default() -> Self {
        State {
            y0: 0.0,
            y1: 0.0,
            y2: 0.0,
            y3: 0.0,
            currents: 0.0,
            ti: f64::NEG_INFINITY,
            r: 0,
        }
    }
}

/// Coefficients recomputed by [`FreqSensor::calibrate`]; read-only during stepping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Propagators {
    /// Kernel normalization constant.
    p21: f64,
    /// Negative inverse squared kernel width.
    p22: f64,
    /// Membrane drive gain over one step.
    p31: f64,
    /// Membrane decay factor over one step.
    p33: f64,
    /// Refractory period in steps.
    refractory_steps: usize,
}

/// Frequency-sensor node integrator.
pub struct FreqSensor {
    params: Parameters,
    state: State,
    prop: Propagators,
    grid: TimeGrid,
    receptor_ports: Vec<Port>,
    spikes: Vec<RingBuffer>,
    currents: RingBuffer,
    history: SpikeHistory,
    logger: DataLogger,
    recordables: Arc<RecordablesMap<Self>>,
}

impl FreqSensor {
    /// Create a new sensor with default parameters. The recordables table is
    /// built once per model set and shared across instances.
    pub fn new(recordables: Arc<RecordablesMap<Self>>) -> Self {
        FreqSensor {
            params: Parameters::default(),
            state: State::default(),
            prop: Propagators::default(),
            grid: TimeGrid::default(),
            receptor_ports: vec![],
            spikes: vec![],
            currents: RingBuffer::default(),
            history: SpikeHistory::new(),
            logger: DataLogger::new(),
            recordables,
        }
    }

    /// Build the observable table for this model.
    pub fn recordables() -> Arc<RecordablesMap<Self>> {
        let mut map = RecordablesMap::new();
        map.insert("V_m", |n: &Self| n.state.y3);
        map.insert("I_in", |n: &Self| n.state.y0);
        map.insert("gate", |n: &Self| n.state.y1);
        map.insert("V_int", |n: &Self| n.state.y2);
        map.insert("I_rec", |n: &Self| n.state.currents);
        Arc::new(map)
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Re-evaluate the reconstructed kernel signal at time `t` (ms).
    fn update_currents(&mut self, t: f64) {
        // before the first integration-window arrival there is no reference
        // time and the reconstructed signal is identically zero
        if !self.state.ti.is_finite() {
            self.state.currents = 0.0;
            return;
        }
        let mut tt = t - self.state.ti - 0.5 * self.params.ti;
        tt = self.prop.p22 * tt * tt;
        self.state.currents = self.state.y0 * self.prop.p21 * (1.0 + tt) * (0.5 * tt).exp();
    }
}

impl Node for FreqSensor {
    fn calibrate(&mut self, grid: &TimeGrid) -> Result<(), SNNError> {
        self.params.validate()?;
        self.grid = *grid;
        let h = grid.resolution();

        self.receptor_ports = (1..=self.params.num_receptors).collect();
        self.spikes = vec![RingBuffer::new(grid.min_delay()); self.params.num_receptors];
        self.currents.resize(grid.min_delay());
        self.logger.init(self.recordables.names());

        self.prop.p21 =
            2.0 / ((3.0 * self.params.sigma).sqrt() * PI.powf(0.25) * self.params.sigma);
        self.prop.p22 = -1.0 / (self.params.sigma * self.params.sigma);
        self.prop.p33 = (-h / self.params.tau_m).exp();
        self.prop.p31 = self.params.tau_m / self.params.c_m * (1.0 - self.prop.p33);

        // the grid can only represent refractory periods as whole steps;
        // fractional durations are truncated (see TimeGrid::ms_to_steps)
        let refractory_steps = grid.ms_to_steps(self.params.t_ref);
        debug_assert!(refractory_steps >= 0);
        if refractory_steps < 0 {
            return Err(SNNError::InvalidParameter(
                "refractory duration must be non-negative".to_string(),
            ));
        }
        self.prop.refractory_steps = refractory_steps as usize;

        debug!(
            "frequency sensor calibrated: h = {} ms, refractory = {} steps",
            h, self.prop.refractory_steps
        );
        Ok(())
    }

    fn update(&mut self, origin: i64, from: usize, to: usize, sink: &mut dyn EventSink) {
        debug_assert!(from < to && to <= self.grid.min_delay());
        let h = self.grid.resolution();

        for lag in from..to {
            let t = self.grid.step_to_ms(origin + lag as i64 + 1);

            if self.spikes[0].get_value(lag) > BUFFER_SPIKE_MIN {
                // integration-window arrival: restart the reconstruction
                self.state.y1 = 0.0;
                self.state.y2 = 0.0;
                self.state.currents = 0.0;
                self.state.ti = t;
            }
            if self.spikes[1].get_value(lag) > BUFFER_SPIKE_MIN {
                // encoding spike: seed the gate and reset the membrane
                self.state.y3 = self.params.v_reset;
                self.state.y1 = 1.0;
            }
            let vm0 = self.state.y3;

            if self.state.r == 0 {
                // snapshot the previous-step values before any write
                let (y1_prev, y2_prev, y3_prev) =
                    (self.state.y1, self.state.y2, self.state.y3);
                self.state.y3 = self.prop.p33 * y3_prev + self.prop.p31 * y1_prev * y2_prev.abs();
                self.state.y1 = self.prop.p33 * y1_prev;

                // Simpson's rule over [t, t + h] for the signal integration
                let f0 = self.state.currents;
                self.update_currents(t + 0.5 * h);
                let fm = self.state.currents;
                self.update_currents(t + h);
                let f1 = self.state.currents;
                self.state.y2 = y2_prev + simpson(h, f0, fm, f1);

                self.state.y3 = clamp_min(self.state.y3, self.params.lower_bound);
                self.state.y2 = clamp_min(self.state.y2, self.params.lower_bound);
                self.state.y1 = clamp_min(self.state.y1, self.params.lower_bound);
            } else {
                self.state.r -= 1;
            }

            if vm0 < self.params.theta && self.state.y3 >= self.params.theta {
                self.state.r = self.prop.refractory_steps;
                self.state.y3 = self.params.e_l;
                self.state.y2 = 0.0;
                self.state.y1 = 0.0;
                // the state is reset at the crossing step itself, so a
                // supra-threshold membrane is never observable afterwards
                self.history.append(t);
                sink.emit_spike(lag);
            }

            self.state.y0 = self.currents.get_value(lag);

            if self.logger.enabled() {
                let row = self.recordables.sample(self);
                self.logger.record(origin + lag as i64, row);
            }
        }
    }

    fn connect_sender(&mut self, kind: EventKind, receptor: Port) -> Result<Port, SNNError> {
        match kind {
            EventKind::Spike => {
                if receptor == 0 || receptor > self.params.num_receptors {
                    return Err(SNNError::IncompatibleReceptor {
                        receptor,
                        num_receptors: self.params.num_receptors,
                    });
                }
                Ok(receptor)
            }
            EventKind::Current => Err(SNNError::InvalidOperation(
                "only spike events connect to receptor ports".to_string(),
            )),
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Spike(e) => {
                for (i, port) in self.receptor_ports.iter().enumerate() {
                    if *port == e.port() {
                        self.spikes[i]
                            .add_value(e.rel_steps(), e.weight() * e.multiplicity() as f64);
                    }
                }
            }
            Event::Current(e) => {
                self.currents
                    .add_value(e.rel_steps(), e.weight() * e.current());
            }
            Event::Logging(request) => self.logger.set_enabled(request.enabled()),
        }
    }

    fn history(&self) -> &SpikeHistory {
        &self.history
    }

    fn history_mut(&mut self) -> &mut SpikeHistory {
        &mut self.history
    }

    fn logger(&self) -> &DataLogger {
        &self.logger
    }

    fn get_status(&self) -> StatusDict {
        let mut d = StatusDict::new();
        self.params.get(&mut d);
        status::insert_f64(&mut d, "V_m", self.state.y3);
        d
    }

    fn set_status(&mut self, d: &StatusDict) -> Result<(), SNNError> {
        // all-or-nothing: validate a candidate before committing
        let mut params = self.params.clone();
        params.set(d)?;
        params.validate()?;
        self.params = params;
        status::update_f64(d, "V_m", &mut self.state.y3)?;
        Ok(())
    }

    fn get_recordable(&self, name: &str) -> Option<f64> {
        self.recordables.get(name).map(|get| get(self))
    }

    fn recordable_names(&self) -> Vec<&'static str> {
        self.recordables.names()
    }
}
