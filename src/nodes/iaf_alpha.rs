//! Leaky integrate-and-fire node with alpha-shaped synaptic currents.
//!
//! Each receptor owns a dual-exponential (alpha) current trace with its own
//! time constant; an incoming spike kicks the trace, which then feeds the
//! leaky membrane. All couplings are advanced with exact propagators, so the
//! discretization is exact for the linear dynamics regardless of the step
//! size. Threshold, refractory gating and lower-bound clamping follow the
//! shared node state machine.

use std::f64::consts::E;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::buffer::RingBuffer;
use crate::error::SNNError;
use crate::event::{Event, EventKind, EventSink, Port};
use crate::history::SpikeHistory;
use crate::propagators::{charge, clamp_min, decay, propagator_31, propagator_32};
use crate::recordables::{DataLogger, RecordablesMap};
use crate::status::{self, StatusDict};
use crate::time::TimeGrid;

use super::Node;

/// Model parameters; potential-like values are relative to `e_l`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub tau_m: f64,
    pub c_m: f64,
    pub t_ref: f64,
    pub e_l: f64,
    pub i_e: f64,
    pub v_reset: f64,
    pub theta: f64,
    pub lower_bound: f64,
    /// Per-receptor synaptic time constants in ms; the vector length is the
    /// receptor count.
    pub tau_syn: Vec<f64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            tau_m: 10.0,
            c_m: 250.0,
            t_ref: 2.0,
            e_l: -70.0,
            i_e: 0.0,
            v_reset: 0.0,
            theta: 15.0,
            lower_bound: f64::NEG_INFINITY,
            tau_syn: vec![2.0, 2.0],
        }
    }
}

impl Parameters {
    fn num_receptors(&self) -> usize {
        self.tau_syn.len()
    }

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
        if self.t_ref < 0.0 {
            return Err(SNNError::InvalidParameter(
                "refractory duration must be non-negative".to_string(),
            ));
        }
        if self.tau_syn.is_empty() {
            return Err(SNNError::InvalidParameter(
                "at least one synaptic time constant is required".to_string(),
            ));
        }
        if self.tau_syn.iter().any(|&tau| tau <= 0.0) {
            return Err(SNNError::InvalidParameter(
                "synaptic time constants must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    fn get(&self, d: &mut StatusDict) {
        status::insert_f64(d, "E_L", self.e_l);
        status::insert_f64(d, "I_e", self.i_e);
        status::insert_f64(d, "V_th", self.theta + self.e_l);
        status::insert_f64(d, "V_reset", self.v_reset + self.e_l);
        status::insert_f64(d, "V_min", self.lower_bound + self.e_l);
        status::insert_f64(d, "C_m", self.c_m);
        status::insert_f64(d, "tau_m", self.tau_m);
        status::insert_f64(d, "t_ref", self.t_ref);
        status::insert_f64_vec(d, "tau_syn", &self.tau_syn);
        status::insert_usize(d, "n_receptors", self.num_receptors());
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
        status::update_f64_vec(d, "tau_syn", &mut self.tau_syn)?;
        Ok(())
    }
}

/// Model state; one `(y1, y2)` alpha-trace pair per receptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct State {
    y0: f64,
    psc: Vec<(f64, f64)>,
    v: f64,
    r: usize,
}

/// Coefficients recomputed by [`IafAlpha::calibrate`]; one entry per receptor
/// for the trace couplings.
#[derive(Debug, Clone, Default, PartialEq)]
struct Propagators {
    p11: Vec<f64>,
    p21: Vec<f64>,
    p31: Vec<f64>,
    p32: Vec<f64>,
    psc_init: Vec<f64>,
    p30: f64,
    p33: f64,
    refractory_steps: usize,
}

/// Multi-receptor alpha-current integrate-and-fire node.
pub struct IafAlpha {
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

impl IafAlpha {
    pub fn new(recordables: Arc<RecordablesMap<Self>>) -> Self {
        IafAlpha {
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
        map.insert("V_m", |n: &Self| n.state.v);
        map.insert("I_in", |n: &Self| n.state.y0);
        map.insert("I_syn", |n: &Self| {
            n.state.psc.iter().map(|&(_, y2)| y2).sum::<f64>()
        });
        Arc::new(map)
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }
}

impl Node for IafAlpha {
    fn calibrate(&mut self, grid: &TimeGrid) -> Result<(), SNNError> {
        self.params.validate()?;
        self.grid = *grid;
        let h = grid.resolution();
        let n = self.params.num_receptors();

        self.receptor_ports = (1..=n).collect();
        self.spikes = vec![RingBuffer::new(grid.min_delay()); n];
        self.currents.resize(grid.min_delay());
        self.state.psc.resize(n, (0.0, 0.0));
        self.logger.init(self.recordables.names());

        self.prop.p33 = decay(h, self.params.tau_m);
        self.prop.p30 = charge(h, self.params.tau_m, self.params.c_m);
        self.prop.p11 = self.params.tau_syn.iter().map(|&tau| decay(h, tau)).collect();
        self.prop.p21 = self.prop.p11.iter().map(|&p11| h * p11).collect();
        self.prop.p31 = self
            .params
            .tau_syn
            .iter()
            .map(|&tau| propagator_31(tau, self.params.tau_m, self.params.c_m, h))
            .collect();
        self.prop.p32 = self
            .params
            .tau_syn
            .iter()
            .map(|&tau| propagator_32(tau, self.params.tau_m, self.params.c_m, h))
            .collect();
        self.prop.psc_init = self.params.tau_syn.iter().map(|&tau| E / tau).collect();

        let refractory_steps = grid.ms_to_steps(self.params.t_ref);
        debug_assert!(refractory_steps >= 0);
        if refractory_steps < 0 {
            return Err(SNNError::InvalidParameter(
                "refractory duration must be non-negative".to_string(),
            ));
        }
        self.prop.refractory_steps = refractory_steps as usize;

        debug!(
            "alpha node calibrated: {} receptors, refractory = {} steps",
            n, self.prop.refractory_steps
        );
        Ok(())
    }

    fn update(&mut self, origin: i64, from: usize, to: usize, sink: &mut dyn EventSink) {
        debug_assert!(from < to && to <= self.grid.min_delay());
        let n = self.params.num_receptors();

        for lag in from..to {
            let t = self.grid.step_to_ms(origin + lag as i64 + 1);

            // incoming spikes kick the first trace variable of their receptor
            for k in 0..n {
                let weighted = self.spikes[k].get_value(lag);
                if weighted != 0.0 {
                    self.state.psc[k].0 += self.prop.psc_init[k] * weighted;
                }
            }
            let vm0 = self.state.v;

            if self.state.r == 0 {
                let v_prev = self.state.v;
                let mut v = self.prop.p30 * (self.state.y0 + self.params.i_e)
                    + self.prop.p33 * v_prev;
                for k in 0..n {
                    let (y1, y2) = self.state.psc[k];
                    v += self.prop.p31[k] * y1 + self.prop.p32[k] * y2;
                }
                self.state.v = clamp_min(v, self.params.lower_bound);
            } else {
                self.state.r -= 1;
            }

            // traces keep evolving during refractoriness; read before write
            for k in 0..n {
                let (y1_prev, y2_prev) = self.state.psc[k];
                self.state.psc[k].1 = self.prop.p21[k] * y1_prev + self.prop.p11[k] * y2_prev;
                self.state.psc[k].0 = self.prop.p11[k] * y1_prev;
            }

            if vm0 < self.params.theta && self.state.v >= self.params.theta {
                self.state.r = self.prop.refractory_steps;
                self.state.v = self.params.v_reset;
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
                if receptor == 0 || receptor > self.params.num_receptors() {
                    return Err(SNNError::IncompatibleReceptor {
                        receptor,
                        num_receptors: self.params.num_receptors(),
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
        status::insert_f64(&mut d, "V_m", self.state.v);
        d
    }

    fn set_status(&mut self, d: &StatusDict) -> Result<(), SNNError> {
        let mut params = self.params.clone();
        params.set(d)?;
        params.validate()?;
        self.params = params;
        status::update_f64(d, "V_m", &mut self.state.v)?;
        Ok(())
    }

    fn get_recordable(&self, name: &str) -> Option<f64> {
        self.recordables.get(name).map(|get| get(self))
    }

    fn recordable_names(&self) -> Vec<&'static str> {
        self.recordables.names()
    }
}
