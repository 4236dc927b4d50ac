//! This crate provides discrete-time spiking neuron and plastic synapse
//! models: node integrators advancing their state exactly over a fixed step
//! grid, and synapses updating per-connection weights from spike-timing
//! history.
//!
//! # Stepping a sensor
//!
//! ```rust
//! use grid_snn::harness::Harness;
//! use grid_snn::nodes::{FreqSensor, Node};
//! use grid_snn::time::TimeGrid;
//!
//! // 0.1 ms resolution, 10-step slices
//! let grid = TimeGrid::build(0.1, 10).unwrap();
//! let mut net = Harness::new(grid);
//! let sensor = net
//!     .add_node(Box::new(FreqSensor::new(FreqSensor::recordables())))
//!     .unwrap();
//!
//! // open the integration window, then deliver an encoding spike
//! net.schedule_spike(sensor, 1, 1.0, 10).unwrap();
//! net.schedule_spike(sensor, 2, 1.0, 30).unwrap();
//! net.run_slices(10);
//!
//! // the membrane was reset by the encoding spike and is decaying back
//! let v_m = net.node(sensor).get_recordable("V_m").unwrap();
//! assert!(v_m > -10.0 && v_m < 0.0);
//! ```
//!
//! # Plastic connections
//!
//! ```rust
//! use grid_snn::synapses::StdpSynapse;
//!
//! let synapse = StdpSynapse::build(0, 1, 5.0, 10, 1).unwrap();
//! // a postsynaptic spike shortly before the presynaptic reference potentiates
//! assert!(synapse.learn(5.0, 1.0) > 5.0);
//! // the reverse pairing depresses
//! assert!(synapse.learn(5.0, -1.0) < 5.0);
//! ```

pub mod buffer;
pub mod error;
pub mod event;
pub mod generator;
pub mod harness;
pub mod history;
pub mod nodes;
pub mod propagators;
pub mod recordables;
pub mod status;
pub mod synapses;
pub mod time;

/// The minimum buffered spike value that counts as an input arrival; smaller
/// drained values are treated as numerical residue and ignored.
pub const BUFFER_SPIKE_MIN: f64 = 0.1;
