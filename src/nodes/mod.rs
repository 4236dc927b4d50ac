//! Node integrator models.
//!
//! Every node owns its continuous state and advances it exactly over one
//! resolution step at a time, draining buffered delayed inputs, detecting
//! threshold crossings and emitting spikes. The concrete models share one
//! state machine — input drain, integrate, edge-triggered threshold check,
//! log — and differ in their propagator sets and input-arrival effects.

use crate::error::SNNError;
use crate::event::{Event, EventKind, EventSink, Port};
use crate::history::SpikeHistory;
use crate::recordables::DataLogger;
use crate::status::StatusDict;
use crate::time::TimeGrid;

pub mod freq_sensor;
pub mod herm_sensor;
pub mod iaf_alpha;

pub use freq_sensor::FreqSensor;
pub use herm_sensor::HermSensor;
pub use iaf_alpha::IafAlpha;

/// The node-side contract of the stepping scheduler.
///
/// `calibrate` must be called after construction and after every resolution or
/// parameter change, before the next `update`. `update` advances the state
/// across the step range `[from, to)` of the current slice; its preconditions
/// (`from < to <= min_delay`) are caller obligations, not runtime conditions.
pub trait Node: Send {
    /// Recompute the precomputed propagators and resize the event buffers from
    /// the current parameters and the simulation grid.
    fn calibrate(&mut self, grid: &TimeGrid) -> Result<(), SNNError>;

    /// Advance the state across steps `[from, to)` of the slice starting at
    /// step index `origin`, reporting threshold crossings through `sink`.
    fn update(&mut self, origin: i64, from: usize, to: usize, sink: &mut dyn EventSink);

    /// Validate a connection of the given event kind to the given receptor
    /// port, returning the port to use for future deliveries.
    fn connect_sender(&mut self, kind: EventKind, receptor: Port) -> Result<Port, SNNError>;

    /// Ingest an incoming event; the only side effect is buffer or logger state.
    fn handle(&mut self, event: Event);

    /// The node's spike-time archive, read by incoming plastic connections.
    fn history(&self) -> &SpikeHistory;

    fn history_mut(&mut self) -> &mut SpikeHistory;

    /// The node's observable log.
    fn logger(&self) -> &DataLogger;

    /// Expose the named parameters (and state observables) of the node.
    fn get_status(&self) -> StatusDict;

    /// Ingest a (partial) parameter dictionary. Validation is all-or-nothing:
    /// on error the previous configuration is left untouched.
    fn set_status(&mut self, d: &StatusDict) -> Result<(), SNNError>;

    /// Sample a single recordable observable by name.
    fn get_recordable(&self, name: &str) -> Option<f64>;

    /// The names of the recordable observables.
    fn recordable_names(&self) -> Vec<&'static str>;
}
