//! Module implementing the recordables table and the per-node data logger.
//!
//! The recordables table maps observable names to accessor functions. It is
//! built once when the model set is assembled and shared by reference into
//! every node instance, so there is no hidden per-type global state.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::SNNError;

/// Named accessors for the observable quantities of a node type `N`.
pub struct RecordablesMap<N> {
    entries: Vec<(&'static str, fn(&N) -> f64)>,
}

impl<N> Clone for RecordablesMap<N> {
    fn clone(&self) -> Self {
        RecordablesMap {
            entries: self.entries.clone(),
        }
    }
}

impl<N> Default for RecordablesMap<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> RecordablesMap<N> {
    pub fn new() -> Self {
        RecordablesMap { entries: vec![] }
    }

    /// Register an observable under the given name.
    pub fn insert(&mut self, name: &'static str, get: fn(&N) -> f64) {
        debug_assert!(self.entries.iter().all(|(n, _)| *n != name));
        self.entries.push((name, get));
    }

    /// Returns the registered observable names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    /// Returns the accessor registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<fn(&N) -> f64> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, get)| *get)
    }

    /// Sample all observables of `node`, in registration order.
    pub fn sample(&self, node: &N) -> Vec<f64> {
        self.entries.iter().map(|(_, get)| get(node)).collect()
    }
}

/// Per-node log of observable rows, one row per simulation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataLogger {
    names: Vec<String>,
    steps: Vec<i64>,
    rows: Vec<Vec<f64>>,
    enabled: bool,
}

impl DataLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)bind the logger to the given observable names, dropping recorded rows.
    pub fn init(&mut self, names: Vec<&'static str>) {
        self.names = names.into_iter().map(String::from).collect();
        self.reset();
    }

    /// Drop all recorded rows.
    pub fn reset(&mut self) {
        self.steps.clear();
        self.rows.clear();
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Append one row of observables for the given step. Ignored while disabled.
    pub fn record(&mut self, step: i64, row: Vec<f64>) {
        if !self.enabled {
            return;
        }
        debug_assert_eq!(row.len(), self.names.len());
        self.steps.push(step);
        self.rows.push(row);
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Save the recorded rows as pretty-printed JSON.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SNNError> {
        let file = File::create(path).map_err(|e| SNNError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SNNError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SNNError::IOError(e.to_string()))?;
        Ok(())
    }

    /// Load previously saved rows.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SNNError> {
        let file = File::open(path).map_err(|e| SNNError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| SNNError::IOError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Toy {
        v: f64,
        u: f64,
    }

    fn toy_map() -> RecordablesMap<Toy> {
        let mut map = RecordablesMap::new();
        map.insert("v", |t: &Toy| t.v);
        map.insert("u", |t: &Toy| t.u);
        map
    }

    #[test]
    fn test_recordables_sample() {
        let map = toy_map();
        let toy = Toy { v: 1.5, u: -2.0 };
        assert_eq!(map.names(), vec!["v", "u"]);
        assert_eq!(map.sample(&toy), vec![1.5, -2.0]);
        assert_eq!(map.get("u").map(|get| get(&toy)), Some(-2.0));
        assert!(map.get("missing").is_none());
    }

    #[test]
    fn test_logger_records_only_when_enabled() {
        let mut logger = DataLogger::new();
        logger.init(vec!["v", "u"]);
        logger.record(0, vec![1.0, 2.0]);
        assert!(logger.rows().is_empty());

        logger.set_enabled(true);
        logger.record(1, vec![3.0, 4.0]);
        assert_eq!(logger.steps(), &[1]);
        assert_eq!(logger.rows(), &[vec![3.0, 4.0]]);
    }

    #[test]
    fn test_logger_save_load_round_trip() {
        let mut logger = DataLogger::new();
        logger.init(vec!["v"]);
        logger.set_enabled(true);
        logger.record(0, vec![0.5]);
        logger.record(1, vec![0.25]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        logger.save_to(&path).unwrap();
        let loaded = DataLogger::load_from(&path).unwrap();
        assert_eq!(loaded, logger);
    }
}
