//! Module implementing the per-node spike history.
//!
//! The history is an append-only log of past spike times, shared read-only by
//! every plastic connection incoming to the node. Each entry carries an access
//! count: the number of registered readers that still need it. Readers
//! register interest before their first read and release it on teardown; the
//! node prunes fully-consumed entries when appending new ones. Connections
//! never mutate entries directly.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A single recorded spike: its time and the number of pending readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistEntry {
    time: f64,
    access_count: usize,
}

impl HistEntry {
    /// Returns the spike time in ms.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Returns the number of registered readers that still need this entry.
    pub fn access_count(&self) -> usize {
        self.access_count
    }
}

/// Append-only, access-counted log of a node's past spike times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeHistory {
    entries: VecDeque<HistEntry>,
    num_readers: usize,
    last_spike: f64,
}

impl Default for SpikeHistory {
    fn default() -> Self {
        SpikeHistory {
            entries: VecDeque::new(),
            num_readers: 0,
            last_spike: f64::NEG_INFINITY,
        }
    }
}

impl SpikeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the time of the most recent spike, or `-inf` if none was recorded.
    pub fn last_spike(&self) -> f64 {
        self.last_spike
    }

    /// Returns the retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistEntry> {
        self.entries.iter()
    }

    /// Register a new reader that will consume all entries after `t_first_read`.
    /// Must be called before the reader's first [`read_range`](Self::read_range)
    /// so the entries it needs cannot be pruned in the meantime.
    pub fn register(&mut self, t_first_read: f64) {
        self.num_readers += 1;
        for entry in self.entries.iter_mut() {
            if entry.time > t_first_read {
                entry.access_count += 1;
            }
        }
    }

    /// Release a reader's remaining interest in entries after `t_next_read`.
    pub fn deregister(&mut self, t_next_read: f64) {
        debug_assert!(self.num_readers > 0);
        self.num_readers = self.num_readers.saturating_sub(1);
        for entry in self.entries.iter_mut() {
            if entry.time > t_next_read {
                entry.access_count = entry.access_count.saturating_sub(1);
            }
        }
    }

    /// Read the entries in the half-open interval `(t1, t2]`, oldest first,
    /// consuming one unit of interest per visited entry.
    pub fn read_range(&mut self, t1: f64, t2: f64) -> Vec<f64> {
        let mut times = Vec::new();
        for entry in self.entries.iter_mut() {
            if entry.time > t2 {
                break;
            }
            if entry.time > t1 {
                entry.access_count = entry.access_count.saturating_sub(1);
                times.push(entry.time);
            }
        }
        times
    }

    /// Append a spike at time `t` and prune fully-consumed front entries.
    /// Spike times must be appended in non-decreasing order.
    pub fn append(&mut self, t: f64) {
        debug_assert!(t >= self.last_spike);
        while let Some(front) = self.entries.front() {
            if front.access_count == 0 {
                self.entries.pop_front();
            } else {
                break;
            }
        }
        self.entries.push_back(HistEntry {
            time: t,
            access_count: self.num_readers,
        });
        self.last_spike = t;
    }

    /// Drop all entries and reset the last spike time. Reader registrations
    /// are kept: the log restarts empty but its consumers remain attached.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_spike = f64::NEG_INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_tracks_last_spike() {
        let mut history = SpikeHistory::new();
        assert_eq!(history.last_spike(), f64::NEG_INFINITY);
        history.append(1.0);
        history.append(3.5);
        assert_eq!(history.last_spike(), 3.5);
        assert_eq!(history.len(), 1); // first entry had no readers and was pruned
    }

    #[test]
    fn test_register_protects_entries() {
        let mut history = SpikeHistory::new();
        history.register(f64::NEG_INFINITY);
        history.append(1.0);
        history.append(2.0);
        history.append(3.0);
        assert_eq!(history.len(), 3);
        assert!(history.entries().all(|e| e.access_count() == 1));
    }

    #[test]
    fn test_read_range_is_half_open_and_consumes() {
        let mut history = SpikeHistory::new();
        history.register(f64::NEG_INFINITY);
        for t in [1.0, 2.0, 3.0, 4.0] {
            history.append(t);
        }
        assert_eq!(history.read_range(1.0, 3.0), vec![2.0, 3.0]);
        // fully-consumed front entries are pruned at the next append
        assert_eq!(history.read_range(0.5, 1.0), vec![1.0]);
        history.append(5.0);
        let times: Vec<f64> = history.entries().map(|e| e.time()).collect();
        assert_eq!(times, vec![4.0, 5.0]);
    }

    #[test]
    fn test_read_range_empty_interval() {
        let mut history = SpikeHistory::new();
        history.register(f64::NEG_INFINITY);
        history.append(1.0);
        assert_eq!(history.read_range(2.0, 5.0), Vec::<f64>::new());
        assert_eq!(history.read_range(1.0, 1.0), Vec::<f64>::new());
    }

    #[test]
    fn test_registration_point_excludes_older_entries() {
        let mut history = SpikeHistory::new();
        history.register(f64::NEG_INFINITY);
        history.append(1.0);
        history.append(2.0);
        // a late reader only needs entries after t = 1.5
        history.register(1.5);
        let counts: Vec<usize> = history.entries().map(|e| e.access_count()).collect();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn test_deregister_releases_interest() {
        let mut history = SpikeHistory::new();
        history.register(f64::NEG_INFINITY);
        history.append(1.0);
        history.append(2.0);
        history.deregister(f64::NEG_INFINITY);
        // all interest released: the next append prunes everything before it
        history.append(3.0);
        assert_eq!(history.len(), 1);
    }
}
