//! Module implementing the discrete simulation grid.
//!
//! All node and synapse models operate on a fixed step grid: the *resolution*
//! is the duration of one step in milliseconds, and the *minimum delay* is the
//! number of steps in one update slice (the horizon of the delayed-event
//! buffers). Both are fixed between calibrations.

use serde::{Deserialize, Serialize};

use super::error::SNNError;

/// The discrete time grid shared by all models of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    /// Duration of one step in ms.
    resolution: f64,
    /// Number of steps in one update slice.
    min_delay: usize,
}

impl Default for TimeGrid {
    fn default() -> Self {
        TimeGrid {
            resolution: 0.1,
            min_delay: 1,
        }
    }
}

impl TimeGrid {
    /// Create a new time grid with the specified resolution (ms per step) and
    /// minimum delay (steps per slice).
    /// The function returns an error if the resolution is not strictly positive
    /// or the minimum delay is zero.
    pub fn build(resolution: f64, min_delay: usize) -> Result<Self, SNNError> {
        if !(resolution > 0.0) {
            return Err(SNNError::InvalidParameter(
                "resolution must be > 0".to_string(),
            ));
        }
        if min_delay == 0 {
            return Err(SNNError::InvalidParameter(
                "minimum delay must be at least one step".to_string(),
            ));
        }
        Ok(TimeGrid {
            resolution,
            min_delay,
        })
    }

    /// Returns the duration of one step in ms.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Returns the number of steps in one update slice.
    pub fn min_delay(&self) -> usize {
        self.min_delay
    }

    /// Returns the time in ms corresponding to the given step index.
    pub fn step_to_ms(&self, step: i64) -> f64 {
        step as f64 * self.resolution
    }

    /// Converts a duration in ms to a whole number of steps.
    ///
    /// Fractional durations are truncated towards zero: the grid can only
    /// represent durations that are integer multiples of the resolution, and a
    /// refractory period of e.g. 2.05 ms on a 0.1 ms grid lasts 20 steps.
    pub fn ms_to_steps(&self, ms: f64) -> i64 {
        (ms / self.resolution).trunc() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_grid_build() {
        assert!(TimeGrid::build(0.1, 10).is_ok());
        assert_eq!(
            TimeGrid::build(0.0, 10),
            Err(SNNError::InvalidParameter(
                "resolution must be > 0".to_string()
            ))
        );
        assert_eq!(
            TimeGrid::build(-1.0, 10),
            Err(SNNError::InvalidParameter(
                "resolution must be > 0".to_string()
            ))
        );
        assert_eq!(
            TimeGrid::build(0.1, 0),
            Err(SNNError::InvalidParameter(
                "minimum delay must be at least one step".to_string()
            ))
        );
    }

    #[test]
    fn test_ms_to_steps_truncates() {
        let grid = TimeGrid::build(0.1, 10).unwrap();
        assert_eq!(grid.ms_to_steps(2.0), 20);
        assert_eq!(grid.ms_to_steps(2.05), 20);
        assert_eq!(grid.ms_to_steps(1.99), 19);
        assert_eq!(grid.ms_to_steps(0.0), 0);
    }

    #[test]
    fn test_step_to_ms() {
        let grid = TimeGrid::build(0.5, 4).unwrap();
        assert_eq!(grid.step_to_ms(0), 0.0);
        assert_eq!(grid.step_to_ms(7), 3.5);
        assert_eq!(grid.step_to_ms(-2), -1.0);
    }
}
