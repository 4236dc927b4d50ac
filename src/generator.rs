//! Module implementing spike-train generators.
//!
//! The generators produce sorted spike times used to drive node receptors in
//! tests and demos: a strictly periodic train for integration-window markers,
//! and a Poisson train for irregular encoding input.

use rand::Rng;
use rand_distr::{Distribution, Exp};

use super::error::SNNError;

/// Sample a periodic spike train covering `[start, end)` with the given period.
/// The function returns an error for a non-positive period.
pub fn periodic_train(start: f64, period: f64, end: f64) -> Result<Vec<f64>, SNNError> {
    if period <= 0.0 {
        return Err(SNNError::InvalidParameter(
            "period must be > 0".to_string(),
        ));
    }
    let mut times = vec![];
    let mut t = start;
    while t < end {
        times.push(t);
        t += period;
    }
    Ok(times)
}

/// Sample a Poisson spike train with the given rate (spikes per ms) over
/// `[0, duration)`. The function returns an error for a negative rate or a
/// negative duration.
pub fn poisson_train<R: Rng>(
    rate: f64,
    duration: f64,
    rng: &mut R,
) -> Result<Vec<f64>, SNNError> {
    if rate < 0.0 {
        return Err(SNNError::InvalidParameter(
            "firing rate must be non-negative".to_string(),
        ));
    }
    if duration < 0.0 {
        return Err(SNNError::InvalidParameter(
            "duration must be non-negative".to_string(),
        ));
    }
    if rate == 0.0 {
        return Ok(vec![]);
    }

    let interval = Exp::new(rate).map_err(|e| SNNError::InvalidParameter(e.to_string()))?;
    let mut times = vec![];
    let mut t = interval.sample(rng);
    while t < duration {
        times.push(t);
        t += interval.sample(rng);
    }
    Ok(times)
}
