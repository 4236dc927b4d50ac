//! Shared numeric helpers for the exact integration of linear model dynamics.
//!
//! A propagator is the precomputed coefficient implementing the analytic
//! solution of a linear differential equation over one fixed step. The
//! second-order helpers cover the alpha-shaped synaptic current feeding a
//! leaky membrane; the quadrature helper covers derived signals that have no
//! closed-form step solution.

/// Exact decay factor of a first-order leak with time constant `tau` over one
/// step of length `h`.
pub fn decay(h: f64, tau: f64) -> f64 {
    (-h / tau).exp()
}

/// Step-response gain of a leaky integrator with time constant `tau` and
/// capacitance `c` driven by a constant input over one step of length `h`.
pub fn charge(h: f64, tau: f64, c: f64) -> f64 {
    tau / c * (1.0 - (-h / tau).exp())
}

// Relative tolerance below which the synaptic and membrane time constants are
// treated as equal and the singular limit of the propagators is used.
const SINGULARITY_TOL: f64 = 1e-9;

/// Exact coupling from the first alpha-trace variable into the membrane over
/// one step: the contribution of `y1` to `V` after `h`, for a synaptic time
/// constant `tau_syn` feeding a membrane with time constant `tau_m` and
/// capacitance `c`.
pub fn propagator_31(tau_syn: f64, tau_m: f64, c: f64, h: f64) -> f64 {
    if (tau_m - tau_syn).abs() < SINGULARITY_TOL * tau_m {
        return h * h / (2.0 * c) * (-h / tau_m).exp();
    }
    let beta = 1.0 / tau_m - 1.0 / tau_syn;
    let e_syn = (-h / tau_syn).exp();
    let e_m = (-h / tau_m).exp();
    (h * e_syn / beta - (e_syn - e_m) / (beta * beta)) / c
}

/// Exact coupling from the second alpha-trace variable into the membrane over
/// one step; see [`propagator_31`].
pub fn propagator_32(tau_syn: f64, tau_m: f64, c: f64, h: f64) -> f64 {
    if (tau_m - tau_syn).abs() < SINGULARITY_TOL * tau_m {
        return h / c * (-h / tau_m).exp();
    }
    let beta = 1.0 / tau_m - 1.0 / tau_syn;
    let e_syn = (-h / tau_syn).exp();
    let e_m = (-h / tau_m).exp();
    (e_syn - e_m) / (beta * c)
}

/// Second-order (Simpson) quadrature of a signal over one step of length `h`,
/// from its samples at the step start, midpoint and end.
pub fn simpson(h: f64, f0: f64, fm: f64, f1: f64) -> f64 {
    (f0 + 4.0 * fm + f1) * h / 6.0
}

/// Clamp a state variable to its configured lower bound. Traces have no upper
/// bound.
pub fn clamp_min(x: f64, lower: f64) -> f64 {
    if x < lower {
        lower
    } else {
        x
    }
}

/// Normalized alpha kernel `(t/tau) * exp(1 - t/tau)`, peaking at one for
/// `t = tau`; zero for non-positive `t`.
pub fn alpha_kernel(t: f64, tau: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    (t / tau) * (1.0 - t / tau).exp()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_decay_and_charge() {
        assert_relative_eq!(decay(0.0, 10.0), 1.0);
        assert_relative_eq!(decay(10.0, 10.0), (-1.0_f64).exp());
        // charging towards tau/c for h >> tau
        assert_relative_eq!(charge(1e6, 30.0, 2.0), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_propagators_match_singular_limit() {
        let (c, h) = (250.0, 0.1);
        let tau = 10.0;
        let eps = 1e-7;
        assert_relative_eq!(
            propagator_31(tau * (1.0 + eps), tau, c, h),
            propagator_31(tau, tau, c, h),
            max_relative = 1e-4
        );
        assert_relative_eq!(
            propagator_32(tau * (1.0 + eps), tau, c, h),
            propagator_32(tau, tau, c, h),
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_propagator_32_closed_form() {
        let (tau_syn, tau_m, c, h): (f64, f64, f64, f64) = (2.0, 10.0, 250.0, 0.1);
        let beta = 1.0 / tau_m - 1.0 / tau_syn;
        let expected = ((-h / tau_syn).exp() - (-h / tau_m).exp()) / (beta * c);
        assert_relative_eq!(propagator_32(tau_syn, tau_m, c, h), expected);
        assert!(propagator_32(tau_syn, tau_m, c, h) > 0.0);
    }

    #[test]
    fn test_simpson_is_exact_for_parabolas() {
        // integral of t^2 over [0, h] is h^3 / 3
        let h = 0.4;
        let integral = simpson(h, 0.0, (h / 2.0) * (h / 2.0), h * h);
        assert_relative_eq!(integral, h * h * h / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clamp_min() {
        assert_eq!(clamp_min(-5.0, -1.0), -1.0);
        assert_eq!(clamp_min(2.0, -1.0), 2.0);
        assert_eq!(clamp_min(3.0, f64::NEG_INFINITY), 3.0);
    }

    #[test]
    fn test_alpha_kernel_peaks_at_tau() {
        assert_eq!(alpha_kernel(-1.0, 20.0), 0.0);
        assert_eq!(alpha_kernel(0.0, 20.0), 0.0);
        assert_relative_eq!(alpha_kernel(20.0, 20.0), 1.0);
        assert!(alpha_kernel(10.0, 20.0) < 1.0);
        assert!(alpha_kernel(40.0, 20.0) < 1.0);
    }
}
