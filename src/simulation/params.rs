//! Numerical and physical parameters for a run
//!
//! `Parameters` holds runtime settings:
//! - time span (`t_start`, `t_end`),
//! - initial step size and step limits for the adaptive integrator,
//! - error tolerances,
//! - gravitational constant `G`, passed explicitly rather than kept global

use super::error::{SimError, SimResult};

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub t_start: f64, // time start
    pub t_end: f64, // time end
    pub h0: f64, // initial step size
    pub atol: f64, // absolute error tolerance
    pub rtol: f64, // relative error tolerance
    pub h_min: f64, // smallest step before giving up
    pub h_max: f64, // largest step the controller may take
    pub max_steps: u64, // step attempts before giving up
    pub G: f64, // gravitational constant
}

impl Parameters {
    /// Defaults for everything except `G` and the time span
    #[allow(non_snake_case)]
    pub fn new(G: f64, t_start: f64, t_end: f64) -> Self {
        let span = (t_end - t_start).abs();
        Self {
            t_start,
            t_end,
            h0: if span > 0.0 { 1e-3 * span } else { 1e-3 },
            atol: 1e-9,
            rtol: 1e-9,
            h_min: 1e-12,
            h_max: f64::INFINITY,
            max_steps: 1_000_000,
            G,
        }
    }

    /// Reject malformed settings before any step runs
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfiguration(msg));

        if !self.t_start.is_finite() || !self.t_end.is_finite() {
            return invalid(format!("time span ({}, {}) is not finite", self.t_start, self.t_end));
        }
        if self.t_end <= self.t_start {
            return invalid(format!(
                "time span ({}, {}) must have t_end > t_start",
                self.t_start, self.t_end
            ));
        }
        if !(self.G > 0.0) || !self.G.is_finite() {
            return invalid(format!("G must be positive and finite, got {}", self.G));
        }
        if !(self.atol > 0.0) || !(self.rtol >= 0.0) {
            return invalid(format!("tolerances must be positive, got atol = {}, rtol = {}", self.atol, self.rtol));
        }
        if !(self.h_min > 0.0) || !(self.h_max >= self.h_min) {
            return invalid(format!("step limits [{}, {}] are not a valid range", self.h_min, self.h_max));
        }
        if !(self.h0 > 0.0) || !self.h0.is_finite() {
            return invalid(format!("initial step h0 must be positive, got {}", self.h0));
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be at least 1".to_string());
        }
        Ok(())
    }
}
