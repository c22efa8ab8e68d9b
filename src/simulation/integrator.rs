//! Adaptive time integrator for the flat N-body state
//!
//! Embedded Dormand–Prince 5(4) pair:
//! - 7 stages, first-same-as-last (the last stage of an accepted step is the
//!   derivative at the new point and seeds the next step),
//! - 5th order solution is propagated, the 4th order one only feeds the
//!   error estimate,
//! - I-controller on the step size.
//!
//! The stepper owns the current `(t, y, dy/dt)` and advances one accepted
//! step per call to [`DormandPrince::step`], so the caller can inspect and
//! rewrite the state between steps and hand it back via
//! [`DormandPrince::reseed`].

use log::warn;
use thiserror::Error;

use super::params::Parameters;
use super::states::NVec;

/// System of ordinary differential equations: dy/dt = f(t, y)
pub trait OdeSystem {
    /// Evaluate the right-hand side into `dydt` (same length as `y`)
    fn rhs(&self, t: f64, y: &NVec, dydt: &mut NVec);
}

const STAGES: usize = 7;

// Dormand–Prince nodes
const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

// Runge–Kutta matrix; the last row doubles as the 5th order weights
const A: [[f64; STAGES]; STAGES] = [
    [0.0; STAGES],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0, 0.0],
    [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0, 0.0],
];

// 5th order weights minus 4th order weights
const E: [f64; STAGES] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

/// Why a step could not be completed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepFailure {
    #[error("step size {h:e} fell below the minimum at t = {t}")]
    StepSizeTooSmall { t: f64, h: f64 },

    #[error("exceeded the budget of {max_steps} steps")]
    MaxStepsExceeded { max_steps: u64 },
}

/// Integration statistics for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub fn_evals: u64,
    pub accepted_steps: u64,
    pub rejected_steps: u64,
}

impl Stats {
    pub fn attempts(&self) -> u64 {
        self.accepted_steps + self.rejected_steps
    }
}

/// Step-size controller: h_new = h · clamp(safety · err^(-1/5), min, max)
#[derive(Debug, Clone)]
pub struct StepController {
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    exponent: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            exponent: 1.0 / 5.0,
        }
    }
}

impl StepController {
    pub fn factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }
        (self.safety * error.powf(-self.exponent)).clamp(self.min_factor, self.max_factor)
    }
}

/// Dormand–Prince 5(4) stepper over a system `S`
#[derive(Debug, Clone)]
pub struct DormandPrince<S: OdeSystem> {
    sys: S,
    controller: StepController,
    atol: f64,
    rtol: f64,
    h_min: f64,
    h_max: f64,
    max_steps: u64,
    t_end: f64,
    t: f64, // current time
    y: NVec, // current state
    f: NVec, // f(t, y), reused as the first stage
    h: f64, // next trial step
    stats: Stats,
}

impl<S: OdeSystem> DormandPrince<S> {
    /// Build a stepper at `(params.t_start, y0)` heading to `params.t_end`.
    /// Expects `params` to have been validated.
    pub fn new(sys: S, y0: NVec, params: &Parameters) -> Self {
        let mut f = NVec::zeros(y0.len());
        sys.rhs(params.t_start, &y0, &mut f);

        Self {
            sys,
            controller: StepController::default(),
            atol: params.atol,
            rtol: params.rtol,
            h_min: params.h_min,
            h_max: params.h_max,
            max_steps: params.max_steps,
            t_end: params.t_end,
            t: params.t_start,
            y: y0,
            f,
            h: params.h0.clamp(params.h_min, params.h_max),
            stats: Stats {
                fn_evals: 1,
                ..Stats::default()
            },
        }
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn state(&self) -> &NVec {
        &self.y
    }

    /// dy/dt at the current state
    pub fn derivative(&self) -> &NVec {
        &self.f
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.t >= self.t_end
    }

    /// Cap the next trial step at `h`, never below `h_min`
    pub fn limit_next_step(&mut self, h: f64) {
        self.h = self.h.min(h).max(self.h_min);
    }

    /// Replace the state at the current time (e.g. after a collision) and
    /// drop the cached derivative so the next step starts from `y`
    pub fn reseed(&mut self, y: NVec) {
        self.sys.rhs(self.t, &y, &mut self.f);
        self.stats.fn_evals += 1;
        self.y = y;
    }

    /// Advance by one accepted step, retrying with smaller steps as needed.
    ///
    /// A candidate whose error estimate is non-finite is retried down to
    /// `h_min`; if it is still non-finite there, it is accepted as is and
    /// the caller's finiteness check reports it.
    pub fn step(&mut self) -> Result<(), StepFailure> {
        loop {
            if self.stats.attempts() >= self.max_steps {
                return Err(StepFailure::MaxStepsExceeded {
                    max_steps: self.max_steps,
                });
            }

            // never step past t_end
            let remaining = self.t_end - self.t;
            let clipped = self.h >= remaining;
            let h = if clipped { remaining } else { self.h };

            let (y_new, f_new, err) = self.attempt(h);

            if err <= 1.0 {
                self.stats.accepted_steps += 1;
                self.t = if clipped { self.t_end } else { self.t + h };
                self.y = y_new;
                self.f = f_new;
                if !clipped {
                    self.h = (h * self.controller.factor(err)).clamp(self.h_min, self.h_max);
                }
                return Ok(());
            }

            if !err.is_finite() && h <= self.h_min {
                warn!("non-finite error estimate at t = {} with h = {:e}", self.t, h);
                self.stats.accepted_steps += 1;
                self.t += h;
                self.y = y_new;
                self.f = f_new;
                return Ok(());
            }

            self.stats.rejected_steps += 1;

            let factor = if err.is_finite() {
                self.controller.factor(err)
            } else {
                self.controller.min_factor
            };
            let h_next = h * factor;

            if h_next < self.h_min {
                // one last try at the floor before giving up
                if h > self.h_min {
                    self.h = self.h_min;
                    continue;
                }
                warn!("step size underflow at t = {}", self.t);
                return Err(StepFailure::StepSizeTooSmall { t: self.t, h: h_next });
            }
            self.h = h_next;
        }
    }

    /// Evaluate one trial step of size `h` from the current state.
    /// Returns the 5th order solution, its derivative and the scaled error.
    fn attempt(&mut self, h: f64) -> (NVec, NVec, f64) {
        let n = self.y.len();
        let mut k: Vec<NVec> = Vec::with_capacity(STAGES);
        k.push(self.f.clone());

        let mut y_new = self.y.clone();
        for s in 1..STAGES {
            // y_s = y + h Σ_j a[s][j] k_j
            let mut ys = self.y.clone();
            for (j, kj) in k.iter().enumerate() {
                let a = A[s][j];
                if a != 0.0 {
                    ys.axpy(h * a, kj, 1.0);
                }
            }

            let mut ks = NVec::zeros(n);
            self.sys.rhs(self.t + C[s] * h, &ys, &mut ks);
            k.push(ks);

            // last stage is evaluated at the 5th order solution
            if s == STAGES - 1 {
                y_new = ys;
            }
        }
        self.stats.fn_evals += (STAGES - 1) as u64;

        let mut err_vec = NVec::zeros(n);
        for (kj, e) in k.iter().zip(E.iter()) {
            if *e != 0.0 {
                err_vec.axpy(h * e, kj, 1.0);
            }
        }

        let mut err: f64 = 0.0;
        for i in 0..n {
            let scale = self.atol + self.rtol * self.y[i].abs().max(y_new[i].abs());
            let e = err_vec[i].abs() / scale;
            // NaN must win over any finite value
            if e.is_nan() || e > err {
                err = e;
            }
            if err.is_nan() {
                break;
            }
        }

        let f_new = k.pop().unwrap_or_else(|| NVec::zeros(n));
        (y_new, f_new, err)
    }
}
