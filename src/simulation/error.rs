//! Simulation error types
//!
//! Nothing is recovered locally: configuration problems are reported before
//! the first step, numeric and integrator failures stop the run and carry
//! the samples computed so far in `partial`.

use thiserror::Error;

use super::integrator::StepFailure;
use super::trajectory::Trajectory;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("non-finite state at t = {t} (bodies {bodies:?})")]
    NumericDegeneracy {
        t: f64,
        bodies: Vec<usize>,
        partial: Box<Trajectory>,
    },

    #[error("integrator failure at t = {t}")]
    IntegratorFailure {
        t: f64,
        #[source]
        source: StepFailure,
        partial: Box<Trajectory>,
    },
}

impl SimError {
    /// Samples computed before the failure, if the run got that far
    pub fn partial(&self) -> Option<&Trajectory> {
        match self {
            Self::InvalidConfiguration(_) => None,
            Self::NumericDegeneracy { partial, .. } | Self::IntegratorFailure { partial, .. } => Some(partial.as_ref()),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
