//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`ParametersConfig`]   – time span, integrator settings and `G`
//! - [`BodyConfig`]         – initial state for each body
//! - [`TestParticleConfig`] – optional test particle; when present the bodies
//!   become fixed attractors and the run stops at the first impact
//! - [`ScenarioConfig`]     – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example 2D scenario YAML matching these types:
//!
//! ```yaml
//! parameters:
//!   t_end: 10.0             # total simulation time
//!   h0: 0.01                # initial step size
//!   atol: 1.0e-9            # absolute error tolerance
//!   rtol: 1.0e-9            # relative error tolerance
//!   h_max: 0.05             # optional cap on the step size
//!   G: 1.0                  # gravitational constant
//!
//! bodies:
//!   - label: left
//!     x: [ -1.0, 0.0 ]
//!     v: [  1.0, 0.0 ]
//!     m: 1.0
//!     radius: 0.1
//!   - label: right
//!     x: [  1.0, 0.0 ]      # v omitted -> starts at rest
//!     m: 1.0
//!     radius: 0.1
//! ```
//!
//! The dimension is taken from the length of `x`; all bodies must agree.

use serde::Deserialize;

/// Global numerical and physical parameters for a scenario.
/// Omitted integrator settings fall back to [`crate::Parameters::new`].
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    #[serde(default)]
    pub t_start: f64, // time start, defaults to 0
    pub t_end: f64, // time end
    pub h0: Option<f64>, // initial step size
    pub atol: Option<f64>, // absolute error tolerance
    pub rtol: Option<f64>, // relative error tolerance
    pub h_min: Option<f64>, // smallest step before the run fails
    pub h_max: Option<f64>, // largest step, bounds how far a body moves between contact checks
    pub max_steps: Option<u64>, // step budget
    pub G: f64, // gravitational constant
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    #[serde(default)]
    pub label: Option<String>, // defaults to "body-<index>"
    pub x: Vec<f64>, // initial position
    #[serde(default)]
    pub v: Option<Vec<f64>>, // initial velocity, zero when omitted
    pub m: f64, // mass
    #[serde(default)]
    pub radius: f64, // collision radius
}

/// Test particle; its mass plays no role in the motion
#[derive(Deserialize, Debug, Clone)]
pub struct TestParticleConfig {
    #[serde(default)]
    pub label: Option<String>,
    pub x: Vec<f64>,
    #[serde(default)]
    pub v: Option<Vec<f64>>,
    #[serde(default)]
    pub radius: f64,
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub parameters: ParametersConfig, // Global numerical and physical parameters
    pub bodies: Vec<BodyConfig>, // Bodies (or fixed attractors) at t_start
    #[serde(default)]
    pub test_particle: Option<TestParticleConfig>, // Switches to the terminating single-particle run
}
