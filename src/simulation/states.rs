//! Core state types for the N-body simulation.
//!
//! Defines the dimension-agnostic body description and the per-run
//! system parameters:
//! - `Body`         immutable initial conditions of one point mass
//! - `SystemParams` masses, radii, dimension and `G` shared by every step
//!
//! Bodies are never mutated during a run, only the flat state vector
//! built from them evolves (see [`crate::simulation::codec`]).

use nalgebra::DVector;

use super::codec::StateLayout;

/// Vector of runtime length, used for positions, velocities and flat states
pub type NVec = DVector<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub label: String, // name used in logs and exported trajectories
    pub x: NVec, // position
    pub v: NVec, // velocity
    pub m: f64, // mass
    pub radius: f64, // collision radius
}

impl Body {
    pub fn new(label: impl Into<String>, m: f64, x: NVec, v: NVec, radius: f64) -> Self {
        Self {
            label: label.into(),
            x,
            v,
            m,
            radius,
        }
    }

    /// Body starting with zero velocity
    pub fn at_rest(label: impl Into<String>, m: f64, x: NVec, radius: f64) -> Self {
        let v = NVec::zeros(x.len());
        Self::new(label, m, x, v, radius)
    }

    /// Convenience constructor from plain slices
    pub fn from_slices(label: impl Into<String>, m: f64, x: &[f64], v: &[f64], radius: f64) -> Self {
        Self::new(label, m, NVec::from_column_slice(x), NVec::from_column_slice(v), radius)
    }

    /// Spatial dimension D of this body's position
    pub fn dimension(&self) -> usize {
        self.x.len()
    }
}

/// Parameters passed alongside the flat state to every dynamics / event
/// evaluation. Immutable for the duration of one run.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct SystemParams {
    pub masses: Vec<f64>, // one entry per body, same order as the state blocks
    pub radii: Vec<f64>, // collision radii
    pub dim: usize, // spatial dimension D
    pub G: f64, // gravitational constant
}

impl SystemParams {
    /// Collect masses and radii from an already validated body list
    #[allow(non_snake_case)]
    pub fn from_bodies(bodies: &[Body], G: f64) -> Self {
        Self {
            masses: bodies.iter().map(|b| b.m).collect(),
            radii: bodies.iter().map(|b| b.radius).collect(),
            dim: bodies.first().map_or(0, Body::dimension),
            G,
        }
    }

    /// Number of bodies N
    pub fn n(&self) -> usize {
        self.masses.len()
    }

    pub fn layout(&self) -> StateLayout {
        StateLayout::new(self.n(), self.dim)
    }
}
