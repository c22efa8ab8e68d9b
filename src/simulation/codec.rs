//! Flat state-vector encoding
//!
//! The integrator works on one homogeneous vector. For `N` bodies in `D`
//! dimensions it has length `2·N·D` and is laid out as `N` blocks:
//!
//! ```text
//! [ x_0 (D) | v_0 (D) | x_1 (D) | v_1 (D) | ... | x_{N-1} | v_{N-1} ]
//! ```
//!
//! in the same order as the input body list. All offset arithmetic lives in
//! [`StateLayout`]; the dynamics, collision and diagnostics code only ever
//! go through its views.

use nalgebra::{DVectorView, DVectorViewMut};

use super::states::{Body, NVec};

/// Shape of a flat state: body count and spatial dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateLayout {
    n: usize,
    dim: usize,
}

impl StateLayout {
    pub fn new(n: usize, dim: usize) -> Self {
        Self { n, dim }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Length of a state vector with this layout, `2·N·D`
    pub fn len(&self) -> usize {
        2 * self.n * self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // offset of body i's block
    fn block(&self, i: usize) -> usize {
        2 * self.dim * i
    }

    /// Position of body `i` inside `state`
    pub fn position<'a>(&self, state: &'a NVec, i: usize) -> DVectorView<'a, f64> {
        state.rows(self.block(i), self.dim)
    }

    /// Velocity of body `i` inside `state`
    pub fn velocity<'a>(&self, state: &'a NVec, i: usize) -> DVectorView<'a, f64> {
        state.rows(self.block(i) + self.dim, self.dim)
    }

    pub fn position_mut<'a>(&self, state: &'a mut NVec, i: usize) -> DVectorViewMut<'a, f64> {
        state.rows_mut(self.block(i), self.dim)
    }

    pub fn velocity_mut<'a>(&self, state: &'a mut NVec, i: usize) -> DVectorViewMut<'a, f64> {
        state.rows_mut(self.block(i) + self.dim, self.dim)
    }

    /// Pack body initial conditions into a flat state, positions then
    /// velocities, in list order. Values are copied, never recomputed.
    pub fn encode(&self, bodies: &[Body]) -> NVec {
        let mut state = NVec::zeros(self.len());
        for (i, b) in bodies.iter().enumerate() {
            self.position_mut(&mut state, i).copy_from(&b.x);
            self.velocity_mut(&mut state, i).copy_from(&b.v);
        }
        state
    }

    /// Split a flat state back into per-body positions and velocities
    pub fn decode(&self, state: &NVec) -> (Vec<NVec>, Vec<NVec>) {
        let positions = (0..self.n).map(|i| self.position(state, i).into_owned()).collect();
        let velocities = (0..self.n).map(|i| self.velocity(state, i).into_owned()).collect();
        (positions, velocities)
    }
}

/// Encode a validated body list. The layout is taken from the list itself.
pub fn encode(bodies: &[Body]) -> NVec {
    let dim = bodies.first().map_or(0, Body::dimension);
    StateLayout::new(bodies.len(), dim).encode(bodies)
}

/// Decode a flat state of `n` bodies in `dim` dimensions
pub fn decode(state: &NVec, n: usize, dim: usize) -> (Vec<NVec>, Vec<NVec>) {
    StateLayout::new(n, dim).decode(state)
}
