//! Gravitational acceleration and the vector field handed to the integrator
//!
//! - [`gravity`] is the pairwise Newtonian term (no softening)
//! - [`NewtonianGravity`] sums it over all ordered pairs and produces the
//!   time derivative of the flat state, implementing [`OdeSystem`]

use nalgebra::{storage::Storage, Dyn, Vector};

use super::integrator::OdeSystem;
use super::states::{NVec, SystemParams};

/// Acceleration of point 1 due to point 2
///
/// Unit vector from `r1` towards `r2` scaled by `G·m2 / d²`. Only the mass of
/// the *other* point enters, `_m1` is kept so call sites read like the
/// physics. Coincident points give `0/0` and therefore NaN components; that
/// singularity is not special-cased here.
#[allow(non_snake_case)]
pub fn gravity<S1, S2>(r1: &Vector<f64, Dyn, S1>, _m1: f64, r2: &Vector<f64, Dyn, S2>, m2: f64, G: f64) -> NVec
where
    S1: Storage<f64, Dyn>,
    S2: Storage<f64, Dyn>,
{
    // displacement from 1 to 2
    let r = r2 - r1;
    let d2 = r.norm_squared();
    let d = d2.sqrt();

    (r / d) * (G * m2 / d2)
}

/// Direct O(N²) Newtonian gravity over the flat state
///
/// The derivative of block `i` is `[v_i ; a_i]` with
/// `a_i = Σ_{j≠i} gravity(x_i, m_i, x_j, m_j, G)`.
#[derive(Debug, Clone)]
pub struct NewtonianGravity {
    params: SystemParams,
}

impl NewtonianGravity {
    pub fn new(params: SystemParams) -> Self {
        Self { params }
    }

    /// Allocating form of [`OdeSystem::rhs`]
    pub fn derivative(&self, state: &NVec, t: f64) -> NVec {
        let mut out = NVec::zeros(state.len());
        self.rhs(t, state, &mut out);
        out
    }
}

impl OdeSystem for NewtonianGravity {
    // forces are not time dependent, t is unused
    fn rhs(&self, _t: f64, y: &NVec, dydt: &mut NVec) {
        let layout = self.params.layout();
        let masses = &self.params.masses;

        for i in 0..layout.n() {
            let xi = layout.position(y, i);
            let mut a = NVec::zeros(layout.dim());

            // every ordered pair (i, j), j != i
            for j in 0..layout.n() {
                if i == j {
                    continue;
                }
                let xj = layout.position(y, j);
                a += gravity(&xi, masses[i], &xj, masses[j], self.params.G);
            }

            // d/dt x_i = v_i, d/dt v_i = a_i
            layout.position_mut(dydt, i).copy_from(&layout.velocity(y, i));
            layout.velocity_mut(dydt, i).copy_from(&a);
        }
    }
}

/// Free-function form: derivative of `state` under `params` at time `t`
pub fn derivative(state: &NVec, params: &SystemParams, t: f64) -> NVec {
    NewtonianGravity::new(params.clone()).derivative(state, t)
}
