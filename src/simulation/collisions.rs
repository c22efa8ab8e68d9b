//! Collision detection and elastic response on the flat state
//!
//! Detection is a pure distance test, `‖x_i − x_j‖ ≤ R_i + R_j` (boundary
//! inclusive), over all unordered pairs. Response rewrites only the velocity
//! blocks of the involved bodies with the one-dimensional elastic formula
//! applied to every component independently:
//!
//! ```text
//! v_i' = ((m_i − m_j)·v_i + 2·m_j·v_j) / (m_i + m_j)
//! v_j' = (2·m_i·v_i + (m_j − m_i)·v_j) / (m_i + m_j)
//! ```
//!
//! Momentum is conserved component-wise. Kinetic energy is only conserved
//! when the velocities are colinear with the line of centers; the angle of
//! impact is not taken into account.

use super::codec::StateLayout;
use super::states::NVec;

/// Indices of two colliding bodies, always `i < j`
pub type Pair = (usize, usize);

/// One resolved collision event during a run
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    pub t: f64, // time of the accepted step that triggered it
    pub pairs: Vec<Pair>, // in resolution order
    pub before: NVec, // state before resolution
    pub sample: usize, // index of the post-resolution sample in the trajectory
}

/// All pairs within contact distance, in ascending `(i, j)` order
pub fn colliding_pairs(state: &NVec, layout: &StateLayout, radii: &[f64]) -> Vec<Pair> {
    let mut pairs = Vec::new();
    for i in 0..layout.n() {
        let xi = layout.position(state, i);
        for j in (i + 1)..layout.n() {
            let xj = layout.position(state, j);
            if (&xi - &xj).norm() <= radii[i] + radii[j] {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Collision predicate plus reporter: `(collided, pairs)`
pub fn detect(state: &NVec, layout: &StateLayout, radii: &[f64]) -> (bool, Vec<Pair>) {
    let pairs = colliding_pairs(state, layout, radii);
    (!pairs.is_empty(), pairs)
}

/// Time for a separation to change by `reach` when it moves at most at
/// `speed` and accelerates at most at `accel`: the root of
/// `speed·h + ½·accel·h² = reach`. `None` when nothing moves.
pub fn reach_time(reach: f64, speed: f64, accel: f64) -> Option<f64> {
    let denom = speed + (speed * speed + 2.0 * accel * reach).sqrt();
    let h = 2.0 * reach / denom;
    (h.is_finite() && h > 0.0).then_some(h)
}

/// Longest step over which no pair can close its contact distance, from the
/// relative velocity and acceleration at the start of the step.
///
/// Pairs with zero contact distance impose no limit. `None` when no pair
/// limits the step.
pub fn contact_step_limit(state: &NVec, derivative: &NVec, layout: &StateLayout, radii: &[f64]) -> Option<f64> {
    let mut limit: Option<f64> = None;
    for i in 0..layout.n() {
        for j in (i + 1)..layout.n() {
            let reach = radii[i] + radii[j];
            if reach <= 0.0 {
                continue;
            }
            let speed = (&layout.velocity(state, i) - &layout.velocity(state, j)).norm();
            // acceleration sits in the velocity slot of the derivative
            let accel = (&layout.velocity(derivative, i) - &layout.velocity(derivative, j)).norm();
            if let Some(h) = reach_time(reach, speed, accel) {
                limit = Some(limit.map_or(h, |l| l.min(h)));
            }
        }
    }
    limit
}

/// Post-collision velocities for one pair
pub fn elastic(m_i: f64, v_i: &NVec, m_j: f64, v_j: &NVec) -> (NVec, NVec) {
    let total = m_i + m_j;
    let vi_new = (v_i * (m_i - m_j) + v_j * (2.0 * m_j)) / total;
    let vj_new = (v_i * (2.0 * m_i) + v_j * (m_j - m_i)) / total;
    (vi_new, vj_new)
}

/// Apply the elastic response for every pair, in order, in place.
///
/// A body in several pairs is updated once per pair; later pairs see the
/// velocities written by earlier ones.
pub fn resolve(state: &mut NVec, layout: &StateLayout, masses: &[f64], pairs: &[Pair]) {
    for &(i, j) in pairs {
        let v_i = layout.velocity(state, i).into_owned();
        let v_j = layout.velocity(state, j).into_owned();

        let (vi_new, vj_new) = elastic(masses[i], &v_i, masses[j], &v_j);

        layout.velocity_mut(state, i).copy_from(&vi_new);
        layout.velocity_mut(state, j).copy_from(&vj_new);
    }
}

/// Non-mutating form of [`resolve`]
pub fn resolved(state: &NVec, layout: &StateLayout, masses: &[f64], pairs: &[Pair]) -> NVec {
    let mut out = state.clone();
    resolve(&mut out, layout, masses, pairs);
    out
}
