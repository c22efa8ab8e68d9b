//! Conservation diagnostics on a flat state
//!
//! Used to judge run quality: total momentum and mechanical energy should
//! stay (nearly) constant between collisions, and momentum across them.

use super::codec::StateLayout;
use super::states::NVec;

/// Σ m_i v_i
pub fn total_momentum(state: &NVec, layout: &StateLayout, masses: &[f64]) -> NVec {
    let mut p = NVec::zeros(layout.dim());
    for (i, m) in masses.iter().enumerate().take(layout.n()) {
        p += &layout.velocity(state, i) * *m;
    }
    p
}

/// Σ ½ m_i |v_i|²
pub fn kinetic_energy(state: &NVec, layout: &StateLayout, masses: &[f64]) -> f64 {
    (0..layout.n())
        .map(|i| 0.5 * masses[i] * layout.velocity(state, i).norm_squared())
        .sum()
}

/// −Σ_{i<j} G m_i m_j / r_ij
#[allow(non_snake_case)]
pub fn potential_energy(state: &NVec, layout: &StateLayout, masses: &[f64], G: f64) -> f64 {
    let mut u = 0.0;
    for i in 0..layout.n() {
        let xi = layout.position(state, i);
        for j in (i + 1)..layout.n() {
            let r = (&xi - &layout.position(state, j)).norm();
            u -= G * masses[i] * masses[j] / r;
        }
    }
    u
}

#[allow(non_snake_case)]
pub fn total_energy(state: &NVec, layout: &StateLayout, masses: &[f64], G: f64) -> f64 {
    kinetic_energy(state, layout, masses) + potential_energy(state, layout, masses, G)
}

/// Mass-weighted mean position
pub fn center_of_mass(state: &NVec, layout: &StateLayout, masses: &[f64]) -> NVec {
    let mut c = NVec::zeros(layout.dim());
    let mut total = 0.0;
    for (i, m) in masses.iter().enumerate().take(layout.n()) {
        c += &layout.position(state, i) * *m;
        total += m;
    }
    c / total
}
