//! Simulation output
//!
//! A `Trajectory` is the append-only list of accepted integrator steps, each
//! stored with the derivative at that state so the trajectory can be queried
//! at arbitrary times by cubic Hermite interpolation. Collision events are
//! kept alongside and point at the sample holding the resolved state.

use super::codec::StateLayout;
use super::collisions::CollisionEvent;
use super::states::NVec;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub state: NVec,
    pub derivative: NVec, // dy/dt at `state`
}

#[derive(Debug, Clone)]
pub struct Trajectory {
    layout: StateLayout,
    labels: Vec<String>,
    samples: Vec<Sample>,
    collisions: Vec<CollisionEvent>,
}

impl Trajectory {
    pub fn new(layout: StateLayout, labels: Vec<String>) -> Self {
        Self {
            layout,
            labels,
            samples: Vec::new(),
            collisions: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, t: f64, state: NVec, derivative: NVec) {
        self.samples.push(Sample { t, state, derivative });
    }

    pub(crate) fn record_collision(&mut self, event: CollisionEvent) {
        self.collisions.push(event);
    }

    pub fn layout(&self) -> StateLayout {
        self.layout
    }

    /// Body labels in state block order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn collisions(&self) -> &[CollisionEvent] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.t)
    }

    pub fn states(&self) -> impl Iterator<Item = &NVec> + '_ {
        self.samples.iter().map(|s| &s.state)
    }

    /// Positions and velocities of every body at sample `index`
    pub fn decode(&self, index: usize) -> Option<(Vec<NVec>, Vec<NVec>)> {
        self.samples.get(index).map(|s| self.layout.decode(&s.state))
    }

    /// State at time `t`, interpolated between the neighbouring samples.
    ///
    /// `None` outside `[t_first, t_last]`. Sample times are reproduced
    /// exactly. An interval that ends on a collision interpolates towards
    /// the resolved state.
    pub fn at(&self, t: f64) -> Option<NVec> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        if t < first.t || t > last.t {
            return None;
        }
        if t == last.t {
            return Some(last.state.clone());
        }

        // first sample strictly after t; always >= 1 here
        let idx = self.samples.partition_point(|s| s.t <= t);
        let a = &self.samples[idx - 1];
        let b = &self.samples[idx];

        let h = b.t - a.t;
        let s = (t - a.t) / h;
        let s2 = s * s;
        let s3 = s2 * s;

        // cubic Hermite basis
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        Some(&a.state * h00 + &a.derivative * (h10 * h) + &b.state * h01 + &b.derivative * (h11 * h))
    }
}
