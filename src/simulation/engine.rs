//! Simulation drivers
//!
//! Both drivers own an explicit step loop around the adaptive integrator:
//! advance one accepted step, check the state, react, repeat.
//!
//! - [`run`] / [`run_with`]: many-body gravity. After every accepted step the
//!   state is checked for non-finite values and for contacts; contacts are
//!   resolved elastically and the integrator is re-seeded from the resolved
//!   state, so no step is ever taken from a pre-collision state.
//! - Before every step the trial step is capped so that no pair can close its
//!   contact distance within it, given the current relative velocity and
//!   acceleration. Contacts are therefore not stepped over even with an
//!   unbounded `h_max`.
//! - [`run_test_particle`]: one test particle among fixed attractors. The run
//!   stops at the first contact.

use log::{debug, info, warn};

use super::codec::StateLayout;
use super::collisions::{contact_step_limit, detect, reach_time, resolve, CollisionEvent};
use super::error::{SimError, SimResult};
use super::forces::{gravity, NewtonianGravity};
use super::integrator::{DormandPrince, OdeSystem};
use super::params::Parameters;
use super::states::{Body, NVec, SystemParams};
use super::trajectory::Trajectory;

/// Check a body list and return its common dimension
pub fn validate_bodies(bodies: &[Body]) -> SimResult<usize> {
    let first = bodies
        .first()
        .ok_or_else(|| SimError::InvalidConfiguration("at least one body is required".to_string()))?;
    let dim = first.dimension();
    if dim == 0 {
        return Err(SimError::InvalidConfiguration(format!(
            "body '{}' has an empty position",
            first.label
        )));
    }

    for (i, b) in bodies.iter().enumerate() {
        if b.x.len() != dim || b.v.len() != dim {
            return Err(SimError::InvalidConfiguration(format!(
                "body {i} ('{}') has position/velocity of length {}/{}, expected {dim}",
                b.label,
                b.x.len(),
                b.v.len()
            )));
        }
        if !(b.m > 0.0) || !b.m.is_finite() {
            return Err(SimError::InvalidConfiguration(format!(
                "body {i} ('{}') has non-positive mass {}",
                b.label, b.m
            )));
        }
        if !(b.radius >= 0.0) || !b.radius.is_finite() {
            return Err(SimError::InvalidConfiguration(format!(
                "body {i} ('{}') has invalid radius {}",
                b.label, b.radius
            )));
        }
        if b.x.iter().chain(b.v.iter()).any(|c| !c.is_finite()) {
            return Err(SimError::InvalidConfiguration(format!(
                "body {i} ('{}') has non-finite initial conditions",
                b.label
            )));
        }
    }
    Ok(dim)
}

/// Bodies whose block contains a non-finite value
fn non_finite_bodies(state: &NVec, layout: &StateLayout) -> Vec<usize> {
    (0..layout.n())
        .filter(|&i| {
            layout.position(state, i).iter().chain(layout.velocity(state, i).iter()).any(|c| !c.is_finite())
        })
        .collect()
}

/// Run with default integrator settings over `time_span = (t0, t1)`
#[allow(non_snake_case)]
pub fn run(bodies: &[Body], G: f64, time_span: (f64, f64)) -> SimResult<Trajectory> {
    run_with(bodies, &Parameters::new(G, time_span.0, time_span.1))
}

/// Many-body run with elastic collisions, full parameter control
pub fn run_with(bodies: &[Body], params: &Parameters) -> SimResult<Trajectory> {
    validate_bodies(bodies)?;
    params.validate()?;

    let system = SystemParams::from_bodies(bodies, params.G);
    let layout = system.layout();
    let labels = bodies.iter().map(|b| b.label.clone()).collect();
    let mut trajectory = Trajectory::new(layout, labels);

    // bodies may already be in contact at t0
    let mut y0 = layout.encode(bodies);
    let (collided, pairs) = detect(&y0, &layout, &system.radii);
    let initial_event = if collided {
        let before = y0.clone();
        resolve(&mut y0, &layout, &system.masses, &pairs);
        debug!("contact at t = {}: {:?}", params.t_start, pairs);
        Some(CollisionEvent {
            t: params.t_start,
            pairs,
            before,
            sample: 0,
        })
    } else {
        None
    };

    let mut solver = DormandPrince::new(NewtonianGravity::new(system.clone()), y0, params);
    trajectory.push(solver.t(), solver.state().clone(), solver.derivative().clone());
    if let Some(event) = initial_event {
        trajectory.record_collision(event);
    }

    while !solver.is_finished() {
        if let Some(limit) = contact_step_limit(solver.state(), solver.derivative(), &layout, &system.radii) {
            solver.limit_next_step(limit);
        }
        if let Err(source) = solver.step() {
            warn!("integration stopped at t = {}: {}", solver.t(), source);
            return Err(SimError::IntegratorFailure {
                t: solver.t(),
                source,
                partial: Box::new(trajectory),
            });
        }
        let t = solver.t();

        let bad = non_finite_bodies(solver.state(), &layout);
        if !bad.is_empty() {
            warn!("non-finite state at t = {t} for bodies {bad:?}");
            return Err(SimError::NumericDegeneracy {
                t,
                bodies: bad,
                partial: Box::new(trajectory),
            });
        }

        let (collided, pairs) = detect(solver.state(), &layout, &system.radii);
        if collided {
            debug!("collision at t = {t}: {pairs:?}");
            let before = solver.state().clone();
            let mut after = before.clone();
            resolve(&mut after, &layout, &system.masses, &pairs);
            solver.reseed(after);
            trajectory.record_collision(CollisionEvent {
                t,
                pairs,
                before,
                sample: trajectory.len(),
            });
        }

        trajectory.push(t, solver.state().clone(), solver.derivative().clone());
    }

    let stats = solver.stats();
    info!(
        "run finished: {} bodies, {} samples, {} collision events, {} accepted / {} rejected steps",
        layout.n(),
        trajectory.len(),
        trajectory.collisions().len(),
        stats.accepted_steps,
        stats.rejected_steps
    );
    Ok(trajectory)
}

/// Where a test particle hit an attractor
#[derive(Debug, Clone, PartialEq)]
pub struct Impact {
    pub t: f64,
    pub attractor: usize, // index into the attractor list
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct TestParticleOutcome {
    pub trajectory: Trajectory,
    pub impact: Option<Impact>,
}

/// Massless particle moving in the field of fixed point masses
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
struct FixedField {
    centers: Vec<NVec>,
    masses: Vec<f64>,
    G: f64,
}

impl OdeSystem for FixedField {
    fn rhs(&self, _t: f64, y: &NVec, dydt: &mut NVec) {
        let layout = StateLayout::new(1, y.len() / 2);
        let x = layout.position(y, 0);

        let mut a = NVec::zeros(layout.dim());
        for (c, m) in self.centers.iter().zip(self.masses.iter()) {
            a += gravity(&x, 0.0, c, *m, self.G);
        }

        layout.position_mut(dydt, 0).copy_from(&layout.velocity(y, 0));
        layout.velocity_mut(dydt, 0).copy_from(&a);
    }
}

/// Integrate one test particle among fixed `attractors` until it touches
/// one of them or `params.t_end` is reached.
///
/// The particle's own mass does not enter its motion. The impact, if any,
/// is the lowest-index attractor in contact after the first accepted step
/// that shows a contact, and that step is the last sample.
pub fn run_test_particle(particle: &Body, attractors: &[Body], params: &Parameters) -> SimResult<TestParticleOutcome> {
    let dim = validate_bodies(std::slice::from_ref(particle))?;
    if !attractors.is_empty() {
        let attractor_dim = validate_bodies(attractors)?;
        if attractor_dim != dim {
            return Err(SimError::InvalidConfiguration(format!(
                "particle is {dim}-dimensional, attractors are {attractor_dim}-dimensional"
            )));
        }
    }
    params.validate()?;

    let layout = StateLayout::new(1, dim);
    let field = FixedField {
        centers: attractors.iter().map(|a| a.x.clone()).collect(),
        masses: attractors.iter().map(|a| a.m).collect(),
        G: params.G,
    };
    let step_limit = |y: &NVec, dydt: &NVec| -> Option<f64> {
        let speed = layout.velocity(y, 0).norm();
        let accel = layout.velocity(dydt, 0).norm();
        attractors
            .iter()
            .filter_map(|a| reach_time(particle.radius + a.radius, speed, accel))
            .reduce(f64::min)
    };
    let contact = |y: &NVec| -> Option<usize> {
        let x = layout.position(y, 0);
        attractors
            .iter()
            .position(|a| (&x - &a.x).norm() <= particle.radius + a.radius)
    };

    let mut trajectory = Trajectory::new(layout, vec![particle.label.clone()]);
    let mut solver = DormandPrince::new(field, layout.encode(std::slice::from_ref(particle)), params);
    trajectory.push(solver.t(), solver.state().clone(), solver.derivative().clone());

    let mut impact = contact(solver.state()).map(|k| Impact {
        t: solver.t(),
        attractor: k,
        label: attractors[k].label.clone(),
    });

    while impact.is_none() && !solver.is_finished() {
        if let Some(limit) = step_limit(solver.state(), solver.derivative()) {
            solver.limit_next_step(limit);
        }
        if let Err(source) = solver.step() {
            warn!("test particle integration stopped at t = {}: {}", solver.t(), source);
            return Err(SimError::IntegratorFailure {
                t: solver.t(),
                source,
                partial: Box::new(trajectory),
            });
        }
        let t = solver.t();

        if !non_finite_bodies(solver.state(), &layout).is_empty() {
            warn!("non-finite test particle state at t = {t}");
            return Err(SimError::NumericDegeneracy {
                t,
                bodies: vec![0],
                partial: Box::new(trajectory),
            });
        }

        trajectory.push(t, solver.state().clone(), solver.derivative().clone());
        impact = contact(solver.state()).map(|k| Impact {
            t,
            attractor: k,
            label: attractors[k].label.clone(),
        });
    }

    match &impact {
        Some(hit) => info!("test particle hit '{}' at t = {}", hit.label, hit.t),
        None => info!("test particle reached t = {} without impact", solver.t()),
    }
    Ok(TestParticleOutcome { trajectory, impact })
}
