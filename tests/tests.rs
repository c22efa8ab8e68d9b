use gravsim::diagnostics::{kinetic_energy, total_energy, total_momentum};
use gravsim::{
    decode, derivative, detect, encode, resolved, run, run_test_particle, run_with, Body, NVec, Parameters,
    Scenario, ScenarioConfig, SimError, StateLayout, SystemParams,
};

/// Build a simple 2-body system at rest, separated along the x-axis
pub fn two_body_system(dist: f64, m1: f64, m2: f64, radius: f64) -> Vec<Body> {
    vec![
        Body::from_slices("b1", m1, &[-dist / 2.0, 0.0], &[0.0, 0.0], radius),
        Body::from_slices("b2", m2, &[dist / 2.0, 0.0], &[0.0, 0.0], radius),
    ]
}

/// Default run parameters for tests
pub fn test_params() -> Parameters {
    let mut p = Parameters::new(1.0, 0.0, 10.0);
    p.h0 = 0.01;
    p.atol = 1e-10;
    p.rtol = 1e-10;
    p
}

/// Two equal masses approaching head-on along x, gravity negligible
pub fn head_on(v: f64) -> (Vec<Body>, Parameters) {
    let bodies = vec![
        Body::from_slices("left", 1.0, &[-1.0, 0.0], &[v, 0.0], 0.1),
        Body::from_slices("right", 1.0, &[1.0, 0.0], &[-v, 0.0], 0.1),
    ];
    let mut p = Parameters::new(1e-9, 0.0, 1.5);
    p.h0 = 0.001;
    p.h_max = 0.01;
    (bodies, p)
}

fn accel(d: &NVec, layout: &StateLayout, i: usize) -> NVec {
    // acceleration sits in the velocity slot of the derivative
    layout.velocity(d, i).into_owned()
}

fn params_for(bodies: &[Body], g: f64) -> SystemParams {
    SystemParams::from_bodies(bodies, g)
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let bodies = two_body_system(1.0, 2.0, 3.0, 0.0);
    let params = params_for(&bodies, 0.1);
    let layout = params.layout();

    let d = derivative(&encode(&bodies), &params, 0.0);
    let net = accel(&d, &layout, 0) * bodies[0].m + accel(&d, &layout, 1) * bodies[1].m;

    assert!(net.norm() < 1e-12, "Net force not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let bodies = two_body_system(2.0, 1.0, 1.0, 0.0);
    let params = params_for(&bodies, 0.1);

    let d = derivative(&encode(&bodies), &params, 0.0);
    let dx = &bodies[1].x - &bodies[0].x;
    let a1 = accel(&d, &params.layout(), 0);

    assert!(dx.norm() > 0.0);
    assert!(a1.dot(&dx) > 0.0, "Acceleration is not toward second body");
}

#[test]
fn gravity_inverse_square_law() {
    let sys_r = two_body_system(1.0, 1.0, 1.0, 0.0);
    let sys_2r = two_body_system(2.0, 1.0, 1.0, 0.0);
    let params = params_for(&sys_r, 0.1);

    let a_r = accel(&derivative(&encode(&sys_r), &params, 0.0), &params.layout(), 0);
    let a_2r = accel(&derivative(&encode(&sys_2r), &params, 0.0), &params.layout(), 0);

    let ratio = a_r.norm() / a_2r.norm();
    assert!((ratio - 4.0).abs() < 1e-12, "Expected 4x, got {}", ratio);
}

#[test]
fn derivative_ignores_time() {
    let bodies = two_body_system(3.0, 1.0, 2.0, 0.0);
    let params = params_for(&bodies, 1.0);
    let state = encode(&bodies);
    assert_eq!(derivative(&state, &params, 0.0), derivative(&state, &params, 123.0));
}

// ==================================================================================
// Codec tests
// ==================================================================================

#[test]
fn encode_decode_round_trip() {
    let lists = vec![
        vec![Body::from_slices("solo", 1.0, &[0.25], &[-3.5], 0.0)],
        vec![
            Body::from_slices("a", 1.0, &[1.0, 2.0, 3.0], &[0.1, 0.2, 0.3], 0.1),
            Body::from_slices("b", 5.0, &[-1e-300, 7.0, 1e12], &[0.0, -0.0, 9.75], 0.2),
            Body::from_slices("c", 0.5, &[std::f64::consts::PI, 0.0, 0.0], &[1.0, 1.0, 1.0], 0.3),
        ],
    ];

    for bodies in lists {
        let dim = bodies[0].dimension();
        let state = encode(&bodies);
        assert_eq!(state.len(), 2 * bodies.len() * dim);

        let (xs, vs) = decode(&state, bodies.len(), dim);
        for (i, b) in bodies.iter().enumerate() {
            assert_eq!(xs[i], b.x);
            assert_eq!(vs[i], b.v);
        }
    }
}

// ==================================================================================
// Collision tests
// ==================================================================================

#[test]
fn detection_boundary_is_inclusive() {
    let layout = StateLayout::new(2, 1);
    let radii = [1.0, 1.0];

    let touching = encode(&[
        Body::from_slices("a", 1.0, &[0.0], &[0.0], 1.0),
        Body::from_slices("b", 1.0, &[2.0], &[0.0], 1.0),
    ]);
    let (hit, pairs) = detect(&touching, &layout, &radii);
    assert!(hit);
    assert_eq!(pairs, vec![(0, 1)]);

    // one ulp further apart
    let apart = encode(&[
        Body::from_slices("a", 1.0, &[0.0], &[0.0], 1.0),
        Body::from_slices("b", 1.0, &[2.0 + 2.0 * f64::EPSILON], &[0.0], 1.0),
    ]);
    let (hit, pairs) = detect(&apart, &layout, &radii);
    assert!(!hit);
    assert!(pairs.is_empty());
}

#[test]
fn equal_mass_head_on_exchanges_velocities() {
    let layout = StateLayout::new(2, 2);
    let state = encode(&[
        Body::from_slices("a", 2.0, &[-0.05, 0.0], &[1.5, 0.0], 0.1),
        Body::from_slices("b", 2.0, &[0.05, 0.0], &[-1.5, 0.0], 0.1),
    ]);

    let after = resolved(&state, &layout, &[2.0, 2.0], &[(0, 1)]);

    assert_eq!(layout.velocity(&after, 0), layout.velocity(&state, 1));
    assert_eq!(layout.velocity(&after, 1), layout.velocity(&state, 0));
}

#[test]
fn unequal_mass_collision_conserves_momentum() {
    let layout = StateLayout::new(2, 3);
    let cases = [
        (1.0, 3.0, [1.0, 0.5, -2.0], [-0.5, 0.0, 4.0]),
        (10.0, 0.1, [0.0, 0.0, 0.0], [3.0, -3.0, 1.0]),
        (2.5, 7.0, [-1.25, 8.0, 0.3], [0.75, -6.0, -0.3]),
    ];

    for (mi, mj, vi, vj) in cases {
        let state = encode(&[
            Body::from_slices("i", mi, &[0.0, 0.0, 0.0], &vi, 1.0),
            Body::from_slices("j", mj, &[0.5, 0.0, 0.0], &vj, 1.0),
        ]);
        let masses = [mi, mj];
        let after = resolved(&state, &layout, &masses, &[(0, 1)]);

        let p0 = total_momentum(&state, &layout, &masses);
        let p1 = total_momentum(&after, &layout, &masses);
        for k in 0..3 {
            assert!(
                (p0[k] - p1[k]).abs() <= 1e-12 * (1.0 + p0[k].abs()),
                "momentum component {k} changed: {} -> {}",
                p0[k],
                p1[k]
            );
        }
    }
}

#[test]
fn colinear_collision_conserves_kinetic_energy() {
    let layout = StateLayout::new(2, 1);
    let masses = [1.0, 4.0];
    let state = encode(&[
        Body::from_slices("i", 1.0, &[0.0], &[3.0], 0.5),
        Body::from_slices("j", 4.0, &[0.9], &[-1.0], 0.5),
    ]);
    let after = resolved(&state, &layout, &masses, &[(0, 1)]);

    let k0 = kinetic_energy(&state, &layout, &masses);
    let k1 = kinetic_energy(&after, &layout, &masses);
    assert!((k0 - k1).abs() < 1e-12);
}

// ==================================================================================
// Driver tests
// ==================================================================================

#[test]
fn two_body_conserves_momentum_and_energy() {
    let bodies = two_body_system(10.0, 1.0, 1.0, 0.1);
    let p = test_params();
    let traj = run_with(&bodies, &p).unwrap();

    assert!(traj.collisions().is_empty());
    assert_eq!(traj.last().unwrap().t, p.t_end);

    let layout = traj.layout();
    let masses = [1.0, 1.0];
    let e0 = total_energy(&traj.first().unwrap().state, &layout, &masses, p.G);

    for s in traj.samples() {
        let momentum = total_momentum(&s.state, &layout, &masses);
        assert!(momentum.norm() < 1e-12, "momentum drifted to {:?} at t = {}", momentum, s.t);

        let e = total_energy(&s.state, &layout, &masses, p.G);
        assert!(((e - e0) / e0).abs() < 1e-6, "energy drifted from {} to {} at t = {}", e0, e, s.t);
    }
}

#[test]
fn run_uses_default_settings() {
    let bodies = two_body_system(10.0, 1.0, 1.0, 0.1);
    let traj = run(&bodies, 1.0, (0.0, 1.0)).unwrap();
    assert_eq!(traj.first().unwrap().t, 0.0);
    assert_eq!(traj.last().unwrap().t, 1.0);
    assert!(traj.len() > 2);
}

#[test]
fn head_on_collision_is_detected_and_resolved() {
    let (bodies, p) = head_on(1.0);
    let traj = run_with(&bodies, &p).unwrap();

    let event = traj.collisions().first().expect("no collision detected");
    assert_eq!(event.pairs, vec![(0, 1)]);

    let layout = traj.layout();
    let before = &event.before;
    let after = &traj.samples()[event.sample].state;

    // contact distance reached, positions untouched, velocities swapped
    let gap = (&layout.position(before, 1) - &layout.position(before, 0)).norm();
    assert!(gap <= 0.2);
    assert_eq!(traj.samples()[event.sample].t, event.t);
    assert_eq!(layout.position(after, 0), layout.position(before, 0));
    assert_eq!(layout.velocity(after, 0), layout.velocity(before, 1));
    assert_eq!(layout.velocity(after, 1), layout.velocity(before, 0));
}

#[test]
fn default_settings_do_not_step_over_a_contact() {
    // no h_max: nothing but the bodies themselves bounds the step
    let (bodies, _) = head_on(1.0);
    let traj = run(&bodies, 1e-9, (0.0, 3.0)).unwrap();

    assert_eq!(traj.collisions().len(), 1);
    let event = &traj.collisions()[0];
    // contact distance 0.2 is reached at t = 0.9, the centers meet at t = 1
    assert!(event.t >= 0.9 - 1e-9 && event.t < 1.0, "collision at t = {}", event.t);

    // the bodies bounced instead of passing through each other
    let layout = traj.layout();
    let last = &traj.last().unwrap().state;
    assert!(layout.position(last, 0)[0] < -1.5);
    assert!(layout.velocity(last, 0)[0] < 0.0);
    assert!(layout.position(last, 1)[0] > 1.5);
}

#[test]
fn initial_overlap_is_resolved_before_first_step() {
    let bodies = vec![
        Body::from_slices("a", 1.0, &[0.0, 0.0], &[1.0, 0.0], 0.5),
        Body::from_slices("b", 1.0, &[0.6, 0.0], &[-1.0, 0.0], 0.5),
    ];
    let mut p = Parameters::new(1e-9, 0.0, 0.01);
    p.h_max = 0.001;
    let traj = run_with(&bodies, &p).unwrap();

    let first = &traj.collisions()[0];
    assert_eq!(first.t, 0.0);
    assert_eq!(first.sample, 0);

    let layout = traj.layout();
    assert_eq!(layout.velocity(&traj.samples()[0].state, 0)[0], -1.0);
    assert_eq!(layout.velocity(&traj.samples()[0].state, 1)[0], 1.0);
}

#[test]
fn interpolation_matches_samples() {
    let bodies = two_body_system(10.0, 1.0, 1.0, 0.1);
    let traj = run_with(&bodies, &test_params()).unwrap();

    let mid = traj.len() / 2;
    let a = &traj.samples()[mid];
    let b = &traj.samples()[mid + 1];
    assert_eq!(traj.at(a.t).unwrap(), a.state);

    let between = traj.at(0.5 * (a.t + b.t)).unwrap();
    assert!((&between - &a.state).norm() < (&b.state - &a.state).norm());
    assert!(traj.at(-1.0).is_none());
}

// ==================================================================================
// Error handling tests
// ==================================================================================

#[test]
fn mismatched_dimensions_are_rejected() {
    let bodies = vec![
        Body::from_slices("flat", 1.0, &[0.0, 0.0], &[0.0, 0.0], 0.1),
        Body::from_slices("deep", 1.0, &[1.0, 0.0, 0.0], &[0.0, 0.0, 0.0], 0.1),
    ];
    let err = run(&bodies, 1.0, (0.0, 1.0)).unwrap_err();
    assert!(matches!(err, SimError::InvalidConfiguration(_)));
    assert!(err.partial().is_none());

    // velocity length disagreeing with position length
    let bodies = vec![Body::from_slices("odd", 1.0, &[0.0, 0.0], &[0.0], 0.1)];
    assert!(matches!(run(&bodies, 1.0, (0.0, 1.0)), Err(SimError::InvalidConfiguration(_))));
}

#[test]
fn non_positive_mass_is_rejected() {
    for m in [0.0, -1.0, f64::NAN] {
        let bodies = two_body_system(10.0, 1.0, m, 0.1);
        assert!(matches!(run(&bodies, 1.0, (0.0, 1.0)), Err(SimError::InvalidConfiguration(_))));
    }
}

#[test]
fn bad_radius_span_and_empty_list_are_rejected() {
    let bodies = two_body_system(10.0, 1.0, 1.0, -0.1);
    assert!(matches!(run(&bodies, 1.0, (0.0, 1.0)), Err(SimError::InvalidConfiguration(_))));

    let bodies = two_body_system(10.0, 1.0, 1.0, 0.1);
    assert!(matches!(run(&bodies, 1.0, (1.0, 1.0)), Err(SimError::InvalidConfiguration(_))));
    assert!(matches!(run(&bodies, 1.0, (2.0, 1.0)), Err(SimError::InvalidConfiguration(_))));
    assert!(matches!(run(&bodies, 0.0, (0.0, 1.0)), Err(SimError::InvalidConfiguration(_))));

    assert!(matches!(run(&[], 1.0, (0.0, 1.0)), Err(SimError::InvalidConfiguration(_))));
}

#[test]
fn coincident_bodies_surface_numeric_degeneracy() {
    // point masses on top of each other: 0/0 in the force
    let bodies = vec![
        Body::from_slices("a", 1.0, &[1.0, 1.0], &[0.0, 0.0], 0.0),
        Body::from_slices("b", 1.0, &[1.0, 1.0], &[0.0, 0.0], 0.0),
    ];
    let err = run(&bodies, 1.0, (0.0, 1.0)).unwrap_err();

    match &err {
        SimError::NumericDegeneracy { bodies, .. } => assert_eq!(bodies, &vec![0, 1]),
        other => panic!("unexpected error {other:?}"),
    }
    // only the initial sample is trustworthy
    assert_eq!(err.partial().unwrap().len(), 1);
}

#[test]
fn exhausted_step_budget_is_an_integrator_failure() {
    let bodies = two_body_system(10.0, 1.0, 1.0, 0.1);
    let mut p = test_params();
    p.max_steps = 5;

    let err = run_with(&bodies, &p).unwrap_err();
    assert!(matches!(err, SimError::IntegratorFailure { .. }));
    let partial = err.partial().unwrap();
    assert!(!partial.is_empty());
    assert!(partial.last().unwrap().t < p.t_end);
}

// ==================================================================================
// Test particle tests
// ==================================================================================

#[test]
fn test_particle_stops_at_first_impact() {
    let particle = Body::from_slices("probe", 1.0, &[0.0, 5.0], &[0.0, 0.0], 0.01);
    let attractors = vec![
        Body::from_slices("far", 1e-3, &[100.0, 0.0], &[0.0, 0.0], 0.1),
        Body::from_slices("planet", 1.0, &[0.0, 0.0], &[0.0, 0.0], 0.5),
    ];
    let mut p = Parameters::new(1.0, 0.0, 100.0);
    p.h_max = 0.01;

    let outcome = run_test_particle(&particle, &attractors, &p).unwrap();
    let impact = outcome.impact.expect("particle should hit the planet");
    assert_eq!(impact.attractor, 1);
    assert_eq!(impact.label, "planet");

    let last = outcome.trajectory.last().unwrap();
    assert_eq!(last.t, impact.t);
    assert!(impact.t < p.t_end);

    let layout = outcome.trajectory.layout();
    let dist = layout.position(&last.state, 0).norm();
    assert!(dist <= 0.51);
}

#[test]
fn test_particle_escaping_runs_to_the_end() {
    let particle = Body::from_slices("probe", 1.0, &[10.0, 0.0], &[1.0, 0.0], 0.01);
    let attractors = vec![Body::from_slices("planet", 1.0, &[0.0, 0.0], &[0.0, 0.0], 0.5)];
    let p = Parameters::new(1.0, 0.0, 20.0);

    let outcome = run_test_particle(&particle, &attractors, &p).unwrap();
    assert!(outcome.impact.is_none());
    assert_eq!(outcome.trajectory.last().unwrap().t, 20.0);
}

#[test]
fn fast_test_particle_hits_with_default_settings() {
    let particle = Body::from_slices("probe", 1.0, &[10.0, 0.0], &[-10.0, 0.0], 0.01);
    let attractors = vec![Body::from_slices("planet", 1.0, &[0.0, 0.0], &[0.0, 0.0], 0.5)];
    let p = Parameters::new(1e-9, 0.0, 5.0);

    let outcome = run_test_particle(&particle, &attractors, &p).unwrap();
    let impact = outcome.impact.expect("particle flew through the planet");
    assert_eq!(impact.label, "planet");
    // surface reached at t = 0.949, the center at t = 1
    assert!(impact.t >= 0.949 - 1e-9 && impact.t < 1.0);
}

#[test]
fn test_particle_dimension_mismatch_is_rejected() {
    let particle = Body::from_slices("probe", 1.0, &[0.0, 5.0], &[0.0, 0.0], 0.01);
    let attractors = vec![Body::from_slices("planet", 1.0, &[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0], 0.5)];
    let p = Parameters::new(1.0, 0.0, 1.0);
    assert!(matches!(
        run_test_particle(&particle, &attractors, &p),
        Err(SimError::InvalidConfiguration(_))
    ));
}

// ==================================================================================
// Configuration tests
// ==================================================================================

const SCENARIO_YAML: &str = r#"
parameters:
  t_end: 2.0
  h0: 0.01
  G: 1.0

bodies:
  - label: heavy
    x: [ 0.0, 0.0 ]
    v: [ 0.0, 0.1 ]
    m: 5.0
    radius: 0.2
  - x: [ 3.0, 0.0 ]
    m: 1.0
"#;

#[test]
fn yaml_scenario_defaults() {
    let cfg: ScenarioConfig = serde_yaml::from_str(SCENARIO_YAML).unwrap();
    let scenario = Scenario::build_scenario(cfg).unwrap();

    assert_eq!(scenario.bodies[0].label, "heavy");
    assert_eq!(scenario.bodies[1].label, "body-1");
    assert_eq!(scenario.bodies[1].v, NVec::zeros(2));
    assert_eq!(scenario.bodies[1].radius, 0.0);
    assert_eq!(scenario.parameters.t_start, 0.0);
    assert_eq!(scenario.parameters.h0, 0.01);
    assert!(scenario.test_particle.is_none());
    assert_eq!(scenario.dimension(), 2);

    let outcome = scenario.run().unwrap();
    assert_eq!(outcome.trajectory().last().unwrap().t, 2.0);
}

#[test]
fn yaml_scenario_with_mismatched_dimensions_fails_to_build() {
    let yaml = r#"
parameters:
  t_end: 1.0
  G: 1.0
bodies:
  - x: [ 0.0, 0.0 ]
    m: 1.0
  - x: [ 1.0, 0.0, 0.0 ]
    m: 1.0
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(matches!(Scenario::build_scenario(cfg), Err(SimError::InvalidConfiguration(_))));
}

#[test]
fn yaml_test_particle_scenario() {
    let yaml = r#"
parameters:
  t_end: 100.0
  h_max: 0.01
  G: 1.0
bodies:
  - label: planet
    x: [ 0.0, 0.0 ]
    m: 1.0
    radius: 0.5
test_particle:
  x: [ 0.0, 3.0 ]
  radius: 0.01
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    let scenario = Scenario::build_scenario(cfg).unwrap();
    assert_eq!(scenario.test_particle.as_ref().unwrap().label, "particle");

    match scenario.run().unwrap() {
        gravsim::ScenarioOutcome::TestParticle(outcome) => {
            assert_eq!(outcome.impact.unwrap().label, "planet");
        }
        other => panic!("expected a test particle run, got {other:?}"),
    }
}
