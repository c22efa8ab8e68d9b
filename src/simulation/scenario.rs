//! Build validated simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle:
//! - numerical parameters (`Parameters`)
//! - bodies at `t_start` (`Vec<Body>`)
//! - optionally a test particle, which turns the bodies into fixed attractors
//!
//! Everything is validated here, before any integration step runs.

use crate::configuration::config::{BodyConfig, ParametersConfig, ScenarioConfig, TestParticleConfig};

use super::engine::{run_test_particle, run_with, validate_bodies, TestParticleOutcome};
use super::error::{SimError, SimResult};
use super::params::Parameters;
use super::states::{Body, NVec};
use super::trajectory::Trajectory;

/// What a scenario produced
#[derive(Debug, Clone)]
pub enum ScenarioOutcome {
    ManyBody(Trajectory),
    TestParticle(TestParticleOutcome),
}

impl ScenarioOutcome {
    pub fn trajectory(&self) -> &Trajectory {
        match self {
            Self::ManyBody(traj) => traj,
            Self::TestParticle(outcome) => &outcome.trajectory,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub parameters: Parameters,
    pub bodies: Vec<Body>,
    pub test_particle: Option<Body>,
}

// velocity defaults to zeros of the position's length
fn velocity_or_rest(x: &[f64], v: Option<&Vec<f64>>) -> NVec {
    match v {
        Some(v) => NVec::from_column_slice(v),
        None => NVec::zeros(x.len()),
    }
}

fn body_from_config(index: usize, bc: &BodyConfig) -> Body {
    let label = bc.label.clone().unwrap_or_else(|| format!("body-{index}"));
    Body::new(
        label,
        bc.m,
        NVec::from_column_slice(&bc.x),
        velocity_or_rest(&bc.x, bc.v.as_ref()),
        bc.radius,
    )
}

fn particle_from_config(pc: &TestParticleConfig) -> Body {
    let label = pc.label.clone().unwrap_or_else(|| "particle".to_string());
    // unit mass only to satisfy body validation
    Body::new(
        label,
        1.0,
        NVec::from_column_slice(&pc.x),
        velocity_or_rest(&pc.x, pc.v.as_ref()),
        pc.radius,
    )
}

fn parameters_from_config(pc: &ParametersConfig) -> Parameters {
    let mut p = Parameters::new(pc.G, pc.t_start, pc.t_end);
    if let Some(h0) = pc.h0 {
        p.h0 = h0;
    }
    if let Some(atol) = pc.atol {
        p.atol = atol;
    }
    if let Some(rtol) = pc.rtol {
        p.rtol = rtol;
    }
    if let Some(h_min) = pc.h_min {
        p.h_min = h_min;
    }
    if let Some(h_max) = pc.h_max {
        p.h_max = h_max;
    }
    if let Some(max_steps) = pc.max_steps {
        p.max_steps = max_steps;
    }
    p
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> SimResult<Self> {
        let parameters = parameters_from_config(&cfg.parameters);
        parameters.validate()?;

        let bodies: Vec<Body> = cfg
            .bodies
            .iter()
            .enumerate()
            .map(|(i, bc)| body_from_config(i, bc))
            .collect();
        let test_particle = cfg.test_particle.as_ref().map(particle_from_config);

        match &test_particle {
            Some(p) => {
                let dim = validate_bodies(std::slice::from_ref(p))?;
                if !bodies.is_empty() && validate_bodies(&bodies)? != dim {
                    return Err(SimError::InvalidConfiguration(
                        "test particle and attractors differ in dimension".to_string(),
                    ));
                }
            }
            None => {
                validate_bodies(&bodies)?;
            }
        }

        Ok(Self {
            parameters,
            bodies,
            test_particle,
        })
    }

    /// Dimension shared by every body in the scenario
    pub fn dimension(&self) -> usize {
        self.test_particle
            .as_ref()
            .or(self.bodies.first())
            .map_or(0, Body::dimension)
    }

    pub fn run(&self) -> SimResult<ScenarioOutcome> {
        match &self.test_particle {
            Some(p) => run_test_particle(p, &self.bodies, &self.parameters).map(ScenarioOutcome::TestParticle),
            None => run_with(&self.bodies, &self.parameters).map(ScenarioOutcome::ManyBody),
        }
    }
}
