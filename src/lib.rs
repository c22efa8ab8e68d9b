pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{Body, NVec, SystemParams};
pub use simulation::params::Parameters;
pub use simulation::codec::{encode, decode, StateLayout};
pub use simulation::forces::{gravity, derivative, NewtonianGravity};
pub use simulation::collisions::{detect, resolve, resolved, elastic, CollisionEvent, Pair};
pub use simulation::integrator::{DormandPrince, OdeSystem, StepFailure};
pub use simulation::trajectory::{Sample, Trajectory};
pub use simulation::engine::{run, run_with, run_test_particle, Impact, TestParticleOutcome};
pub use simulation::scenario::{Scenario, ScenarioOutcome};
pub use simulation::error::{SimError, SimResult};
pub use simulation::diagnostics;

pub use configuration::config::{ParametersConfig, BodyConfig, TestParticleConfig, ScenarioConfig};

pub use benchmark::benchmark::bench_derivative;
