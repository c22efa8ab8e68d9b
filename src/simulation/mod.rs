pub mod states;
pub mod params;
pub mod codec;
pub mod forces;
pub mod collisions;
pub mod integrator;
pub mod trajectory;
pub mod diagnostics;
pub mod error;
pub mod engine;
pub mod scenario;
