use std::time::Instant;

use crate::simulation::codec::encode;
use crate::simulation::forces::NewtonianGravity;
use crate::simulation::integrator::OdeSystem;
use crate::simulation::states::{Body, NVec, SystemParams};

/// Helper to build a deterministic cloud of `n` bodies in 3D
fn make_bodies(n: usize) -> Vec<Body> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            // deterministic positions, no rand needed
            let x = NVec::from_column_slice(&[
                (i_f * 0.37).sin() * 5.0,
                (i_f * 0.13).cos() * 5.0,
                (i_f * 0.07).sin() * 5.0,
            ]);
            Body::at_rest(format!("body-{i}"), 1.0, x, 0.01)
        })
        .collect()
}

/// Time one evaluation of the O(N²) vector field for growing N.
/// Prints CSV so the output can be pasted straight into a spreadsheet.
pub fn bench_derivative() {
    let ns = [100, 200, 400, 800, 1600];
    let repeats = 5;

    println!("N,derivative_ms");

    for n in ns {
        let bodies = make_bodies(n);
        let state = encode(&bodies);
        let dynamics = NewtonianGravity::new(SystemParams::from_bodies(&bodies, 0.1));
        let mut out = NVec::zeros(state.len());

        // Warm up
        dynamics.rhs(0.0, &state, &mut out);

        let t0 = Instant::now();
        for _ in 0..repeats {
            dynamics.rhs(0.0, &state, &mut out);
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / repeats as f64;

        println!("{},{:.6}", n, ms);
    }
}
