use std::time::Instant;

use nalgebra::SVector;

use crate::simulation::error::Result;
use crate::simulation::forces::Gravity;
use crate::simulation::states::{Body, Field};

/// Deterministic field of `n` unit masses spread over a 10x10 square (no rand needed)
pub fn make_field<const D: usize>(n: usize) -> Result<Field<D>> {
    let freqs = [0.37, 0.13, 0.07];
    let mut bodies = Vec::with_capacity(n);

    for i in 0..n {
        let i_f = i as f64;
        let x = SVector::<f64, D>::from_fn(|k, _| {
            let phase = i_f * freqs[k % freqs.len()] + k as f64;
            phase.sin() * 5.0 + i_f * 1e-6 // offset keeps positions distinct
        });
        bodies.push(Body::new(1.0, x, None, false)?);
    }

    Field::with_gravity(bodies, Gravity::new(0.1)?)
}

/// Time `Field::time_step` for growing body counts.
/// Output is CSV so it can go straight into a spreadsheet.
pub fn bench_time_step() -> Result<()> {
    let ns = [100, 200, 400, 800, 1600, 3200];
    let dt = 1e-3;

    println!("N,ms_per_step");

    for n in ns {
        // Small n: average over a few steps to smooth noise
        let steps = if n <= 800 { 5 } else { 1 };
        let mut field = make_field::<2>(n)?;

        // Warm-up
        field.time_step(dt)?;

        let t0 = Instant::now();
        for _ in 0..steps {
            field.time_step(dt)?;
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        println!("{},{:.6}", n, ms);
    }
    Ok(())
}
