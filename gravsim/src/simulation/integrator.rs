//! Fixed-step integration for a field of bodies
//!
//! One step is three passes over the bodies:
//! 1. reset accelerations,
//! 2. accumulate the pull of every unordered pair (i < j, ascending),
//! 3. semi-implicit Euler: `v += a dt`, then `x += v dt` with the new `v`.
//!
//! With the `parallel` feature, pass 2 runs one rayon task per body. Each task
//! adds contributions in ascending partner order, which is the same order the
//! serial pair loop produces for that body, so both paths agree bit for bit.

use nalgebra::SVector;

use super::error::{Result, SimulationError};
use super::forces::Gravity;
use super::states::Body;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Semi-implicit (symplectic) Euler update of a single body
pub fn semi_implicit_euler<const D: usize>(body: &mut Body<D>, dt: f64) {
    if body.anchored {
        return;
    }
    body.velocity += body.acceleration * dt; // kick with the current acceleration
    body.position += body.velocity * dt; // drift with the updated velocity
}

/// Advance all `bodies` by `dt` under `gravity`
pub fn euler_step<const D: usize>(bodies: &mut [Body<D>], gravity: &Gravity, dt: f64) -> Result<()> {
    if !dt.is_finite() {
        return Err(SimulationError::InvalidTimeStep { dt });
    }
    if bodies.is_empty() {
        return Err(SimulationError::EmptyField);
    }

    for b in bodies.iter_mut() {
        b.reset_acceleration();
    }

    #[cfg(not(feature = "parallel"))]
    accumulate_pairs(bodies, gravity)?;
    #[cfg(feature = "parallel")]
    accumulate_parallel(bodies, gravity)?;

    for b in bodies.iter_mut() {
        semi_implicit_euler(b, dt);
    }

    // NaN/inf positions are what the old drawing loop tripped over
    match bodies.iter().position(|b| !is_finite_state(b)) {
        Some(index) => Err(SimulationError::Diverged { index }),
        None => Ok(()),
    }
}

/// Serial O(n^2) superposition over unordered pairs, ascending (i, j)
#[cfg_attr(feature = "parallel", allow(dead_code))]
pub(crate) fn accumulate_pairs<const D: usize>(bodies: &mut [Body<D>], gravity: &Gravity) -> Result<()> {
    let n = bodies.len();
    for i in 0..n {
        // split so body i and every j > i can be borrowed mutably together
        let (head, tail) = bodies.split_at_mut(i + 1);
        let bi = &mut head[i];

        for (k, bj) in tail.iter_mut().enumerate() {
            let j = i + 1 + k;
            bi.accumulate_pull(bj, gravity).map_err(|e| e.at_pair(i, j))?;
            bj.accumulate_pull(bi, gravity).map_err(|e| e.at_pair(j, i))?;
        }
    }
    Ok(())
}

/// Per-body partial sums computed concurrently, then written back
#[cfg(feature = "parallel")]
pub(crate) fn accumulate_parallel<const D: usize>(bodies: &mut [Body<D>], gravity: &Gravity) -> Result<()> {
    let snapshot: &[Body<D>] = bodies;
    let sums: Vec<Result<SVector<f64, D>>> = (0..snapshot.len())
        .into_par_iter()
        .map(|i| net_pull(snapshot, i, gravity))
        .collect();

    // collect in body order so the reported failure is deterministic
    let sums = sums.into_iter().collect::<Result<Vec<_>>>()?;
    for (b, a) in bodies.iter_mut().zip(sums) {
        b.acceleration = a;
    }
    Ok(())
}

/// Net acceleration on body `i`, partners visited in ascending index order
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
fn net_pull<const D: usize>(bodies: &[Body<D>], i: usize, gravity: &Gravity) -> Result<SVector<f64, D>> {
    let on = &bodies[i];
    let mut acc = SVector::<f64, D>::zeros();
    for (j, from) in bodies.iter().enumerate() {
        if j == i {
            continue;
        }
        acc += gravity.acceleration(on, from).map_err(|e| e.at_pair(i, j))?;
    }
    Ok(acc)
}

fn is_finite_state<const D: usize>(b: &Body<D>) -> bool {
    b.position.iter().chain(b.velocity.iter()).all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::NVec2;
    use approx::assert_relative_eq;

    fn body(m: f64, x: f64, y: f64) -> Body<2> {
        Body::new(m, NVec2::new(x, y), None, false).unwrap()
    }

    #[test]
    fn velocity_updates_before_position() {
        let mut b = Body::new(1.0, NVec2::zeros(), Some(NVec2::new(1.0, 0.0)), false).unwrap();
        b.acceleration = NVec2::new(2.0, 0.0);
        semi_implicit_euler(&mut b, 0.5);
        // v = 1 + 2 * 0.5 = 2, x = 0 + 2 * 0.5 = 1 (explicit Euler would give 0.5)
        assert_eq!(b.velocity(), NVec2::new(2.0, 0.0));
        assert_eq!(b.position(), NVec2::new(1.0, 0.0));
    }

    #[test]
    fn anchored_body_ignores_acceleration() {
        let mut b = Body::new(1.0, NVec2::new(3.0, 4.0), None, true).unwrap();
        b.acceleration = NVec2::new(10.0, -10.0);
        semi_implicit_euler(&mut b, 1.0);
        assert_eq!(b.position(), NVec2::new(3.0, 4.0));
        assert_eq!(b.velocity(), NVec2::zeros());
    }

    #[test]
    fn per_body_sum_matches_pair_loop() {
        let g = Gravity::new(1.0).unwrap();
        let mut bodies = vec![
            body(1.0, 0.0, 0.0),
            body(2.5, 1.3, -0.7),
            body(0.3, -2.0, 0.4),
            body(7.0, 0.9, 3.1),
            body(1.1, -0.5, -1.9),
        ];
        accumulate_pairs(&mut bodies, &g).unwrap();
        for i in 0..bodies.len() {
            let expected = net_pull(&bodies, i, &g).unwrap();
            // identical summation order, identical bits
            assert_eq!(bodies[i].acceleration(), expected);
        }
    }

    #[test]
    fn degenerate_pair_is_reported_and_nothing_moves() {
        let g = Gravity::default();
        let mut bodies = vec![body(1.0, 0.0, 0.0), body(1.0, 5.0, 5.0), body(1.0, 5.0, 5.0)];
        let before: Vec<_> = bodies.iter().map(|b| b.position()).collect();

        let err = euler_step(&mut bodies, &g, 1.0).unwrap_err();
        assert_eq!(err, SimulationError::DegenerateSeparation { pair: Some((1, 2)) });

        let after: Vec<_> = bodies.iter().map(|b| b.position()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn non_finite_dt_rejected() {
        let mut bodies = vec![body(1.0, 0.0, 0.0), body(1.0, 1.0, 0.0)];
        let err = euler_step(&mut bodies, &Gravity::default(), f64::NAN).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidTimeStep { .. }));
    }

    #[test]
    fn overflow_is_reported_as_divergence() {
        let g = Gravity::new(1.0).unwrap();
        let mut bodies = vec![body(1.0, 0.0, 0.0), body(1.0, 1.0, 0.0)];
        let err = euler_step(&mut bodies, &g, 1e200).unwrap_err();
        assert_eq!(err, SimulationError::Diverged { index: 0 });
    }

    #[test]
    fn empty_slice_is_rejected() {
        let mut bodies: Vec<Body<2>> = Vec::new();
        assert_eq!(euler_step(&mut bodies, &Gravity::default(), 1.0).unwrap_err(), SimulationError::EmptyField);
    }

    #[test]
    fn pair_accelerations_balance() {
        let g = Gravity::new(1.0).unwrap();
        let mut bodies = vec![body(2.0, 0.0, 0.0), body(3.0, 1.0, 2.0)];
        accumulate_pairs(&mut bodies, &g).unwrap();
        let net = bodies[0].acceleration() * 2.0 + bodies[1].acceleration() * 3.0;
        assert_relative_eq!(net.norm(), 0.0, epsilon = 1e-12);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_matches_serial_bitwise() {
        let g = Gravity::new(0.5).unwrap();
        let bodies: Vec<Body<2>> = (0..40)
            .map(|i| {
                let f = i as f64;
                body(1.0 + (f * 0.3).sin().abs(), (f * 0.37).sin() * 5.0, (f * 0.13).cos() * 5.0)
            })
            .collect();

        let mut serial = bodies.clone();
        let mut parallel = bodies;
        accumulate_pairs(&mut serial, &g).unwrap();
        accumulate_parallel(&mut parallel, &g).unwrap();

        for (s, p) in serial.iter().zip(&parallel) {
            assert_eq!(s.acceleration(), p.acceleration());
        }
    }
}
