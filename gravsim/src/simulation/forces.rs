//! Pairwise gravitational pull between bodies
//!
//! The law used here scales with inverse *distance*, not inverse square:
//!
//!   F = G * m_self * m_other / |r|
//!   a_self = F / m_self
//!
//! directed from `self` toward `other`. Trajectories depend on this exact
//! form, so it is kept as is. In 2D the direction is `(cos θ, sin θ)` of the
//! bearing `θ = atan2(dy, dx)`; other dimensions use `r / |r|`.

use crate::simulation::error::{Result, SimulationError};
use crate::simulation::states::Body;
use nalgebra::SVector;

/// Gravitational constant in SI units (m^3 kg^-1 s^-2), the value used when
/// nothing else is configured
pub const GRAVITATIONAL_CONSTANT: f64 = 6.673e-11;

/// Gravity force law with an explicit constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub g: f64, // gravitational constant
}

impl Default for Gravity {
    fn default() -> Self {
        Self { g: GRAVITATIONAL_CONSTANT }
    }
}

impl Gravity {
    pub fn new(g: f64) -> Result<Self> {
        if !g.is_finite() {
            return Err(SimulationError::NonFinite { what: "gravitational constant" });
        }
        Ok(Self { g })
    }

    /// Acceleration felt by `on` due to `from`
    ///
    /// Fails with `NonPositiveMass` if either mass is <= 0 and with
    /// `DegenerateSeparation` if the bodies coincide or the result is not finite.
    pub fn acceleration<const D: usize>(&self, on: &Body<D>, from: &Body<D>) -> Result<SVector<f64, D>> {
        for m in [on.mass, from.mass] {
            if m <= 0.0 {
                return Err(SimulationError::NonPositiveMass { mass: m, index: None });
            }
        }

        let r = from.position - on.position; // displacement toward `from`
        let dist = r.norm();
        if dist == 0.0 {
            return Err(SimulationError::DegenerateSeparation { pair: None });
        }

        let force = self.g * on.mass * from.mass / dist;
        let a = force / on.mass;
        let accel = if D == 2 {
            let theta = r[1].atan2(r[0]); // same angle as Body::bearing_to
            SVector::from_fn(|k, _| if k == 0 { theta.cos() * a } else { theta.sin() * a })
        } else {
            r * (a / dist)
        };

        if !accel.iter().all(|c| c.is_finite()) {
            return Err(SimulationError::DegenerateSeparation { pair: None });
        }
        Ok(accel)
    }
}

/// Euclidean distance between two positions
pub fn distance<const D: usize>(p1: &SVector<f64, D>, p2: &SVector<f64, D>) -> f64 {
    (p1 - p2).norm()
}

/// Unit vector pointing from `from` to `to`, `None` when they coincide
pub fn direction<const D: usize>(from: &SVector<f64, D>, to: &SVector<f64, D>) -> Option<SVector<f64, D>> {
    let r = to - from;
    let n = r.norm();
    if n == 0.0 {
        None
    } else {
        Some(r / n)
    }
}
