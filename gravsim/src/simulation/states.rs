//! Core state types for the gravity simulation
//!
//! - `Body<D>`: point mass in D dimensions (D = 2 in the usual case)
//! - `Field<D>`: the ordered set of bodies stepped together
//!
//! Vectors are nalgebra `SVector<f64, D>`, so every body in a field shares the
//! same dimensionality by construction.

use std::fmt;

use nalgebra::{SVector, Vector2};

use crate::simulation::error::{Result, SimulationError};
use crate::simulation::forces::{self, Gravity};
use crate::simulation::integrator;

pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone)]
pub struct Body<const D: usize> {
    pub(crate) mass: f64,
    pub(crate) position: SVector<f64, D>,
    pub(crate) velocity: SVector<f64, D>,
    pub(crate) acceleration: SVector<f64, D>, // transient, rebuilt every step
    pub(crate) anchored: bool, // anchored bodies pull but never move
}

impl<const D: usize> Body<D> {
    /// Create a body. A missing velocity defaults to zero.
    ///
    /// Mass only has to be finite here; a positive mass is required once the
    /// body takes part in a force computation or joins a [`Field`].
    pub fn new(mass: f64, position: SVector<f64, D>, velocity: Option<SVector<f64, D>>, anchored: bool) -> Result<Self> {
        if !mass.is_finite() {
            return Err(SimulationError::NonFinite { what: "mass" });
        }
        if !position.iter().all(|c| c.is_finite()) {
            return Err(SimulationError::NonFinite { what: "position" });
        }
        let velocity = velocity.unwrap_or_else(SVector::zeros);
        if !velocity.iter().all(|c| c.is_finite()) {
            return Err(SimulationError::NonFinite { what: "velocity" });
        }

        Ok(Self {
            mass,
            position,
            velocity,
            acceleration: SVector::zeros(),
            anchored,
        })
    }

    /// Create a body from runtime-sized components (config files, user input).
    /// An empty velocity slice means "at rest".
    pub fn from_slices(mass: f64, position: &[f64], velocity: Option<&[f64]>, anchored: bool) -> Result<Self> {
        let position = to_vector::<D>(position)?;
        let velocity = match velocity {
            Some(v) if !v.is_empty() => Some(to_vector::<D>(v)?),
            _ => None,
        };
        Self::new(mass, position, velocity, anchored)
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn position(&self) -> SVector<f64, D> {
        self.position
    }

    pub fn velocity(&self) -> SVector<f64, D> {
        self.velocity
    }

    pub fn acceleration(&self) -> SVector<f64, D> {
        self.acceleration
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn distance_to(&self, other: &Body<D>) -> f64 {
        forces::distance(&self.position, &other.position)
    }

    /// Unit vector toward `other`; `None` if both sit at the same point.
    /// This is the D-dimensional counterpart of [`Body::bearing_to`].
    pub fn direction_to(&self, other: &Body<D>) -> Option<SVector<f64, D>> {
        forces::direction(&self.position, &other.position)
    }

    pub fn acceleration_from(&self, other: &Body<D>, gravity: &Gravity) -> Result<SVector<f64, D>> {
        gravity.acceleration(self, other)
    }

    pub fn reset_acceleration(&mut self) {
        self.acceleration = SVector::zeros();
    }

    /// Superpose the pull of `other` onto this body's acceleration.
    /// On error the acceleration is left as it was.
    pub fn accumulate_pull(&mut self, other: &Body<D>, gravity: &Gravity) -> Result<()> {
        self.acceleration += self.acceleration_from(other, gravity)?;
        Ok(())
    }

    /// Advance velocity then position by `dt` (no-op when anchored)
    pub fn integrate(&mut self, dt: f64) {
        integrator::semi_implicit_euler(self, dt);
    }

    /// Merge two bodies into a new one carrying their total mass.
    ///
    /// The position is the mass-weighted average of the operands, halved:
    /// `(p1 * m1 / M + p2 * m2 / M) / 2`. The result is at rest and free.
    pub fn combine_with(&self, other: &Body<D>) -> Result<Body<D>> {
        let total = self.mass + other.mass;
        if total <= 0.0 {
            return Err(SimulationError::NonPositiveMass { mass: total, index: None });
        }
        let position = (self.position * self.mass / total + other.position * other.mass / total) / 2.0;

        Body::new(total, position, None, false)
    }
}

impl Body<2> {
    /// Angle (radians) of the line from this body to `other`, `atan2(dy, dx)`
    pub fn bearing_to(&self, other: &Body<2>) -> f64 {
        let r = other.position - self.position;
        r[1].atan2(r[0])
    }
}

/// Equal mass and equal position; velocity and acceleration are ignored
impl<const D: usize> PartialEq for Body<D> {
    fn eq(&self, other: &Self) -> bool {
        self.mass == other.mass && self.position == other.position
    }
}

impl<const D: usize> fmt::Display for Body<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({}, [", self.mass)?;
        for (k, c) in self.position.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "])")
    }
}

fn to_vector<const D: usize>(components: &[f64]) -> Result<SVector<f64, D>> {
    if components.len() != D {
        return Err(SimulationError::DimensionalityMismatch {
            expected: D,
            found: components.len(),
        });
    }
    Ok(SVector::from_column_slice(components))
}

// =========================================================================================
// Field
// =========================================================================================

/// Collection of bodies that attract each other.
///
/// The field owns its bodies. Callers only get copies (see [`Field::particles`]),
/// so nothing outside can change the state between steps.
#[derive(Debug, Clone)]
pub struct Field<const D: usize> {
    bodies: Vec<Body<D>>, // insertion order is the summation order
    gravity: Gravity,
}

impl<const D: usize> Field<D> {
    pub fn new(bodies: Vec<Body<D>>) -> Result<Self> {
        Self::with_gravity(bodies, Gravity::default())
    }

    /// Build a field with an explicit force law.
    ///
    /// Rejects an empty body list (`EmptyField`) and any body whose mass is not
    /// positive, so `time_step` and `combined` never see a degenerate field.
    pub fn with_gravity(bodies: Vec<Body<D>>, gravity: Gravity) -> Result<Self> {
        if bodies.is_empty() {
            return Err(SimulationError::EmptyField);
        }
        if let Some((index, b)) = bodies.iter().enumerate().find(|(_, b)| b.mass <= 0.0) {
            return Err(SimulationError::NonPositiveMass { mass: b.mass, index: Some(index) });
        }
        Ok(Self { bodies, gravity })
    }

    /// Snapshot of every body, in insertion order
    pub fn particles(&self) -> Vec<Body<D>> {
        self.bodies.clone()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Always false, a field holds at least one body
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    /// Left fold of [`Body::combine_with`] in insertion order.
    /// A single-body field yields a copy of that body.
    pub fn combined(&self) -> Result<Body<D>> {
        let (first, rest) = self.bodies.split_first().ok_or(SimulationError::EmptyField)?;
        rest.iter().try_fold(first.clone(), |acc, b| acc.combine_with(b))
    }

    /// Advance every body by `dt`.
    ///
    /// A failed pair evaluation returns before anything moves. A `Diverged`
    /// error leaves the non-finite state in place for the caller to inspect.
    pub fn time_step(&mut self, dt: f64) -> Result<()> {
        integrator::euler_step(&mut self.bodies, &self.gravity, dt)
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.mass).sum()
    }

    /// Sum of m * v
    pub fn momentum(&self) -> SVector<f64, D> {
        self.bodies.iter().fold(SVector::zeros(), |p, b| p + b.velocity * b.mass)
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(|b| 0.5 * b.mass * b.velocity.norm_squared()).sum()
    }
}
