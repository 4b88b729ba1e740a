//! Build runnable scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a `Scenario<D>`:
//! - numerical parameters (`Parameters`)
//! - optional bounding box
//! - a `Population` that can (re)create the initial `Field` on demand
//!
//! The driver repopulates from the scenario whenever it resets a run.

use nalgebra::SVector;
use rand::Rng;

use crate::configuration::config::{BodyConfig, PopulationConfig, ScenarioConfig};
use crate::simulation::error::{Result, SimulationError};
use crate::simulation::forces::Gravity;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, Field};

/// Upper limit on `count_max` for a random population
pub const MAX_BODIES: usize = 10_000;

/// Random population settings
#[derive(Debug, Clone, PartialEq)]
pub struct RandomPopulation<const D: usize> {
    pub count_min: usize,
    pub count_max: usize,
    pub mass_exponents: (i32, i32), // masses drawn from [10^lo, 10^hi]
    pub speed: f64, // velocity components in [-speed/2, speed/2]
    pub extent: SVector<f64, D>, // positions drawn from [0, extent]
    pub central_mass: bool, // heavy resting body near the centre
}

impl<const D: usize> RandomPopulation<D> {
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Vec<Body<D>> {
        let n = rng.random_range(self.count_min..=self.count_max);
        let lo = 10f64.powi(self.mass_exponents.0);
        let hi = 10f64.powi(self.mass_exponents.1);

        let mut bodies = Vec::with_capacity(n + 1);
        for _ in 0..n {
            let mass = rng.random_range(lo..=hi);
            let position = SVector::<f64, D>::from_fn(|k, _| rng.random_range(0.0..=self.extent[k]));
            let velocity = SVector::<f64, D>::from_fn(|_, _| (rng.random::<f64>() - 0.5) * self.speed);
            bodies.push(Body { mass, position, velocity, acceleration: SVector::zeros(), anchored: false });
        }

        if self.central_mass {
            // within an eighth of the extent around the centre
            let position = SVector::<f64, D>::from_fn(|k, _| {
                let a = self.extent[k];
                (rng.random::<f64>() - 0.5) * a / 4.0 + a / 2.0
            });
            bodies.push(Body { mass: hi, position, velocity: SVector::zeros(), acceleration: SVector::zeros(), anchored: false });
        }
        bodies
    }

    fn validate(&self) -> Result<()> {
        if (self.count_min == 0 && !self.central_mass) || self.count_min > self.count_max {
            return Err(SimulationError::InvalidConfig(format!(
                "body count range [{}, {}] is empty or can produce an empty field",
                self.count_min, self.count_max
            )));
        }
        if self.count_max > MAX_BODIES {
            return Err(SimulationError::InvalidConfig(format!(
                "count_max {} exceeds the limit of {MAX_BODIES} bodies",
                self.count_max
            )));
        }
        if self.mass_exponents.0 > self.mass_exponents.1 {
            return Err(SimulationError::InvalidConfig("mass exponents must be ascending".into()));
        }
        // both ends of the mass range must be positive, finite f64 values
        let (lo, hi) = (10f64.powi(self.mass_exponents.0), 10f64.powi(self.mass_exponents.1));
        if lo <= 0.0 || !hi.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "mass exponents [{}, {}] leave the range of f64",
                self.mass_exponents.0, self.mass_exponents.1
            )));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(SimulationError::InvalidConfig("speed must be finite and >= 0".into()));
        }
        if !self.extent.iter().all(|a| a.is_finite() && *a > 0.0) {
            return Err(SimulationError::InvalidConfig("bounds must be finite and > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Population<const D: usize> {
    Fixed(Vec<Body<D>>),
    Random(RandomPopulation<D>),
}

/// Everything needed to (re)start a run
#[derive(Debug, Clone)]
pub struct Scenario<const D: usize> {
    pub parameters: Parameters,
    pub bounds: Option<SVector<f64, D>>,
    pub population: Population<D>,
}

impl<const D: usize> Scenario<D> {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        if cfg.engine.dimension != D {
            return Err(SimulationError::DimensionalityMismatch {
                expected: D,
                found: cfg.engine.dimension,
            });
        }

        // Parameters (runtime) from engine + parameters config
        let parameters = Parameters {
            g: cfg.parameters.g,
            dt: cfg.engine.dt,
            granularity: cfg.engine.granularity,
            max_ticks: cfg.engine.max_ticks,
            seed: cfg.parameters.seed,
            on_divergence: cfg.engine.on_divergence,
        };
        parameters.validate()?;

        let bounds = match &cfg.engine.bounds {
            Some(b) => Some(to_extent::<D>(b)?),
            None => None,
        };

        let population = match (cfg.bodies, cfg.population) {
            (Some(bodies), None) => Population::Fixed(
                bodies.iter().map(body_from_config::<D>).collect::<Result<Vec<_>>>()?,
            ),
            (None, Some(pop)) => {
                let extent = bounds.ok_or_else(|| {
                    SimulationError::InvalidConfig("a random population needs engine.bounds".into())
                })?;
                Population::Random(random_from_config(&pop, extent))
            }
            (Some(_), Some(_)) => {
                return Err(SimulationError::InvalidConfig(
                    "give either bodies or population, not both".into(),
                ))
            }
            (None, None) => {
                return Err(SimulationError::InvalidConfig("no bodies and no population".into()))
            }
        };

        let scenario = Self { parameters, bounds, population };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the scenario can produce a field
    pub fn validate(&self) -> Result<()> {
        self.parameters.validate()?;
        match &self.population {
            Population::Fixed(bodies) if bodies.is_empty() => Err(SimulationError::EmptyField),
            Population::Fixed(_) => Ok(()),
            Population::Random(r) => r.validate(),
        }
    }

    /// Create a fresh field for this scenario
    pub fn populate<R: Rng>(&self, rng: &mut R) -> Result<Field<D>> {
        let bodies = match &self.population {
            Population::Fixed(bodies) => bodies.clone(),
            Population::Random(r) => r.generate(rng),
        };
        Field::with_gravity(bodies, Gravity::new(self.parameters.g)?)
    }
}

fn body_from_config<const D: usize>(bc: &BodyConfig) -> Result<Body<D>> {
    Body::from_slices(bc.m, &bc.x, Some(&bc.v), bc.anchored)
}

fn random_from_config<const D: usize>(pc: &PopulationConfig, extent: SVector<f64, D>) -> RandomPopulation<D> {
    RandomPopulation {
        count_min: pc.count_min,
        count_max: pc.count_max,
        mass_exponents: (pc.mass_exponents[0], pc.mass_exponents[1]),
        speed: pc.speed,
        extent,
        central_mass: pc.central_mass,
    }
}

fn to_extent<const D: usize>(b: &[f64]) -> Result<SVector<f64, D>> {
    if b.len() != D {
        return Err(SimulationError::DimensionalityMismatch { expected: D, found: b.len() });
    }
    Ok(SVector::from_column_slice(b))
}
