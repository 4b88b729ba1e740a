//! Numerical and physical parameters for a run
//!
//! `Parameters` holds runtime settings:
//! - gravitational constant `g`,
//! - time per tick `dt` and the number of sub-steps it is split into,
//! - an optional tick limit and random seed,
//! - what the driver does when the physics blows up

use serde::Deserialize;

use crate::simulation::error::{Result, SimulationError};
use crate::simulation::forces::GRAVITATIONAL_CONSTANT;

/// Reaction to a numerical failure during a tick
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DivergencePolicy {
    #[serde(rename = "reset")] // discard the field and repopulate from the scenario
    #[default]
    Reset,

    #[serde(rename = "stop")] // hand the error back to the caller
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub g: f64, // gravitational constant
    pub dt: f64, // simulated time per tick
    pub granularity: u32, // sub-steps per tick
    pub max_ticks: Option<u64>, // stop after this many ticks
    pub seed: Option<u64>, // deterministic seed
    pub on_divergence: DivergencePolicy,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            g: GRAVITATIONAL_CONSTANT,
            dt: 0.25,
            granularity: 10,
            max_ticks: None,
            seed: None,
            on_divergence: DivergencePolicy::Reset,
        }
    }
}

impl Parameters {
    /// Length of one sub-step
    pub fn sub_step(&self) -> f64 {
        self.dt / f64::from(self.granularity)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.g.is_finite() {
            return Err(SimulationError::NonFinite { what: "gravitational constant" });
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimulationError::InvalidTimeStep { dt: self.dt });
        }
        if self.granularity == 0 {
            return Err(SimulationError::InvalidConfig("granularity must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_ten_sub_steps_per_tick() {
        let p = Parameters::default();
        assert_eq!(p.g, 6.673e-11);
        assert_eq!(p.sub_step(), 0.025);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn zero_granularity_rejected() {
        let p = Parameters { granularity: 0, ..Parameters::default() };
        assert!(matches!(p.validate(), Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn non_positive_dt_rejected() {
        let p = Parameters { dt: 0.0, ..Parameters::default() };
        assert_eq!(p.validate(), Err(SimulationError::InvalidTimeStep { dt: 0.0 }));
    }
}
