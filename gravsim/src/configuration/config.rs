//! Configuration types for loading simulation scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`EngineConfig`]     – dimension, step size, sub-steps, stop conditions
//! - [`ParametersConfig`] – gravitational constant and seed
//! - [`BodyConfig`]       – explicit initial state for each body, or
//! - [`PopulationConfig`] – a randomly generated population
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   dimension: 2            # length of every vector below
//!   dt: 0.25                # simulated time per tick
//!   granularity: 10         # sub-steps per tick
//!   max_ticks: 2400
//!   bounds: [1920.0, 1080.0]
//!   on_divergence: "reset"  # or "stop"
//!
//! parameters:
//!   G: 6.673e-11
//!   seed: 42
//!
//! bodies:
//!   - x: [0.0, 0.0]
//!     m: 1.0e10
//!     anchored: true
//!   - x: [1.0, 0.0]
//!     v: [0.0, 0.5]
//!     m: 1.0
//! ```
//!
//! `bodies` and `population` are mutually exclusive; see
//! [`crate::simulation::scenario::Scenario::build_scenario`].

use serde::Deserialize;

use crate::simulation::forces::GRAVITATIONAL_CONSTANT;
use crate::simulation::params::DivergencePolicy;

#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub dimension: usize, // number of components per vector
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_granularity")]
    pub granularity: u32,
    #[serde(default)]
    pub max_ticks: Option<u64>,
    #[serde(default)]
    pub bounds: Option<Vec<f64>>, // box [0, extent] per axis, for escape checks and placement
    #[serde(default)]
    pub on_divergence: DivergencePolicy,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    #[serde(rename = "G", default = "default_g")]
    pub g: f64,
    #[serde(default)]
    pub seed: Option<u64>, // makes random populations reproducible
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self { g: GRAVITATIONAL_CONSTANT, seed: None }
    }
}

/// Initial state of one body
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // position
    #[serde(default)]
    pub v: Vec<f64>, // velocity, empty means at rest
    pub m: f64, // mass
    #[serde(default)]
    pub anchored: bool,
}

/// Random population, drawn inside `engine.bounds`
#[derive(Deserialize, Debug, Clone)]
pub struct PopulationConfig {
    #[serde(default = "default_count_min")]
    pub count_min: usize,
    #[serde(default = "default_count_max")]
    pub count_max: usize,
    #[serde(default = "default_mass_exponents")]
    pub mass_exponents: [i32; 2], // masses in [10^a, 10^b]
    #[serde(default = "default_speed")]
    pub speed: f64, // velocity components in [-speed/2, speed/2]
    #[serde(default = "default_central_mass")]
    pub central_mass: bool, // add a heavy body near the centre
}

#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub bodies: Option<Vec<BodyConfig>>,
    #[serde(default)]
    pub population: Option<PopulationConfig>,
}

fn default_dt() -> f64 {
    0.25
}

fn default_granularity() -> u32 {
    10
}

fn default_g() -> f64 {
    GRAVITATIONAL_CONSTANT
}

fn default_count_min() -> usize {
    3
}

fn default_count_max() -> usize {
    15
}

fn default_mass_exponents() -> [i32; 2] {
    [8, 12]
}

fn default_speed() -> f64 {
    24.0
}

fn default_central_mass() -> bool {
    true
}
