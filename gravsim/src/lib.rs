pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::error::{Result, SimulationError};
pub use simulation::states::{Body, Field, NVec2};
pub use simulation::forces::{Gravity, GRAVITATIONAL_CONSTANT};
pub use simulation::params::{DivergencePolicy, Parameters};
pub use simulation::scenario::{Population, RandomPopulation, Scenario};
pub use simulation::engine::{Engine, RunSummary, TickOutcome};

pub use configuration::config::{EngineConfig, ParametersConfig, BodyConfig, PopulationConfig, ScenarioConfig};

pub use benchmark::benchmark::bench_time_step;
