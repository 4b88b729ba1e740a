//! Error type shared by the simulation core
//!
//! Every failure is local and synchronous: it is returned to whoever called
//! `time_step`, `combined` or `combine_with`. Recovery (reseeding, stopping)
//! belongs to the driver, see [`crate::simulation::engine`].

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// A runtime-sized vector did not match the simulation dimension
    #[error("dimensionality mismatch: expected {expected} components, found {found}")]
    DimensionalityMismatch { expected: usize, found: usize },

    /// Two bodies coincide (or the force blew up), the pull is unbounded
    #[error("degenerate separation{}", describe_pair(.pair))]
    DegenerateSeparation { pair: Option<(usize, usize)> },

    /// Mass <= 0 where a positive mass is required
    #[error("non-positive mass {mass}{}", describe_index(.index))]
    NonPositiveMass { mass: f64, index: Option<usize> },

    /// NaN or infinite input
    #[error("{what} must be finite")]
    NonFinite { what: &'static str },

    #[error("field has no bodies")]
    EmptyField,

    #[error("time step must be finite, got {dt}")]
    InvalidTimeStep { dt: f64 },

    /// Integration produced a NaN or infinite position/velocity
    #[error("body {index} diverged to a non-finite state")]
    Diverged { index: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SimulationError {
    /// Attach pair indices to a failure coming out of a pairwise evaluation
    pub(crate) fn at_pair(self, i: usize, j: usize) -> Self {
        match self {
            SimulationError::DegenerateSeparation { .. } => {
                SimulationError::DegenerateSeparation { pair: Some((i, j)) }
            }
            other => other,
        }
    }

    /// True for failures a driver may treat as "physics went divergent"
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            SimulationError::DegenerateSeparation { .. } | SimulationError::Diverged { .. }
        )
    }
}

fn describe_pair(pair: &Option<(usize, usize)>) -> String {
    match pair {
        Some((i, j)) => format!(" between bodies {i} and {j}"),
        None => String::new(),
    }
}

fn describe_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" on body {i}"),
        None => String::new(),
    }
}
