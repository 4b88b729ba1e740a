//! Run loop around a `Field`
//!
//! The engine owns the policy the core leaves to its caller:
//! - sub-stepping: each tick is `granularity` steps of `dt / granularity`
//! - recovery: on a numerical failure either repopulate (`Reset`) or give the
//!   error back (`Stop`)
//! - termination: stop once every body has left the bounding box, or after
//!   `max_ticks`

use nalgebra::SVector;
use rand::{rng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::simulation::error::{Result, SimulationError};
use crate::simulation::params::{DivergencePolicy, Parameters};
use crate::simulation::scenario::Scenario;
use crate::simulation::states::Field;

/// What happened during one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Advanced,
    /// Every body is outside the bounds
    Escaped,
    /// A sub-step failed and the field was repopulated
    Reset { cause: SimulationError },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub resets: u64,
    pub escaped: bool,
    pub time: f64, // simulated time since the last reset
}

pub struct Engine<const D: usize> {
    scenario: Scenario<D>,
    field: Field<D>,
    rng: ChaCha8Rng,
    ticks: u64, // ticks completed over the whole run
    resets: u64,
    time: f64,
}

impl<const D: usize> Engine<D> {
    /// Build the engine and the first field.
    ///
    /// Without `max_ticks` and without bounds a run could never end, so that
    /// combination is rejected.
    pub fn new(scenario: Scenario<D>) -> Result<Self> {
        scenario.validate()?;
        if scenario.parameters.max_ticks.is_none() && scenario.bounds.is_none() {
            return Err(SimulationError::InvalidConfig(
                "a run needs max_ticks or bounds to terminate".into(),
            ));
        }

        let mut rng: ChaCha8Rng = match scenario.parameters.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        let field = scenario.populate(&mut rng)?;

        Ok(Self {
            scenario,
            field,
            rng,
            ticks: 0,
            resets: 0,
            time: 0.0,
        })
    }

    pub fn field(&self) -> &Field<D> {
        &self.field
    }

    pub fn parameters(&self) -> &Parameters {
        &self.scenario.parameters
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn resets(&self) -> u64 {
        self.resets
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Throw the current field away and start over from the scenario
    pub fn reset(&mut self) -> Result<()> {
        self.field = self.scenario.populate(&mut self.rng)?;
        self.resets += 1;
        self.time = 0.0;
        Ok(())
    }

    /// Advance by one tick (`granularity` sub-steps)
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let params = &self.scenario.parameters;
        let (h, steps, dt, policy) = (params.sub_step(), params.granularity, params.dt, params.on_divergence);

        for _ in 0..steps {
            if let Err(cause) = self.field.time_step(h) {
                return match policy {
                    DivergencePolicy::Reset if cause.is_numerical() => {
                        self.reset()?;
                        self.ticks += 1;
                        Ok(TickOutcome::Reset { cause })
                    }
                    _ => Err(cause),
                };
            }
        }

        self.ticks += 1;
        self.time += dt;

        if self.all_escaped() {
            Ok(TickOutcome::Escaped)
        } else {
            Ok(TickOutcome::Advanced)
        }
    }

    /// Tick until every body escapes or `max_ticks` is reached.
    /// `observer` sees the field after each tick.
    pub fn run<F>(&mut self, mut observer: F) -> Result<RunSummary>
    where
        F: FnMut(u64, &TickOutcome, &Field<D>),
    {
        let mut escaped = false;
        while self.scenario.parameters.max_ticks.map_or(true, |m| self.ticks < m) {
            let outcome = self.tick()?;
            observer(self.ticks, &outcome, &self.field);
            if outcome == TickOutcome::Escaped {
                escaped = true;
                break;
            }
        }

        Ok(RunSummary {
            ticks: self.ticks,
            resets: self.resets,
            escaped,
            time: self.time,
        })
    }

    fn all_escaped(&self) -> bool {
        match &self.scenario.bounds {
            Some(extent) => self.field.particles().iter().all(|b| outside(&b.position(), extent)),
            None => false,
        }
    }
}

fn outside<const D: usize>(p: &SVector<f64, D>, extent: &SVector<f64, D>) -> bool {
    p.iter().zip(extent.iter()).any(|(c, a)| *c < 0.0 || c > a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::scenario::Population;
    use crate::simulation::states::{Body, NVec2};

    fn scenario(bodies: Vec<Body<2>>, params: Parameters, bounds: Option<NVec2>) -> Scenario<2> {
        Scenario { parameters: params, bounds, population: Population::Fixed(bodies) }
    }

    fn body(m: f64, x: f64, y: f64, vx: f64) -> Body<2> {
        Body::new(m, NVec2::new(x, y), Some(NVec2::new(vx, 0.0)), false).unwrap()
    }

    #[test]
    fn endless_run_rejected() {
        let s = scenario(vec![body(1.0, 0.0, 0.0, 0.0)], Parameters::default(), None);
        assert!(matches!(Engine::new(s), Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn runs_to_tick_limit() {
        let params = Parameters { max_ticks: Some(5), ..Parameters::default() };
        let s = scenario(vec![body(1.0, 0.0, 0.0, 0.0), body(1.0, 1.0, 0.0, 0.0)], params, None);
        let mut engine = Engine::new(s).unwrap();

        let mut seen = Vec::new();
        let summary = engine.run(|t, _, _| seen.push(t)).unwrap();

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(summary.ticks, 5);
        assert!(!summary.escaped);
        assert!((summary.time - 1.25).abs() < 1e-12);
    }

    #[test]
    fn stops_once_everything_left_the_box() {
        let params = Parameters { g: 0.0, dt: 1.0, granularity: 2, max_ticks: Some(100), ..Parameters::default() };
        // both drift right at 4 units per tick, box is 10 wide
        let bodies = vec![body(1.0, 1.0, 5.0, 4.0), body(1.0, 3.0, 5.0, 4.0)];
        let mut engine = Engine::new(scenario(bodies, params, Some(NVec2::new(10.0, 10.0)))).unwrap();

        let summary = engine.run(|_, _, _| {}).unwrap();
        assert!(summary.escaped);
        // x = 1 + 4t > 10 first at t = 3
        assert_eq!(summary.ticks, 3);
    }

    #[test]
    fn divergence_resets_by_default() {
        // head-on collision lands both bodies on x = 1 after the first sub-step
        let params = Parameters { g: 0.0, dt: 1.0, granularity: 2, max_ticks: Some(1), ..Parameters::default() };
        let bodies = vec![body(1.0, 0.0, 0.0, 2.0), body(1.0, 2.0, 0.0, -2.0)];
        let mut engine = Engine::new(scenario(bodies.clone(), params, None)).unwrap();

        let outcome = engine.tick().unwrap();
        assert_eq!(outcome, TickOutcome::Reset { cause: SimulationError::DegenerateSeparation { pair: Some((0, 1)) } });
        assert_eq!(engine.resets(), 1);
        assert_eq!(engine.field().particles(), bodies);
    }

    #[test]
    fn stop_policy_surfaces_the_error() {
        let params = Parameters {
            g: 0.0,
            dt: 1.0,
            granularity: 2,
            max_ticks: Some(1),
            on_divergence: DivergencePolicy::Stop,
            ..Parameters::default()
        };
        let bodies = vec![body(1.0, 0.0, 0.0, 2.0), body(1.0, 2.0, 0.0, -2.0)];
        let mut engine = Engine::new(scenario(bodies, params, None)).unwrap();

        let err = engine.run(|_, _, _| {}).unwrap_err();
        assert!(matches!(err, SimulationError::DegenerateSeparation { .. }));
    }
}
