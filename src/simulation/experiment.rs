//! Multi-trial experiment runner
//!
//! The population is built once per experiment and reset between trials, so
//! personality drift accumulates across trials while all per-episode
//! relationship state starts clean.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimConfig;
use crate::core::error::{Result, SimError};
use crate::entity::personality::create_personality_calculator;
use crate::entity::PersonalityCalculator;
use crate::hazard::{create_hazard_model, HazardModel};
use crate::population::build_population;
use crate::report::ResultsReporter;
use crate::simulation::driver::run_trial;
use crate::simulation::state::SimulationState;

pub struct Experiment {
    config: SimConfig,
    state: SimulationState,
    hazard: Box<dyn HazardModel>,
    personality: Box<dyn PersonalityCalculator>,
    rng: ChaCha8Rng,
}

impl Experiment {
    /// Validate the config, build the population and resolve the pluggable
    /// collaborators
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let individuals = build_population(&config, &mut rng)?;
        if individuals.len() < 2 {
            return Err(SimError::Invariant(format!(
                "population collapsed to {} individuals after pruning; nothing to simulate",
                individuals.len()
            )));
        }

        let hazard = create_hazard_model(&config.hazard_model, &config.hazard)?;
        let personality =
            create_personality_calculator(&config.personality_model, &config.personality)?;
        let state = SimulationState::new(individuals);

        Ok(Self {
            config,
            state,
            hazard,
            personality,
            rng,
        })
    }

    /// Run every trial, feeding each outcome to the reporter, then close the
    /// report
    pub fn run(&mut self, reporter: &mut dyn ResultsReporter) -> Result<()> {
        tracing::info!(
            individuals = self.state.len(),
            trials = self.config.trial_count,
            seed = self.config.seed,
            "starting experiment"
        );
        for trial in 0..self.config.trial_count {
            self.state.reset();
            let outcome = run_trial(
                &mut self.state,
                &*self.hazard,
                &*self.personality,
                &self.config,
                &mut self.rng,
            )?;
            tracing::debug!(
                trial,
                successful = outcome.successful,
                events = outcome.history.len(),
                elapsed = outcome.elapsed,
                "trial complete"
            );
            reporter.gather_simulation_results(&outcome);
        }
        reporter.report_final_results();
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }
}
