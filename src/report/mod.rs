//! Trial result collection
//!
//! The engine guarantees each trial's outcome reaches the reporter exactly
//! once, and that the report is closed exactly once after the last trial.
//! What reporters do with the data is their own business.

pub mod summary;

pub use summary::{FinalSummary, SummaryReporter};

use crate::simulation::TrialOutcome;

pub trait ResultsReporter {
    /// Called once per trial with the trial's outcome
    fn gather_simulation_results(&mut self, outcome: &TrialOutcome);

    /// Called once after all trials have run
    fn report_final_results(&mut self);
}
