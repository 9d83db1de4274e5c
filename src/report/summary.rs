//! Aggregate summary reporter

use serde::Serialize;

use crate::core::types::{DepartureKind, IndividualId};
use crate::report::ResultsReporter;
use crate::simulation::TrialOutcome;

/// Per-trial digest kept by the summary reporter
#[derive(Debug, Clone, Serialize)]
pub struct TrialSummary {
    pub successful: bool,
    pub events: usize,
    pub initiations: usize,
    pub follows: usize,
    pub cancellations: usize,
    pub max_initiator_count: usize,
    pub final_initiators: Vec<IndividualId>,
    pub elapsed: f64,
}

/// Aggregate over a whole experiment
#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalSummary {
    pub trials: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub mean_events_per_trial: f64,
    pub mean_cancellations_per_trial: f64,
    pub mean_elapsed: f64,
    pub max_initiator_count: usize,
}

#[derive(Default)]
pub struct SummaryReporter {
    trials: Vec<TrialSummary>,
    final_summary: Option<FinalSummary>,
}

impl SummaryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trials(&self) -> &[TrialSummary] {
        &self.trials
    }

    /// Available after `report_final_results`
    pub fn final_summary(&self) -> Option<&FinalSummary> {
        self.final_summary.as_ref()
    }
}

impl ResultsReporter for SummaryReporter {
    fn gather_simulation_results(&mut self, outcome: &TrialOutcome) {
        let count = |kind: DepartureKind| {
            outcome
                .history
                .iter()
                .filter(|record| record.kind == kind)
                .count()
        };
        self.trials.push(TrialSummary {
            successful: outcome.successful,
            events: outcome.history.len(),
            initiations: count(DepartureKind::Initiate),
            follows: count(DepartureKind::Follow),
            cancellations: count(DepartureKind::Cancel),
            max_initiator_count: outcome.max_initiator_count,
            final_initiators: outcome.final_initiators.clone(),
            elapsed: outcome.elapsed,
        });
    }

    fn report_final_results(&mut self) {
        let trials = self.trials.len();
        let successes = self.trials.iter().filter(|t| t.successful).count();
        let divisor = trials.max(1) as f64;
        let summary = FinalSummary {
            trials,
            successes,
            success_rate: successes as f64 / divisor,
            mean_events_per_trial: self.trials.iter().map(|t| t.events).sum::<usize>() as f64
                / divisor,
            mean_cancellations_per_trial: self
                .trials
                .iter()
                .map(|t| t.cancellations)
                .sum::<usize>() as f64
                / divisor,
            mean_elapsed: self.trials.iter().map(|t| t.elapsed).sum::<f64>() / divisor,
            max_initiator_count: self
                .trials
                .iter()
                .map(|t| t.max_initiator_count)
                .max()
                .unwrap_or(0),
        };
        tracing::info!(
            trials = summary.trials,
            successes = summary.successes,
            success_rate = summary.success_rate,
            mean_events = summary.mean_events_per_trial,
            "experiment finished"
        );
        self.final_summary = Some(summary);
    }
}
