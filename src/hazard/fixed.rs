//! Deterministic hazard model with preassigned waiting times
//!
//! Useful for wiring up exactly-scripted departures when debugging the
//! engine or asserting on full histories in tests.

use rand_chacha::ChaCha8Rng;

use crate::entity::Individual;
use crate::hazard::HazardModel;

pub struct FixedTimes {
    /// Per-individual initiation times, indexed by id; individuals past the
    /// end never initiate
    pub initiation: Vec<f64>,
    /// Constant follow time for everyone
    pub follow: f64,
    /// Constant cancel time for everyone; use infinity to disable
    /// cancellation
    pub cancel: f64,
}

impl HazardModel for FixedTimes {
    fn initiation_time(&self, individual: &Individual, _rng: &mut ChaCha8Rng) -> f64 {
        self.initiation
            .get(individual.id.index())
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    fn follow_time(
        &self,
        _individual: &Individual,
        _leader: &Individual,
        _observed_group_size: usize,
        _reference_group_size: usize,
        _rng: &mut ChaCha8Rng,
    ) -> f64 {
        self.follow
    }

    fn cancel_time(
        &self,
        _individual: &Individual,
        _departed_including_self: usize,
        _rng: &mut ChaCha8Rng,
    ) -> f64 {
        self.cancel
    }
}
