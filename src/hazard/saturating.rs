//! Default hazard model with mimetic, saturating follow rates

use rand_chacha::ChaCha8Rng;

use crate::core::config::HazardParams;
use crate::entity::Individual;
use crate::hazard::{exponential_waiting_time, HazardModel};

/// Saturating-rate hazard model
///
/// - Initiation: base rate scaled by the individual's personality and
///   assertiveness, so bold individuals move first on average.
/// - Follow: rises with the observed departed membership through
///   `observed / (observed + h * reference)`, approaching the ceiling as
///   the observed group saturates its reference.
/// - Cancel: falls linearly toward zero as the follower share of the
///   individual's neighborhood approaches the threshold, beyond which the
///   initiator is committed and the waiting time is infinite.
pub struct SaturatingHazards {
    params: HazardParams,
}

impl SaturatingHazards {
    pub fn new(params: HazardParams) -> Self {
        Self { params }
    }
}

impl HazardModel for SaturatingHazards {
    fn initiation_time(&self, individual: &Individual, rng: &mut ChaCha8Rng) -> f64 {
        let boldness = (0.1 + 0.9 * individual.personality) * (0.5 + 0.5 * individual.assertiveness);
        exponential_waiting_time(self.params.initiation_rate * boldness, rng)
    }

    fn follow_time(
        &self,
        individual: &Individual,
        _leader: &Individual,
        observed_group_size: usize,
        reference_group_size: usize,
        rng: &mut ChaCha8Rng,
    ) -> f64 {
        let observed = observed_group_size as f64;
        let reference = reference_group_size.max(1) as f64;
        let saturation = observed / (observed + self.params.follow_half_fraction * reference);
        // Hesitant individuals need a fuller group before they commit
        let rate = self.params.follow_max_rate * saturation * (0.5 + 0.5 * individual.personality);
        exponential_waiting_time(rate, rng)
    }

    fn cancel_time(
        &self,
        individual: &Individual,
        departed_including_self: usize,
        rng: &mut ChaCha8Rng,
    ) -> f64 {
        let neighborhood = individual.neighbors.len().max(1) as f64;
        let share = departed_including_self.saturating_sub(1) as f64 / neighborhood;
        if share >= self.params.cancel_threshold {
            return f64::INFINITY;
        }
        let rate = self.params.cancel_rate * (1.0 - share / self.params.cancel_threshold);
        exponential_waiting_time(rate, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::core::types::{IndividualId, Vec2};
    use crate::spatial::Neighbor;

    fn individual(personality: f64, neighbor_count: usize) -> Individual {
        let neighbors = (0..neighbor_count)
            .map(|i| Neighbor {
                id: IndividualId(100 + i as u32),
                distance: 1.0 + i as f64,
            })
            .collect();
        Individual::new(
            IndividualId(0),
            Vec2::default(),
            personality,
            0.5,
            neighbors,
            Vec::new(),
        )
    }

    #[test]
    fn test_cancel_becomes_impossible_past_threshold() {
        let model = SaturatingHazards::new(HazardParams::default());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ind = individual(0.5, 4);
        // 4 of 4 neighbors departed: share 1.0 >= 0.75
        assert_eq!(model.cancel_time(&ind, 5, &mut rng), f64::INFINITY);
        // Lone departed initiator: share 0.0, finite sample
        assert!(model.cancel_time(&ind, 1, &mut rng).is_finite());
    }

    #[test]
    fn test_follow_rate_rises_with_observed_group() {
        let model = SaturatingHazards::new(HazardParams::default());
        let ind = individual(0.5, 8);
        let leader = individual(0.5, 8);
        // Compare mean waiting times over many samples
        let mean = |observed: usize| {
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            (0..2000)
                .map(|_| model.follow_time(&ind, &leader, observed, 8, &mut rng))
                .sum::<f64>()
                / 2000.0
        };
        assert!(mean(6) < mean(1));
    }

    #[test]
    fn test_bolder_individuals_initiate_sooner_on_average() {
        let model = SaturatingHazards::new(HazardParams::default());
        let mean = |personality: f64| {
            let ind = individual(personality, 4);
            let mut rng = ChaCha8Rng::seed_from_u64(19);
            (0..2000)
                .map(|_| model.initiation_time(&ind, &mut rng))
                .sum::<f64>()
                / 2000.0
        };
        assert!(mean(0.9) < mean(0.1));
    }
}
