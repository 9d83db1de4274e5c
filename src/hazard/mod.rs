//! Pluggable hazard-rate models
//!
//! A hazard model maps an individual's current local state to a sampled
//! waiting time for each of the three event kinds. The engine is agnostic to
//! the rate formulas; it requires only that outputs are non-negative and
//! that `f64::INFINITY` is the "this will never happen" sentinel.

pub mod fixed;
pub mod registry;
pub mod saturating;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::entity::Individual;

pub use fixed::FixedTimes;
pub use registry::create_hazard_model;
pub use saturating::SaturatingHazards;

pub trait HazardModel {
    /// Waiting time until this remaining individual would initiate
    fn initiation_time(&self, individual: &Individual, rng: &mut ChaCha8Rng) -> f64;

    /// Waiting time until this remaining individual would follow `leader`
    ///
    /// `observed_group_size` is the departed membership of the observed
    /// group and `reference_group_size` the basis it is judged against;
    /// both depend on the configured locality flags.
    fn follow_time(
        &self,
        individual: &Individual,
        leader: &Individual,
        observed_group_size: usize,
        reference_group_size: usize,
        rng: &mut ChaCha8Rng,
    ) -> f64;

    /// Waiting time until this leaderless departed individual would cancel
    fn cancel_time(
        &self,
        individual: &Individual,
        departed_including_self: usize,
        rng: &mut ChaCha8Rng,
    ) -> f64;
}

/// Sample an exponential waiting time for the given rate
///
/// Draws U uniform in [0,1) and returns `-ln(1-U)/rate`. A rate of zero or
/// below means the event cannot happen and maps to infinity.
pub fn exponential_waiting_time(rate: f64, rng: &mut ChaCha8Rng) -> f64 {
    if rate <= 0.0 {
        return f64::INFINITY;
    }
    let u: f64 = rng.gen_range(0.0..1.0);
    -(1.0 - u).ln() / rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    #[test]
    fn test_zero_rate_means_never() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(exponential_waiting_time(0.0, &mut rng), f64::INFINITY);
        assert_eq!(exponential_waiting_time(-3.0, &mut rng), f64::INFINITY);
    }

    #[test]
    fn test_sample_mean_tracks_inverse_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let n = 20_000;
        let total: f64 = (0..n)
            .map(|_| exponential_waiting_time(2.0, &mut rng))
            .sum();
        let mean = total / n as f64;
        assert!((mean - 0.5).abs() < 0.02, "mean {mean}");
    }

    proptest! {
        #[test]
        fn prop_samples_are_finite_and_non_negative(rate in 0.001f64..100.0, seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let t = exponential_waiting_time(rate, &mut rng);
            prop_assert!(t.is_finite());
            prop_assert!(t >= 0.0);
        }
    }
}
