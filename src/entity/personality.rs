//! Personality updates after initiation outcomes
//!
//! When an initiation resolves, the initiator's personality shifts toward a
//! reward or penalty target, and so does every nearest neighbor's (the
//! bystander effect). The calculator is a pluggable collaborator: the engine
//! hands it the current value, the update kind and the follower-subtree size
//! and stores whatever comes back.

use crate::core::config::PersonalityParams;
use crate::core::error::{Result, SimError};

/// How an individual relates to the initiation being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalityUpdate {
    /// Initiated and led the population out
    TrueWinner,
    /// Initiated and cancelled
    TrueLoser,
    /// Nearest neighbor of a successful initiator
    BystanderWinner,
    /// Nearest neighbor of a failed initiator
    BystanderLoser,
}

impl PersonalityUpdate {
    pub fn is_winner(self) -> bool {
        matches!(self, Self::TrueWinner | Self::BystanderWinner)
    }

    pub fn is_bystander(self) -> bool {
        matches!(self, Self::BystanderWinner | Self::BystanderLoser)
    }
}

pub trait PersonalityCalculator {
    /// Compute the post-update personality; the result is stored verbatim
    fn calculate(&self, current: f64, update: PersonalityUpdate, follower_count: usize) -> f64;
}

/// Discounted step toward a reward/penalty target, clamped to a configured
/// range
///
/// The step grows with the size of the follower tree at resolution time: an
/// initiation that dragged half the population along moves personalities
/// further than a lone departure, saturating at twice the base emphasis.
pub struct DiscountedUpdate {
    params: PersonalityParams,
}

impl DiscountedUpdate {
    pub fn new(params: PersonalityParams) -> Self {
        Self { params }
    }
}

impl PersonalityCalculator for DiscountedUpdate {
    fn calculate(&self, current: f64, update: PersonalityUpdate, follower_count: usize) -> f64 {
        let p = &self.params;
        let target = if update.is_winner() {
            p.reward_target
        } else {
            p.penalty_target
        };
        let mut gain = p.discount;
        if update.is_bystander() {
            gain *= p.bystander_weight;
        }
        let followers = follower_count as f64;
        let emphasis = 1.0 + followers / (followers + p.follower_half_sat);
        (current + gain * emphasis * (target - current)).clamp(p.min, p.max)
    }
}

/// Disables personality drift entirely; every update returns the current
/// value unchanged
pub struct StaticPersonality;

impl PersonalityCalculator for StaticPersonality {
    fn calculate(&self, current: f64, _update: PersonalityUpdate, _follower_count: usize) -> f64 {
        current
    }
}

/// Resolve a personality calculator from its registry key
pub fn create_personality_calculator(
    name: &str,
    params: &PersonalityParams,
) -> Result<Box<dyn PersonalityCalculator>> {
    match name {
        "discounted" => Ok(Box::new(DiscountedUpdate::new(params.clone()))),
        "static" => Ok(Box::new(StaticPersonality)),
        other => Err(SimError::UnknownImplementation {
            kind: "personality calculator",
            name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn calculator() -> DiscountedUpdate {
        DiscountedUpdate::new(PersonalityParams::default())
    }

    #[test]
    fn test_winner_moves_up_loser_moves_down() {
        let calc = calculator();
        let up = calc.calculate(0.5, PersonalityUpdate::TrueWinner, 0);
        let down = calc.calculate(0.5, PersonalityUpdate::TrueLoser, 0);
        assert!(up > 0.5);
        assert!(down < 0.5);
    }

    #[test]
    fn test_bystander_update_is_weaker_than_true_update() {
        let calc = calculator();
        let true_step = calc.calculate(0.5, PersonalityUpdate::TrueWinner, 2) - 0.5;
        let bystander_step = calc.calculate(0.5, PersonalityUpdate::BystanderWinner, 2) - 0.5;
        assert!(bystander_step > 0.0);
        assert!(bystander_step < true_step);
    }

    #[test]
    fn test_larger_follower_trees_push_harder() {
        let calc = calculator();
        let small = calc.calculate(0.5, PersonalityUpdate::TrueLoser, 1);
        let large = calc.calculate(0.5, PersonalityUpdate::TrueLoser, 20);
        assert!(large < small);
    }

    #[test]
    fn test_static_calculator_never_drifts() {
        let calc = StaticPersonality;
        assert_eq!(calc.calculate(0.37, PersonalityUpdate::TrueWinner, 10), 0.37);
    }

    #[test]
    fn test_unknown_calculator_name_is_a_config_error() {
        let err = create_personality_calculator("osmosis", &PersonalityParams::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("osmosis"));
    }

    proptest! {
        #[test]
        fn prop_result_stays_inside_clamp_range(
            current in 0.0f64..=1.0,
            followers in 0usize..200,
            winner in any::<bool>(),
            bystander in any::<bool>(),
        ) {
            let calc = calculator();
            let update = match (winner, bystander) {
                (true, false) => PersonalityUpdate::TrueWinner,
                (false, false) => PersonalityUpdate::TrueLoser,
                (true, true) => PersonalityUpdate::BystanderWinner,
                (false, true) => PersonalityUpdate::BystanderLoser,
            };
            let result = calc.calculate(current, update, followers);
            prop_assert!(result >= 0.01 && result <= 0.99);
        }
    }
}
