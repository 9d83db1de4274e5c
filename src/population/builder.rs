//! Population builders: placement and trait assignment strategies

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::BuilderParams;
use crate::core::error::{Result, SimError};
use crate::core::types::Vec2;

/// Everything the engine needs from the builder for one individual
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub position: Vec2,
    pub personality: f64,
    pub assertiveness: f64,
}

pub trait PopulationBuilder {
    /// Produce the placement for the individual at the given build index
    fn build_individual(&self, index: usize, rng: &mut ChaCha8Rng) -> Placement;
}

fn draw_range(range: (f64, f64), rng: &mut ChaCha8Rng) -> f64 {
    if range.0 == range.1 {
        return range.0;
    }
    rng.gen_range(range.0..=range.1)
}

/// Uniform placement over the square arena
pub struct UniformBuilder {
    params: BuilderParams,
}

impl UniformBuilder {
    pub fn new(params: BuilderParams) -> Self {
        Self { params }
    }
}

impl PopulationBuilder for UniformBuilder {
    fn build_individual(&self, _index: usize, rng: &mut ChaCha8Rng) -> Placement {
        let side = self.params.arena_side;
        Placement {
            position: Vec2::new(rng.gen_range(0.0..side), rng.gen_range(0.0..side)),
            personality: draw_range(self.params.personality_range, rng),
            assertiveness: draw_range(self.params.assertiveness_range, rng),
        }
    }
}

/// Placement scattered around evenly-spaced cluster centers
///
/// Centers sit on a circle around the arena midpoint; the build index picks
/// the cluster round-robin and the individual lands uniformly in a square of
/// half-width `cluster_spread` around its center.
pub struct ClusteredBuilder {
    params: BuilderParams,
    centers: Vec<Vec2>,
}

impl ClusteredBuilder {
    pub fn new(params: BuilderParams) -> Self {
        let mid = params.arena_side / 2.0;
        let ring = params.arena_side / 3.0;
        let count = params.cluster_count.max(1);
        let centers = (0..count)
            .map(|c| {
                let angle = std::f64::consts::TAU * c as f64 / count as f64;
                Vec2::new(mid + ring * angle.cos(), mid + ring * angle.sin())
            })
            .collect();
        Self { params, centers }
    }
}

impl PopulationBuilder for ClusteredBuilder {
    fn build_individual(&self, index: usize, rng: &mut ChaCha8Rng) -> Placement {
        let center = self.centers[index % self.centers.len()];
        let spread = self.params.cluster_spread;
        Placement {
            position: Vec2::new(
                center.x + rng.gen_range(-spread..=spread),
                center.y + rng.gen_range(-spread..=spread),
            ),
            personality: draw_range(self.params.personality_range, rng),
            assertiveness: draw_range(self.params.assertiveness_range, rng),
        }
    }
}

/// Resolve a population builder from its registry key
pub fn create_population_builder(
    name: &str,
    params: &BuilderParams,
) -> Result<Box<dyn PopulationBuilder>> {
    match name {
        "uniform" => Ok(Box::new(UniformBuilder::new(params.clone()))),
        "clustered" => Ok(Box::new(ClusteredBuilder::new(params.clone()))),
        other => Err(SimError::UnknownImplementation {
            kind: "population builder",
            name: other.to_string(),
        }),
    }
}
