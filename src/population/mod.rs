//! Population construction
//!
//! A builder places candidate individuals, the neighbor graph is computed
//! over their positions, neighborless candidates are pruned, and the
//! survivors are assembled into the dense arena the engine runs over.

pub mod builder;

pub use builder::{create_population_builder, Placement, PopulationBuilder};

use rand_chacha::ChaCha8Rng;

use crate::core::config::SimConfig;
use crate::core::error::Result;
use crate::core::types::IndividualId;
use crate::entity::Individual;
use crate::spatial::build_neighbor_graph;

/// Build the full population for an experiment
pub fn build_population(config: &SimConfig, rng: &mut ChaCha8Rng) -> Result<Vec<Individual>> {
    let builder = create_population_builder(&config.population_builder, &config.builder)?;

    let placements: Vec<Placement> = (0..config.individual_count)
        .map(|index| builder.build_individual(index, rng))
        .collect();
    let positions: Vec<_> = placements.iter().map(|p| p.position).collect();

    let mut graph = build_neighbor_graph(
        &positions,
        config.neighbor_mode,
        config.neighbor_count,
        config.neighbor_radius,
    );

    let pruned = config.individual_count - graph.len();
    if pruned > 0 {
        tracing::warn!(
            pruned,
            surviving = graph.len(),
            "dropped individuals with no neighbors before simulation"
        );
    }

    let individuals = graph
        .kept
        .iter()
        .enumerate()
        .map(|(new, &old)| {
            let placement = &placements[old];
            Individual::new(
                IndividualId(new as u32),
                placement.position,
                placement.personality,
                placement.assertiveness,
                std::mem::take(&mut graph.neighbors[new]),
                std::mem::take(&mut graph.mimics[new]),
            )
        })
        .collect();

    Ok(individuals)
}
