//! Experiment configuration
//!
//! Config files are TOML. Every engine-level key is required and checked
//! before any trial runs, so a typo fails fast with the offending key named
//! instead of surfacing as a skewed result three hundred trials later.
//! Model parameter tables are optional and fall back to tuned defaults.

use std::path::Path;

use serde::Deserialize;

use crate::core::error::{Result, SimError};
use crate::core::types::NeighborMode;

/// Fully resolved experiment configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of individuals requested from the population builder
    pub individual_count: usize,
    /// k for topological/hybrid neighbor selection
    pub neighbor_count: usize,
    /// Radius for metric/hybrid neighbor selection (world units)
    pub neighbor_radius: f64,
    /// Strategy for the fixed nearest-neighbor relation
    pub neighbor_mode: NeighborMode,
    /// Number of trials to run in one experiment
    pub trial_count: usize,
    /// Seed for the experiment-wide PRNG
    pub seed: u64,
    /// Reference group size for hazard inputs: own neighbor count (true)
    /// or the whole population (false)
    pub local_reference_group: bool,
    /// Departed counts for follow/cancel hazard inputs: own departed
    /// nearest neighbors (true) or all departed individuals (false)
    ///
    /// Independent of `local_reference_group`; the two axes are not
    /// reconciled against each other.
    pub local_departed_count: bool,
    /// Registry key of the hazard model
    pub hazard_model: String,
    /// Registry key of the personality calculator
    pub personality_model: String,
    /// Registry key of the population builder
    pub population_builder: String,
    /// Hazard model parameters
    pub hazard: HazardParams,
    /// Personality calculator parameters
    pub personality: PersonalityParams,
    /// Population builder parameters
    pub builder: BuilderParams,
}

/// Rate parameters for the saturating hazard model
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HazardParams {
    /// Base initiation rate, scaled per individual by personality and
    /// assertiveness
    pub initiation_rate: f64,
    /// Follow rate ceiling, approached as the observed group saturates
    pub follow_max_rate: f64,
    /// Fraction of the reference group size at which the follow rate
    /// reaches half its ceiling
    pub follow_half_fraction: f64,
    /// Base cancellation rate for a freshly departed initiator
    pub cancel_rate: f64,
    /// Follower share of the neighborhood at which cancellation becomes
    /// impossible
    pub cancel_threshold: f64,
}

impl Default for HazardParams {
    fn default() -> Self {
        Self {
            initiation_rate: 0.01,
            follow_max_rate: 1.0,
            follow_half_fraction: 0.5,
            cancel_rate: 0.1,
            cancel_threshold: 0.75,
        }
    }
}

/// Parameters for the discounted personality update
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersonalityParams {
    /// Target personality pulled toward after a successful initiation
    pub reward_target: f64,
    /// Target personality pulled toward after a failed initiation
    pub penalty_target: f64,
    /// Step fraction toward the target per update
    pub discount: f64,
    /// Scale applied to the discount for bystander updates
    pub bystander_weight: f64,
    /// Follower count at which the update reaches half its full emphasis
    pub follower_half_sat: f64,
    /// Lower clamp for personality
    pub min: f64,
    /// Upper clamp for personality
    pub max: f64,
}

impl Default for PersonalityParams {
    fn default() -> Self {
        Self {
            reward_target: 1.0,
            penalty_target: 0.0,
            discount: 0.2,
            bystander_weight: 0.25,
            follower_half_sat: 3.0,
            min: 0.01,
            max: 0.99,
        }
    }
}

/// Parameters for the shipped population builders
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderParams {
    /// Side length of the square arena individuals are placed in
    pub arena_side: f64,
    /// Inclusive range initial personalities are drawn from
    pub personality_range: (f64, f64),
    /// Inclusive range assertiveness traits are drawn from
    pub assertiveness_range: (f64, f64),
    /// Number of clusters for the clustered builder
    pub cluster_count: usize,
    /// Half-width of the square each cluster scatters over
    pub cluster_spread: f64,
}

impl Default for BuilderParams {
    fn default() -> Self {
        Self {
            arena_side: 100.0,
            personality_range: (0.3, 0.7),
            assertiveness_range: (0.2, 0.8),
            cluster_count: 4,
            cluster_spread: 10.0,
        }
    }
}

/// Raw TOML layer: every engine key optional so resolution can name
/// exactly which one is missing
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    individual_count: Option<usize>,
    neighbor_count: Option<usize>,
    neighbor_radius: Option<f64>,
    neighbor_mode: Option<NeighborMode>,
    trial_count: Option<usize>,
    seed: Option<u64>,
    local_reference_group: Option<bool>,
    local_departed_count: Option<bool>,
    hazard_model: Option<String>,
    personality_model: Option<String>,
    population_builder: Option<String>,
    hazard: Option<HazardParams>,
    personality: Option<PersonalityParams>,
    builder: Option<BuilderParams>,
}

impl RawConfig {
    fn resolve(self) -> Result<SimConfig> {
        let config = SimConfig {
            individual_count: self
                .individual_count
                .ok_or(SimError::MissingKey("individual_count"))?,
            neighbor_count: self
                .neighbor_count
                .ok_or(SimError::MissingKey("neighbor_count"))?,
            neighbor_radius: self
                .neighbor_radius
                .ok_or(SimError::MissingKey("neighbor_radius"))?,
            neighbor_mode: self
                .neighbor_mode
                .ok_or(SimError::MissingKey("neighbor_mode"))?,
            trial_count: self.trial_count.ok_or(SimError::MissingKey("trial_count"))?,
            seed: self.seed.ok_or(SimError::MissingKey("seed"))?,
            local_reference_group: self
                .local_reference_group
                .ok_or(SimError::MissingKey("local_reference_group"))?,
            local_departed_count: self
                .local_departed_count
                .ok_or(SimError::MissingKey("local_departed_count"))?,
            hazard_model: self.hazard_model.ok_or(SimError::MissingKey("hazard_model"))?,
            personality_model: self
                .personality_model
                .ok_or(SimError::MissingKey("personality_model"))?,
            population_builder: self
                .population_builder
                .ok_or(SimError::MissingKey("population_builder"))?,
            hazard: self.hazard.unwrap_or_default(),
            personality: self.personality.unwrap_or_default(),
            builder: self.builder.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl SimConfig {
    /// Parse and validate a TOML config string
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text)?;
        raw.resolve()
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Cross-check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.individual_count < 2 {
            return Err(SimError::InvalidKey {
                key: "individual_count",
                reason: format!("need at least 2 individuals, got {}", self.individual_count),
            });
        }
        if self.trial_count == 0 {
            return Err(SimError::InvalidKey {
                key: "trial_count",
                reason: "must be at least 1".into(),
            });
        }
        let needs_k = matches!(
            self.neighbor_mode,
            NeighborMode::Topological | NeighborMode::Hybrid
        );
        if needs_k && self.neighbor_count == 0 {
            return Err(SimError::InvalidKey {
                key: "neighbor_count",
                reason: format!("must be positive for {:?} mode", self.neighbor_mode),
            });
        }
        let needs_radius = matches!(
            self.neighbor_mode,
            NeighborMode::Metric | NeighborMode::Hybrid
        );
        if needs_radius && self.neighbor_radius <= 0.0 {
            return Err(SimError::InvalidKey {
                key: "neighbor_radius",
                reason: format!("must be positive for {:?} mode", self.neighbor_mode),
            });
        }
        if !(self.hazard.cancel_threshold > 0.0) {
            return Err(SimError::InvalidKey {
                key: "hazard.cancel_threshold",
                reason: "must be positive".into(),
            });
        }
        if self.personality.min >= self.personality.max {
            return Err(SimError::InvalidKey {
                key: "personality.min",
                reason: format!(
                    "clamp range is empty: min {} >= max {}",
                    self.personality.min, self.personality.max
                ),
            });
        }
        if self.builder.personality_range.0 > self.builder.personality_range.1 {
            return Err(SimError::InvalidKey {
                key: "builder.personality_range",
                reason: "range start exceeds range end".into(),
            });
        }
        if self.builder.assertiveness_range.0 > self.builder.assertiveness_range.1 {
            return Err(SimError::InvalidKey {
                key: "builder.assertiveness_range",
                reason: "range start exceeds range end".into(),
            });
        }
        Ok(())
    }
}

impl Default for SimConfig {
    /// Tuned defaults for programmatic use and tests; config files must
    /// spell every engine key out explicitly.
    fn default() -> Self {
        Self {
            individual_count: 60,
            neighbor_count: 8,
            neighbor_radius: 25.0,
            neighbor_mode: NeighborMode::Topological,
            trial_count: 100,
            seed: 42,
            local_reference_group: true,
            local_departed_count: true,
            hazard_model: "saturating".into(),
            personality_model: "discounted".into(),
            population_builder: "uniform".into(),
            hazard: HazardParams::default(),
            personality: PersonalityParams::default(),
            builder: BuilderParams::default(),
        }
    }
}
