//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for individuals
///
/// Ids are dense arena indices assigned once per experiment, after
/// neighborless individuals have been pruned from the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(pub u32);

impl IndividualId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for movement groups
///
/// Issued by the population state from an explicit per-experiment counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// Simulated time, in model units
pub type Time = f64;

/// The three kinds of departure event an individual can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepartureKind {
    /// Start a fresh movement group
    Initiate,
    /// Join an already-moving neighbor's group
    Follow,
    /// Abort an initiation, collapsing the whole follower tree
    Cancel,
}

/// Strategy for building the fixed nearest-neighbor relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborMode {
    /// The k closest individuals by Euclidean distance
    Topological,
    /// All individuals within a fixed radius
    Metric,
    /// Within the radius, capped at the k closest
    Hybrid,
}

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_individual_id_equality() {
        let a = IndividualId(1);
        let b = IndividualId(1);
        let c = IndividualId(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_individual_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<IndividualId, &str> = HashMap::new();
        map.insert(IndividualId(3), "scout");
        assert_eq!(map.get(&IndividualId(3)), Some(&"scout"));
    }

    #[test]
    fn test_vec2_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_neighbor_mode_parses_from_config_keys() {
        let mode: NeighborMode = serde_json::from_str("\"topological\"").unwrap();
        assert_eq!(mode, NeighborMode::Topological);
        let mode: NeighborMode = serde_json::from_str("\"hybrid\"").unwrap();
        assert_eq!(mode, NeighborMode::Hybrid);
    }
}
