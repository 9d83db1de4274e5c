//! The simulated individual and its local transition primitives
//!
//! An individual is always in exactly one of three states:
//! - remaining: `group` and `leader` both unset
//! - initiator: `group` set, `leader` unset
//! - follower:  `group` and `leader` both set
//!
//! Relations are id references into the population arena, never direct
//! back-pointers; traversals over the follower tree (cascades, subtree
//! counts) live on the arena owner, not here.

use crate::core::error::{Result, SimError};
use crate::core::types::{GroupId, IndividualId, Vec2};
use crate::spatial::Neighbor;

#[derive(Debug, Clone)]
pub struct Individual {
    pub id: IndividualId,
    /// Immutable for the lifetime of the experiment
    pub position: Vec2,
    /// Scalar in [0,1]; persists across trials and drifts via the
    /// personality calculator
    pub personality: f64,
    /// Fixed trait in [0,1] set by the population builder
    pub assertiveness: f64,
    /// Movement group, None while remaining
    pub group: Option<GroupId>,
    /// The individual being followed, None unless following
    pub leader: Option<IndividualId>,
    /// Immediate followers, in adoption order
    pub followers: Vec<IndividualId>,
    /// First already-departed neighbor this individual became aware of;
    /// write-once per departure episode
    pub first_mover: Option<IndividualId>,
    /// Fixed nearest neighbors, sorted by ascending distance
    pub neighbors: Vec<Neighbor>,
    /// Inverse relation: everyone who counts this individual as a neighbor
    pub mimics: Vec<IndividualId>,
    /// Initiations attempted over the whole experiment
    pub attempts: u32,
    /// Initiations that led the full population out
    pub successes: u32,
}

impl Individual {
    pub fn new(
        id: IndividualId,
        position: Vec2,
        personality: f64,
        assertiveness: f64,
        neighbors: Vec<Neighbor>,
        mimics: Vec<IndividualId>,
    ) -> Self {
        Self {
            id,
            position,
            personality,
            assertiveness,
            group: None,
            leader: None,
            followers: Vec::new(),
            first_mover: None,
            neighbors,
            mimics,
            attempts: 0,
            successes: 0,
        }
    }

    pub fn is_remaining(&self) -> bool {
        self.group.is_none() && self.leader.is_none()
    }

    pub fn is_initiator(&self) -> bool {
        self.group.is_some() && self.leader.is_none()
    }

    pub fn is_follower(&self) -> bool {
        self.leader.is_some()
    }

    pub fn is_neighbor(&self, id: IndividualId) -> bool {
        self.neighbors.iter().any(|n| n.id == id)
    }

    pub fn neighbor_ids(&self) -> impl Iterator<Item = IndividualId> + '_ {
        self.neighbors.iter().map(|n| n.id)
    }

    /// Start a fresh movement group under the given id
    ///
    /// Following while already following is a model error, not a user error.
    pub fn begin_initiation(&mut self, group: GroupId) -> Result<()> {
        if self.leader.is_some() {
            return Err(SimError::Invariant(format!(
                "{:?} initiated while following {:?}",
                self.id, self.leader
            )));
        }
        if self.group.is_some() {
            return Err(SimError::Invariant(format!(
                "{:?} initiated while already in {:?}",
                self.id, self.group
            )));
        }
        self.group = Some(group);
        self.attempts += 1;
        Ok(())
    }

    /// Join the given leader's group
    ///
    /// Registration in the leader's follower list is the arena owner's job.
    pub fn adopt_leader(&mut self, leader: IndividualId, group: GroupId) -> Result<()> {
        if self.leader.is_some() || self.group.is_some() {
            return Err(SimError::Invariant(format!(
                "{:?} adopted leader {:?} while not remaining",
                self.id, leader
            )));
        }
        self.leader = Some(leader);
        self.group = Some(group);
        Ok(())
    }

    /// Record the first departed neighbor observed this episode; later
    /// observations are ignored until an explicit reset
    pub fn observe_first_mover(&mut self, neighbor: IndividualId) {
        if self.first_mover.is_none() {
            self.first_mover = Some(neighbor);
        }
    }

    pub fn reset_first_mover(&mut self) {
        self.first_mover = None;
    }

    /// Return to the remaining state, dropping every per-episode relation.
    /// Personality, assertiveness and the counters persist.
    pub fn clear_movement_state(&mut self) {
        self.group = None;
        self.leader = None;
        self.first_mover = None;
        self.followers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual(id: u32) -> Individual {
        Individual::new(
            IndividualId(id),
            Vec2::default(),
            0.5,
            0.5,
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_state_predicates_follow_the_three_state_invariant() {
        let mut ind = individual(0);
        assert!(ind.is_remaining());

        ind.begin_initiation(GroupId(1)).unwrap();
        assert!(ind.is_initiator());
        assert!(!ind.is_remaining() && !ind.is_follower());

        ind.clear_movement_state();
        assert!(ind.is_remaining());

        ind.adopt_leader(IndividualId(9), GroupId(2)).unwrap();
        assert!(ind.is_follower());
        assert!(!ind.is_initiator());
    }

    #[test]
    fn test_initiating_while_following_is_fatal() {
        let mut ind = individual(0);
        ind.adopt_leader(IndividualId(1), GroupId(0)).unwrap();
        assert!(ind.begin_initiation(GroupId(1)).is_err());
    }

    #[test]
    fn test_adopting_while_departed_is_fatal() {
        let mut ind = individual(0);
        ind.begin_initiation(GroupId(0)).unwrap();
        assert!(ind.adopt_leader(IndividualId(1), GroupId(0)).is_err());
    }

    #[test]
    fn test_first_mover_is_write_once_until_reset() {
        let mut ind = individual(0);
        ind.observe_first_mover(IndividualId(4));
        ind.observe_first_mover(IndividualId(7));
        assert_eq!(ind.first_mover, Some(IndividualId(4)));

        ind.reset_first_mover();
        ind.observe_first_mover(IndividualId(7));
        assert_eq!(ind.first_mover, Some(IndividualId(7)));
    }

    #[test]
    fn test_clear_keeps_counters_and_personality() {
        let mut ind = individual(0);
        ind.begin_initiation(GroupId(0)).unwrap();
        ind.followers.push(IndividualId(2));
        ind.personality = 0.8;
        ind.clear_movement_state();

        assert!(ind.is_remaining());
        assert!(ind.followers.is_empty());
        assert_eq!(ind.attempts, 1);
        assert_eq!(ind.personality, 0.8);
    }
}
