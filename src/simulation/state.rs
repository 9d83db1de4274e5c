//! Population state: the individual arena and its partitions
//!
//! `SimulationState` owns every individual and is the sole mutator of group
//! membership. The population is partitioned into `remaining` and `departed`
//! at all times, with `eligible_initiators` tracking the subset of remaining
//! individuals none of whose neighbors currently belongs to any group.
//!
//! Hashed sets are used for membership checks only. Every order-sensitive
//! traversal runs in arena (id) order so that identical seeds reproduce
//! identical departure histories.

use std::collections::VecDeque;

use ahash::AHashSet;

use crate::core::error::{Result, SimError};
use crate::core::types::{GroupId, IndividualId};
use crate::entity::{Individual, PersonalityCalculator, PersonalityUpdate};

pub struct SimulationState {
    individuals: Vec<Individual>,
    remaining: AHashSet<IndividualId>,
    departed: AHashSet<IndividualId>,
    eligible_initiators: AHashSet<IndividualId>,
    next_group_id: u32,
}

impl SimulationState {
    /// Take ownership of a freshly built population; everyone starts
    /// remaining and eligible
    pub fn new(individuals: Vec<Individual>) -> Self {
        let all: AHashSet<IndividualId> = individuals.iter().map(|ind| ind.id).collect();
        Self {
            individuals,
            remaining: all.clone(),
            departed: AHashSet::new(),
            eligible_initiators: all,
            next_group_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// All ids in arena order
    pub fn ids(&self) -> impl Iterator<Item = IndividualId> {
        (0..self.individuals.len() as u32).map(IndividualId)
    }

    pub fn individual(&self, id: IndividualId) -> &Individual {
        &self.individuals[id.index()]
    }

    pub fn individual_mut(&mut self, id: IndividualId) -> &mut Individual {
        &mut self.individuals[id.index()]
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining.len()
    }

    pub fn departed_count(&self) -> usize {
        self.departed.len()
    }

    pub fn is_remaining(&self, id: IndividualId) -> bool {
        self.remaining.contains(&id)
    }

    pub fn is_departed(&self, id: IndividualId) -> bool {
        self.departed.contains(&id)
    }

    pub fn is_eligible_initiator(&self, id: IndividualId) -> bool {
        self.eligible_initiators.contains(&id)
    }

    /// Current departed membership of a group
    pub fn group_size(&self, group: GroupId) -> usize {
        self.individuals
            .iter()
            .filter(|ind| ind.group == Some(group))
            .count()
    }

    /// Size of an individual's whole follower subtree (immediate followers
    /// plus theirs, transitively)
    pub fn total_follower_count(&self, id: IndividualId) -> usize {
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for &follower in &self.individuals[current.index()].followers {
                count += 1;
                stack.push(follower);
            }
        }
        count
    }

    /// Start a fresh movement group led by the given eligible individual
    pub fn initiate(&mut self, id: IndividualId) -> Result<()> {
        if !self.remaining.contains(&id) {
            return Err(SimError::Invariant(format!(
                "initiate on non-remaining {id:?}"
            )));
        }
        if !self.eligible_initiators.contains(&id) {
            return Err(SimError::Invariant(format!(
                "initiate on ineligible {id:?}"
            )));
        }
        let group = GroupId(self.next_group_id);
        self.next_group_id += 1;
        self.individuals[id.index()].begin_initiation(group)?;

        self.remaining.remove(&id);
        self.departed.insert(id);
        self.eligible_initiators.remove(&id);
        self.mark_departure_observed(id);
        Ok(())
    }

    /// Move a remaining individual into the given leader's group
    pub fn follow(&mut self, leader: IndividualId, follower: IndividualId) -> Result<()> {
        if !self.remaining.contains(&follower) {
            return Err(SimError::Invariant(format!(
                "follow by non-remaining {follower:?}"
            )));
        }
        let group = self.individuals[leader.index()]
            .group
            .ok_or_else(|| SimError::Invariant(format!("follow target {leader:?} has no group")))?;
        self.individuals[follower.index()].adopt_leader(leader, group)?;
        self.individuals[leader.index()].followers.push(follower);

        self.remaining.remove(&follower);
        self.departed.insert(follower);
        self.eligible_initiators.remove(&follower);
        self.mark_departure_observed(follower);
        Ok(())
    }

    /// Departure side effects shared by initiate and follow: mimicking
    /// neighbors now observe a nearby group, so they must follow rather than
    /// initiate, and the departure may become their first mover.
    fn mark_departure_observed(&mut self, id: IndividualId) {
        let mimics = self.individuals[id.index()].mimics.clone();
        for watcher in mimics {
            self.eligible_initiators.remove(&watcher);
            if self.remaining.contains(&watcher) {
                self.individuals[watcher.index()].observe_first_mover(id);
            }
        }
    }

    /// Abort an initiation, collapsing the whole follower tree back to
    /// remaining
    ///
    /// Returns the affected set (the initiator and its transitive followers)
    /// so the driver can invalidate cached events. Eligibility and
    /// first-mover repair run only after the full cascade has applied, so
    /// "currently departed" reflects the post-cancellation world.
    pub fn cancel_initiation(
        &mut self,
        id: IndividualId,
        personality: &dyn PersonalityCalculator,
    ) -> Result<Vec<IndividualId>> {
        if !self.departed.contains(&id) {
            return Err(SimError::Invariant(format!(
                "cancel on non-departed {id:?}"
            )));
        }
        if self.individuals[id.index()].leader.is_some() {
            return Err(SimError::Invariant(format!("cancel on follower {id:?}")));
        }

        self.signal_initiation_failure(id, personality);

        // Collect the whole affected subtree before any state is cleared
        let mut affected = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            affected.push(current);
            queue.extend(self.individuals[current.index()].followers.iter().copied());
        }

        for &member in &affected {
            if !self.departed.remove(&member) {
                return Err(SimError::Invariant(format!(
                    "cancel cascade from {id:?} reached non-departed {member:?}"
                )));
            }
            self.remaining.insert(member);
            self.individuals[member.index()].clear_movement_state();
        }
        let affected_set: AHashSet<IndividualId> = affected.iter().copied().collect();

        // Recompute eligibility for everyone still remaining; the newly
        // ineligible pick up a first mover from the post-cascade world
        for watcher in self.ids() {
            if !self.remaining.contains(&watcher) {
                continue;
            }
            let eligible = self.individuals[watcher.index()]
                .neighbors
                .iter()
                .all(|n| self.individuals[n.id.index()].group.is_none());
            if eligible {
                self.eligible_initiators.insert(watcher);
            } else {
                self.eligible_initiators.remove(&watcher);
                if self.individuals[watcher.index()].first_mover.is_none() {
                    if let Some(replacement) = self.find_departed_neighbor(watcher) {
                        self.individuals[watcher.index()].observe_first_mover(replacement);
                    }
                }
            }
        }

        // Repair first movers that pointed into the cancelled set
        for watcher in self.ids() {
            if !self.remaining.contains(&watcher) {
                continue;
            }
            let stale = self.individuals[watcher.index()]
                .first_mover
                .is_some_and(|fm| affected_set.contains(&fm));
            if stale {
                self.individuals[watcher.index()].reset_first_mover();
                if let Some(replacement) = self.find_departed_neighbor(watcher) {
                    self.individuals[watcher.index()].observe_first_mover(replacement);
                }
            }
        }

        Ok(affected)
    }

    /// First currently-departed individual (in arena order) that is a
    /// nearest neighbor of `id`
    fn find_departed_neighbor(&self, id: IndividualId) -> Option<IndividualId> {
        self.ids().find(|&candidate| {
            self.departed.contains(&candidate) && self.individuals[id.index()].is_neighbor(candidate)
        })
    }

    /// All remaining individuals with at least one neighbor in the
    /// initiator's group
    pub fn find_potential_followers(&self, initiator: IndividualId) -> Result<Vec<IndividualId>> {
        let group = self.individuals[initiator.index()].group.ok_or_else(|| {
            SimError::Invariant(format!("{initiator:?} has no group to attract followers to"))
        })?;
        Ok(self
            .ids()
            .filter(|&id| {
                self.remaining.contains(&id)
                    && self.individuals[id.index()]
                        .neighbors
                        .iter()
                        .any(|n| self.individuals[n.id.index()].group == Some(group))
            })
            .collect())
    }

    /// Failed initiation: penalize the initiator and every nearest neighbor
    /// (the bystander effect), weighted by the pre-cascade follower subtree
    pub fn signal_initiation_failure(
        &mut self,
        id: IndividualId,
        personality: &dyn PersonalityCalculator,
    ) {
        let follower_count = self.total_follower_count(id);
        self.apply_personality_update(id, PersonalityUpdate::TrueLoser, follower_count, personality);
        let neighbors: Vec<IndividualId> = self.individuals[id.index()].neighbor_ids().collect();
        for neighbor in neighbors {
            self.apply_personality_update(
                neighbor,
                PersonalityUpdate::BystanderLoser,
                follower_count,
                personality,
            );
        }
    }

    /// Successful initiation: reward the initiator and every nearest
    /// neighbor
    pub fn signal_initiation_success(
        &mut self,
        id: IndividualId,
        personality: &dyn PersonalityCalculator,
    ) {
        let follower_count = self.total_follower_count(id);
        self.individuals[id.index()].successes += 1;
        self.apply_personality_update(id, PersonalityUpdate::TrueWinner, follower_count, personality);
        let neighbors: Vec<IndividualId> = self.individuals[id.index()].neighbor_ids().collect();
        for neighbor in neighbors {
            self.apply_personality_update(
                neighbor,
                PersonalityUpdate::BystanderWinner,
                follower_count,
                personality,
            );
        }
    }

    fn apply_personality_update(
        &mut self,
        id: IndividualId,
        update: PersonalityUpdate,
        follower_count: usize,
        personality: &dyn PersonalityCalculator,
    ) {
        let ind = &mut self.individuals[id.index()];
        ind.personality = personality.calculate(ind.personality, update, follower_count);
    }

    /// Rebuild per-trial state: every individual back to remaining and
    /// eligible. Personalities and counters persist across trials.
    pub fn reset(&mut self) {
        for ind in &mut self.individuals {
            ind.clear_movement_state();
        }
        self.remaining = self.individuals.iter().map(|ind| ind.id).collect();
        self.departed.clear();
        self.eligible_initiators = self.remaining.clone();
        self.next_group_id = 0;
    }

    /// Cross-check the partition and per-individual state invariants;
    /// intended for tests and debugging
    pub fn validate_partitions(&self) -> Result<()> {
        for id in self.ids() {
            let in_remaining = self.remaining.contains(&id);
            let in_departed = self.departed.contains(&id);
            if in_remaining == in_departed {
                return Err(SimError::Invariant(format!(
                    "{id:?} is in {} partitions",
                    if in_remaining { "both" } else { "no" }
                )));
            }
            let ind = &self.individuals[id.index()];
            if in_departed != ind.group.is_some() {
                return Err(SimError::Invariant(format!(
                    "{id:?} partition disagrees with its group field"
                )));
            }
            if in_remaining && ind.leader.is_some() {
                return Err(SimError::Invariant(format!(
                    "remaining {id:?} still has a leader"
                )));
            }
            let eligible = ind
                .neighbors
                .iter()
                .all(|n| self.individuals[n.id.index()].group.is_none());
            let tracked = self.eligible_initiators.contains(&id);
            if tracked && !in_remaining {
                return Err(SimError::Invariant(format!(
                    "departed {id:?} still tracked as eligible initiator"
                )));
            }
            if in_remaining && tracked != eligible {
                return Err(SimError::Invariant(format!(
                    "{id:?} eligibility tracking is stale (tracked {tracked}, actual {eligible})"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::entity::personality::StaticPersonality;
    use crate::spatial::Neighbor;

    /// Fully connected population: everyone is everyone's neighbor
    fn clique(n: u32) -> SimulationState {
        let individuals = (0..n)
            .map(|i| {
                let neighbors = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| Neighbor {
                        id: IndividualId(j),
                        distance: 1.0,
                    })
                    .collect();
                let mimics = (0..n).filter(|&j| j != i).map(IndividualId).collect();
                Individual::new(
                    IndividualId(i),
                    Vec2::new(i as f64, 0.0),
                    0.5,
                    0.5,
                    neighbors,
                    mimics,
                )
            })
            .collect();
        SimulationState::new(individuals)
    }

    #[test]
    fn test_initiate_moves_partitions_and_strips_eligibility() {
        let mut state = clique(3);
        state.initiate(IndividualId(0)).unwrap();

        assert!(state.is_departed(IndividualId(0)));
        assert!(!state.is_remaining(IndividualId(0)));
        assert!(state.individual(IndividualId(0)).is_initiator());
        assert_eq!(state.individual(IndividualId(0)).attempts, 1);
        // Mimicking neighbors observe a nearby group and may no longer initiate
        assert!(!state.is_eligible_initiator(IndividualId(1)));
        assert!(!state.is_eligible_initiator(IndividualId(2)));
        assert!(state.is_remaining(IndividualId(1)));
        state.validate_partitions().unwrap();
    }

    #[test]
    fn test_departure_becomes_first_mover_for_watchers() {
        let mut state = clique(3);
        state.initiate(IndividualId(1)).unwrap();
        assert_eq!(state.individual(IndividualId(0)).first_mover, Some(IndividualId(1)));
        assert_eq!(state.individual(IndividualId(2)).first_mover, Some(IndividualId(1)));
        // A second departure does not overwrite it
        state.follow(IndividualId(1), IndividualId(2)).unwrap();
        assert_eq!(state.individual(IndividualId(0)).first_mover, Some(IndividualId(1)));
    }

    #[test]
    fn test_follow_adopts_group_and_registers_follower() {
        let mut state = clique(3);
        state.initiate(IndividualId(0)).unwrap();
        state.follow(IndividualId(0), IndividualId(2)).unwrap();

        let leader_group = state.individual(IndividualId(0)).group;
        assert_eq!(state.individual(IndividualId(2)).group, leader_group);
        assert_eq!(state.individual(IndividualId(2)).leader, Some(IndividualId(0)));
        assert_eq!(state.individual(IndividualId(0)).followers, vec![IndividualId(2)]);
        state.validate_partitions().unwrap();
    }

    #[test]
    fn test_initiate_requires_eligibility() {
        let mut state = clique(3);
        state.initiate(IndividualId(0)).unwrap();
        // 1 now observes 0's group
        assert!(state.initiate(IndividualId(1)).is_err());
    }

    #[test]
    fn test_follower_counts_cover_the_whole_subtree() {
        let mut state = clique(4);
        state.initiate(IndividualId(0)).unwrap();
        state.follow(IndividualId(0), IndividualId(1)).unwrap();
        state.follow(IndividualId(1), IndividualId(2)).unwrap();
        state.follow(IndividualId(2), IndividualId(3)).unwrap();

        assert_eq!(state.total_follower_count(IndividualId(0)), 3);
        assert_eq!(state.total_follower_count(IndividualId(1)), 2);
        assert_eq!(state.total_follower_count(IndividualId(3)), 0);
    }

    #[test]
    fn test_cancel_cascade_returns_the_whole_chain() {
        let mut state = clique(4);
        state.initiate(IndividualId(0)).unwrap();
        state.follow(IndividualId(0), IndividualId(1)).unwrap();
        state.follow(IndividualId(1), IndividualId(2)).unwrap();

        let affected = state
            .cancel_initiation(IndividualId(0), &StaticPersonality)
            .unwrap();
        assert_eq!(
            affected,
            vec![IndividualId(0), IndividualId(1), IndividualId(2)]
        );
        for id in [IndividualId(0), IndividualId(1), IndividualId(2)] {
            assert!(state.is_remaining(id));
            let ind = state.individual(id);
            assert!(ind.is_remaining());
            assert!(ind.followers.is_empty());
            assert_eq!(ind.first_mover, None);
        }
        assert_eq!(state.departed_count(), 0);
        // With no groups left, everyone is eligible again
        for id in state.ids() {
            assert!(state.is_eligible_initiator(id));
        }
        state.validate_partitions().unwrap();
    }

    #[test]
    fn test_cancel_repairs_first_movers_from_surviving_groups() {
        // 0 and 3 initiate independently is impossible in a clique, so use a
        // line: 0-1-2-3 with k=1 style adjacency built by hand
        let neighbors = |targets: &[u32]| {
            targets
                .iter()
                .map(|&t| Neighbor {
                    id: IndividualId(t),
                    distance: 1.0,
                })
                .collect::<Vec<_>>()
        };
        let mimics = |targets: &[u32]| targets.iter().copied().map(IndividualId).collect::<Vec<_>>();
        let individuals = vec![
            Individual::new(IndividualId(0), Vec2::new(0.0, 0.0), 0.5, 0.5, neighbors(&[1]), mimics(&[1])),
            Individual::new(IndividualId(1), Vec2::new(1.0, 0.0), 0.5, 0.5, neighbors(&[0, 2]), mimics(&[0, 2])),
            Individual::new(IndividualId(2), Vec2::new(2.0, 0.0), 0.5, 0.5, neighbors(&[1, 3]), mimics(&[1, 3])),
            Individual::new(IndividualId(3), Vec2::new(3.0, 0.0), 0.5, 0.5, neighbors(&[2]), mimics(&[2])),
        ];
        let mut state = SimulationState::new(individuals);

        // Two disjoint groups: 0 and 3 cannot see each other
        state.initiate(IndividualId(0)).unwrap();
        state.initiate(IndividualId(3)).unwrap();
        // 2 first observed 3
        assert_eq!(state.individual(IndividualId(2)).first_mover, Some(IndividualId(3)));

        let affected = state
            .cancel_initiation(IndividualId(3), &StaticPersonality)
            .unwrap();
        assert_eq!(affected, vec![IndividualId(3)]);
        // 2's first mover pointed into the cancelled set; no departed
        // neighbor of 2 survives, so it resets to none
        assert_eq!(state.individual(IndividualId(2)).first_mover, None);
        // 1 still watches the surviving group through 0
        assert_eq!(state.individual(IndividualId(1)).first_mover, Some(IndividualId(0)));
        assert!(!state.is_eligible_initiator(IndividualId(1)));
        // 3 is remaining again but watches nobody departed
        assert!(state.is_remaining(IndividualId(3)));
        assert!(state.is_eligible_initiator(IndividualId(3)));
        state.validate_partitions().unwrap();
    }

    #[test]
    fn test_find_potential_followers_scans_remaining_watchers() {
        let mut state = clique(4);
        state.initiate(IndividualId(2)).unwrap();
        let potential = state.find_potential_followers(IndividualId(2)).unwrap();
        assert_eq!(
            potential,
            vec![IndividualId(0), IndividualId(1), IndividualId(3)]
        );

        state.follow(IndividualId(2), IndividualId(0)).unwrap();
        let potential = state.find_potential_followers(IndividualId(2)).unwrap();
        assert_eq!(potential, vec![IndividualId(1), IndividualId(3)]);
    }

    #[test]
    fn test_reset_restores_partitions_but_keeps_counters() {
        let mut state = clique(3);
        state.initiate(IndividualId(0)).unwrap();
        state.follow(IndividualId(0), IndividualId(1)).unwrap();
        state.reset();

        assert_eq!(state.remaining_count(), 3);
        assert_eq!(state.departed_count(), 0);
        for id in state.ids() {
            assert!(state.individual(id).is_remaining());
            assert!(state.is_eligible_initiator(id));
        }
        assert_eq!(state.individual(IndividualId(0)).attempts, 1);
        state.validate_partitions().unwrap();
    }

    #[test]
    fn test_failure_signal_penalizes_initiator_and_bystanders() {
        let mut state = clique(3);
        let calc = crate::entity::personality::DiscountedUpdate::new(
            crate::core::config::PersonalityParams::default(),
        );
        state.initiate(IndividualId(0)).unwrap();
        let before: Vec<f64> = state.ids().map(|id| state.individual(id).personality).collect();

        state.cancel_initiation(IndividualId(0), &calc).unwrap();
        let after: Vec<f64> = state.ids().map(|id| state.individual(id).personality).collect();

        assert!(after[0] < before[0], "initiator penalized");
        assert!(after[1] < before[1], "bystander penalized");
        assert!(after[2] < before[2], "bystander penalized");
        // The true loser moves further than the bystanders
        assert!(before[0] - after[0] > before[1] - after[1]);
    }
}
