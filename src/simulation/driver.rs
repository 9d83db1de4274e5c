//! The per-trial next-event loop
//!
//! Each step finds the globally earliest candidate event, applies it, and
//! invalidates every cached candidate the change could have influenced.
//! Candidates that survive a step are aged by decrementing their residual
//! waiting time instead of being resampled, which is exactly equivalent to a
//! fresh draw because the sampled processes are memoryless.
//!
//! An individual is *active* while it can still act: remaining, or departed
//! and leaderless (an initiator that can still cancel). Followers never act.

use ordered_float::OrderedFloat;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{DepartureKind, GroupId, IndividualId, Time};
use crate::entity::PersonalityCalculator;
use crate::hazard::HazardModel;
use crate::simulation::event::{DepartureEvent, DepartureRecord};
use crate::simulation::state::SimulationState;

/// Everything a trial produces for the reporter
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    /// True iff the whole population departed
    pub successful: bool,
    /// Leaderless departed individuals at loop exit (empty on collapse)
    pub final_initiators: Vec<IndividualId>,
    /// Largest number of simultaneous initiators seen during the trial
    pub max_initiator_count: usize,
    /// Append-only record of every applied event, in order
    pub history: Vec<DepartureRecord>,
    /// Total simulated time elapsed
    pub elapsed: Time,
}

/// Run one trial to completion over a freshly reset state
pub fn run_trial(
    state: &mut SimulationState,
    hazard: &dyn HazardModel,
    personality: &dyn PersonalityCalculator,
    config: &SimConfig,
    rng: &mut ChaCha8Rng,
) -> Result<TrialOutcome> {
    let len = state.len();
    TrialDriver {
        state,
        hazard,
        personality,
        config,
        rng,
        cache: vec![None; len],
        departure_times: vec![None; len],
        history: Vec::new(),
        elapsed: 0.0,
        last_step: 0.0,
        max_initiators: 0,
    }
    .run()
}

struct TrialDriver<'a> {
    state: &'a mut SimulationState,
    hazard: &'a dyn HazardModel,
    personality: &'a dyn PersonalityCalculator,
    config: &'a SimConfig,
    rng: &'a mut ChaCha8Rng,
    /// Cached next candidate per individual, holding residual times
    cache: Vec<Option<DepartureEvent>>,
    /// Absolute departure time of currently departed individuals
    departure_times: Vec<Option<Time>>,
    history: Vec<DepartureRecord>,
    elapsed: Time,
    /// Simulated time consumed by the previous step
    last_step: Time,
    max_initiators: usize,
}

impl TrialDriver<'_> {
    fn run(mut self) -> Result<TrialOutcome> {
        // At least one full iteration before the exit check: the bootstrap
        // initiator always departs first
        loop {
            self.refresh_candidates()?;
            let event = self.select_next()?;
            self.apply(event)?;

            let initiators = self.count_initiators();
            self.max_initiators = self.max_initiators.max(initiators);

            if self.state.remaining_count() == 0 || self.state.departed_count() == 0 {
                break;
            }
        }

        let successful = self.state.remaining_count() == 0;
        let final_initiators: Vec<IndividualId> = self
            .state
            .ids()
            .filter(|&id| self.state.is_departed(id) && self.state.individual(id).leader.is_none())
            .collect();
        if successful {
            for &id in &final_initiators {
                self.state.signal_initiation_success(id, self.personality);
            }
        }

        Ok(TrialOutcome {
            successful,
            final_initiators,
            max_initiator_count: self.max_initiators,
            history: self.history,
            elapsed: self.elapsed,
        })
    }

    fn is_active(&self, id: IndividualId) -> bool {
        self.state.is_remaining(id)
            || (self.state.is_departed(id) && self.state.individual(id).leader.is_none())
    }

    fn count_initiators(&self) -> usize {
        self.state
            .ids()
            .filter(|&id| self.state.is_departed(id) && self.state.individual(id).leader.is_none())
            .count()
    }

    /// Age every surviving candidate by the previous step and build fresh
    /// ones where the cache was invalidated
    fn refresh_candidates(&mut self) -> Result<()> {
        for idx in 0..self.cache.len() {
            let id = IndividualId(idx as u32);
            if !self.is_active(id) {
                self.cache[idx] = None;
                continue;
            }
            if let Some(event) = self.cache[idx].as_mut() {
                event.time -= self.last_step;
                if event.time < 0.0 {
                    return Err(SimError::Invariant(format!(
                        "residual time for {id:?} went negative ({})",
                        event.time
                    )));
                }
            } else {
                let event = self.build_candidate(id)?;
                self.cache[idx] = Some(event);
            }
        }
        Ok(())
    }

    fn build_candidate(&mut self, id: IndividualId) -> Result<DepartureEvent> {
        if self.state.is_departed(id) {
            return self.cancel_candidate(id);
        }

        let observed = self.observed_groups(id);
        if observed.is_empty() {
            if !self.state.is_eligible_initiator(id) {
                return Err(SimError::Invariant(format!(
                    "{id:?} observes no group but is not tracked as eligible"
                )));
            }
            let time = self
                .hazard
                .initiation_time(self.state.individual(id), self.rng);
            let time = self.checked(id, DepartureKind::Initiate, time)?;
            return Ok(DepartureEvent {
                individual: id,
                leader: None,
                kind: DepartureKind::Initiate,
                time,
            });
        }
        if self.state.is_eligible_initiator(id) {
            return Err(SimError::Invariant(format!(
                "{id:?} observes a group but is still tracked as eligible"
            )));
        }

        // One follow candidate per observed group; keep the earliest
        let mut best: Option<DepartureEvent> = None;
        for (group, members) in observed {
            let leader = self.earliest_departed(&members);
            let observed_size = if self.config.local_departed_count {
                members.len()
            } else {
                self.state.group_size(group)
            };
            let reference_size = if self.config.local_reference_group {
                self.state.individual(id).neighbors.len()
            } else {
                self.state.len()
            };
            let time = self.hazard.follow_time(
                self.state.individual(id),
                self.state.individual(leader),
                observed_size,
                reference_size,
                self.rng,
            );
            let time = self.checked(id, DepartureKind::Follow, time)?;
            let better = best
                .as_ref()
                .map_or(true, |b| OrderedFloat(time) < OrderedFloat(b.time));
            if better {
                best = Some(DepartureEvent {
                    individual: id,
                    leader: Some(leader),
                    kind: DepartureKind::Follow,
                    time,
                });
            }
        }
        best.ok_or_else(|| {
            SimError::Invariant(format!("{id:?} produced no candidate from observed groups"))
        })
    }

    fn cancel_candidate(&mut self, id: IndividualId) -> Result<DepartureEvent> {
        // An initiator whose entire neighborhood already follows has nobody
        // left to be abandoned by; it will never cancel
        let time = if self.state.total_follower_count(id)
            >= self.state.individual(id).neighbors.len()
        {
            f64::INFINITY
        } else {
            let departed_including_self = if self.config.local_departed_count {
                1 + self
                    .state
                    .individual(id)
                    .neighbor_ids()
                    .filter(|&n| self.state.is_departed(n))
                    .count()
            } else {
                self.state.departed_count()
            };
            let time = self.hazard.cancel_time(
                self.state.individual(id),
                departed_including_self,
                self.rng,
            );
            self.checked(id, DepartureKind::Cancel, time)?
        };
        Ok(DepartureEvent {
            individual: id,
            leader: None,
            kind: DepartureKind::Cancel,
            time,
        })
    }

    /// Observed groups among `id`'s neighbors, in neighbor-list order, each
    /// with its observed members
    fn observed_groups(&self, id: IndividualId) -> Vec<(GroupId, Vec<IndividualId>)> {
        let mut groups: Vec<(GroupId, Vec<IndividualId>)> = Vec::new();
        for neighbor in &self.state.individual(id).neighbors {
            if let Some(group) = self.state.individual(neighbor.id).group {
                match groups.iter_mut().find(|(g, _)| *g == group) {
                    Some((_, members)) => members.push(neighbor.id),
                    None => groups.push((group, vec![neighbor.id])),
                }
            }
        }
        groups
    }

    /// The member with the earliest absolute departure time; ties keep the
    /// first (closest) member
    fn earliest_departed(&self, members: &[IndividualId]) -> IndividualId {
        let mut earliest = members[0];
        let mut earliest_time = self.departure_time_of(earliest);
        for &member in &members[1..] {
            let time = self.departure_time_of(member);
            if OrderedFloat(time) < OrderedFloat(earliest_time) {
                earliest = member;
                earliest_time = time;
            }
        }
        earliest
    }

    fn departure_time_of(&self, id: IndividualId) -> Time {
        self.departure_times[id.index()].unwrap_or(f64::INFINITY)
    }

    /// Reject NaN and negative waiting times at the point of sampling
    fn checked(&self, id: IndividualId, kind: DepartureKind, time: f64) -> Result<f64> {
        if time.is_nan() || time < 0.0 {
            return Err(SimError::HazardSample {
                kind,
                individual: id,
                value: time,
            });
        }
        Ok(time)
    }

    /// Globally earliest candidate; ties go to the first encountered in
    /// arena order
    fn select_next(&self) -> Result<DepartureEvent> {
        let mut best: Option<&DepartureEvent> = None;
        for slot in &self.cache {
            if let Some(event) = slot {
                let better = best
                    .map_or(true, |b| OrderedFloat(event.time) < OrderedFloat(b.time));
                if better {
                    best = Some(event);
                }
            }
        }
        let event = best.cloned().ok_or_else(|| {
            SimError::Invariant("no candidate event found for a non-empty population".into())
        })?;
        if !event.time.is_finite() {
            return Err(SimError::Invariant(
                "simulation stalled: earliest candidate waiting time is infinite".into(),
            ));
        }
        Ok(event)
    }

    fn apply(&mut self, event: DepartureEvent) -> Result<()> {
        let id = event.individual;
        let now = self.elapsed + event.time;
        match event.kind {
            DepartureKind::Initiate => {
                self.state.initiate(id)?;
                self.departure_times[id.index()] = Some(now);
                self.invalidate_with_mimics(id);
                let potential = self.state.find_potential_followers(id)?.len();
                tracing::trace!(individual = ?id, time = now, potential_followers = potential, "initiation");
            }
            DepartureKind::Follow => {
                let leader = event.leader.ok_or_else(|| {
                    SimError::Invariant(format!("follow event for {id:?} carries no leader"))
                })?;
                self.state.follow(leader, id)?;
                self.departure_times[id.index()] = Some(now);
                self.invalidate_with_mimics(id);
                tracing::trace!(individual = ?id, leader = ?leader, time = now, "follow");
            }
            DepartureKind::Cancel => {
                let affected = self.state.cancel_initiation(id, self.personality)?;
                for &member in &affected {
                    self.departure_times[member.index()] = None;
                    self.invalidate_with_mimics(member);
                }
                tracing::trace!(individual = ?id, cascade = affected.len(), time = now, "cancellation");
            }
        }

        self.history.push(DepartureRecord {
            individual: id,
            leader: event.leader,
            kind: event.kind,
            time: now,
        });
        self.elapsed = now;
        self.last_step = event.time;
        Ok(())
    }

    /// Evict the cached candidate of an individual whose observable world
    /// changed, and of everyone watching it
    fn invalidate_with_mimics(&mut self, id: IndividualId) {
        self.cache[id.index()] = None;
        let mimics = self.state.individual(id).mimics.clone();
        for watcher in mimics {
            self.cache[watcher.index()] = None;
        }
    }
}
