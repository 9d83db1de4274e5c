//! Departure events: cached candidates and the run history

use serde::{Deserialize, Serialize};

use crate::core::types::{DepartureKind, IndividualId, Time};

/// A candidate next event for one individual
///
/// While cached by the driver, `time` holds the residual waiting time and is
/// decremented as simulated time advances. Decrementing instead of
/// resampling is valid because the sampled waiting times are memoryless: an
/// individual whose local state did not change has no reason to be redrawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartureEvent {
    pub individual: IndividualId,
    /// Observed group member being followed; None for Initiate and Cancel
    pub leader: Option<IndividualId>,
    pub kind: DepartureKind,
    pub time: Time,
}

/// One applied event in a trial's append-only history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartureRecord {
    pub individual: IndividualId,
    pub leader: Option<IndividualId>,
    pub kind: DepartureKind,
    /// Absolute simulated time the event was applied at
    pub time: Time,
}
