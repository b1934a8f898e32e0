//! Event definitions for the line simulator.
//!
//! An event is a pending wake-up of one process at a given simulation time.
//! Events are ordered by `(time, id)`; the id is a submission counter, so
//! events due at the same instant run in the order they were scheduled.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ItemId, ProcessId, SimTime};

/// Unique identifier for a scheduled event.
///
/// Ids are handed out in submission order and double as the tie-breaker
/// for events due at the same time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    /// Creates an event ID from a raw value.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw event ID.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a process is being resumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wake {
    /// First activation, before the clock advances.
    Start,
    /// A timed hold (service time or arrival interval) has elapsed.
    Timeout,
    /// A suspended `get` was satisfied with this item.
    Granted(ItemId),
    /// A suspended `put` was admitted into its store.
    Admitted,
    /// Fault signal cutting a wait short.
    Interrupt,
}

impl Wake {
    /// Returns the item carried by this wake-up, if any.
    pub fn item(&self) -> Option<ItemId> {
        match self {
            Wake::Granted(item) => Some(*item),
            _ => None,
        }
    }
}

/// A scheduled wake-up.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    /// Submission id, also the tie-breaker
    pub id: EventId,
    /// The simulation time at which this event is due
    pub time: SimTime,
    /// The process to resume
    pub target: ProcessId,
    /// The reason for resuming it
    pub wake: Wake,
}

impl Event {
    /// Creates a new event.
    pub fn new(id: EventId, time: SimTime, target: ProcessId, wake: Wake) -> Self {
        Self {
            id,
            time,
            target,
            wake,
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
