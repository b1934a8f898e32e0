//! Bounded FIFO buffer with blocking put/get.
//!
//! A `Store` sits between two adjacent processes. It never drops an item and
//! never reorders them: a `put` on a full store parks the item with its
//! producer in the put-waiter queue, and a `get` on an empty store parks the
//! consumer in the get-waiter queue. Both queues are served strictly FIFO.
//!
//! The store itself does not touch the scheduler. Operations return an
//! outcome naming the process that must be resumed, and the caller schedules
//! that wake-up (see [`crate::process::Context`]).
//!
//! # Example
//!
//! ```
//! use linesim::store::{GetOutcome, PutOutcome, Store};
//!
//! let mut store = Store::new(0, "fill_queue", 1);
//! assert_eq!(store.put(0, 10, 1), PutOutcome::Stored);
//! assert_eq!(store.put(0, 10, 2), PutOutcome::Suspended);
//!
//! // Taking the first item admits the parked one
//! assert_eq!(store.get(5, 20), GetOutcome::Taken { item: 1, admitted: Some(10) });
//! assert_eq!(store.len(), 1);
//! ```

use std::collections::VecDeque;

use crate::error::{SimError, SimResult};
use crate::types::{ItemId, ProcessId, SimTime, StoreId};

/// Result of a `put` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    /// The item was appended to the store.
    Stored,
    /// A consumer was waiting; the item goes straight to it.
    HandedOff { getter: ProcessId, item: ItemId },
    /// The store is full; the producer is parked holding its item.
    Suspended,
}

/// Result of a `get` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GetOutcome {
    /// The oldest item was removed. If a producer was parked, its item took
    /// the vacated slot and that producer must be resumed.
    Taken {
        item: ItemId,
        admitted: Option<ProcessId>,
    },
    /// The store is empty; the consumer is parked.
    Suspended,
}

/// A fixed-capacity FIFO buffer.
#[derive(Debug)]
pub struct Store {
    id: StoreId,
    name: String,
    capacity: usize,
    contents: VecDeque<ItemId>,
    put_waiters: VecDeque<(ProcessId, ItemId)>,
    get_waiters: VecDeque<ProcessId>,

    // Occupancy integral in item-ticks, closed up to `last_change`
    occupancy_area: u128,
    last_change: SimTime,
    peak: usize,
    puts: u64,
    gets: u64,
}

impl Store {
    /// Creates an empty store.
    pub fn new(id: StoreId, name: impl Into<String>, capacity: usize) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            contents: VecDeque::with_capacity(capacity),
            put_waiters: VecDeque::new(),
            get_waiters: VecDeque::new(),
            occupancy_area: 0,
            last_change: 0,
            peak: 0,
            puts: 0,
            gets: 0,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of resident items.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.contents.len() >= self.capacity
    }

    /// Resident items, oldest first.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.contents.iter().copied()
    }

    /// Number of producers parked on a full store.
    pub fn put_waiting(&self) -> usize {
        self.put_waiters.len()
    }

    /// Number of consumers parked on an empty store.
    pub fn get_waiting(&self) -> usize {
        self.get_waiters.len()
    }

    /// Items parked with their producers, not yet admitted.
    pub fn parked_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.put_waiters.iter().map(|&(_, item)| item)
    }

    /// Offers `item` from `producer` at time `now`.
    pub fn put(&mut self, now: SimTime, producer: ProcessId, item: ItemId) -> PutOutcome {
        if let Some(getter) = self.get_waiters.pop_front() {
            // Consumers only wait on an empty store, so the item bypasses it.
            debug_assert!(self.contents.is_empty());
            self.puts += 1;
            self.gets += 1;
            return PutOutcome::HandedOff { getter, item };
        }

        if self.contents.len() < self.capacity {
            self.accumulate(now);
            self.contents.push_back(item);
            self.peak = self.peak.max(self.contents.len());
            self.puts += 1;
            PutOutcome::Stored
        } else {
            self.put_waiters.push_back((producer, item));
            PutOutcome::Suspended
        }
    }

    /// Requests the oldest item on behalf of `consumer` at time `now`.
    pub fn get(&mut self, now: SimTime, consumer: ProcessId) -> GetOutcome {
        self.accumulate(now);

        let Some(item) = self.contents.pop_front() else {
            self.get_waiters.push_back(consumer);
            return GetOutcome::Suspended;
        };
        self.gets += 1;

        let admitted = self.put_waiters.pop_front().map(|(producer, parked)| {
            self.contents.push_back(parked);
            self.puts += 1;
            producer
        });

        GetOutcome::Taken { item, admitted }
    }

    /// Withdraws a parked consumer. Returns false if it was not waiting.
    pub fn cancel_get(&mut self, consumer: ProcessId) -> bool {
        match self.get_waiters.iter().position(|&p| p == consumer) {
            Some(pos) => {
                self.get_waiters.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Verifies `len <= capacity`.
    pub fn check_invariant(&self) -> SimResult<()> {
        if self.contents.len() > self.capacity {
            tracing::error!(
                store = %self.name,
                occupancy = self.contents.len(),
                capacity = self.capacity,
                "buffer capacity exceeded"
            );
            return Err(SimError::CapacityExceeded {
                store: self.name.clone(),
                occupancy: self.contents.len(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Occupancy integral (item-ticks) from time zero up to `now`.
    pub fn occupancy_area(&self, now: SimTime) -> u128 {
        let open = now.saturating_sub(self.last_change) as u128 * self.contents.len() as u128;
        self.occupancy_area + open
    }

    /// Time-averaged occupancy over `[0, now]`.
    pub fn mean_occupancy(&self, now: SimTime) -> f64 {
        if now == 0 {
            return self.contents.len() as f64;
        }
        self.occupancy_area(now) as f64 / now as f64
    }

    /// Highest resident count seen.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Items accepted, including direct hand-offs.
    pub fn puts(&self) -> u64 {
        self.puts
    }

    /// Items delivered, including direct hand-offs.
    pub fn gets(&self) -> u64 {
        self.gets
    }

    /// Appends an item without any capacity check.
    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, item: ItemId) {
        self.contents.push_back(item);
    }

    fn accumulate(&mut self, now: SimTime) {
        if now > self.last_change {
            let span = (now - self.last_change) as u128;
            self.occupancy_area += span * self.contents.len() as u128;
            self.last_change = now;
        }
    }
}
