//! The cooperative process abstraction.
//!
//! A process is a state machine resumed by the scheduler. Each resumption
//! runs to completion without yielding; the process suspends by returning
//! after it has either scheduled a timed wake-up or parked itself on a store.
//!
//! Processes reach the clock, the queue and the stores only through a
//! [`Context`], which also turns store outcomes into the zero-delay wake-ups
//! of whichever peer process was unblocked.

use crate::error::{SimError, SimResult};
use crate::event::{EventId, Wake};
use crate::scheduler::Scheduler;
use crate::store::{GetOutcome, PutOutcome, Store};
use crate::types::{ItemId, ProcessId, SimTime, StoreId};

/// The core trait implemented by the generator and the stages.
pub trait Process: Send {
    /// Returns the unique identifier of this process.
    fn id(&self) -> ProcessId;

    /// Human-readable name used in logs and reports.
    fn name(&self) -> &str;

    /// Resumes the process.
    ///
    /// # Arguments
    /// * `ctx` - Access to the clock, event queue and stores
    /// * `wake` - Why the process is being resumed
    fn resume(&mut self, ctx: &mut Context<'_>, wake: Wake) -> SimResult<()>;

    /// Number of items this process currently holds (in service).
    ///
    /// Items parked on a full store are owned by that store's put-waiter
    /// queue and are not counted here.
    fn held_items(&self) -> usize {
        0
    }
}

/// The view of the simulation handed to a process while it runs.
pub struct Context<'a> {
    scheduler: &'a mut Scheduler,
    stores: &'a mut [Store],
}

impl<'a> Context<'a> {
    pub fn new(scheduler: &'a mut Scheduler, stores: &'a mut [Store]) -> Self {
        Self { scheduler, stores }
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Schedules a wake-up of `target` after `delay` ticks.
    pub fn schedule(&mut self, delay: SimTime, target: ProcessId, wake: Wake) -> EventId {
        self.scheduler.schedule(delay, target, wake)
    }

    /// Puts `item` into `store` on behalf of `producer`.
    ///
    /// Returns `true` if the put completed now, `false` if the producer is
    /// parked and will be resumed with [`Wake::Admitted`].
    pub fn put(&mut self, store: StoreId, producer: ProcessId, item: ItemId) -> SimResult<bool> {
        let now = self.scheduler.now();
        let target = self
            .stores
            .get_mut(store)
            .ok_or(SimError::UnknownStore(store))?;

        match target.put(now, producer, item) {
            PutOutcome::Stored => Ok(true),
            PutOutcome::HandedOff { getter, item } => {
                tracing::trace!(store = target.name(), item, getter, "hand-off");
                self.scheduler.schedule(0, getter, Wake::Granted(item));
                Ok(true)
            }
            PutOutcome::Suspended => {
                tracing::debug!(store = target.name(), item, producer, now, "put suspended");
                Ok(false)
            }
        }
    }

    /// Takes the oldest item from `store` on behalf of `consumer`.
    ///
    /// Returns `None` if the consumer is parked and will be resumed with
    /// [`Wake::Granted`].
    pub fn get(&mut self, store: StoreId, consumer: ProcessId) -> SimResult<Option<ItemId>> {
        let now = self.scheduler.now();
        let source = self
            .stores
            .get_mut(store)
            .ok_or(SimError::UnknownStore(store))?;

        match source.get(now, consumer) {
            GetOutcome::Taken { item, admitted } => {
                if let Some(producer) = admitted {
                    tracing::trace!(store = source.name(), producer, "put admitted");
                    self.scheduler.schedule(0, producer, Wake::Admitted);
                }
                Ok(Some(item))
            }
            GetOutcome::Suspended => {
                tracing::trace!(store = source.name(), consumer, now, "get suspended");
                Ok(None)
            }
        }
    }

    /// Withdraws a parked consumer from `store`.
    pub fn cancel_get(&mut self, store: StoreId, consumer: ProcessId) -> SimResult<bool> {
        let source = self
            .stores
            .get_mut(store)
            .ok_or(SimError::UnknownStore(store))?;
        Ok(source.cancel_get(consumer))
    }
}
