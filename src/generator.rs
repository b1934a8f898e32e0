//! Item generator process.
//!
//! The generator releases a new item every `arrival_interval` ticks and puts
//! it into the first store of the line. It is subject to the same
//! backpressure as any stage: while the first store is full the put is
//! parked and no further items are created. The next interval starts only
//! after the put completes.

use crate::error::{SimError, SimResult};
use crate::event::Wake;
use crate::process::{Context, Process};
use crate::types::{ItemId, ProcessId, SimTime, StoreId};

/// Process that injects items into the line at a fixed interval.
#[derive(Debug)]
pub struct Generator {
    id: ProcessId,
    interval: SimTime,
    target: StoreId,
    stop_at: SimTime,
    last_item: ItemId,
    suspended_since: Option<SimTime>,

    /// Items created so far
    pub generated: u64,
    /// Number of puts that had to be parked
    pub suspensions: u64,
    suspended_time: SimTime,
}

impl Generator {
    /// Creates a generator.
    ///
    /// # Arguments
    /// * `id` - Process id used as the event target
    /// * `interval` - Ticks between consecutive items
    /// * `target` - Store receiving the items
    /// * `stop_at` - No tick is scheduled after this time
    pub fn new(id: ProcessId, interval: SimTime, target: StoreId, stop_at: SimTime) -> Self {
        Self {
            id,
            interval,
            target,
            stop_at,
            last_item: 0,
            suspended_since: None,
            generated: 0,
            suspensions: 0,
            suspended_time: 0,
        }
    }

    /// Returns true while a put is parked on a full store.
    pub fn is_suspended(&self) -> bool {
        self.suspended_since.is_some()
    }

    /// Total time spent parked on a full store, up to `now`.
    pub fn suspended_time(&self, now: SimTime) -> SimTime {
        match self.suspended_since {
            Some(since) => self.suspended_time + now.saturating_sub(since),
            None => self.suspended_time,
        }
    }

    fn schedule_next(&mut self, ctx: &mut Context<'_>) {
        if ctx.now().saturating_add(self.interval) <= self.stop_at {
            ctx.schedule(self.interval, self.id, Wake::Timeout);
        } else {
            tracing::debug!(now = ctx.now(), "generator reached horizon");
        }
    }

    fn release(&mut self, ctx: &mut Context<'_>) -> SimResult<()> {
        self.last_item += 1;
        self.generated += 1;
        let item = self.last_item;
        tracing::trace!(item, now = ctx.now(), "item generated");

        if ctx.put(self.target, self.id, item)? {
            self.schedule_next(ctx);
        } else {
            self.suspensions += 1;
            self.suspended_since = Some(ctx.now());
        }
        Ok(())
    }
}

impl Process for Generator {
    fn id(&self) -> ProcessId {
        self.id
    }

    fn name(&self) -> &str {
        "generator"
    }

    fn resume(&mut self, ctx: &mut Context<'_>, wake: Wake) -> SimResult<()> {
        match wake {
            Wake::Start => {
                self.schedule_next(ctx);
                Ok(())
            }
            Wake::Timeout if !self.is_suspended() => self.release(ctx),
            Wake::Admitted => match self.suspended_since.take() {
                Some(since) => {
                    self.suspended_time += ctx.now() - since;
                    self.schedule_next(ctx);
                    Ok(())
                }
                None => Err(SimError::UnexpectedWake {
                    process: self.name().to_string(),
                    wake,
                    state: "running",
                }),
            },
            wake => Err(SimError::UnexpectedWake {
                process: self.name().to_string(),
                wake,
                state: if self.is_suspended() { "suspended" } else { "running" },
            }),
        }
    }
}
