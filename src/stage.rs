//! Stage process implementation.
//!
//! A `Stage` models one processing step of the line. It repeats the cycle
//!
//! ```text
//! WaitInput -> InService -> WaitOutputSpace -> WaitInput
//! ```
//!
//! for the whole run: take one item from the input store, hold it for the
//! service duration, then deposit it downstream. A full downstream store
//! suspends the stage in `WaitOutputSpace`, which is how backpressure
//! propagates up the line. The terminal stage has no output store and
//! counts the item as completed instead.
//!
//! # Interruptions
//!
//! A [`Wake::Interrupt`] delivered while the stage is parked on its input
//! cuts the wait short: the registration is withdrawn, `blocked_count` is
//! incremented and a fresh get is issued at once, without consuming an item.
//! Interrupts in any other state are ignored; service is never cancelled.

use crate::error::{SimError, SimResult};
use crate::event::Wake;
use crate::process::{Context, Process};
use crate::types::{ItemId, ProcessId, SimTime, StageKind, StoreId};

/// The state of a stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageState {
    /// Not yet started
    Idle,
    /// Parked on the input store since `since`
    WaitInput { since: SimTime },
    /// Holding `item` since `since`
    InService { item: ItemId, since: SimTime },
    /// Parked on a full output store since `since`; the item is held there
    WaitOutputSpace { since: SimTime },
}

impl StageState {
    fn label(&self) -> &'static str {
        match self {
            StageState::Idle => "idle",
            StageState::WaitInput { .. } => "waiting for input",
            StageState::InService { .. } => "in service",
            StageState::WaitOutputSpace { .. } => "waiting for output space",
        }
    }
}

/// One processing step of the line.
///
/// # Example
///
/// ```
/// use linesim::stage::Stage;
/// use linesim::types::StageKind;
///
/// let stage = Stage::new(3, StageKind::Label, 8000, 2, Some(3));
/// assert_eq!(stage.kind(), StageKind::Label);
/// assert_eq!(stage.blocked_count, 0);
/// ```
#[derive(Debug)]
pub struct Stage {
    id: ProcessId,
    kind: StageKind,
    service_duration: SimTime,
    input: StoreId,
    output: Option<StoreId>,
    state: StageState,

    // Statistics
    /// Items whose service finished
    pub processed: u64,
    /// Input waits cut short by an interruption
    pub blocked_count: u64,
    /// Interruptions that arrived outside an input wait
    pub ignored_interrupts: u64,
    starved_time: SimTime,
    blocked_time: SimTime,
    busy_time: SimTime,
}

impl Stage {
    /// Creates a stage.
    ///
    /// # Arguments
    /// * `id` - Process id used as the event target
    /// * `kind` - Which step of the line this is
    /// * `service_duration` - Service time per item, in ticks
    /// * `input` - Store the stage consumes from
    /// * `output` - Store the stage produces into; `None` for the last stage
    pub fn new(
        id: ProcessId,
        kind: StageKind,
        service_duration: SimTime,
        input: StoreId,
        output: Option<StoreId>,
    ) -> Self {
        Self {
            id,
            kind,
            service_duration,
            input,
            output,
            state: StageState::Idle,
            processed: 0,
            blocked_count: 0,
            ignored_interrupts: 0,
            starved_time: 0,
            blocked_time: 0,
            busy_time: 0,
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn service_duration(&self) -> SimTime {
        self.service_duration
    }

    pub fn state(&self) -> &StageState {
        &self.state
    }

    /// Item currently in service, if any.
    pub fn item_in_service(&self) -> Option<ItemId> {
        match self.state {
            StageState::InService { item, .. } => Some(item),
            _ => None,
        }
    }

    /// Time spent parked on the input store, up to `now`.
    pub fn starved_time(&self, now: SimTime) -> SimTime {
        match self.state {
            StageState::WaitInput { since } => self.starved_time + now.saturating_sub(since),
            _ => self.starved_time,
        }
    }

    /// Time spent parked on a full output store, up to `now`.
    pub fn blocked_time(&self, now: SimTime) -> SimTime {
        match self.state {
            StageState::WaitOutputSpace { since } => {
                self.blocked_time + now.saturating_sub(since)
            }
            _ => self.blocked_time,
        }
    }

    /// Time spent serving items, up to `now`.
    pub fn busy_time(&self, now: SimTime) -> SimTime {
        match self.state {
            StageState::InService { since, .. } => self.busy_time + now.saturating_sub(since),
            _ => self.busy_time,
        }
    }

    fn request_input(&mut self, ctx: &mut Context<'_>) -> SimResult<()> {
        match ctx.get(self.input, self.id)? {
            Some(item) => self.begin_service(ctx, item),
            None => self.state = StageState::WaitInput { since: ctx.now() },
        }
        Ok(())
    }

    fn begin_service(&mut self, ctx: &mut Context<'_>, item: ItemId) {
        tracing::trace!(stage = self.kind.name(), item, now = ctx.now(), "service started");
        self.state = StageState::InService {
            item,
            since: ctx.now(),
        };
        ctx.schedule(self.service_duration, self.id, Wake::Timeout);
    }

    fn finish_service(&mut self, ctx: &mut Context<'_>, item: ItemId, since: SimTime) -> SimResult<()> {
        let now = ctx.now();
        self.busy_time += now - since;
        self.processed += 1;

        let Some(output) = self.output else {
            tracing::trace!(stage = self.kind.name(), item, now, "item completed");
            return self.request_input(ctx);
        };

        if ctx.put(output, self.id, item)? {
            self.request_input(ctx)
        } else {
            self.state = StageState::WaitOutputSpace { since: now };
            Ok(())
        }
    }

    fn interrupt(&mut self, ctx: &mut Context<'_>) -> SimResult<()> {
        let withdrawn = matches!(self.state, StageState::WaitInput { .. })
            && ctx.cancel_get(self.input, self.id)?;

        if !withdrawn {
            // Either busy, or a grant for this stage is already in flight.
            self.ignored_interrupts += 1;
            tracing::warn!(
                stage = self.kind.name(),
                state = self.state.label(),
                now = ctx.now(),
                "interrupt ignored"
            );
            return Ok(());
        }

        if let StageState::WaitInput { since } = self.state {
            self.starved_time += ctx.now() - since;
        }
        self.blocked_count += 1;
        tracing::debug!(
            stage = self.kind.name(),
            blocked = self.blocked_count,
            now = ctx.now(),
            "input wait interrupted"
        );
        self.request_input(ctx)
    }

    fn unexpected(&self, wake: Wake) -> SimError {
        SimError::UnexpectedWake {
            process: self.kind.name().to_string(),
            wake,
            state: self.state.label(),
        }
    }
}

impl Process for Stage {
    fn id(&self) -> ProcessId {
        self.id
    }

    fn name(&self) -> &str {
        self.kind.name()
    }

    fn resume(&mut self, ctx: &mut Context<'_>, wake: Wake) -> SimResult<()> {
        match (wake, self.state.clone()) {
            (Wake::Start, StageState::Idle) => self.request_input(ctx),
            (Wake::Granted(item), StageState::WaitInput { since }) => {
                self.starved_time += ctx.now() - since;
                self.begin_service(ctx, item);
                Ok(())
            }
            (Wake::Timeout, StageState::InService { item, since }) => {
                self.finish_service(ctx, item, since)
            }
            (Wake::Admitted, StageState::WaitOutputSpace { since }) => {
                self.blocked_time += ctx.now() - since;
                self.request_input(ctx)
            }
            (Wake::Interrupt, _) => self.interrupt(ctx),
            (wake, _) => Err(self.unexpected(wake)),
        }
    }

    fn held_items(&self) -> usize {
        usize::from(self.item_in_service().is_some())
    }
}
