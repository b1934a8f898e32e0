//! Virtual clock and event queue.
//!
//! The `Scheduler` owns the simulation clock and a min-heap of pending
//! wake-ups. Time only moves when an event is popped: the clock jumps to
//! that event's due time. Events due at the same time are executed in
//! submission order.
//!
//! # Horizon Semantics
//!
//! `run_until(horizon, ..)` executes every event with `time <= horizon` and
//! leaves later events in the queue untouched. They are never executed; the
//! owner reports them as discarded. The clock finishes at `horizon` even if
//! the queue drained earlier.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventId, Wake};
use crate::types::{ProcessId, SimTime};

/// Counters maintained by the scheduler.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Events submitted via `schedule`
    pub events_scheduled: u64,
    /// Events popped and handed to the dispatcher
    pub events_executed: u64,
    /// Largest queue length observed
    pub peak_queue_len: usize,
}

/// The virtual clock and its pending-event queue.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: SimTime,
    queue: BinaryHeap<Reverse<Event>>,
    next_id: u64,
    stats: SchedulerStats,
    trace: Option<Vec<Event>>,
}

impl Scheduler {
    /// Creates a scheduler with the clock at zero and an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every executed event, in execution order.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    /// Returns the current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedules `target` to be resumed with `wake` after `delay` ticks.
    pub fn schedule(&mut self, delay: SimTime, target: ProcessId, wake: Wake) -> EventId {
        let id = EventId::from_raw(self.next_id);
        self.next_id += 1;

        let time = self.now.saturating_add(delay);
        self.queue.push(Reverse(Event::new(id, time, target, wake)));

        self.stats.events_scheduled += 1;
        self.stats.peak_queue_len = self.stats.peak_queue_len.max(self.queue.len());
        id
    }

    /// Returns the due time of the next pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|Reverse(event)| event.time)
    }

    /// Pops the next event if it is due at or before `limit`, advancing the clock.
    pub fn pop_due(&mut self, limit: SimTime) -> Option<Event> {
        match self.peek_time() {
            Some(time) if time <= limit => {}
            _ => return None,
        }

        let Reverse(event) = self.queue.pop()?;
        debug_assert!(event.time >= self.now, "event queue went back in time");
        self.now = event.time;
        self.stats.events_executed += 1;

        if let Some(trace) = self.trace.as_mut() {
            trace.push(event.clone());
        }

        Some(event)
    }

    /// Executes every event due at or before `horizon`.
    ///
    /// Each popped event is passed to `handler` together with the scheduler
    /// itself, so the handler can schedule follow-up events. The first
    /// handler error stops the loop and is returned. On success the clock is
    /// left at `horizon` and the number of executed events is returned.
    pub fn run_until<E, F>(&mut self, horizon: SimTime, mut handler: F) -> Result<u64, E>
    where
        F: FnMut(&mut Scheduler, Event) -> Result<(), E>,
    {
        let mut executed = 0;

        while let Some(event) = self.pop_due(horizon) {
            tracing::trace!(
                time = event.time,
                id = event.id.as_raw(),
                target = event.target,
                wake = ?event.wake,
                "dispatch"
            );
            handler(self, event)?;
            executed += 1;
        }

        if self.now < horizon {
            self.now = horizon;
        }

        Ok(executed)
    }

    /// Returns the number of pending events.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Iterates pending events in no particular order.
    pub fn pending_events(&self) -> impl Iterator<Item = &Event> {
        self.queue.iter().map(|Reverse(event)| event)
    }

    /// Returns the scheduler counters.
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Returns the executed-event trace, if tracing was enabled.
    pub fn trace(&self) -> Option<&[Event]> {
        self.trace.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_pop_in_time_order() {
        let mut sched = Scheduler::new();
        sched.schedule(300, 1, Wake::Timeout);
        sched.schedule(100, 2, Wake::Timeout);
        sched.schedule(200, 3, Wake::Timeout);

        let order: Vec<_> = std::iter::from_fn(|| sched.pop_due(SimTime::MAX))
            .map(|e| (e.time, e.target))
            .collect();

        assert_eq!(order, vec![(100, 2), (200, 3), (300, 1)]);
        assert_eq!(sched.now(), 300);
    }

    #[test]
    fn test_same_time_is_fifo() {
        let mut sched = Scheduler::new();
        for target in [5, 3, 9, 1] {
            sched.schedule(50, target, Wake::Start);
        }

        let targets: Vec<_> = std::iter::from_fn(|| sched.pop_due(50))
            .map(|e| e.target)
            .collect();

        assert_eq!(targets, vec![5, 3, 9, 1]);
    }

    #[test]
    fn test_delay_is_relative_to_now() {
        let mut sched = Scheduler::new();
        sched.schedule(100, 1, Wake::Timeout);
        sched.pop_due(100).unwrap();

        sched.schedule(0, 2, Wake::Admitted);
        sched.schedule(25, 3, Wake::Timeout);

        assert_eq!(sched.peek_time(), Some(100));
        assert_eq!(sched.pop_due(1000).unwrap().target, 2);
        assert_eq!(sched.pop_due(1000).unwrap().time, 125);
    }

    #[test]
    fn test_run_until_executes_horizon_events_and_keeps_later_ones() {
        let mut sched = Scheduler::new();
        sched.schedule(100, 1, Wake::Timeout);
        sched.schedule(200, 2, Wake::Timeout);
        sched.schedule(201, 3, Wake::Timeout);

        let mut seen = Vec::new();
        let executed = sched
            .run_until(200, |_, event| -> Result<(), ()> {
                seen.push(event.target);
                Ok(())
            })
            .unwrap();

        assert_eq!(executed, 2);
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(sched.now(), 200);
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn test_run_until_handler_can_reschedule() {
        let mut sched = Scheduler::new();
        sched.schedule(0, 1, Wake::Start);

        let mut fired = 0u32;
        sched
            .run_until(1000, |s, _| -> Result<(), ()> {
                fired += 1;
                s.schedule(300, 1, Wake::Timeout);
                Ok(())
            })
            .unwrap();

        // t = 0, 300, 600, 900; the event at 1200 stays pending
        assert_eq!(fired, 4);
        assert_eq!(sched.peek_time(), Some(1200));
    }

    #[test]
    fn test_run_until_advances_idle_clock() {
        let mut sched = Scheduler::new();
        let executed = sched.run_until(500, |_, _| -> Result<(), ()> { Ok(()) }).unwrap();
        assert_eq!(executed, 0);
        assert_eq!(sched.now(), 500);
    }

    #[test]
    fn test_run_until_stops_on_error() {
        let mut sched = Scheduler::new();
        sched.schedule(10, 1, Wake::Timeout);
        sched.schedule(20, 2, Wake::Timeout);

        let result = sched.run_until(100, |_, event| {
            if event.target == 1 {
                Err("boom")
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Err("boom"));
        assert_eq!(sched.now(), 10);
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn test_trace_and_stats() {
        let mut sched = Scheduler::new().with_trace();
        sched.schedule(5, 1, Wake::Start);
        sched.schedule(5, 2, Wake::Start);
        sched.run_until(5, |_, _| -> Result<(), ()> { Ok(()) }).unwrap();

        let trace = sched.trace().unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].target, 1);
        assert_eq!(sched.stats().events_scheduled, 2);
        assert_eq!(sched.stats().events_executed, 2);
        assert_eq!(sched.stats().peak_queue_len, 2);
    }
}
