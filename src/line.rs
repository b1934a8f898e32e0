//! Pipeline orchestrator.
//!
//! A `Line` owns the scheduler, the five stores, the generator and the five
//! stages wired `fill -> cap -> label -> seal -> pack`:
//!
//! ```text
//! generator -> [fill_queue] -> fill -> [cap_queue] -> cap -> [label_queue]
//!   -> label -> [seal_queue] -> seal -> [pack_queue] -> pack
//! ```
//!
//! Every process receives a zero-delay start event before the clock
//! advances, in the order generator, fill, cap, label, seal, pack. After
//! each dispatched event all stores are checked against their capacity; a
//! violation aborts the run.
//!
//! # Example
//!
//! ```
//! use linesim::{Line, LineConfigBuilder};
//!
//! let config = LineConfigBuilder::new().horizon(1000.0).build().unwrap();
//! let report = Line::new(&config).unwrap().run().unwrap();
//! assert_eq!(report.items_generated, 100);
//! ```

use crate::config::LineConfig;
use crate::error::{SimError, SimResult};
use crate::event::{Event, Wake};
use crate::generator::Generator;
use crate::metrics::{LineReport, MetricsCollector};
use crate::process::{Context, Process};
use crate::scheduler::Scheduler;
use crate::stage::Stage;
use crate::store::Store;
use crate::types::{to_ticks, ProcessId, SimTime, StageKind};

/// Process id of the generator; stage `i` (0-based) has id `i + 1`.
pub const GENERATOR_ID: ProcessId = 0;

/// Returns the process id of a stage.
pub fn stage_process_id(kind: StageKind) -> ProcessId {
    kind.index() as ProcessId + 1
}

/// The assembled packaging line.
#[derive(Debug)]
pub struct Line {
    scheduler: Scheduler,
    stores: Vec<Store>,
    generator: Generator,
    stages: Vec<Stage>,
    horizon: SimTime,
    metrics: MetricsCollector,
}

impl Line {
    /// Builds the line from a configuration.
    ///
    /// Fails with a configuration error before any event is scheduled.
    pub fn new(config: &LineConfig) -> SimResult<Self> {
        Self::build(config, Scheduler::new())
    }

    /// Builds the line with event tracing enabled.
    pub fn with_trace(config: &LineConfig) -> SimResult<Self> {
        Self::build(config, Scheduler::new().with_trace())
    }

    fn build(config: &LineConfig, mut scheduler: Scheduler) -> SimResult<Self> {
        config.validate()?;

        let horizon = config.horizon_ticks();
        let capacity = config.line.buffer_capacity;

        let stores: Vec<Store> = StageKind::ALL
            .iter()
            .map(|kind| Store::new(kind.index(), format!("{}_queue", kind), capacity))
            .collect();

        let stages: Vec<Stage> = StageKind::ALL
            .iter()
            .map(|&kind| {
                let input = kind.index();
                let output = (!kind.is_last()).then_some(input + 1);
                Stage::new(
                    stage_process_id(kind),
                    kind,
                    config.service_ticks(kind),
                    input,
                    output,
                )
            })
            .collect();

        let generator = Generator::new(GENERATOR_ID, config.arrival_ticks(), 0, horizon);

        scheduler.schedule(0, GENERATOR_ID, Wake::Start);
        for stage in &stages {
            scheduler.schedule(0, stage.id(), Wake::Start);
        }
        for interruption in &config.interruptions {
            scheduler.schedule(
                to_ticks(interruption.at),
                stage_process_id(interruption.stage),
                Wake::Interrupt,
            );
        }

        tracing::debug!(
            horizon,
            capacity,
            interruptions = config.interruptions.len(),
            "line assembled"
        );

        Ok(Self {
            scheduler,
            stores,
            generator,
            stages,
            horizon,
            metrics: MetricsCollector::new(horizon, config.simulation.time_units_per_hour),
        })
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Observation horizon in ticks.
    pub fn horizon(&self) -> SimTime {
        self.horizon
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, kind: StageKind) -> &Stage {
        &self.stages[kind.index()]
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Executed events in order, if the line was built with tracing.
    pub fn trace(&self) -> Option<&[Event]> {
        self.scheduler.trace()
    }

    /// Items that left the last stage.
    pub fn items_completed(&self) -> u64 {
        self.stage(StageKind::Pack).processed
    }

    /// Advances the simulation to `target` (capped at the horizon).
    ///
    /// May be called repeatedly with increasing targets. Events due after
    /// the horizon are never executed.
    pub fn run_until(&mut self, target: SimTime) -> SimResult<()> {
        let target = target.min(self.horizon);

        let stores = &mut self.stores;
        let generator = &mut self.generator;
        let stages = &mut self.stages;

        self.scheduler.run_until(target, |scheduler, event| {
            {
                let process: &mut dyn Process = if event.target == GENERATOR_ID {
                    &mut *generator
                } else {
                    stages
                        .get_mut(event.target as usize - 1)
                        .ok_or(SimError::UnknownProcess(event.target))?
                };
                let mut ctx = Context::new(scheduler, &mut *stores);
                process.resume(&mut ctx, event.wake)?;
            }

            stores.iter().try_for_each(Store::check_invariant)
        })?;

        Ok(())
    }

    /// Runs to the horizon, checks conservation and returns the report.
    pub fn run(mut self) -> SimResult<LineReport> {
        tracing::info!(horizon = self.horizon, "simulation started");

        self.run_until(self.horizon)?;
        self.check_conservation()?;

        let report = self.report();
        tracing::info!(
            generated = report.items_generated,
            completed = report.items_completed,
            throughput = report.throughput,
            discarded = report.events.discarded,
            "simulation finished"
        );
        Ok(report)
    }

    /// Snapshot of the metrics as of the current time.
    pub fn report(&self) -> LineReport {
        self.metrics.snapshot(
            self.now(),
            &self.generator,
            &self.stages,
            &self.stores,
            self.scheduler.stats(),
            self.scheduler.pending(),
        )
    }

    /// Counts every item currently inside the line.
    ///
    /// An item is either resident in a store, parked with a producer on a
    /// full store, in service at a stage, or carried by a pending hand-off
    /// event.
    pub fn items_in_system(&self) -> u64 {
        let in_stores: usize = self
            .stores
            .iter()
            .map(|s| s.len() + s.put_waiting())
            .sum();
        let in_service: usize = self.stages.iter().map(|s| s.held_items()).sum();
        let in_transit = self
            .scheduler
            .pending_events()
            .filter(|e| e.wake.item().is_some())
            .count();

        (in_stores + in_service + in_transit) as u64
    }

    /// Verifies `generated - completed == items_in_system()`.
    pub fn check_conservation(&self) -> SimResult<()> {
        let generated = self.generator.generated;
        let completed = self.items_completed();
        let in_system = self.items_in_system();

        if completed > generated || generated - completed != in_system {
            tracing::error!(generated, completed, in_system, "item conservation broken");
            return Err(SimError::ConservationBroken {
                generated,
                completed,
                in_system,
            });
        }
        Ok(())
    }
}

/// Builds and runs a line in one call.
pub fn run(config: &LineConfig) -> SimResult<LineReport> {
    Line::new(config)?.run()
}
