//! # linesim
//!
//! A discrete-event simulator for a five-stage packaging line.
//!
//! Items are generated at a fixed interval and flow through fill, cap,
//! label, seal and pack. Adjacent stages are joined by bounded FIFO buffers
//! with blocking put/get, so a slow stage backs the whole line up. The run
//! reports throughput, work-in-process inventory and per-stage blocking
//! probability over a fixed horizon.
//!
//! ## Design Principles
//!
//! - **Virtual time**: the clock jumps from one scheduled event to the
//!   next. There is no wall-clock pacing.
//! - **Deterministic replay**: events are ordered by `(time, submission
//!   order)` and time is fixed-point, so identical configurations produce
//!   bit-identical reports.
//! - **Cooperative processes**: the generator and each stage are state
//!   machines resumed one at a time by a single scheduler loop.
//! - **Single ownership**: every item is in exactly one buffer, held by
//!   exactly one process, or carried by exactly one pending hand-off.
//!
//! ## Features
//!
//! - `parallel` - Run parameter sweeps on a rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use linesim::{Line, LineConfigBuilder, StageKind};
//!
//! let config = LineConfigBuilder::new()
//!     .horizon(10_000.0)
//!     .buffer_capacity(5)
//!     .arrival_interval(10.0)
//!     .stage_durations([6.5, 5.0, 8.0, 5.0, 6.0])
//!     .build()
//!     .unwrap();
//!
//! let report = Line::new(&config).unwrap().run().unwrap();
//! assert_eq!(report.items_generated, 1000);
//! assert_eq!(report.blocking_probability(StageKind::Fill), Some(0.0));
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use linesim::LineConfig;
//!
//! let config = LineConfig::from_yaml_file("line.yaml")?;
//! let report = linesim::run(&config)?;
//! println!("{}", report.summary()?);
//! ```

pub mod types;
pub mod event;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod process;
pub mod stage;
pub mod generator;
pub mod line;
pub mod config;
pub mod metrics;
pub mod sweep;

// Re-export commonly used types
pub use types::{ItemId, ProcessId, SimTime, StageKind, StoreId, TICKS_PER_UNIT};
pub use event::{Event, EventId, Wake};
pub use error::{SimError, SimResult};
pub use scheduler::{Scheduler, SchedulerStats};
pub use store::{GetOutcome, PutOutcome, Store};
pub use process::{Context, Process};
pub use stage::{Stage, StageState};
pub use generator::Generator;
pub use line::{run, Line};
pub use config::{ConfigError, InterruptionConfig, LineConfig, LineConfigBuilder, StageDurations};
pub use metrics::{LineReport, MetricsCollector, StageReport};
pub use sweep::SweepRunner;

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging. `RUST_LOG`
/// takes precedence over `level` when set.
///
/// # Example
///
/// ```rust,ignore
/// linesim::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
