//! Parameter sweeps over independent line configurations.
//!
//! Each configuration runs on its own `Line`; runs share nothing, so the
//! results are identical whether they execute sequentially or in parallel.
//!
//! # Feature Flag
//!
//! Parallel execution requires the `parallel` feature:
//! ```toml
//! [dependencies]
//! linesim = { version = "0.1", features = ["parallel"] }
//! ```
//! Without it, `SweepRunner::run` falls back to a sequential loop.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::LineConfig;
use crate::error::SimResult;
use crate::line;
use crate::metrics::LineReport;
use crate::types::StageKind;

/// Runs a batch of configurations.
///
/// # Example
///
/// ```
/// use linesim::sweep::{capacity_sweep, SweepRunner};
/// use linesim::LineConfigBuilder;
///
/// let base = LineConfigBuilder::new().horizon(500.0).build().unwrap();
/// let results = SweepRunner::new().run(&capacity_sweep(&base, &[1, 2, 5]));
/// assert_eq!(results.len(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SweepRunner {
    /// Number of worker threads (0 = auto)
    num_threads: usize,
}

impl SweepRunner {
    /// Creates a runner using the default thread count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads.
    ///
    /// Pass 0 for automatic detection (uses number of CPUs). Ignored without
    /// the `parallel` feature.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Returns the configured thread count.
    pub fn threads(&self) -> usize {
        self.num_threads
    }

    /// Runs every configuration, returning results in input order.
    #[cfg(not(feature = "parallel"))]
    pub fn run(&self, configs: &[LineConfig]) -> Vec<SimResult<LineReport>> {
        configs.iter().map(line::run).collect()
    }

    /// Runs every configuration on a rayon pool, returning results in input order.
    #[cfg(feature = "parallel")]
    pub fn run(&self, configs: &[LineConfig]) -> Vec<SimResult<LineReport>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build();

        match pool {
            Ok(pool) => pool.install(|| configs.par_iter().map(line::run).collect()),
            Err(err) => {
                tracing::warn!(error = %err, "thread pool unavailable, running sequentially");
                configs.iter().map(line::run).collect()
            }
        }
    }
}

/// Copies `base` once per buffer capacity.
pub fn capacity_sweep(base: &LineConfig, capacities: &[usize]) -> Vec<LineConfig> {
    capacities
        .iter()
        .map(|&capacity| {
            let mut config = base.clone();
            config.line.buffer_capacity = capacity;
            config
        })
        .collect()
}

/// Copies `base` once per service duration of `stage`.
pub fn duration_sweep(base: &LineConfig, stage: StageKind, durations: &[f64]) -> Vec<LineConfig> {
    durations
        .iter()
        .map(|&duration| {
            let mut config = base.clone();
            config.line.stages.set(stage, duration);
            config
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineConfigBuilder;

    fn base() -> LineConfig {
        LineConfigBuilder::new().horizon(2000.0).build().unwrap()
    }

    #[test]
    fn test_capacity_sweep_configs() {
        let configs = capacity_sweep(&base(), &[1, 3, 8]);
        let capacities: Vec<_> = configs.iter().map(|c| c.line.buffer_capacity).collect();
        assert_eq!(capacities, vec![1, 3, 8]);
    }

    #[test]
    fn test_duration_sweep_configs() {
        let configs = duration_sweep(&base(), StageKind::Pack, &[6.0, 12.0]);
        assert_eq!(configs[1].line.stages.pack, 12.0);
        assert_eq!(configs[1].line.stages.fill, 6.5);
    }

    #[test]
    fn test_sweep_matches_individual_runs() {
        let configs = duration_sweep(&base(), StageKind::Label, &[4.0, 9.0, 15.0]);
        let results = SweepRunner::new().with_threads(2).run(&configs);

        for (config, result) in configs.iter().zip(results) {
            let expected = line::run(config).unwrap();
            assert_eq!(result.unwrap(), expected);
        }
    }

    #[test]
    fn test_sweep_reports_invalid_configs() {
        let mut configs = capacity_sweep(&base(), &[2]);
        configs.push({
            let mut bad = base();
            bad.line.arrival_interval = 0.0;
            bad
        });

        let results = SweepRunner::new().run(&configs);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
