//! Metrics collection and export for the line simulator.
//!
//! Counters live with their owners (generator, stages, stores) during the
//! run. The [`MetricsCollector`] reads them once, after the horizon, and
//! derives a [`LineReport`] that can be exported to JSON, CSV or a
//! human-readable summary.
//!
//! # Inventory
//!
//! `avg_inventory` is the mean over the five buffers of their occupancy at
//! the final instant. `time_weighted_inventory` is the mean over the
//! buffers of their time-averaged occupancy over the whole window. The two
//! differ materially on congested lines; both are reported.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::generator::Generator;
use crate::scheduler::SchedulerStats;
use crate::stage::Stage;
use crate::store::Store;
use crate::types::{to_units, SimTime, StageKind};

/// Final statistics of one line run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineReport {
    /// Observation window, in time units
    pub horizon: f64,
    /// Items released into the line
    pub items_generated: u64,
    /// Items that left the last stage
    pub items_completed: u64,
    /// Items released per hour
    pub throughput: f64,
    /// Items completed per hour
    pub completion_rate: f64,
    /// Mean final-instant buffer occupancy
    pub avg_inventory: f64,
    /// Mean time-averaged buffer occupancy
    pub time_weighted_inventory: f64,
    /// Generator statistics
    pub generator: GeneratorReport,
    /// Per-stage statistics, in flow order
    pub stages: Vec<StageReport>,
    /// Per-buffer statistics, in flow order
    pub buffers: Vec<BufferReport>,
    /// Event queue statistics
    pub events: EventReport,
}

/// Generator statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorReport {
    pub generated: u64,
    /// Puts that had to wait for space
    pub suspensions: u64,
    /// Time spent waiting for space, in time units
    pub suspended_time: f64,
}

/// Statistics for a single stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: StageKind,
    pub service_duration: f64,
    pub processed: u64,
    pub blocked_count: u64,
    /// `blocked_count / horizon`
    pub blocking_probability: f64,
    pub ignored_interrupts: u64,
    /// Time parked on an empty input, in time units
    pub starved_time: f64,
    /// Time parked on a full output, in time units
    pub blocked_time: f64,
    /// Time in service, in time units
    pub busy_time: f64,
    /// `busy_time / horizon`
    pub utilization: f64,
}

/// Statistics for a single buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BufferReport {
    pub name: String,
    pub capacity: usize,
    pub final_occupancy: usize,
    pub mean_occupancy: f64,
    pub peak_occupancy: usize,
    pub puts: u64,
    pub gets: u64,
}

/// Event queue statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    pub scheduled: u64,
    pub executed: u64,
    /// Events due after the horizon, never executed
    pub discarded: usize,
    pub peak_queue_len: usize,
}

/// Derives a [`LineReport`] from the line's components.
#[derive(Clone, Debug)]
pub struct MetricsCollector {
    horizon: SimTime,
    time_units_per_hour: f64,
}

impl MetricsCollector {
    /// Creates a collector for a window of `horizon` ticks.
    pub fn new(horizon: SimTime, time_units_per_hour: f64) -> Self {
        Self {
            horizon,
            time_units_per_hour,
        }
    }

    fn per_hour(&self, count: u64) -> f64 {
        count as f64 * self.time_units_per_hour / to_units(self.horizon)
    }

    /// Builds the report as of time `now`.
    pub fn snapshot(
        &self,
        now: SimTime,
        generator: &Generator,
        stages: &[Stage],
        stores: &[Store],
        events: &SchedulerStats,
        pending_events: usize,
    ) -> LineReport {
        let horizon_units = to_units(self.horizon);
        let items_completed = stages
            .iter()
            .find(|s| s.kind().is_last())
            .map(|s| s.processed)
            .unwrap_or(0);

        let stage_reports: Vec<StageReport> = stages
            .iter()
            .map(|stage| {
                let busy_time = to_units(stage.busy_time(now));
                StageReport {
                    stage: stage.kind(),
                    service_duration: to_units(stage.service_duration()),
                    processed: stage.processed,
                    blocked_count: stage.blocked_count,
                    blocking_probability: stage.blocked_count as f64 / horizon_units,
                    ignored_interrupts: stage.ignored_interrupts,
                    starved_time: to_units(stage.starved_time(now)),
                    blocked_time: to_units(stage.blocked_time(now)),
                    busy_time,
                    utilization: busy_time / horizon_units,
                }
            })
            .collect();

        let buffer_reports: Vec<BufferReport> = stores
            .iter()
            .map(|store| BufferReport {
                name: store.name().to_string(),
                capacity: store.capacity(),
                final_occupancy: store.len(),
                mean_occupancy: store.mean_occupancy(now),
                peak_occupancy: store.peak(),
                puts: store.puts(),
                gets: store.gets(),
            })
            .collect();

        let buffer_count = buffer_reports.len().max(1) as f64;
        let avg_inventory = buffer_reports
            .iter()
            .map(|b| b.final_occupancy as f64)
            .sum::<f64>()
            / buffer_count;
        let time_weighted_inventory =
            buffer_reports.iter().map(|b| b.mean_occupancy).sum::<f64>() / buffer_count;

        LineReport {
            horizon: horizon_units,
            items_generated: generator.generated,
            items_completed,
            throughput: self.per_hour(generator.generated),
            completion_rate: self.per_hour(items_completed),
            avg_inventory,
            time_weighted_inventory,
            generator: GeneratorReport {
                generated: generator.generated,
                suspensions: generator.suspensions,
                suspended_time: to_units(generator.suspended_time(now)),
            },
            stages: stage_reports,
            buffers: buffer_reports,
            events: EventReport {
                scheduled: events.events_scheduled,
                executed: events.events_executed,
                discarded: pending_events,
                peak_queue_len: events.peak_queue_len,
            },
        }
    }
}

impl LineReport {
    /// Returns the statistics of one stage.
    pub fn stage(&self, kind: StageKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == kind)
    }

    /// Returns the blocking probability of one stage.
    pub fn blocking_probability(&self, kind: StageKind) -> Option<f64> {
        self.stage(kind).map(|s| s.blocking_probability)
    }

    /// Exports the report to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports the report to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self.to_json().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e)
        })?;
        std::fs::write(path, json)
    }

    /// Exports summary metrics to CSV.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("metric,value\n");
        csv.push_str(&format!("horizon,{}\n", self.horizon));
        csv.push_str(&format!("items_generated,{}\n", self.items_generated));
        csv.push_str(&format!("items_completed,{}\n", self.items_completed));
        csv.push_str(&format!("throughput,{:.4}\n", self.throughput));
        csv.push_str(&format!("completion_rate,{:.4}\n", self.completion_rate));
        csv.push_str(&format!("avg_inventory,{:.4}\n", self.avg_inventory));
        csv.push_str(&format!(
            "time_weighted_inventory,{:.4}\n",
            self.time_weighted_inventory
        ));
        csv.push_str(&format!(
            "generator_suspended_time,{:.4}\n",
            self.generator.suspended_time
        ));

        csv
    }

    /// Exports per-stage statistics to CSV.
    pub fn stages_to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("stage,service_duration,processed,blocked_count,blocking_probability,starved_time,blocked_time,utilization\n");

        for s in &self.stages {
            csv.push_str(&format!(
                "{},{},{},{},{:.6},{:.4},{:.4},{:.4}\n",
                s.stage,
                s.service_duration,
                s.processed,
                s.blocked_count,
                s.blocking_probability,
                s.starved_time,
                s.blocked_time,
                s.utilization,
            ));
        }

        csv
    }

    /// Exports summary metrics to a CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "=== Packaging Line ===")?;
        writeln!(w, "Horizon: {} time units", self.horizon)?;
        writeln!(
            w,
            "Items: {} generated, {} completed",
            self.items_generated, self.items_completed
        )?;
        writeln!(w, "Throughput: {} units/hr", self.throughput)?;
        writeln!(w, "Completion rate: {:.2} units/hr", self.completion_rate)?;
        writeln!(
            w,
            "Average inventory levels in buffers: {:.2}",
            self.avg_inventory
        )?;
        writeln!(
            w,
            "Time-weighted inventory levels in buffers: {:.2}",
            self.time_weighted_inventory
        )?;
        writeln!(w)?;

        writeln!(w, "Downtime probabilities:")?;
        for s in &self.stages {
            writeln!(w, "- {}: {:.2}%", s.stage, s.blocking_probability * 100.0)?;
        }
        writeln!(w)?;

        writeln!(w, "--- Stages ---")?;
        for s in &self.stages {
            writeln!(
                w,
                "{:<6} processed {:>7}  util {:>6.2}%  starved {:>10.1}  blocked {:>10.1}",
                s.stage.name(),
                s.processed,
                s.utilization * 100.0,
                s.starved_time,
                s.blocked_time,
            )?;
        }

        writeln!(w, "--- Buffers ---")?;
        for b in &self.buffers {
            writeln!(
                w,
                "{:<12} final {}/{}  mean {:.2}  peak {}",
                b.name, b.final_occupancy, b.capacity, b.mean_occupancy, b.peak_occupancy,
            )?;
        }

        writeln!(
            w,
            "Generator suspended for {:.1} time units ({} times)",
            self.generator.suspended_time, self.generator.suspensions
        )?;

        Ok(())
    }

    /// Returns the summary as a string.
    pub fn summary(&self) -> std::io::Result<String> {
        let mut buf = Vec::new();
        self.write_summary(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> LineReport {
        let collector = MetricsCollector::new(100_000, 3600.0);
        let mut generator = Generator::new(0, 10_000, 0, 100_000);
        generator.generated = 10;

        let mut pack = Stage::new(1, StageKind::Pack, 6000, 0, None);
        pack.processed = 8;
        pack.blocked_count = 2;

        let mut store = Store::new(0, "pack_queue", 5);
        store.put(0, 0, 1);
        store.put(50_000, 0, 2);

        collector.snapshot(
            100_000,
            &generator,
            &[pack],
            &[store],
            &SchedulerStats::default(),
            3,
        )
    }

    #[test]
    fn test_snapshot_derivations() {
        let report = sample_report();

        assert_eq!(report.horizon, 100.0);
        assert_eq!(report.items_generated, 10);
        assert_eq!(report.items_completed, 8);
        assert!((report.throughput - 360.0).abs() < 1e-9);
        assert!((report.completion_rate - 288.0).abs() < 1e-9);
        assert_eq!(report.avg_inventory, 2.0);
        assert!((report.time_weighted_inventory - 1.5).abs() < 1e-9);
        assert_eq!(report.blocking_probability(StageKind::Pack), Some(0.02));
        assert_eq!(report.blocking_probability(StageKind::Fill), None);
        assert_eq!(report.events.discarded, 3);
    }

    #[test]
    fn test_csv_export() {
        let report = sample_report();

        let csv = report.to_csv();
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("items_generated,10"));
        assert!(csv.contains("throughput,360.0000"));

        let stages = report.stages_to_csv();
        assert!(stages.contains("pack,6,8,2,0.020000"));
    }

    #[test]
    fn test_json_export() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        let restored: LineReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, restored);
    }

    #[test]
    fn test_summary_output() {
        let summary = sample_report().summary().unwrap();
        assert!(summary.contains("Throughput: 360 units/hr"));
        assert!(summary.contains("- pack: 2.00%"));
        assert!(summary.contains("pack_queue"));
    }
}
