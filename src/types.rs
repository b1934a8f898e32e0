//! Core type definitions for the line simulator.
//!
//! This module defines the fundamental types shared by the scheduler,
//! the stores and the processes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simulation time in fixed-point ticks.
///
/// One configured time unit is [`TICKS_PER_UNIT`] ticks. Integer ticks keep
/// event ordering exact, so identical configurations replay bit-for-bit.
pub type SimTime = u64;

/// Number of ticks in one configured time unit.
pub const TICKS_PER_UNIT: SimTime = 1000;

/// Unique identifier of an item flowing through the line.
///
/// Items are numbered sequentially by the generator, starting at 1.
pub type ItemId = u64;

/// Identifier of a cooperative process (the generator or a stage).
pub type ProcessId = u32;

/// Index of a store within the line.
pub type StoreId = usize;

/// Converts a time in configured units to ticks, rounding to the nearest tick.
///
/// Negative and non-finite inputs map to 0; callers validate before converting.
pub fn to_ticks(units: f64) -> SimTime {
    if !units.is_finite() || units <= 0.0 {
        return 0;
    }
    (units * TICKS_PER_UNIT as f64).round() as SimTime
}

/// Converts ticks back to configured time units.
pub fn to_units(ticks: SimTime) -> f64 {
    ticks as f64 / TICKS_PER_UNIT as f64
}

/// The five processing steps of the packaging line, in flow order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Fill,
    Cap,
    Label,
    Seal,
    Pack,
}

impl StageKind {
    /// All stages in the order items visit them.
    pub const ALL: [StageKind; 5] = [
        StageKind::Fill,
        StageKind::Cap,
        StageKind::Label,
        StageKind::Seal,
        StageKind::Pack,
    ];

    /// Short lowercase name, as used in configuration files and reports.
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Fill => "fill",
            StageKind::Cap => "cap",
            StageKind::Label => "label",
            StageKind::Seal => "seal",
            StageKind::Pack => "pack",
        }
    }

    /// Position of the stage in the line (0-based).
    pub fn index(&self) -> usize {
        match self {
            StageKind::Fill => 0,
            StageKind::Cap => 1,
            StageKind::Label => 2,
            StageKind::Seal => 3,
            StageKind::Pack => 4,
        }
    }

    /// Returns true for the terminal stage, which has no output buffer.
    pub fn is_last(&self) -> bool {
        matches!(self, StageKind::Pack)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_conversion() {
        assert_eq!(to_ticks(6.5), 6500);
        assert_eq!(to_ticks(10.0), 10_000);
        assert_eq!(to_ticks(0.0004), 0);
        assert_eq!(to_ticks(0.0006), 1);
        assert_eq!(to_ticks(-3.0), 0);
        assert_eq!(to_ticks(f64::NAN), 0);
        assert_eq!(to_units(6500), 6.5);
    }

    #[test]
    fn test_stage_order() {
        for (i, kind) in StageKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert!(StageKind::Pack.is_last());
        assert!(!StageKind::Seal.is_last());
        assert_eq!(StageKind::Label.to_string(), "label");
    }

    #[test]
    fn test_stage_kind_serde() {
        let json = serde_json::to_string(&StageKind::Seal).unwrap();
        assert_eq!(json, "\"seal\"");
        let kind: StageKind = serde_json::from_str("\"cap\"").unwrap();
        assert_eq!(kind, StageKind::Cap);
    }
}
