//! Adherence analytics: pure aggregation over already-fetched log entries.

use serde::{Serialize, Serializer};

use crate::adherence::AdherenceLog;

/// Overall statistics
pub mod stats;

/// Weekday and time-of-day patterns
pub mod patterns;

/// Per-medication breakdown
pub mod medications;

pub use medications::{per_medication, MedicationAdherence};
pub use patterns::{time_of_day_pattern, weekly_pattern, DayPattern, DayPeriod, PeriodPattern};
pub use stats::{compute_stats, AdherenceStats};

/// Number of most recent entries the pattern views look at.
pub const RECENT_WINDOW: usize = 100;

/// Share of taken doses, in percent.
///
/// Serializes as the number `0` when there is nothing to measure and as a
/// two-decimal string (`"70.00"`) otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum AdherenceRate {
    #[default]
    NoData,
    Percent(f64),
}

impl AdherenceRate {
    pub fn from_counts(taken: usize, total: usize) -> Self {
        if total == 0 {
            return Self::NoData;
        }
        let percent = taken as f64 / total as f64 * 100.0;
        Self::Percent((percent * 100.0).round() / 100.0)
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::NoData => 0.0,
            Self::Percent(percent) => *percent,
        }
    }
}

impl Serialize for AdherenceRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NoData => serializer.serialize_u8(0),
            Self::Percent(percent) => serializer.serialize_str(&format!("{percent:.2}")),
        }
    }
}

/// The newest `RECENT_WINDOW` entries, by scheduled time descending.
pub fn recent_window(entries: &[AdherenceLog]) -> Vec<&AdherenceLog> {
    let mut recent: Vec<&AdherenceLog> = entries.iter().collect();
    recent.sort_by(|a, b| b.scheduled_time.cmp(&a.scheduled_time));
    recent.truncate(RECENT_WINDOW);
    recent
}
