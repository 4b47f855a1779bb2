use serde::Serialize;

use crate::adherence::{AdherenceLog, AdherenceStatus};
use crate::time::DateRange;

use super::AdherenceRate;

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceStats {
    pub total: usize,
    pub taken: usize,
    pub missed: usize,
    pub skipped: usize,
    pub adherence_rate: AdherenceRate,
}

impl AdherenceStats {
    pub fn record(&mut self, status: AdherenceStatus) {
        self.total += 1;
        match status {
            AdherenceStatus::Taken => self.taken += 1,
            AdherenceStatus::Missed => self.missed += 1,
            AdherenceStatus::Skipped => self.skipped += 1,
        }
        self.adherence_rate = AdherenceRate::from_counts(self.taken, self.total);
    }
}

/// Count entries by status, restricted to `range` when one is given.
pub fn compute_stats<'a, I>(entries: I, range: Option<&DateRange>) -> AdherenceStats
where
    I: IntoIterator<Item = &'a AdherenceLog>,
{
    let mut stats = AdherenceStats::default();
    for entry in entries {
        if range.map_or(true, |r| r.contains(&entry.scheduled_time)) {
            stats.record(entry.status);
        }
    }
    stats
}
