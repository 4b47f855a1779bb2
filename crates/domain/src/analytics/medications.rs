use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::adherence::AdherenceLog;
use crate::medications::Medication;
use crate::time::DateRange;

use super::stats::AdherenceStats;

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAdherence {
    pub medication_id: String,
    pub medication_name: Option<String>,
    #[serde(flatten)]
    pub stats: AdherenceStats,
}

/// Statistics per referenced medication, best adherence first. Names are
/// resolved from `medications`; logs for unknown ids keep a `None` name.
pub fn per_medication(
    entries: &[AdherenceLog],
    medications: &[Medication],
    range: Option<&DateRange>,
) -> Vec<MedicationAdherence> {
    let mut grouped: BTreeMap<&str, AdherenceStats> = BTreeMap::new();
    for entry in entries {
        if range.map_or(true, |r| r.contains(&entry.scheduled_time)) {
            grouped
                .entry(entry.medication_id.as_str())
                .or_default()
                .record(entry.status);
        }
    }

    let names: HashMap<&str, &str> = medications
        .iter()
        .map(|m| (m.id.as_str(), m.name.as_str()))
        .collect();

    let mut breakdown: Vec<MedicationAdherence> = grouped
        .into_iter()
        .map(|(id, stats)| MedicationAdherence {
            medication_id: id.to_string(),
            medication_name: names.get(id).map(|name| name.to_string()),
            stats,
        })
        .collect();

    // BTreeMap order already breaks ties by id; the sort is stable.
    breakdown.sort_by(|a, b| {
        b.stats
            .adherence_rate
            .value()
            .total_cmp(&a.stats.adherence_rate.value())
    });
    breakdown
}
