use chrono::{DateTime, FixedOffset, TimeZone};
use derive_new::new;
use serde::Serialize;

use crate::time::parse_clock_time;

use super::model::Medication;

#[derive(Clone, Debug, Serialize, Eq, PartialEq, new)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub medication_id: String,
    pub medication_name: String,
    pub dosage: String,
    pub time: String,
    pub scheduled_date_time: DateTime<FixedOffset>,
}

/// Expand every configured clock time of each active medication into a
/// reminder instant on the calendar day of `now`.
///
/// Frequency and the start/end dates are not consulted.
pub fn todays_reminders(medications: &[Medication], now: DateTime<FixedOffset>) -> Vec<Reminder> {
    let today = now.date_naive();
    let offset = now.offset();

    let mut reminders = Vec::new();
    for medication in medications.iter().filter(|m| m.is_active()) {
        for time in &medication.times {
            let Some(clock) = parse_clock_time(time) else {
                tracing::warn!(
                    "Skipping unparseable reminder time {:?} for medication {}",
                    time,
                    medication.id
                );
                continue;
            };

            let Some(scheduled) = offset.from_local_datetime(&today.and_time(clock)).single()
            else {
                continue;
            };

            reminders.push(Reminder::new(
                medication.id.clone(),
                medication.name.clone(),
                medication.dosage.clone(),
                time.clone(),
                scheduled,
            ));
        }
    }

    reminders
}
