use chrono::{DateTime, Utc};
use serde::Deserialize;
use ulid::Ulid;

use crate::errors::Error;
use crate::time::flexible_instant;

use super::log::{AdherenceLog, AdherenceStatus};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAdherenceInput {
    pub medication_id: String,
    #[serde(default, deserialize_with = "flexible_instant::deserialize")]
    pub scheduled_time: Option<DateTime<Utc>>,
    pub status: AdherenceStatus,
    #[serde(default, deserialize_with = "flexible_instant::deserialize")]
    pub taken_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LogAdherenceInput {
    /// Build the log entry for `user_id`. A taken dose without an explicit
    /// taken time is stamped with `now`; any other status drops the taken
    /// time.
    pub fn into_log(self, user_id: &str, now: DateTime<Utc>) -> Result<AdherenceLog, Error> {
        if self.medication_id.trim().is_empty() {
            return Err(Error::validation("medicationId is required"));
        }
        let scheduled_time = self
            .scheduled_time
            .ok_or_else(|| Error::validation("scheduledTime is required"))?;

        let taken_time = match self.status {
            AdherenceStatus::Taken => Some(self.taken_time.unwrap_or(now)),
            AdherenceStatus::Missed | AdherenceStatus::Skipped => None,
        };

        Ok(AdherenceLog {
            id: Ulid::new().to_string(),
            user_id: user_id.to_string(),
            medication_id: self.medication_id,
            scheduled_time,
            taken_time,
            status: self.status,
            notes: self.notes,
            created_at: now,
        })
    }
}
