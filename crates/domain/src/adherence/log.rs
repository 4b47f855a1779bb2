use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a scheduled dose.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdherenceStatus {
    Taken,
    Missed,
    Skipped,
}

/// One scheduled-dose event. `taken_time` is only ever set for
/// [`AdherenceStatus::Taken`].
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceLog {
    pub id: String,
    pub user_id: String,
    pub medication_id: String,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_time: Option<DateTime<Utc>>,
    pub status: AdherenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AdherenceLog {
    pub fn is_taken(&self) -> bool {
        self.status == AdherenceStatus::Taken
    }
}
