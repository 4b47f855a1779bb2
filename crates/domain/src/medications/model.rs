use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ENTITY: &str = "Medication";

/// Dosing frequency. Informational only; reminders are driven by `times`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    TwiceDaily,
    Thrice,
    Twice,
    Once,
}

/// Lifecycle of a medication record. Deleting a medication moves it to
/// `Inactive`; records are never removed.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MedicationState {
    #[default]
    Active,
    Inactive,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub times: Vec<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub state: MedicationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    pub fn is_active(&self) -> bool {
        self.state == MedicationState::Active
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Soft delete. Deactivating twice is a no-op apart from the timestamp.
    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        self.state = MedicationState::Inactive;
        self.updated_at = at;
    }
}
