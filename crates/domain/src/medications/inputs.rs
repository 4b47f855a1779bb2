use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use ulid::Ulid;

use crate::errors::Error;
use crate::time::{clearable_instant, flexible_instant, parse_clock_time};

use super::model::{Frequency, Medication, MedicationState};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicationInput {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default, deserialize_with = "flexible_instant::deserialize")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_instant::deserialize")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewMedicationInput {
    /// Validate and turn the input into a fresh, active medication owned by
    /// `user_id`.
    pub fn into_medication(self, user_id: &str, now: DateTime<Utc>) -> Result<Medication, Error> {
        require_text("name", &self.name)?;
        require_text("dosage", &self.dosage)?;
        validate_times(&self.times)?;

        Ok(Medication {
            id: Ulid::new().to_string(),
            user_id: user_id.to_string(),
            name: self.name.trim().to_string(),
            dosage: self.dosage.trim().to_string(),
            frequency: self.frequency,
            times: self.times,
            start_date: self.start_date.unwrap_or(now),
            end_date: self.end_date,
            notes: self.notes,
            state: MedicationState::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. Absent fields are left untouched; an explicit `null`
/// clears `endDate` or `notes`. Owner, id and lifecycle state cannot be
/// changed through a patch.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub times: Option<Vec<String>>,
    #[serde(default, deserialize_with = "flexible_instant::deserialize")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "clearable_instant::deserialize")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "clearable")]
    pub notes: Option<Option<String>>,
}

fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl MedicationPatch {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(dosage) = &self.dosage {
            require_text("dosage", dosage)?;
        }
        if let Some(times) = &self.times {
            validate_times(times)?;
        }
        Ok(())
    }

    pub fn apply(&self, medication: &mut Medication, at: DateTime<Utc>) {
        if let Some(name) = &self.name {
            medication.name = name.trim().to_string();
        }
        if let Some(dosage) = &self.dosage {
            medication.dosage = dosage.trim().to_string();
        }
        if let Some(frequency) = self.frequency {
            medication.frequency = frequency;
        }
        if let Some(times) = &self.times {
            medication.times.clone_from(times);
        }
        if let Some(start_date) = self.start_date {
            medication.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            medication.end_date = end_date;
        }
        if let Some(notes) = &self.notes {
            medication.notes.clone_from(notes);
        }
        medication.updated_at = at;
    }
}

fn require_text(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(())
}

fn validate_times(times: &[String]) -> Result<(), Error> {
    for time in times {
        if parse_clock_time(time).is_none() {
            return Err(Error::validation(format!(
                "Invalid time '{time}', expected HH:MM"
            )));
        }
    }
    Ok(())
}
