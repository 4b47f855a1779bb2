use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::adherence::AdherenceLog;
use crate::errors::Error;
use crate::medications::{Medication, MedicationPatch, ENTITY as MEDICATION};
use crate::time::DateRange;

use super::{AdherenceLogStore, MedicationStore};

/// Lock-guarded, process-local store. Records keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    medications: RwLock<Vec<Medication>>,
    logs: RwLock<Vec<AdherenceLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the medication matching both id and owner and mutate it while
    /// the write lock is held.
    fn modify<F>(&self, user_id: &str, id: &str, change: F) -> Result<Medication, Error>
    where
        F: FnOnce(&mut Medication),
    {
        let mut medications = self.medications.write().map_err(poisoned)?;
        let medication = medications
            .iter_mut()
            .find(|m| m.id == id && m.is_owned_by(user_id))
            .ok_or_else(|| Error::not_found(MEDICATION))?;

        change(medication);
        Ok(medication.clone())
    }
}

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::storage("memory store lock poisoned")
}

#[async_trait]
impl MedicationStore for MemoryStore {
    async fn insert(&self, medication: Medication) -> Result<Medication, Error> {
        let mut medications = self.medications.write().map_err(poisoned)?;
        medications.push(medication.clone());
        Ok(medication)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Medication>, Error> {
        let medications = self.medications.read().map_err(poisoned)?;
        Ok(medications
            .iter()
            .filter(|m| m.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn list_active(&self, user_id: &str) -> Result<Vec<Medication>, Error> {
        let medications = self.medications.read().map_err(poisoned)?;
        Ok(medications
            .iter()
            .filter(|m| m.is_owned_by(user_id) && m.is_active())
            .cloned()
            .collect())
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Medication>, Error> {
        let medications = self.medications.read().map_err(poisoned)?;
        Ok(medications
            .iter()
            .find(|m| m.id == id && m.is_owned_by(user_id))
            .cloned())
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        patch: &MedicationPatch,
    ) -> Result<Medication, Error> {
        let now = Utc::now();
        self.modify(user_id, id, |m| patch.apply(m, now))
    }

    async fn deactivate(&self, user_id: &str, id: &str) -> Result<Medication, Error> {
        let now = Utc::now();
        self.modify(user_id, id, |m| m.deactivate(now))
    }
}

#[async_trait]
impl AdherenceLogStore for MemoryStore {
    async fn insert(&self, log: AdherenceLog) -> Result<AdherenceLog, Error> {
        let mut logs = self.logs.write().map_err(poisoned)?;
        logs.push(log.clone());
        Ok(log)
    }

    async fn list(
        &self,
        user_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<AdherenceLog>, Error> {
        let logs = self.logs.read().map_err(poisoned)?;
        Ok(logs
            .iter()
            .filter(|l| l.user_id == user_id)
            .filter(|l| range.map_or(true, |r| r.contains(&l.scheduled_time)))
            .cloned()
            .collect())
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<AdherenceLog>, Error> {
        let logs = self.logs.read().map_err(poisoned)?;
        let mut owned: Vec<AdherenceLog> = logs
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.scheduled_time.cmp(&a.scheduled_time));
        owned.truncate(limit);
        Ok(owned)
    }
}
