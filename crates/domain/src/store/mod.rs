//! Persistence seams for medications and adherence logs.
//!
//! Every operation is scoped by the owning user. Conditional writes
//! (`update`, `deactivate`) only succeed when a record matches both the id
//! and the owner, and report [`Error::NotFound`] otherwise.

use async_trait::async_trait;

use crate::adherence::AdherenceLog;
use crate::errors::Error;
use crate::medications::{Medication, MedicationPatch};
use crate::time::DateRange;

/// DynamoDB backend
pub mod dynamo;

/// In-process backend
pub mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait MedicationStore: Send + Sync {
    async fn insert(&self, medication: Medication) -> Result<Medication, Error>;

    /// Every medication of the user, active or not.
    async fn list(&self, user_id: &str) -> Result<Vec<Medication>, Error>;

    async fn list_active(&self, user_id: &str) -> Result<Vec<Medication>, Error>;

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Medication>, Error>;

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        patch: &MedicationPatch,
    ) -> Result<Medication, Error>;

    async fn deactivate(&self, user_id: &str, id: &str) -> Result<Medication, Error>;
}

#[async_trait]
pub trait AdherenceLogStore: Send + Sync {
    async fn insert(&self, log: AdherenceLog) -> Result<AdherenceLog, Error>;

    /// Entries of the user, restricted to `range` (inclusive, on scheduled
    /// time) when given.
    async fn list(&self, user_id: &str, range: Option<&DateRange>)
        -> Result<Vec<AdherenceLog>, Error>;

    /// The user's `limit` newest entries by scheduled time, newest first.
    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<AdherenceLog>, Error>;
}
