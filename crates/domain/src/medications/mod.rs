/// Medication entity and lifecycle
pub mod model;

/// Input DTOs
pub mod inputs;

/// Daily reminder expansion
pub mod reminders;

pub use inputs::{MedicationPatch, NewMedicationInput};
pub use model::{Frequency, Medication, MedicationState, ENTITY};
pub use reminders::{todays_reminders, Reminder};
