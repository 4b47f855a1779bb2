//! Medication Adherence Domain Models

/// Adherence log entries
pub mod adherence;

/// Adherence analytics
pub mod analytics;

/// Domain errors
pub mod errors;

/// Medications and reminders
pub mod medications;

/// Persistence
pub mod store;

/// Date and clock-time parsing
pub mod time;

pub use errors::Error;
