/// Adherence log entry
pub mod log;

/// Input DTOs
pub mod inputs;

pub use inputs::LogAdherenceInput;
pub use log::{AdherenceLog, AdherenceStatus};
