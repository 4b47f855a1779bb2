use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl Error {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl ToString) -> Self {
        Self::Storage {
            message: message.to_string(),
        }
    }
}
