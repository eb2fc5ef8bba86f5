//! Error taxonomy shared by the domain, storage and gateway layers.

use shared::FieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// One or more form fields failed validation
    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Another record already uses this email address
    #[error("Email already registered")]
    DuplicateEmail { email: String },

    #[error("Student with ID {id} not found")]
    NotFound { id: String },

    /// Status change that the verification workflow does not allow
    #[error("Cannot change status of {id}: {reason}")]
    InvalidTransition { id: String, reason: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The remote record store could not be reached
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// Unexpected persistence failure with full context chain
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        RegistryError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(id: &str) -> Self {
        RegistryError::NotFound { id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, RegistryError::Unavailable(_))
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
