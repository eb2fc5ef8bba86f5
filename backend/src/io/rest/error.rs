//! HTTP mapping for domain errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, info, warn};
use shared::ApiResponse;

use crate::domain::errors::RegistryError;

impl RegistryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::Validation(_) => StatusCode::BAD_REQUEST,
            RegistryError::DuplicateEmail { .. } => StatusCode::CONFLICT,
            RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
            RegistryError::InvalidTransition { .. } => StatusCode::CONFLICT,
            RegistryError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            RegistryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RegistryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error kind carried in the response envelope, so clients do
    /// not have to match on status codes or message text
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::Validation(_) => "validation",
            RegistryError::DuplicateEmail { .. } => "duplicate_email",
            RegistryError::NotFound { .. } => "not_found",
            RegistryError::InvalidTransition { .. } => "invalid_transition",
            RegistryError::InvalidCredentials => "invalid_credentials",
            RegistryError::Unavailable(_) => "unavailable",
            RegistryError::Storage(_) => "internal",
        }
    }

    /// Message safe to show to users, without internal details
    pub fn user_message(&self) -> String {
        match self {
            RegistryError::Validation(_) => "Please correct the highlighted fields".to_string(),
            RegistryError::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        match &self {
            RegistryError::Storage(_) | RegistryError::Unavailable(_) => {
                error!("Internal service error: {:#}", self);
            }
            RegistryError::InvalidCredentials => {
                info!("Authentication failed");
            }
            _ => {
                warn!("Request rejected: {}", self);
            }
        }

        let status = self.status_code();
        let mut body = ApiResponse::<()>::failure(self.user_message()).with_code(self.code());
        if let RegistryError::Validation(errors) = self {
            body = body.with_errors(errors);
        }

        (status, Json(body)).into_response()
    }
}
