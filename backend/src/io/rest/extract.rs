//! Request extractors whose rejections use the API error envelope.
//!
//! A malformed body or query string becomes `RegistryError::Validation`, so
//! clients get a 400 with `success: false` instead of axum's plain-text
//! rejection.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use shared::FieldError;

use crate::domain::errors::RegistryError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(RegistryError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(RegistryError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for RegistryError {
    fn from(rejection: JsonRejection) -> Self {
        RegistryError::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl From<QueryRejection> for RegistryError {
    fn from(rejection: QueryRejection) -> Self {
        RegistryError::Validation(vec![FieldError::new("query", rejection.body_text())])
    }
}
