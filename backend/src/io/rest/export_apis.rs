//! # REST API for CSV Export

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use log::{error, info};
use shared::{ApiResponse, ExportDataRequest};

use crate::domain::{RegistryError, StudentFilter};
use crate::io::rest::extract::ApiJson;
use crate::AppState;

/// Generate a finance report or full backup as CSV text
pub async fn export_csv(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ExportDataRequest>,
) -> impl IntoResponse {
    info!("POST /api/export/csv - kind: {:?}", request.kind);

    let filter = match StudentFilter::from_params(&request.filters) {
        Ok(filter) => filter,
        Err(e) => return e.into_response(),
    };

    let students = match state.student_service.list_students(&filter).await {
        Ok(students) => students,
        Err(e) => return e.into_response(),
    };

    match state
        .export_service
        .export_students(&students, request.kind, Utc::now().date_naive())
    {
        Ok(export) => {
            let count = export.record_count;
            (StatusCode::OK, Json(ApiResponse::ok(export).with_count(count))).into_response()
        }
        Err(e) => {
            error!("Failed to export students: {:#}", e);
            RegistryError::Storage(e).into_response()
        }
    }
}
