//! # REST API for Analytics
//!
//! Dashboard overview and finance figures, computed on demand from the
//! current registrations.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use log::{error, info};
use shared::{ApiResponse, StudentFilterParams};

use crate::domain::StudentFilter;
use crate::io::rest::extract::ApiQuery;
use crate::AppState;

/// Headcounts by gender, class and registration period
pub async fn get_overview(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/analytics/overview");

    match state.student_service.list_students(&StudentFilter::new()).await {
        Ok(students) => {
            let overview = state.analytics_service.overview(&students, Utc::now().date_naive());
            (StatusCode::OK, Json(ApiResponse::ok(overview))).into_response()
        }
        Err(e) => {
            error!("Failed to compute overview: {}", e);
            e.into_response()
        }
    }
}

/// Finance report over the students matching the query filters
pub async fn get_finance(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StudentFilterParams>,
) -> impl IntoResponse {
    info!("GET /api/analytics/finance - filters: {:?}", params);

    let filter = match StudentFilter::from_params(&params) {
        Ok(filter) => filter,
        Err(e) => return e.into_response(),
    };

    match state.student_service.list_students(&filter).await {
        Ok(students) => {
            let report = state.finance_service.build_report(&students, Utc::now().date_naive());
            (StatusCode::OK, Json(ApiResponse::ok(report))).into_response()
        }
        Err(e) => {
            error!("Failed to compute finance report: {}", e);
            e.into_response()
        }
    }
}
