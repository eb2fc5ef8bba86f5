//! # Service Endpoints
//!
//! Health probe, service banner and the JSON 404 fallback.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use log::info;
use serde_json::json;
use shared::{ApiResponse, HealthResponse};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/health");

    let database = if state.db.ping().await { "connected" } else { "disconnected" };

    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.service_name.clone(),
        database: database.to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(response))
}

pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": format!("Welcome to {}", state.service_name),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "login": "POST /api/auth/login",
            "students": "/api/students",
            "register": "POST /api/students/register",
            "analytics": "/api/analytics/overview",
            "finance": "/api/analytics/finance",
            "export": "POST /api/export/csv"
        }
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::<()>::failure("Endpoint not found")))
}
