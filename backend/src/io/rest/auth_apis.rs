//! # REST API for Administrator Login

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::info;
use shared::{LoginRequest, LoginResponse};

use crate::io::rest::extract::ApiJson;
use crate::AppState;

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/login - username: {}", request.username);

    match state.auth_service.login(&request).await {
        Ok(user) => {
            let response = LoginResponse {
                success: true,
                user,
                message: "Login successful".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
