//! # REST API for Student Management
//!
//! Endpoints for registering, listing, updating, verifying and deleting
//! students.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{error, info};
use shared::{
    ApiResponse, CreateStudentRequest, DeleteStudentsRequest, DeleteStudentsResponse, PageParams,
    StudentFilterParams, UpdateStudentRequest, VerifyStudentRequest,
};

use crate::domain::registration_form::RegistrationChannel;
use crate::domain::{StudentFilter, VerificationAction};
use crate::io::rest::extract::{ApiJson, ApiQuery};
use crate::io::rest::mappers::StudentMapper;
use crate::AppState;

/// List students matching the query filters, newest first
pub async fn list_students(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StudentFilterParams>,
) -> impl IntoResponse {
    info!("GET /api/students - filters: {:?}", params);

    let filter = match StudentFilter::from_params(&params) {
        Ok(filter) => filter,
        Err(e) => return e.into_response(),
    };

    match state.student_service.list_students(&filter).await {
        Ok(students) => {
            let count = students.len();
            let body = ApiResponse::ok(StudentMapper::to_dto_list(students)).with_count(count);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!("Failed to list students: {}", e);
            e.into_response()
        }
    }
}

/// Get a student by ID
pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}", student_id);

    match state.student_service.get_student(&student_id).await {
        Ok(student) => (StatusCode::OK, Json(ApiResponse::ok(StudentMapper::to_dto(student)))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Admin entry of a new student
pub async fn create_student(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateStudentRequest>,
) -> impl IntoResponse {
    info!("POST /api/students - email: {}", request.email);

    match state.student_service.create_student(request).await {
        Ok(student) => {
            let body = ApiResponse::ok(StudentMapper::to_dto(student)).with_message("Student registered successfully");
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => {
            error!("Failed to create student: {}", e);
            e.into_response()
        }
    }
}

/// Public self-registration with a payment receipt
pub async fn register_student(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateStudentRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/students/register - email: {}, receipt: {}",
        request.email,
        request.payment_receipt.is_some()
    );

    match state.student_service.register_student(request).await {
        Ok(student) => {
            let body = ApiResponse::ok(StudentMapper::to_public_dto(student))
                .with_message("Registration submitted. Your payment will be verified shortly.");
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => {
            error!("Failed public registration: {}", e);
            e.into_response()
        }
    }
}

/// Check a registration form without storing it
pub async fn validate_student(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateStudentRequest>,
) -> impl IntoResponse {
    info!("POST /api/students/validate");

    let validation = state.student_service.validate_form(&request, RegistrationChannel::Admin);
    (StatusCode::OK, Json(ApiResponse::ok(validation))).into_response()
}

/// Update the editable fields of a student
pub async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    ApiJson(request): ApiJson<UpdateStudentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/students/{} - request: {:?}", student_id, request);

    if request.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::failure("No valid fields to update").with_code("validation")),
        )
            .into_response();
    }

    match state.student_service.update_student(&student_id, request).await {
        Ok(student) => {
            let body = ApiResponse::ok(StudentMapper::to_dto(student)).with_message("Student updated successfully");
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!("Failed to update student: {}", e);
            e.into_response()
        }
    }
}

/// Verify or reject an online registration
pub async fn verify_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    ApiJson(request): ApiJson<VerifyStudentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/students/{}/verify - status: {}", student_id, request.status);

    let action = match VerificationAction::from_status(request.status) {
        Ok(action) => action,
        Err(e) => return e.into_response(),
    };

    match state.verification_service.apply(&student_id, action).await {
        Ok(student) => {
            let message = format!("Student {} successfully", student.status);
            let body = ApiResponse::ok(StudentMapper::to_dto(student)).with_message(message);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Delete a student
pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/students/{}", student_id);

    match state.student_service.delete_student(&student_id).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::<()>::done("Student deleted successfully"))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete several students by ID
pub async fn delete_students(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DeleteStudentsRequest>,
) -> impl IntoResponse {
    info!("POST /api/students/delete - {} ids", request.student_ids.len());

    match state.student_service.delete_students(&request.student_ids).await {
        Ok(response) => {
            let message = response.success_message.clone();
            (StatusCode::OK, Json(ApiResponse::ok(response).with_message(message))).into_response()
        }
        Err(e) => {
            error!("Failed to delete students: {}", e);
            e.into_response()
        }
    }
}

/// Delete every student
pub async fn delete_all_students(State(state): State<AppState>) -> impl IntoResponse {
    info!("DELETE /api/students");

    match state.student_service.delete_all_students().await {
        Ok(deleted_count) => {
            let response = DeleteStudentsResponse {
                deleted_count,
                not_found_ids: Vec::new(),
                success_message: format!("Deleted {} students", deleted_count),
            };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => {
            error!("Failed to delete all students: {}", e);
            e.into_response()
        }
    }
}

/// One formatted page of the management table
pub async fn get_student_table(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StudentFilterParams>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> impl IntoResponse {
    info!("GET /api/students/table - page: {:?}", paging.page);

    let filter = match StudentFilter::from_params(&params) {
        Ok(filter) => filter,
        Err(e) => return e.into_response(),
    };

    match state.student_service.list_students(&filter).await {
        Ok(students) => {
            let table = state
                .student_table_service
                .build_table(&students, paging.page.unwrap_or(1), paging.per_page);
            (StatusCode::OK, Json(ApiResponse::ok(table))).into_response()
        }
        Err(e) => {
            error!("Failed to build student table: {}", e);
            e.into_response()
        }
    }
}
