//! # Student Registry Backend
//!
//! Contains all non-UI logic for the tutoring business's student registry.
//!
//! - **Domain**: Registration rules, search, finance aggregation, verification and export
//! - **Storage**: SQLite persistence behind async storage traits
//! - **IO**: REST API exposing the domain to the admin dashboard, the public
//!   registration form and the command line client
//!
//! ## Architecture
//!
//! ```text
//! Clients (dashboard, public form, CLI)
//!     ↓
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (Business logic, services)
//!     ↓
//! Storage Layer (SQLite, storage traits)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domain::{
    AnalyticsService, AuthService, ExportService, FinanceService, RegistrationFormConfig,
    RegistrationFormService, StudentService, StudentTableService, VerificationService,
};
use crate::storage::{AdminRepository, DbConnection, StudentRepository, StudentStorage};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub db: DbConnection,
    pub student_service: StudentService,
    pub verification_service: VerificationService,
    pub finance_service: FinanceService,
    pub analytics_service: AnalyticsService,
    pub export_service: ExportService,
    pub student_table_service: StudentTableService,
    pub auth_service: AuthService,
    pub service_name: String,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::new(&config.database_path).await?;

    info!("Setting up domain model");
    let student_storage: Arc<dyn StudentStorage> = Arc::new(StudentRepository::new(db.clone()));
    let form_service = RegistrationFormService::with_config(RegistrationFormConfig {
        max_receipt_bytes: config.max_receipt_bytes,
    });
    let student_service = StudentService::new(student_storage.clone(), form_service);
    let verification_service = VerificationService::new(student_storage);
    let auth_service = AuthService::new(Arc::new(AdminRepository::new(db.clone())));

    auth_service
        .ensure_default_admin(&config.admin.username, &config.admin.password)
        .await?;

    info!("Setting up application state");
    Ok(AppState {
        db,
        student_service,
        verification_service,
        finance_service: FinanceService::new(),
        analytics_service: AnalyticsService::new(),
        export_service: ExportService::new(),
        student_table_service: StudentTableService::new(),
        auth_service,
        service_name: config.service_name.clone(),
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // CORS setup to allow the dashboard and public form to make requests
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(io::health_check))
        .route("/auth/login", post(io::login))
        .route(
            "/students",
            get(io::list_students)
                .post(io::create_student)
                .delete(io::delete_all_students),
        )
        .route("/students/register", post(io::register_student))
        .route("/students/validate", post(io::validate_student))
        .route("/students/delete", post(io::delete_students))
        .route("/students/table", get(io::get_student_table))
        .route(
            "/students/:id",
            get(io::get_student)
                .put(io::update_student)
                .delete(io::delete_student),
        )
        .route("/students/:id/verify", put(io::verify_student))
        .route("/analytics/overview", get(io::get_overview))
        .route("/analytics/finance", get(io::get_finance))
        .route("/export/csv", post(io::export_csv));

    Router::new()
        .route("/", get(io::home))
        .nest("/api", api_routes)
        .fallback(io::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
