//! # REST API Interface Layer
//!
//! Provides the HTTP endpoints of the student registry:
//!
//! - `POST /api/auth/login`
//! - `GET|POST|DELETE /api/students`, `POST /api/students/register`,
//!   `POST /api/students/validate`, `POST /api/students/delete`,
//!   `GET /api/students/table`
//! - `GET|PUT|DELETE /api/students/:id`, `PUT /api/students/:id/verify`
//! - `GET /api/analytics/overview`, `GET /api/analytics/finance`
//! - `POST /api/export/csv`
//! - `GET /api/health`, `GET /`
//!
//! Handlers log the request line, delegate to a domain service and let
//! `RegistryError` pick the status code. Bodies and query strings go
//! through `extract::ApiJson` and `extract::ApiQuery` so malformed input
//! is answered with the same envelope.

pub mod analytics_apis;
pub mod auth_apis;
pub mod error;
pub mod export_apis;
pub mod extract;
pub mod health_apis;
pub mod mappers;
pub mod student_apis;

pub use analytics_apis::*;
pub use auth_apis::*;
pub use export_apis::*;
pub use health_apis::*;
pub use student_apis::*;
