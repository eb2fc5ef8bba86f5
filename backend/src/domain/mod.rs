//! # Domain Module
//!
//! Contains all business logic for the student registry.
//!
//! Registrations are modeled, validated, searched, verified, aggregated and
//! exported here, independently of how they are stored or presented.
//!
//! ## Module Organization
//!
//! - **student_service**: Registration CRUD and bulk deletion
//! - **registration_form**: Form validation and normalization for admin and public entry
//! - **filter**: Search criteria and pagination
//! - **finance**: Revenue aggregation for the finance dashboard
//! - **analytics**: Headcount overview for the main dashboard
//! - **verification**: Pending → verified | rejected workflow for online registrations
//! - **export_service**: CSV finance reports and full backups
//! - **student_table**: Management table formatting
//! - **auth_service**: Administrator login
//!
//! ## Business Rules
//!
//! - Email addresses are unique (case-insensitive) across registrations
//! - Manual registrations are verified on creation; online ones start pending
//! - Only pending online registrations can be verified or rejected, once
//! - Revenue figures count verified registrations only
//! - The suggested fee is 1000 per class but is never enforced

pub mod analytics;
pub mod auth_service;
pub mod errors;
pub mod export_service;
pub mod filter;
pub mod finance;
pub mod models;
pub mod registration_form;
pub mod student_service;
pub mod student_table;
pub mod verification;

pub use analytics::AnalyticsService;
pub use auth_service::AuthService;
pub use errors::{RegistryError, RegistryResult};
pub use export_service::ExportService;
pub use filter::StudentFilter;
pub use finance::FinanceService;
pub use registration_form::{RegistrationChannel, RegistrationFormConfig, RegistrationFormService};
pub use student_service::StudentService;
pub use student_table::StudentTableService;
pub use verification::{VerificationAction, VerificationService};
