//! # Storage Traits
//!
//! Storage abstractions that let the domain layer work against any record
//! store: the server's SQLite document table, the remote HTTP API, the local
//! fallback slot, or the fallback gateway that combines the last two.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::RegistrationStatus;

use crate::domain::errors::RegistryResult;
use crate::domain::models::{Admin, Student, StudentPatch};

/// Trait defining the interface for student record storage
///
/// Implementations must keep email addresses unique across records and
/// report `RegistryError::DuplicateEmail` instead of storing a second one.
#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// List all students, newest first
    async fn list_students(&self) -> RegistryResult<Vec<Student>>;

    /// Retrieve a specific student by ID
    async fn get_student(&self, student_id: &str) -> RegistryResult<Option<Student>>;

    /// Store a new student and return the stored record
    async fn create_student(&self, student: &Student) -> RegistryResult<Student>;

    /// Apply a partial update to an existing student
    async fn update_student(&self, student_id: &str, patch: &StudentPatch) -> RegistryResult<Student>;

    /// Persist a verification outcome
    async fn update_status(
        &self,
        student_id: &str,
        status: RegistrationStatus,
        updated_at: DateTime<Utc>,
    ) -> RegistryResult<Student>;

    /// Delete a single student; `NotFound` when no such record exists
    async fn delete_student(&self, student_id: &str) -> RegistryResult<()>;

    /// Delete every student, returning how many were removed
    async fn delete_all_students(&self) -> RegistryResult<usize>;
}

/// Trait defining the interface for administrator storage
#[async_trait]
pub trait AdminStorage: Send + Sync {
    async fn get_admin(&self, username: &str) -> RegistryResult<Option<Admin>>;

    async fn count_admins(&self) -> RegistryResult<i64>;

    async fn store_admin(&self, admin: &Admin) -> RegistryResult<()>;
}
