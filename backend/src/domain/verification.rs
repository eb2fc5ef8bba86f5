//! Payment verification workflow.
//!
//! Online registrations start out pending and an admin either verifies or
//! rejects the uploaded receipt. Both outcomes are final; manual
//! registrations never enter the workflow.

use chrono::{DateTime, Utc};
use log::{info, warn};
use shared::{RegistrationStatus, RegistrationType};
use std::sync::Arc;

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::models::Student;
use crate::storage::traits::StudentStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationAction {
    Verify,
    Reject,
}

impl VerificationAction {
    pub fn target_status(&self) -> RegistrationStatus {
        match self {
            VerificationAction::Verify => RegistrationStatus::Verified,
            VerificationAction::Reject => RegistrationStatus::Rejected,
        }
    }

    /// Action that leads to `status`; pending is not a valid outcome
    pub fn from_status(status: RegistrationStatus) -> RegistryResult<Self> {
        match status {
            RegistrationStatus::Verified => Ok(VerificationAction::Verify),
            RegistrationStatus::Rejected => Ok(VerificationAction::Reject),
            RegistrationStatus::Pending => Err(RegistryError::validation(
                "status",
                "Status must be verified or rejected",
            )),
        }
    }
}

/// Check the transition and return the updated record without persisting it
pub fn apply_verification(
    student: &Student,
    action: VerificationAction,
    now: DateTime<Utc>,
) -> RegistryResult<Student> {
    if student.registration_type != RegistrationType::Online {
        return Err(RegistryError::InvalidTransition {
            id: student.id.clone(),
            reason: "only online registrations need verification".to_string(),
        });
    }
    if student.status != RegistrationStatus::Pending {
        return Err(RegistryError::InvalidTransition {
            id: student.id.clone(),
            reason: format!("registration is already {}", student.status),
        });
    }

    let mut updated = student.clone();
    updated.status = action.target_status();
    updated.updated_at = Some(now);
    Ok(updated)
}

/// Service running verification decisions against a record store
#[derive(Clone)]
pub struct VerificationService {
    storage: Arc<dyn StudentStorage>,
}

impl VerificationService {
    pub fn new(storage: Arc<dyn StudentStorage>) -> Self {
        Self { storage }
    }

    pub async fn verify(&self, student_id: &str) -> RegistryResult<Student> {
        self.apply(student_id, VerificationAction::Verify).await
    }

    pub async fn reject(&self, student_id: &str) -> RegistryResult<Student> {
        self.apply(student_id, VerificationAction::Reject).await
    }

    pub async fn apply(&self, student_id: &str, action: VerificationAction) -> RegistryResult<Student> {
        info!("Applying {:?} to student {}", action, student_id);

        let student = self
            .storage
            .get_student(student_id)
            .await?
            .ok_or_else(|| RegistryError::not_found(student_id))?;

        let updated = apply_verification(&student, action, Utc::now()).map_err(|e| {
            warn!("Rejected verification request: {}", e);
            e
        })?;

        let stored = self
            .storage
            .update_status(student_id, updated.status, updated.updated_at.unwrap_or_else(Utc::now))
            .await?;

        info!("Student {} is now {}", stored.id, stored.status);
        Ok(stored)
    }

    /// Online registrations still waiting for review
    pub async fn pending_students(&self) -> RegistryResult<Vec<Student>> {
        let students = self.storage.list_students().await?;
        Ok(students.into_iter().filter(|s| s.needs_verification()).collect())
    }
}
