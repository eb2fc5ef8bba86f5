use chrono::{NaiveDate, Utc};
use log::{info, warn};
use shared::{
    CreateStudentRequest, DeleteStudentsResponse, RegistrationStatus, RegistrationType,
    StudentFormValidation, UpdateStudentRequest,
};
use std::sync::Arc;

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::filter::StudentFilter;
use crate::domain::models::Student;
use crate::domain::registration_form::{RegistrationChannel, RegistrationDraft, RegistrationFormService};
use crate::storage::traits::StudentStorage;

/// Service for managing student registrations
#[derive(Clone)]
pub struct StudentService {
    storage: Arc<dyn StudentStorage>,
    form_service: RegistrationFormService,
}

impl StudentService {
    pub fn new(storage: Arc<dyn StudentStorage>, form_service: RegistrationFormService) -> Self {
        Self { storage, form_service }
    }

    pub fn storage(&self) -> Arc<dyn StudentStorage> {
        self.storage.clone()
    }

    /// Admin entry: stored as a manual, already verified registration
    pub async fn create_student(&self, request: CreateStudentRequest) -> RegistryResult<Student> {
        info!("Creating student: email={}", request.email.trim());

        let draft = self
            .form_service
            .normalize(&request, RegistrationChannel::Admin, today())?;
        let student = Self::build_student(draft, RegistrationType::Manual, RegistrationStatus::Verified);

        let stored = self.storage.create_student(&student).await?;
        info!("Created student {} with ID: {}", stored.full_name(), stored.id);
        Ok(stored)
    }

    /// Public self-registration: stored as online and pending review
    pub async fn register_student(&self, request: CreateStudentRequest) -> RegistryResult<Student> {
        info!("Public registration: email={}", request.email.trim());

        let draft = self
            .form_service
            .normalize(&request, RegistrationChannel::Public, today())?;
        let student = Self::build_student(draft, RegistrationType::Online, RegistrationStatus::Pending);

        let stored = self.storage.create_student(&student).await?;
        info!("Registered student {} pending verification", stored.id);
        Ok(stored)
    }

    pub fn validate_form(&self, request: &CreateStudentRequest, channel: RegistrationChannel) -> StudentFormValidation {
        self.form_service.validate_registration_form(request, channel, today())
    }

    pub async fn get_student(&self, student_id: &str) -> RegistryResult<Student> {
        self.storage
            .get_student(student_id)
            .await?
            .ok_or_else(|| {
                warn!("Student not found: {}", student_id);
                RegistryError::not_found(student_id)
            })
    }

    /// Matching students, newest first
    pub async fn list_students(&self, filter: &StudentFilter) -> RegistryResult<Vec<Student>> {
        let students = self.storage.list_students().await?;
        if filter.is_empty() {
            return Ok(students);
        }
        let matching = filter.apply(&students);
        info!("Filter matched {} of {} students", matching.len(), students.len());
        Ok(matching)
    }

    pub async fn update_student(&self, student_id: &str, request: UpdateStudentRequest) -> RegistryResult<Student> {
        info!("Updating student: {}", student_id);

        let patch = self.form_service.normalize_patch(&request)?;
        let updated = self.storage.update_student(student_id, &patch).await?;

        info!("Updated student {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_student(&self, student_id: &str) -> RegistryResult<()> {
        info!("Deleting student: {}", student_id);
        self.storage.delete_student(student_id).await
    }

    /// Delete several students; unknown ids are reported, not fatal
    pub async fn delete_students(&self, student_ids: &[String]) -> RegistryResult<DeleteStudentsResponse> {
        let mut deleted_count = 0;
        let mut not_found_ids = Vec::new();

        for id in student_ids {
            match self.storage.delete_student(id).await {
                Ok(()) => deleted_count += 1,
                Err(RegistryError::NotFound { .. }) => not_found_ids.push(id.clone()),
                Err(e) => return Err(e),
            }
        }

        let success_message = match (deleted_count, not_found_ids.len()) {
            (0, _) => "No students were deleted".to_string(),
            (1, 0) => "1 student deleted successfully".to_string(),
            (n, 0) => format!("{} students deleted successfully", n),
            (n, missing) => format!("{} students deleted, {} not found", n, missing),
        };

        info!("{}", success_message);
        Ok(DeleteStudentsResponse {
            deleted_count,
            not_found_ids,
            success_message,
        })
    }

    pub async fn delete_all_students(&self) -> RegistryResult<usize> {
        let deleted = self.storage.delete_all_students().await?;
        warn!("Deleted all {} students", deleted);
        Ok(deleted)
    }

    fn build_student(draft: RegistrationDraft, registration_type: RegistrationType, status: RegistrationStatus) -> Student {
        let now = Utc::now();
        Student {
            id: Student::generate_id(now.timestamp_millis() as u64),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            mobile: draft.mobile,
            gender: draft.gender,
            address: draft.address,
            classes: draft.classes,
            register_date: draft.register_date,
            registration_fee: draft.registration_fee,
            registration_type,
            status,
            created_at: now,
            updated_at: None,
            payment_receipt: draft.payment_receipt,
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
