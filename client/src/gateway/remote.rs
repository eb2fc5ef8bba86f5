//! Record store backed by the registry server's REST API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use registry_backend::domain::models::{Student, StudentPatch};
use registry_backend::domain::{RegistryError, RegistryResult};
use registry_backend::io::rest::mappers::StudentMapper;
use registry_backend::storage::StudentStorage;
use shared::{CreateStudentRequest, RegistrationStatus, StudentFilterParams, StudentRecord, UpdateStudentRequest};

use crate::services::ApiClient;

/// `StudentStorage` over HTTP. The server assigns ids and timestamps, so
/// created records come back with the server's values.
#[derive(Clone)]
pub struct HttpStudentStore {
    api: ApiClient,
}

impl HttpStudentStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[async_trait]
impl StudentStorage for HttpStudentStore {
    async fn list_students(&self) -> RegistryResult<Vec<Student>> {
        let records = self.api.list_students(&StudentFilterParams::default()).await?;
        Ok(StudentMapper::to_domain_list(records)?)
    }

    async fn get_student(&self, student_id: &str) -> RegistryResult<Option<Student>> {
        match self.api.get_student(student_id).await? {
            Some(record) => Ok(Some(to_domain(record)?)),
            None => Ok(None),
        }
    }

    async fn create_student(&self, student: &Student) -> RegistryResult<Student> {
        let request = create_request(student);
        let record = if student.is_online() {
            self.api.register_student(&request).await?
        } else {
            self.api.create_student(&request).await?
        };
        to_domain(record)
    }

    async fn update_student(&self, student_id: &str, patch: &StudentPatch) -> RegistryResult<Student> {
        let record = self.api.update_student(student_id, &update_request(patch)).await?;
        to_domain(record)
    }

    async fn update_status(
        &self,
        student_id: &str,
        status: RegistrationStatus,
        _updated_at: DateTime<Utc>,
    ) -> RegistryResult<Student> {
        let record = self.api.verify_student(student_id, status).await?;
        to_domain(record)
    }

    async fn delete_student(&self, student_id: &str) -> RegistryResult<()> {
        self.api.delete_student(student_id).await
    }

    async fn delete_all_students(&self) -> RegistryResult<usize> {
        self.api.delete_all_students().await
    }
}

fn to_domain(record: StudentRecord) -> RegistryResult<Student> {
    StudentMapper::to_domain(record).map_err(RegistryError::Storage)
}

/// Form payload that recreates `student` on the server
pub fn create_request(student: &Student) -> CreateStudentRequest {
    let (payment_receipt, payment_receipt_name) = match &student.payment_receipt {
        Some(receipt) => (Some(receipt.data_url.clone()), receipt.file_name.clone()),
        None => (None, None),
    };

    CreateStudentRequest {
        first_name: student.first_name.clone(),
        last_name: student.last_name.clone(),
        email: student.email.clone(),
        mobile: student.mobile.clone(),
        gender: student.gender.key().to_string(),
        address: student.address.clone(),
        classes: student.classes.iter().map(|c| c.key().to_string()).collect(),
        register_date: Some(student.register_date.format("%Y-%m-%d").to_string()),
        registration_fee: Some(student.registration_fee),
        payment_receipt,
        payment_receipt_name,
    }
}

pub fn update_request(patch: &StudentPatch) -> UpdateStudentRequest {
    UpdateStudentRequest {
        first_name: patch.first_name.clone(),
        last_name: patch.last_name.clone(),
        email: patch.email.clone(),
        mobile: patch.mobile.clone(),
        gender: patch.gender.map(|g| g.key().to_string()),
        address: patch.address.clone(),
        classes: patch
            .classes
            .as_ref()
            .map(|classes| classes.iter().map(|c| c.key().to_string()).collect()),
        register_date: patch.register_date.map(|d| d.format("%Y-%m-%d").to_string()),
        registration_fee: patch.registration_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use shared::{Gender, RegistrationType, Subject};
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_test() -> (MockServer, HttpStudentStore) {
        let server = MockServer::start().await;
        let api = ApiClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap();
        (server, HttpStudentStore::new(api))
    }

    fn sample_student(registration_type: RegistrationType) -> Student {
        Student {
            id: "LOCAL-1".to_string(),
            first_name: "Dilini".to_string(),
            last_name: "Jayasuriya".to_string(),
            email: "dilini@example.com".to_string(),
            mobile: "0761234567".to_string(),
            gender: Gender::Female,
            address: "22 Hill Street".to_string(),
            classes: vec![Subject::Chemistry, Subject::CombinedMaths],
            register_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            registration_fee: 2000,
            registration_type,
            status: RegistrationStatus::Verified,
            created_at: Utc::now(),
            updated_at: None,
            payment_receipt: None,
        }
    }

    fn server_record(id: &str, registration_type: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "firstName": "Dilini",
            "lastName": "Jayasuriya",
            "email": "dilini@example.com",
            "mobile": "0761234567",
            "gender": "female",
            "address": "22 Hill Street",
            "classes": ["chemistry", "combined-maths"],
            "registerDate": "2024-06-03",
            "registrationFee": 2000,
            "registrationType": registration_type,
            "status": status,
            "createdAt": "2024-06-03T09:30:00+00:00"
        })
    }

    #[test]
    fn test_create_request_uses_wire_keys() {
        let request = create_request(&sample_student(RegistrationType::Manual));

        assert_eq!(request.gender, "female");
        assert_eq!(request.classes, vec!["chemistry", "combined-maths"]);
        assert_eq!(request.register_date.as_deref(), Some("2024-06-03"));
        assert_eq!(request.registration_fee, Some(2000));
    }

    #[test]
    fn test_update_request_only_carries_patched_fields() {
        let patch = StudentPatch {
            registration_fee: Some(3000),
            ..Default::default()
        };
        let request = update_request(&patch);

        assert_eq!(request.registration_fee, Some(3000));
        assert!(request.first_name.is_none());
        assert!(request.classes.is_none());
    }

    #[tokio::test]
    async fn test_manual_create_posts_to_students() {
        let (server, store) = setup_test().await;
        Mock::given(method("POST"))
            .and(path("/api/students"))
            .and(body_partial_json(json!({ "email": "dilini@example.com" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": server_record("STU-SERVER-1", "manual", "verified")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stored = store.create_student(&sample_student(RegistrationType::Manual)).await.unwrap();

        assert_eq!(stored.id, "STU-SERVER-1");
        assert_eq!(stored.classes, vec![Subject::Chemistry, Subject::CombinedMaths]);
    }

    #[tokio::test]
    async fn test_online_create_posts_to_register() {
        let (server, store) = setup_test().await;
        Mock::given(method("POST"))
            .and(path("/api/students/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": server_record("STU-SERVER-2", "online", "pending")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stored = store.create_student(&sample_student(RegistrationType::Online)).await.unwrap();

        assert_eq!(stored.status, RegistrationStatus::Pending);
        assert!(stored.needs_verification());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_reported() {
        let (server, store) = setup_test().await;
        Mock::given(method("POST"))
            .and(path("/api/students"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "success": false,
                "error": "Email already registered"
            })))
            .mount(&server)
            .await;

        let result = store.create_student(&sample_student(RegistrationType::Manual)).await;

        assert!(matches!(result, Err(RegistryError::DuplicateEmail { .. })));
    }

    #[tokio::test]
    async fn test_update_status_uses_verify_endpoint() {
        let (server, store) = setup_test().await;
        Mock::given(method("PUT"))
            .and(path("/api/students/STU-7/verify"))
            .and(body_partial_json(json!({ "status": "rejected" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": server_record("STU-7", "online", "rejected")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updated = store
            .update_status("STU-7", RegistrationStatus::Rejected, Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.status, RegistrationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_delete_missing_student_is_not_found() {
        let (server, store) = setup_test().await;
        Mock::given(method("DELETE"))
            .and(path("/api/students/STU-404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "error": "Student with ID STU-404 not found"
            })))
            .mount(&server)
            .await;

        let err = store.delete_student("STU-404").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
