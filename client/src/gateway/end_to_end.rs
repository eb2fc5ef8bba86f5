//! Gateway against a real registry server bound to an ephemeral port.

use registry_backend::config::Config;
use registry_backend::domain::{RegistryError, StudentFilter, VerificationAction};
use registry_backend::storage::sqlite::connection::IN_MEMORY;
use registry_backend::storage::StudentStorage;
use registry_backend::{create_router, initialize_backend};
use shared::{CreateStudentRequest, RegistrationStatus, RegistrationType, StudentRecord};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

use crate::app::{ClientSettings, RegistryClient};
use crate::refresh::RefreshConfig;

async fn spawn_server() -> String {
    let config = Config {
        database_path: IN_MEMORY.to_string(),
        ..Config::default()
    };
    let state = initialize_backend(&config).await.expect("Failed to initialize backend");
    let app = create_router(state, &config.cors_origins);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", address)
}

async fn setup_test() -> (TempDir, RegistryClient) {
    let api_url = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let settings = ClientSettings {
        api_url,
        cache_path: dir.path().join("students.json"),
        timeout: Duration::from_secs(5),
        refresh: RefreshConfig::default(),
    };
    let client = RegistryClient::connect(&settings).unwrap();
    (dir, client)
}

fn form(email: &str, classes: &[&str], fee: i64) -> CreateStudentRequest {
    CreateStudentRequest {
        first_name: "Hasini".to_string(),
        last_name: "Rathnayake".to_string(),
        email: email.to_string(),
        mobile: "0771234567".to_string(),
        gender: "female".to_string(),
        address: "45 Kandy Road".to_string(),
        classes: classes.iter().map(|c| c.to_string()).collect(),
        register_date: Some("2024-05-10".to_string()),
        registration_fee: Some(fee),
        payment_receipt: None,
        payment_receipt_name: None,
    }
}

#[tokio::test]
async fn test_registration_lifecycle_through_gateway() {
    let (dir, client) = setup_test().await;

    let manual = client
        .student_service
        .create_student(form("hasini@example.com", &["physics", "chemistry"], 2000))
        .await
        .unwrap();
    assert!(manual.id.starts_with("STU-"));
    assert!(manual.is_verified());

    let mut online_form = form("online@example.com", &["physics"], 1000);
    online_form.register_date = None;
    online_form.payment_receipt = Some("data:image/png;base64,iVBORw0KGgo=".to_string());
    online_form.payment_receipt_name = Some("receipt.png".to_string());
    let online = client.api.register_student(&online_form).await.unwrap();
    assert_eq!(online.status, Some(RegistrationStatus::Pending));
    assert_eq!(online.registration_type, RegistrationType::Online);
    assert_eq!(online.payment_receipt, None);

    assert_eq!(client.load().await.unwrap(), 2);
    assert_eq!(client.pending().await.len(), 1);
    assert!(client.offline_warning().is_none());

    // The successful list was mirrored into the local slot
    let raw = std::fs::read_to_string(dir.path().join("students.json")).unwrap();
    let cached: Vec<StudentRecord> = serde_json::from_str(&raw).unwrap();
    assert_eq!(cached.len(), 2);

    let verified = client.decide(&online.id, VerificationAction::Verify).await.unwrap();
    assert!(verified.is_verified());

    let again = client.decide(&online.id, VerificationAction::Reject).await;
    assert!(matches!(again, Err(RegistryError::InvalidTransition { .. })));

    let cannot = client.decide(&manual.id, VerificationAction::Verify).await;
    assert!(matches!(cannot, Err(RegistryError::InvalidTransition { .. })));

    let report = client.finance_report(&StudentFilter::new()).await;
    assert_eq!(report.overview.total_revenue, 3000);
    assert_eq!(report.overview.verified_count, 2);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_by_server() {
    let (_dir, client) = setup_test().await;

    client
        .student_service
        .create_student(form("dup@example.com", &["physics"], 1000))
        .await
        .unwrap();
    let duplicate = client
        .student_service
        .create_student(form("DUP@example.com", &["chemistry"], 1000))
        .await;

    assert!(matches!(duplicate, Err(RegistryError::DuplicateEmail { .. })));
    assert_eq!(client.gateway.list_students().await.unwrap().len(), 1);

    let other = client
        .student_service
        .create_student(form("other@example.com", &["physics"], 1000))
        .await
        .unwrap();
    let request = shared::UpdateStudentRequest {
        email: Some("dup@example.com".to_string()),
        ..Default::default()
    };
    let conflict = client.api.update_student(&other.id, &request).await;
    assert!(matches!(
        conflict,
        Err(RegistryError::DuplicateEmail { email }) if email == "dup@example.com"
    ));
}

#[tokio::test]
async fn test_update_and_delete_through_gateway() {
    let (_dir, client) = setup_test().await;

    let student = client
        .student_service
        .create_student(form("edit@example.com", &["physics"], 1000))
        .await
        .unwrap();

    let updated = client
        .student_service
        .update_student(
            &student.id,
            shared::UpdateStudentRequest {
                registration_fee: Some(3000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.registration_fee, 3000);

    let response = client
        .delete(&[student.id.clone(), "STU-MISSING".to_string()])
        .await
        .unwrap();
    assert_eq!(response.deleted_count, 1);
    assert_eq!(response.not_found_ids, vec!["STU-MISSING".to_string()]);

    assert!(client.gateway.get_student(&student.id).await.unwrap().is_none());
    assert_eq!(client.roster.count().await, 0);
}
