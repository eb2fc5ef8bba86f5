use log::{debug, warn};
use registry_backend::domain::{RegistryError, RegistryResult};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    AdminUser, ApiResponse, CreateStudentRequest, DeleteStudentsResponse, ExportDataRequest,
    ExportDataResponse, FieldError, FinanceReport, HealthResponse, LoginRequest, LoginResponse,
    PageParams, RegistrationStatus, StudentFilterParams, StudentOverview, StudentRecord,
    StudentTableResponse, UpdateStudentRequest, VerifyStudentRequest,
};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// API client for communicating with the registry server
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client with the default base URL
    pub fn new() -> RegistryResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a new API client with a custom base URL and request timeout
    pub fn with_base_url(base_url: &str, timeout: Duration) -> RegistryResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Storage(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Test connection to the server
    pub async fn test_connection(&self) -> RegistryResult<HealthResponse> {
        let response = self
            .http
            .get(self.url("/api/health"))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Unavailable(format!("health check returned {}", status)));
        }
        response.json::<HealthResponse>().await.map_err(decode_error)
    }

    pub async fn login(&self, request: &LoginRequest) -> RegistryResult<AdminUser> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            let body = response.json::<LoginResponse>().await.map_err(decode_error)?;
            return Ok(body.user);
        }

        let body = response.json::<ApiResponse<serde_json::Value>>().await.ok();
        Err(error_from_response(status, body, &request.username))
    }

    pub async fn list_students(&self, filters: &StudentFilterParams) -> RegistryResult<Vec<StudentRecord>> {
        let request = self.http.get(self.url("/api/students")).query(filters);
        self.execute(request, "students").await
    }

    /// `None` when the server has no such student
    pub async fn get_student(&self, student_id: &str) -> RegistryResult<Option<StudentRecord>> {
        let request = self.http.get(self.url(&format!("/api/students/{}", student_id)));
        match self.execute(request, student_id).await {
            Ok(record) => Ok(Some(record)),
            Err(RegistryError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Admin entry; the server stores it as a verified manual registration
    pub async fn create_student(&self, request: &CreateStudentRequest) -> RegistryResult<StudentRecord> {
        let builder = self.http.post(self.url("/api/students")).json(request);
        self.execute(builder, &request.email).await
    }

    /// Public registration; the server stores it as pending
    pub async fn register_student(&self, request: &CreateStudentRequest) -> RegistryResult<StudentRecord> {
        let builder = self.http.post(self.url("/api/students/register")).json(request);
        self.execute(builder, &request.email).await
    }

    pub async fn update_student(&self, student_id: &str, request: &UpdateStudentRequest) -> RegistryResult<StudentRecord> {
        let builder = self
            .http
            .put(self.url(&format!("/api/students/{}", student_id)))
            .json(request);
        // A conflict here is about the new email, not the ID in the path
        self.execute(builder, student_id)
            .await
            .map_err(|e| match (e, request.email.as_deref()) {
                (RegistryError::DuplicateEmail { .. }, Some(email)) => RegistryError::DuplicateEmail {
                    email: email.to_string(),
                },
                (e, _) => e,
            })
    }

    pub async fn verify_student(&self, student_id: &str, status: RegistrationStatus) -> RegistryResult<StudentRecord> {
        let builder = self
            .http
            .put(self.url(&format!("/api/students/{}/verify", student_id)))
            .json(&VerifyStudentRequest { status });
        self.execute(builder, student_id).await
    }

    pub async fn delete_student(&self, student_id: &str) -> RegistryResult<()> {
        let builder = self.http.delete(self.url(&format!("/api/students/{}", student_id)));
        self.execute_unit(builder, student_id).await
    }

    pub async fn delete_all_students(&self) -> RegistryResult<usize> {
        let builder = self.http.delete(self.url("/api/students"));
        let response: DeleteStudentsResponse = self.execute(builder, "students").await?;
        Ok(response.deleted_count)
    }

    pub async fn get_overview(&self) -> RegistryResult<StudentOverview> {
        let builder = self.http.get(self.url("/api/analytics/overview"));
        self.execute(builder, "overview").await
    }

    pub async fn get_finance(&self, filters: &StudentFilterParams) -> RegistryResult<FinanceReport> {
        let builder = self.http.get(self.url("/api/analytics/finance")).query(filters);
        self.execute(builder, "finance").await
    }

    pub async fn get_student_table(
        &self,
        filters: &StudentFilterParams,
        paging: &PageParams,
    ) -> RegistryResult<StudentTableResponse> {
        let builder = self
            .http
            .get(self.url("/api/students/table"))
            .query(filters)
            .query(paging);
        self.execute(builder, "table").await
    }

    pub async fn export_csv(&self, request: &ExportDataRequest) -> RegistryResult<ExportDataResponse> {
        let builder = self.http.post(self.url("/api/export/csv")).json(request);
        self.execute(builder, "export").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send the request and unwrap the `data` of a successful envelope.
    /// `subject` names the record the call is about, for error reporting.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, subject: &str) -> RegistryResult<T> {
        let body: ApiResponse<T> = self.send(request, subject).await?;
        body.data.ok_or_else(|| {
            RegistryError::Storage(anyhow::anyhow!("Server response for {} carried no data", subject))
        })
    }

    async fn execute_unit(&self, request: RequestBuilder, subject: &str) -> RegistryResult<()> {
        let _: ApiResponse<serde_json::Value> = self.send(request, subject).await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, subject: &str) -> RegistryResult<ApiResponse<T>> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!("{} {}", status, response.url());

        if status.is_success() {
            return response.json::<ApiResponse<T>>().await.map_err(decode_error);
        }

        let body = response.json::<ApiResponse<serde_json::Value>>().await.ok();
        Err(error_from_response(status, body, subject))
    }
}

/// Connection refused, DNS failure, timeout and the like
fn transport_error(e: reqwest::Error) -> RegistryError {
    warn!("Request to record store failed: {}", e);
    RegistryError::Unavailable(e.to_string())
}

fn decode_error(e: reqwest::Error) -> RegistryError {
    RegistryError::Storage(anyhow::anyhow!("Failed to parse server response: {}", e))
}

/// Map a failed response back onto the error taxonomy the server produced it from.
/// The envelope's `code` decides when present; older servers only send a status.
pub fn error_from_response<B>(
    status: StatusCode,
    body: Option<ApiResponse<B>>,
    subject: &str,
) -> RegistryError {
    let (message, code, field_errors) = match body {
        Some(body) => (
            body.error.unwrap_or_else(|| status.to_string()),
            body.code,
            body.errors,
        ),
        None => (status.to_string(), None, Vec::new()),
    };

    match code.as_deref() {
        Some("validation") => validation_error(message, field_errors),
        Some("duplicate_email") => RegistryError::DuplicateEmail {
            email: subject.to_string(),
        },
        Some("not_found") => RegistryError::not_found(subject),
        Some("invalid_transition") => RegistryError::InvalidTransition {
            id: subject.to_string(),
            reason: message,
        },
        Some("invalid_credentials") => RegistryError::InvalidCredentials,
        Some("unavailable") => RegistryError::Unavailable(format!("{} ({})", message, status)),
        _ => match status {
            s if s.is_server_error() => RegistryError::Unavailable(format!("{} ({})", message, s)),
            StatusCode::BAD_REQUEST => validation_error(message, field_errors),
            StatusCode::UNAUTHORIZED => RegistryError::InvalidCredentials,
            StatusCode::NOT_FOUND => RegistryError::not_found(subject),
            StatusCode::CONFLICT => RegistryError::InvalidTransition {
                id: subject.to_string(),
                reason: message,
            },
            other => RegistryError::Storage(anyhow::anyhow!("Unexpected response {}: {}", other, message)),
        },
    }
}

fn validation_error(message: String, field_errors: Vec<FieldError>) -> RegistryError {
    if field_errors.is_empty() {
        RegistryError::Validation(vec![FieldError::new("request", message)])
    } else {
        RegistryError::Validation(field_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_test() -> (MockServer, ApiClient) {
        let server = MockServer::start().await;
        let client = ApiClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap();
        (server, client)
    }

    fn record_json(id: &str, email: &str) -> serde_json::Value {
        json!({
            "id": id,
            "firstName": "Kasun",
            "lastName": "Fernando",
            "email": email,
            "mobile": "0771234567",
            "gender": "male",
            "address": "4 Lake Drive",
            "classes": ["physics"],
            "registerDate": "2024-03-02",
            "registrationFee": 1000,
            "registrationType": "manual",
            "status": "verified",
            "createdAt": "2024-03-02T08:00:00+00:00"
        })
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = ApiClient::with_base_url("http://localhost:5000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_error_mapping() {
        let duplicate = ApiResponse::<()>::failure("Email already registered").with_code("duplicate_email");
        assert!(matches!(
            error_from_response(StatusCode::CONFLICT, Some(duplicate), "a@b.com"),
            RegistryError::DuplicateEmail { email } if email == "a@b.com"
        ));

        // Reworded message, same code
        let reworded = ApiResponse::<()>::failure("That address is taken").with_code("duplicate_email");
        assert!(matches!(
            error_from_response(StatusCode::CONFLICT, Some(reworded), "a@b.com"),
            RegistryError::DuplicateEmail { .. }
        ));

        let transition = ApiResponse::<()>::failure("registration is already verified");
        assert!(matches!(
            error_from_response(StatusCode::CONFLICT, Some(transition), "STU-1"),
            RegistryError::InvalidTransition { .. }
        ));

        let invalid = ApiResponse::<()>::failure("Validation failed")
            .with_errors(vec![FieldError::new("email", "Invalid email")]);
        match error_from_response(StatusCode::BAD_REQUEST, Some(invalid), "x") {
            RegistryError::Validation(errors) => assert_eq!(errors[0].field, "email"),
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(error_from_response::<()>(StatusCode::BAD_GATEWAY, None, "x").is_unavailable());
        assert!(error_from_response::<()>(StatusCode::NOT_FOUND, None, "STU-9").is_not_found());
        assert!(matches!(
            error_from_response::<()>(StatusCode::UNAUTHORIZED, None, "admin"),
            RegistryError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_update_conflict_reports_new_email() {
        let (server, client) = setup_test().await;
        Mock::given(method("PUT"))
            .and(path("/api/students/STU-1"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "success": false,
                "error": "Email already registered",
                "code": "duplicate_email"
            })))
            .mount(&server)
            .await;

        let request = UpdateStudentRequest {
            email: Some("taken@example.com".to_string()),
            ..Default::default()
        };
        let result = client.update_student("STU-1", &request).await;

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateEmail { email }) if email == "taken@example.com"
        ));
    }

    #[tokio::test]
    async fn test_list_students_sends_filters() {
        let (server, client) = setup_test().await;
        Mock::given(method("GET"))
            .and(path("/api/students"))
            .and(query_param("class", "physics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [record_json("STU-1", "kasun@example.com")],
                "count": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let filters = StudentFilterParams {
            class: Some("physics".to_string()),
            ..Default::default()
        };
        let records = client.list_students(&filters).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "STU-1");
    }

    #[tokio::test]
    async fn test_get_missing_student_is_none() {
        let (server, client) = setup_test().await;
        Mock::given(method("GET"))
            .and(path("/api/students/STU-404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "error": "Student with ID STU-404 not found"
            })))
            .mount(&server)
            .await;

        assert_eq!(client.get_student("STU-404").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let (server, client) = setup_test().await;
        Mock::given(method("GET"))
            .and(path("/api/students"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client.list_students(&StudentFilterParams::default()).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let client = ApiClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let err = client.test_connection().await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_login_failure() {
        let (server, client) = setup_test().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "error": "Invalid username or password"
            })))
            .mount(&server)
            .await;

        let request = LoginRequest {
            username: "admin".to_string(),
            password: "wrong".to_string(),
        };
        assert!(matches!(client.login(&request).await, Err(RegistryError::InvalidCredentials)));
    }
}
