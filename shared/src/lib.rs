use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A student's registration entry as it travels over the wire and sits in
/// the local fallback slot. Field names follow the camelCase document layout
/// of the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Record id in format: "STU-<base36 millis>-<hex>"
    #[serde(alias = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Lower-cased, unique across records
    pub email: String,
    pub mobile: String,
    pub gender: Gender,
    pub address: String,
    pub classes: Vec<Subject>,
    /// Calendar date (YYYY-MM-DD)
    pub register_date: String,
    pub registration_fee: i64,
    #[serde(default)]
    pub registration_type: RegistrationType,
    /// Legacy documents carry no status and are read as verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RegistrationStatus>,
    /// RFC 3339 creation timestamp
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Receipt image or PDF as a data URL (online registrations only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_receipt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_receipt_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn key(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}

/// Subjects offered by the tutoring business, in declared order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subject {
    Physics,
    Chemistry,
    CombinedMaths,
}

impl Subject {
    /// Declaration order, used for tie-breaking and stable report layout
    pub const ALL: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::CombinedMaths];

    pub fn key(&self) -> &'static str {
        match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::CombinedMaths => "combined-maths",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::CombinedMaths => "C. Maths",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "physics" => Ok(Subject::Physics),
            "chemistry" => Ok(Subject::Chemistry),
            "combined-maths" | "combined_maths" | "combinedmaths" => Ok(Subject::CombinedMaths),
            other => Err(format!("Unknown class: {}", other)),
        }
    }
}

/// How the registration entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    /// Entered by an admin
    #[default]
    Manual,
    /// Self-service submission with a payment receipt
    Online,
}

impl RegistrationType {
    pub fn key(&self) -> &'static str {
        match self {
            RegistrationType::Manual => "manual",
            RegistrationType::Online => "online",
        }
    }
}

impl fmt::Display for RegistrationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for RegistrationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(RegistrationType::Manual),
            "online" => Ok(RegistrationType::Online),
            other => Err(format!("Unknown registration type: {}", other)),
        }
    }
}

/// Outcome of payment-receipt review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Verified,
    Pending,
    Rejected,
}

impl RegistrationStatus {
    pub fn key(&self) -> &'static str {
        match self {
            RegistrationStatus::Verified => "verified",
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verified" => Ok(RegistrationStatus::Verified),
            "pending" => Ok(RegistrationStatus::Pending),
            "rejected" => Ok(RegistrationStatus::Rejected),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

/// Registration form as submitted by an admin or by the public form.
///
/// Every field is optional on the wire so a half-filled form reaches
/// validation and comes back with per-field errors instead of a parse
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateStudentRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub gender: String,
    pub address: String,
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_fee: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_receipt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_receipt_name: Option<String>,
}

/// Partial update; only the editable registration fields may change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStudentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_fee: Option<i64>,
}

impl UpdateStudentRequest {
    pub fn is_empty(&self) -> bool {
        self == &UpdateStudentRequest::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyStudentRequest {
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStudentsRequest {
    pub student_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStudentsResponse {
    pub deleted_count: usize,
    pub not_found_ids: Vec<String>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: AdminUser,
    pub message: String,
}

/// Validation failure for a single form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of validating a registration form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFormValidation {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    /// Fee suggested from the number of selected classes
    pub suggested_fee: Option<i64>,
}

/// Envelope shared by every API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    /// A missing field reads as `None`, which keeps `T` free of a `Default` bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error kind, e.g. "duplicate_email"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            code: None,
            count: None,
            errors: Vec::new(),
        }
    }

    /// Success without a payload, e.g. after a delete
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
            code: None,
            count: None,
            errors: Vec::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            code: None,
            count: None,
            errors: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

/// Filter criteria as query parameters. Blank values mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentFilterParams {
    /// Case-insensitive substring of first name, last name, email or mobile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Registration month (YYYY-MM)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    /// Inclusive lower bound (YYYY-MM-DD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Inclusive upper bound (YYYY-MM-DD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,
}

/// Headline finance numbers over verified registrations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceOverview {
    pub total_revenue: i64,
    pub current_month_revenue: i64,
    pub current_month_count: usize,
    /// Rounded to the nearest whole amount, 0 when there are no records
    pub average_fee: i64,
    pub verified_count: usize,
    pub most_popular_class: Option<Subject>,
}

/// Revenue attributed to one subject, fees split evenly over each record's subjects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRevenue {
    pub subject: Subject,
    pub label: String,
    pub revenue: f64,
    pub students: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBucket {
    pub count: usize,
    pub revenue: i64,
    pub percentage: f64,
}

/// Counts and revenue per payment channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    /// Online registrations with a verified receipt
    pub bank_transfer: PaymentBucket,
    /// Manual registrations paid in person
    pub local_payment: PaymentBucket,
    /// Online registrations awaiting review (excluded from percentages)
    pub pending: PaymentBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    /// YYYY-MM
    pub month: String,
    /// Short month name, e.g. "Jan"
    pub label: String,
    pub revenue: i64,
    pub count: usize,
    /// Percentage of the busiest month, never below the chart floor
    pub bar_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBracket {
    pub fee: i64,
    pub count: usize,
    pub total: i64,
    pub bar_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    pub id: String,
    pub name: String,
    pub email: String,
    pub classes: Vec<Subject>,
    pub register_date: String,
    pub fee: i64,
    pub registration_type: RegistrationType,
}

/// Everything the finance dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceReport {
    pub overview: FinanceOverview,
    pub class_revenue: Vec<ClassRevenue>,
    pub payment_breakdown: PaymentBreakdown,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub fee_distribution: Vec<FeeBracket>,
    pub recent_transactions: Vec<RecentTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCount {
    pub subject: Subject,
    pub label: String,
    pub count: usize,
}

/// Student population summary for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOverview {
    pub total_students: usize,
    pub male_count: usize,
    pub female_count: usize,
    pub male_percentage: f64,
    pub female_percentage: f64,
    pub class_counts: Vec<ClassCount>,
    pub this_week: usize,
    pub this_month: usize,
    pub pending_verification: usize,
}

/// Which CSV report to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Verified registrations with their fees
    #[default]
    Finance,
    /// Every record with all fields
    Backup,
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "finance" => Ok(ExportKind::Finance),
            "backup" => Ok(ExportKind::Backup),
            other => Err(format!("Unknown export kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDataRequest {
    pub kind: ExportKind,
    pub filters: StudentFilterParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDataResponse {
    pub csv_content: String,
    pub filename: String,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub database: String,
    pub timestamp: String,
}

/// One row of the management table, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedStudent {
    pub row_number: usize,
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub gender: String,
    pub classes: Vec<String>,
    /// e.g. "Jan 5, 2024"
    pub formatted_date: String,
    /// e.g. "Rs. 1,000"
    pub formatted_fee: String,
    pub registration_type: RegistrationType,
    pub status: RegistrationStatus,
    pub needs_verification: bool,
}

/// Entry in the page-number strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageMarker {
    Page { number: usize, current: bool },
    Gap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: usize,
    pub per_page: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub markers: Vec<PageMarker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentTableResponse {
    pub students: Vec<FormattedStudent>,
    pub page_info: PageInfo,
    pub pending_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_record_accepts_legacy_document() {
        let json = r#"{
            "_id": "STU-LX2A9K",
            "firstName": "Nimal",
            "lastName": "Perera",
            "email": "nimal@example.com",
            "mobile": "0771234567",
            "gender": "male",
            "address": "12 Temple Road",
            "classes": ["physics", "combined-maths"],
            "registerDate": "2024-01-05",
            "registrationFee": 2000
        }"#;

        let record: StudentRecord = serde_json::from_str(json).expect("legacy record should parse");

        assert_eq!(record.id, "STU-LX2A9K");
        assert_eq!(record.classes, vec![Subject::Physics, Subject::CombinedMaths]);
        assert_eq!(record.registration_type, RegistrationType::Manual);
        assert_eq!(record.status, None);
        assert!(record.created_at.is_empty());
    }

    #[test]
    fn test_student_record_serializes_camel_case() {
        let record = StudentRecord {
            id: "STU-1".to_string(),
            first_name: "Amaya".to_string(),
            last_name: "Silva".to_string(),
            email: "amaya@example.com".to_string(),
            mobile: "0712345678".to_string(),
            gender: Gender::Female,
            address: "4 Lake View".to_string(),
            classes: vec![Subject::Chemistry],
            register_date: "2024-03-01".to_string(),
            registration_fee: 1000,
            registration_type: RegistrationType::Online,
            status: Some(RegistrationStatus::Pending),
            created_at: "2024-03-01T08:00:00+00:00".to_string(),
            updated_at: None,
            payment_receipt: None,
            payment_receipt_name: None,
        };

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["firstName"], "Amaya");
        assert_eq!(value["registrationType"], "online");
        assert_eq!(value["status"], "pending");
        assert!(value.get("paymentReceipt").is_none());
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn test_subject_parsing_and_labels() {
        assert_eq!("Combined-Maths".parse::<Subject>(), Ok(Subject::CombinedMaths));
        assert_eq!(Subject::CombinedMaths.label(), "C. Maths");
        assert!("biology".parse::<Subject>().is_err());
        assert_eq!(
            serde_json::to_string(&Subject::CombinedMaths).unwrap(),
            "\"combined-maths\""
        );
    }

    #[test]
    fn test_create_request_tolerates_missing_fields() {
        let request: CreateStudentRequest = serde_json::from_str(r#"{"firstName":"Kasun"}"#).unwrap();

        assert_eq!(request.first_name, "Kasun");
        assert!(request.classes.is_empty());
        assert_eq!(request.registration_fee, None);
    }

    #[test]
    fn test_api_response_envelope() {
        let response = ApiResponse::ok(vec![1, 2, 3]).with_count(3);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 3);
        assert!(value.get("error").is_none());
        assert!(value.get("errors").is_none());

        let failure: ApiResponse<()> = ApiResponse::failure("Student not found");
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Student not found");
    }

    #[test]
    fn test_failure_envelope_without_data_decodes() {
        // StudentRecord has no Default impl, so this only builds while `data` carries no serde default
        let raw = r#"{"success":false,"error":"Student not found","code":"not_found"}"#;
        let response: ApiResponse<StudentRecord> = serde_json::from_str(raw).unwrap();

        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.as_deref(), Some("Student not found"));
        assert_eq!(response.code.as_deref(), Some("not_found"));

        let value = serde_json::to_value(ApiResponse::<()>::failure("x").with_code("validation")).unwrap();
        assert_eq!(value["code"], "validation");
    }

    #[test]
    fn test_page_marker_serialization() {
        let markers = vec![PageMarker::Page { number: 1, current: true }, PageMarker::Gap];
        let value = serde_json::to_value(&markers).unwrap();

        assert_eq!(value[0]["page"]["number"], 1);
        assert_eq!(value[1], "gap");
    }
}
