//! Registration form domain logic.
//!
//! Validates and normalizes registration forms coming from the admin entry
//! form and from the public self-registration page. Every field is checked
//! independently so the caller gets the complete list of problems at once,
//! each tagged with the form field it belongs to.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use shared::{
    CreateStudentRequest, FieldError, Gender, StudentFormValidation, Subject, UpdateStudentRequest,
};

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::models::{PaymentReceipt, Student, StudentPatch};

/// Receipt types the public form accepts
pub const ACCEPTED_RECEIPT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// 5 MiB
pub const DEFAULT_MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

/// Where a registration form was submitted from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationChannel {
    /// Admin entry; registration date is mandatory, no receipt
    Admin,
    /// Public self-registration; date defaults to today, receipt required
    Public,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationFormConfig {
    pub max_receipt_bytes: usize,
}

impl Default for RegistrationFormConfig {
    fn default() -> Self {
        Self {
            max_receipt_bytes: DEFAULT_MAX_RECEIPT_BYTES,
        }
    }
}

/// Cleaned, typed registration ready to become a `Student`
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub gender: Gender,
    pub address: String,
    pub classes: Vec<Subject>,
    pub register_date: NaiveDate,
    pub registration_fee: i64,
    pub payment_receipt: Option<PaymentReceipt>,
}

/// Registration form service that handles all form-related business logic
#[derive(Clone, Default)]
pub struct RegistrationFormService {
    config: RegistrationFormConfig,
}

impl RegistrationFormService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistrationFormConfig) -> Self {
        Self { config }
    }

    /// Validate a registration form without building anything
    pub fn validate_registration_form(
        &self,
        request: &CreateStudentRequest,
        channel: RegistrationChannel,
        today: NaiveDate,
    ) -> StudentFormValidation {
        let (errors, _) = self.check_form(request, channel, today);
        let class_count = parse_classes(&request.classes).map(|c| c.len()).unwrap_or(0);

        StudentFormValidation {
            is_valid: errors.is_empty(),
            errors,
            suggested_fee: (class_count > 0).then(|| Student::suggested_fee(class_count)),
        }
    }

    /// Validate and normalize a registration form
    pub fn normalize(
        &self,
        request: &CreateStudentRequest,
        channel: RegistrationChannel,
        today: NaiveDate,
    ) -> RegistryResult<RegistrationDraft> {
        match self.check_form(request, channel, today) {
            (errors, Some(draft)) if errors.is_empty() => Ok(draft),
            (errors, _) => Err(RegistryError::Validation(errors)),
        }
    }

    /// Validate the fields present in an update and turn them into a patch
    pub fn normalize_patch(&self, request: &UpdateStudentRequest) -> RegistryResult<StudentPatch> {
        let mut errors = Vec::new();
        let mut patch = StudentPatch::default();

        if let Some(first_name) = &request.first_name {
            patch.first_name = check_name(first_name, "firstName", "First name", &mut errors);
        }
        if let Some(last_name) = &request.last_name {
            patch.last_name = check_name(last_name, "lastName", "Last name", &mut errors);
        }
        if let Some(email) = &request.email {
            patch.email = check_email(email, &mut errors);
        }
        if let Some(mobile) = &request.mobile {
            patch.mobile = check_mobile(mobile, &mut errors);
        }
        if let Some(gender) = &request.gender {
            patch.gender = check_gender(gender, &mut errors);
        }
        if let Some(address) = &request.address {
            patch.address = check_address(address, &mut errors);
        }
        if let Some(classes) = &request.classes {
            patch.classes = check_classes(classes, &mut errors);
        }
        if let Some(date) = &request.register_date {
            patch.register_date = check_date(Some(date), &mut errors);
        }
        if request.registration_fee.is_some() {
            patch.registration_fee = check_fee(request.registration_fee, &mut errors);
        }

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(RegistryError::Validation(errors))
        }
    }

    /// Check a receipt data URL: accepted MIME type and decoded size limit
    pub fn validate_receipt(&self, data_url: &str) -> Result<(), String> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| "Payment receipt must be an uploaded file".to_string())?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| "Payment receipt is malformed".to_string())?;
        let mime = header.split(';').next().unwrap_or_default().to_lowercase();

        if !ACCEPTED_RECEIPT_TYPES.contains(&mime.as_str()) {
            return Err("Please upload a JPG, PNG or PDF file".to_string());
        }
        if !header.ends_with(";base64") {
            return Err("Payment receipt must be base64 encoded".to_string());
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| "Payment receipt is malformed".to_string())?;
        if bytes.len() > self.config.max_receipt_bytes {
            return Err(format!(
                "File size must be less than {}MB",
                self.config.max_receipt_bytes / (1024 * 1024)
            ));
        }
        Ok(())
    }

    fn check_form(
        &self,
        request: &CreateStudentRequest,
        channel: RegistrationChannel,
        today: NaiveDate,
    ) -> (Vec<FieldError>, Option<RegistrationDraft>) {
        let mut errors = Vec::new();

        let first_name = check_name(&request.first_name, "firstName", "First name", &mut errors);
        let last_name = check_name(&request.last_name, "lastName", "Last name", &mut errors);
        let email = check_email(&request.email, &mut errors);
        let mobile = check_mobile(&request.mobile, &mut errors);
        let gender = check_gender(&request.gender, &mut errors);
        let address = check_address(&request.address, &mut errors);
        let classes = check_classes(&request.classes, &mut errors);
        let register_date = match (channel, request.register_date.as_deref()) {
            (RegistrationChannel::Public, None) | (RegistrationChannel::Public, Some("")) => Some(today),
            (_, date) => check_date(date, &mut errors),
        };
        let registration_fee = check_fee(request.registration_fee, &mut errors);

        let payment_receipt = match channel {
            RegistrationChannel::Admin => None,
            RegistrationChannel::Public => match request.payment_receipt.as_deref() {
                Some(data_url) if !data_url.trim().is_empty() => match self.validate_receipt(data_url) {
                    Ok(()) => Some(PaymentReceipt {
                        data_url: data_url.trim().to_string(),
                        file_name: request
                            .payment_receipt_name
                            .as_ref()
                            .map(|n| n.trim().to_string())
                            .filter(|n| !n.is_empty()),
                    }),
                    Err(message) => {
                        errors.push(FieldError::new("paymentReceipt", message));
                        None
                    }
                },
                _ => {
                    errors.push(FieldError::new("paymentReceipt", "Please upload payment receipt"));
                    None
                }
            },
        };

        let draft = match (first_name, last_name, email, mobile, gender, address, classes, register_date, registration_fee) {
            (
                Some(first_name),
                Some(last_name),
                Some(email),
                Some(mobile),
                Some(gender),
                Some(address),
                Some(classes),
                Some(register_date),
                Some(registration_fee),
            ) if errors.is_empty() => Some(RegistrationDraft {
                first_name,
                last_name,
                email,
                mobile,
                gender,
                address,
                classes,
                register_date,
                registration_fee,
                payment_receipt,
            }),
            _ => None,
        };

        (errors, draft)
    }
}

fn check_name(raw: &str, field: &str, label: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < 2 {
        errors.push(FieldError::new(field, format!("{} must be at least 2 characters", label)));
        return None;
    }
    Some(trimmed.to_string())
}

/// Trimmed and lower-cased; shape `local@domain.tld` without whitespace
fn check_email(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
        return None;
    }
    if !is_valid_email(&email) {
        errors.push(FieldError::new("email", "Please enter a valid email address"));
        return None;
    }
    Some(email)
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn check_mobile(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 10 {
        errors.push(FieldError::new("mobile", "Mobile number must be at least 10 digits"));
        return None;
    }
    Some(raw.trim().to_string())
}

fn check_gender(raw: &str, errors: &mut Vec<FieldError>) -> Option<Gender> {
    if raw.trim().is_empty() {
        errors.push(FieldError::new("gender", "Please select gender"));
        return None;
    }
    match raw.parse::<Gender>() {
        Ok(gender) => Some(gender),
        Err(message) => {
            errors.push(FieldError::new("gender", message));
            None
        }
    }
}

fn check_address(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < 5 {
        errors.push(FieldError::new("address", "Address must be at least 5 characters"));
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse class tags, collapsing duplicates and keeping first occurrence
fn parse_classes(raw: &[String]) -> Result<Vec<Subject>, String> {
    let mut classes = Vec::new();
    for tag in raw {
        let subject = tag.parse::<Subject>()?;
        if !classes.contains(&subject) {
            classes.push(subject);
        }
    }
    Ok(classes)
}

fn check_classes(raw: &[String], errors: &mut Vec<FieldError>) -> Option<Vec<Subject>> {
    match parse_classes(raw) {
        Ok(classes) if classes.is_empty() => {
            errors.push(FieldError::new("classes", "Please select at least one class"));
            None
        }
        Ok(classes) => Some(classes),
        Err(message) => {
            errors.push(FieldError::new("classes", message));
            None
        }
    }
}

fn check_date(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<NaiveDate> {
    match raw.map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("registerDate", "Registration date is required"));
            None
        }
        Some(date) => match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(FieldError::new("registerDate", "Registration date must be YYYY-MM-DD"));
                None
            }
        },
    }
}

fn check_fee(raw: Option<i64>, errors: &mut Vec<FieldError>) -> Option<i64> {
    match raw {
        None => {
            errors.push(FieldError::new("registrationFee", "Registration fee is required"));
            None
        }
        Some(fee) if fee <= 0 => {
            errors.push(FieldError::new("registrationFee", "Registration fee must be greater than 0"));
            None
        }
        Some(fee) => Some(fee),
    }
}
