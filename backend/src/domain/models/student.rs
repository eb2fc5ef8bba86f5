//! Domain model for a student registration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{Gender, RegistrationStatus, RegistrationType, Subject};

/// Fee suggested per enrolled subject
pub const FEE_PER_CLASS: i64 = 1000;

/// Domain model representing one student's registration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub gender: Gender,
    pub address: String,
    pub classes: Vec<Subject>,
    pub register_date: NaiveDate,
    pub registration_fee: i64,
    pub registration_type: RegistrationType,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub payment_receipt: Option<PaymentReceipt>,
}

/// Uploaded proof of a bank transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Full data URL, e.g. "data:image/png;base64,..."
    pub data_url: String,
    pub file_name: Option<String>,
}

impl Student {
    /// Generate a unique ID for a student: "STU-<base36 millis>-<4 hex>"
    pub fn generate_id(timestamp_millis: u64) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "STU-{}-{}",
            to_base36(timestamp_millis),
            suffix[..4].to_uppercase()
        )
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_verified(&self) -> bool {
        self.status == RegistrationStatus::Verified
    }

    pub fn is_online(&self) -> bool {
        self.registration_type == RegistrationType::Online
    }

    /// Online registration still waiting for receipt review
    pub fn needs_verification(&self) -> bool {
        self.is_online() && self.status == RegistrationStatus::Pending
    }

    pub fn has_subject(&self, subject: Subject) -> bool {
        self.classes.contains(&subject)
    }

    /// Fee the registration form proposes for the given number of classes.
    /// Never enforced; admins may enter any positive fee.
    pub fn suggested_fee(class_count: usize) -> i64 {
        FEE_PER_CLASS * class_count as i64
    }
}

/// Changes to the editable registration fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub classes: Option<Vec<Subject>>,
    pub register_date: Option<NaiveDate>,
    pub registration_fee: Option<i64>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self == &StudentPatch::default()
    }

    /// Apply the patch and stamp the update time
    pub fn apply(&self, student: &mut Student, now: DateTime<Utc>) {
        if let Some(first_name) = &self.first_name {
            student.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            student.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            student.email = email.clone();
        }
        if let Some(mobile) = &self.mobile {
            student.mobile = mobile.clone();
        }
        if let Some(gender) = self.gender {
            student.gender = gender;
        }
        if let Some(address) = &self.address {
            student.address = address.clone();
        }
        if let Some(classes) = &self.classes {
            student.classes = classes.clone();
        }
        if let Some(register_date) = self.register_date {
            student.register_date = register_date;
        }
        if let Some(fee) = self.registration_fee {
            student.registration_fee = fee;
        }
        student.updated_at = Some(now);
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
