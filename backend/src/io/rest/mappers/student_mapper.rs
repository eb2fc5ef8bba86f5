//! Conversion between the wire `StudentRecord` and the domain `Student`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use shared::{RegistrationStatus, StudentRecord};

use crate::domain::models::{PaymentReceipt, Student};

/// Mapper to convert between shared StudentRecord DTOs and domain Student models.
pub struct StudentMapper;

impl StudentMapper {
    /// Converts a shared StudentRecord DTO to a domain Student model.
    ///
    /// Records without a status predate online registration and are read as
    /// verified. A missing creation time falls back to the registration date.
    pub fn to_domain(dto: StudentRecord) -> Result<Student> {
        let register_date = parse_register_date(&dto.register_date)
            .with_context(|| format!("Failed to parse registerDate of student {}", dto.id))?;

        let created_at = if dto.created_at.trim().is_empty() {
            register_date
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
                .unwrap_or_else(Utc::now)
        } else {
            parse_timestamp(&dto.created_at)
                .with_context(|| format!("Failed to parse createdAt of student {}", dto.id))?
        };

        let updated_at = match dto.updated_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(
                parse_timestamp(raw)
                    .with_context(|| format!("Failed to parse updatedAt of student {}", dto.id))?,
            ),
            _ => None,
        };

        let payment_receipt = dto.payment_receipt.map(|data_url| PaymentReceipt {
            data_url,
            file_name: dto.payment_receipt_name,
        });

        Ok(Student {
            id: dto.id,
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            mobile: dto.mobile,
            gender: dto.gender,
            address: dto.address,
            classes: dto.classes,
            register_date,
            registration_fee: dto.registration_fee,
            registration_type: dto.registration_type,
            status: dto.status.unwrap_or(RegistrationStatus::Verified),
            created_at,
            updated_at,
            payment_receipt,
        })
    }

    /// Converts a domain Student model to a shared StudentRecord DTO.
    pub fn to_dto(domain: Student) -> StudentRecord {
        let (payment_receipt, payment_receipt_name) = match domain.payment_receipt {
            Some(receipt) => (Some(receipt.data_url), receipt.file_name),
            None => (None, None),
        };

        StudentRecord {
            id: domain.id,
            first_name: domain.first_name,
            last_name: domain.last_name,
            email: domain.email,
            mobile: domain.mobile,
            gender: domain.gender,
            address: domain.address,
            classes: domain.classes,
            register_date: domain.register_date.format("%Y-%m-%d").to_string(),
            registration_fee: domain.registration_fee,
            registration_type: domain.registration_type,
            status: Some(domain.status),
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.map(|t| t.to_rfc3339()),
            payment_receipt,
            payment_receipt_name,
        }
    }

    /// DTO for responses to the public registration form; the receipt is
    /// never echoed back.
    pub fn to_public_dto(domain: Student) -> StudentRecord {
        let mut dto = Self::to_dto(domain);
        dto.payment_receipt = None;
        dto
    }

    pub fn to_dto_list(domain_students: Vec<Student>) -> Vec<StudentRecord> {
        domain_students.into_iter().map(Self::to_dto).collect()
    }

    /// Converts a list of DTOs, failing on the first malformed record.
    pub fn to_domain_list(dtos: Vec<StudentRecord>) -> Result<Vec<Student>> {
        dtos.into_iter().map(Self::to_domain).collect()
    }
}

/// Accepts plain dates as well as full timestamps from older documents
fn parse_register_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").context("expected YYYY-MM-DD")
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw.trim())
        .context("expected an RFC 3339 timestamp")?
        .with_timezone(&Utc))
}
