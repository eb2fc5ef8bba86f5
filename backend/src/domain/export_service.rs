//! Export service domain logic for the student registry.
//!
//! Turns registrations into CSV reports. Every cell is quoted (embedded
//! quotes doubled), rows end with `\n`, and the filename carries the export
//! date. The finance report lists verified registrations only, the backup
//! lists everything.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use shared::{ExportDataResponse, ExportKind};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::models::Student;

pub const FINANCE_HEADERS: [&str; 8] = [
    "Student ID",
    "Name",
    "Email",
    "Mobile",
    "Gender",
    "Classes",
    "Registration Date",
    "Fee",
];

pub const BACKUP_HEADERS: [&str; 15] = [
    "ID",
    "First Name",
    "Last Name",
    "Email",
    "Mobile",
    "Gender",
    "Address",
    "Classes",
    "Registration Date",
    "Registration Fee",
    "Registration Type",
    "Status",
    "Created At",
    "Updated At",
    "Receipt Name",
];

/// Export service that handles all export-related business logic
#[derive(Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Build the report of `kind` over `students`, dated `today`
    pub fn export_students(&self, students: &[Student], kind: ExportKind, today: NaiveDate) -> Result<ExportDataResponse> {
        let rows: Vec<&Student> = match kind {
            ExportKind::Finance => students.iter().filter(|s| s.is_verified()).collect(),
            ExportKind::Backup => students.iter().collect(),
        };

        let csv_content = self.to_delimited_text(&rows, kind)?;
        let filename = Self::report_filename(kind, today);

        info!("📄 EXPORT: {} rows for {}", rows.len(), filename);

        Ok(ExportDataResponse {
            csv_content,
            filename,
            record_count: rows.len(),
        })
    }

    /// Header row plus one row per record in input order
    pub fn to_delimited_text(&self, students: &[&Student], kind: ExportKind) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        match kind {
            ExportKind::Finance => writer.write_record(FINANCE_HEADERS)?,
            ExportKind::Backup => writer.write_record(BACKUP_HEADERS)?,
        }

        for student in students {
            match kind {
                ExportKind::Finance => writer.write_record(finance_row(student))?,
                ExportKind::Backup => writer.write_record(backup_row(student))?,
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }

    /// e.g. "finance_report_2024-05-20.csv"
    pub fn report_filename(kind: ExportKind, date: NaiveDate) -> String {
        let stem = match kind {
            ExportKind::Finance => "finance_report",
            ExportKind::Backup => "students_backup",
        };
        format!("{}_{}.csv", stem, date.format("%Y-%m-%d"))
    }

    /// Write a generated report into `directory`, creating it if needed
    pub fn export_to_directory(&self, export: &ExportDataResponse, directory: &Path) -> Result<PathBuf> {
        fs::create_dir_all(directory)
            .with_context(|| format!("Failed to create directory {}", directory.display()))?;

        let path = directory.join(&export.filename);
        fs::write(&path, &export.csv_content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("✅ EXPORT: Wrote {} records to {}", export.record_count, path.display());
        Ok(path)
    }
}

fn joined_classes(student: &Student) -> String {
    student
        .classes
        .iter()
        .map(|c| c.key())
        .collect::<Vec<_>>()
        .join("; ")
}

fn finance_row(student: &Student) -> Vec<String> {
    vec![
        student.id.clone(),
        student.full_name(),
        student.email.clone(),
        student.mobile.clone(),
        student.gender.key().to_string(),
        joined_classes(student),
        student.register_date.format("%Y-%m-%d").to_string(),
        student.registration_fee.to_string(),
    ]
}

fn backup_row(student: &Student) -> Vec<String> {
    vec![
        student.id.clone(),
        student.first_name.clone(),
        student.last_name.clone(),
        student.email.clone(),
        student.mobile.clone(),
        student.gender.key().to_string(),
        student.address.clone(),
        joined_classes(student),
        student.register_date.format("%Y-%m-%d").to_string(),
        student.registration_fee.to_string(),
        student.registration_type.key().to_string(),
        student.status.key().to_string(),
        student.created_at.to_rfc3339(),
        student.updated_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        student
            .payment_receipt
            .as_ref()
            .and_then(|r| r.file_name.clone())
            .unwrap_or_default(),
    ]
}
