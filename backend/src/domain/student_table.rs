//! Student table domain logic.
//!
//! Formats registrations for the management table: display names, subject
//! labels, human dates, currency amounts and the page-number strip. Pure
//! formatting, independent of any particular UI.

use chrono::NaiveDate;
use shared::{FormattedStudent, PageInfo, StudentTableResponse};

use crate::domain::filter::{page_markers, paginate, DEFAULT_PER_PAGE};
use crate::domain::models::Student;

/// Configuration for student table display
#[derive(Debug, Clone, PartialEq)]
pub struct StudentTableConfig {
    pub currency_prefix: String,
    pub per_page: usize,
}

impl Default for StudentTableConfig {
    fn default() -> Self {
        Self {
            currency_prefix: "Rs.".to_string(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Student table service that handles all table-related formatting
#[derive(Clone, Default)]
pub struct StudentTableService {
    config: StudentTableConfig,
}

impl StudentTableService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StudentTableConfig) -> Self {
        Self { config }
    }

    /// One page of the table. `per_page` falls back to the configured size.
    pub fn build_table(&self, students: &[Student], page: usize, per_page: Option<usize>) -> StudentTableResponse {
        let page = paginate(students, page, per_page.unwrap_or(self.config.per_page));

        let rows = page
            .items
            .iter()
            .enumerate()
            .map(|(index, student)| self.format_student(student, page.offset() + index + 1))
            .collect();

        StudentTableResponse {
            students: rows,
            page_info: PageInfo {
                page: page.page,
                per_page: page.per_page,
                total_records: page.total_records,
                total_pages: page.total_pages,
                has_previous: page.has_previous(),
                has_next: page.has_next(),
                markers: page_markers(page.page, page.total_pages),
            },
            pending_count: students.iter().filter(|s| s.needs_verification()).count(),
        }
    }

    pub fn format_student(&self, student: &Student, row_number: usize) -> FormattedStudent {
        FormattedStudent {
            row_number,
            id: student.id.clone(),
            full_name: student.full_name(),
            email: student.email.clone(),
            mobile: student.mobile.clone(),
            gender: student.gender.label().to_string(),
            classes: student.classes.iter().map(|c| c.label().to_string()).collect(),
            formatted_date: self.format_date(student.register_date),
            formatted_fee: self.format_fee(student.registration_fee),
            registration_type: student.registration_type,
            status: student.status,
            needs_verification: student.needs_verification(),
        }
    }

    /// "Jan 5, 2024"
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format("%b %-d, %Y").to_string()
    }

    /// "Rs. 12,500"
    pub fn format_fee(&self, amount: i64) -> String {
        let digits = amount.unsigned_abs().to_string();
        let mut grouped = String::new();
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if amount < 0 { "-" } else { "" };
        format!("{} {}{}", self.config.currency_prefix, sign, grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::student::test_support::*;
    use shared::{PageMarker, RegistrationStatus, Subject};

    #[test]
    fn test_format_fee_groups_thousands() {
        let service = StudentTableService::new();

        assert_eq!(service.format_fee(0), "Rs. 0");
        assert_eq!(service.format_fee(950), "Rs. 950");
        assert_eq!(service.format_fee(1000), "Rs. 1,000");
        assert_eq!(service.format_fee(1234567), "Rs. 1,234,567");
    }

    #[test]
    fn test_format_date() {
        let service = StudentTableService::new();

        assert_eq!(
            service.format_date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            "Jan 5, 2024"
        );
    }

    #[test]
    fn test_build_table_second_page() {
        let mut records: Vec<Student> = (1..=12)
            .map(|i| student(&format!("S{}", i), 1000, &[Subject::CombinedMaths], "2024-03-01"))
            .collect();
        records[11] = online(records[11].clone(), RegistrationStatus::Pending);

        let table = StudentTableService::new().build_table(&records, 2, None);

        assert_eq!(table.students.len(), 2);
        assert_eq!(table.students[0].row_number, 11);
        assert_eq!(table.students[1].classes, vec!["C. Maths"]);
        assert!(table.students[1].needs_verification);
        assert_eq!(table.page_info.total_pages, 2);
        assert!(table.page_info.has_previous);
        assert!(!table.page_info.has_next);
        assert_eq!(table.pending_count, 1);
        assert_eq!(
            table.page_info.markers,
            vec![
                PageMarker::Page { number: 1, current: false },
                PageMarker::Page { number: 2, current: true },
            ]
        );
    }
}
