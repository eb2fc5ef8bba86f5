//! Filter/search engine over student registrations.
//!
//! Criteria are conjunctive and every criterion is optional. Filtering never
//! reorders: the output is the input with non-matching records removed.
//! Also hosts the pagination used by the management table.

use chrono::NaiveDate;
use shared::{
    FieldError, Gender, PageMarker, RegistrationStatus, RegistrationType, StudentFilterParams, Subject,
};

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::models::Student;

pub const DEFAULT_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFilter {
    /// Case-insensitive substring of first name, last name, email or mobile
    pub query: Option<String>,
    pub gender: Option<Gender>,
    pub subject: Option<Subject>,
    /// Registration month as "YYYY-MM", zero padded
    pub month: Option<String>,
    pub fee: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<RegistrationStatus>,
    pub registration_type: Option<RegistrationType>,
}

impl StudentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_status(mut self, status: RegistrationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Build criteria from query parameters. Blank values are ignored,
    /// malformed ones are reported per parameter.
    pub fn from_params(params: &StudentFilterParams) -> RegistryResult<Self> {
        let mut errors = Vec::new();

        let filter = StudentFilter {
            query: non_blank(&params.search).map(str::to_string),
            gender: parse_param(&params.gender, "gender", &mut errors, |v| v.parse()),
            subject: parse_param(&params.class, "class", &mut errors, |v| v.parse()),
            month: parse_param(&params.month, "month", &mut errors, |v| {
                NaiveDate::parse_from_str(&format!("{}-01", v), "%Y-%m-%d")
                    .map(|d| d.format("%Y-%m").to_string())
                    .map_err(|_| "Month must be YYYY-MM".to_string())
            }),
            fee: parse_param(&params.fee, "fee", &mut errors, |v| {
                v.parse::<i64>().map_err(|_| "Fee must be a whole number".to_string())
            }),
            start_date: parse_param(&params.start_date, "startDate", &mut errors, parse_date),
            end_date: parse_param(&params.end_date, "endDate", &mut errors, parse_date),
            status: parse_param(&params.status, "status", &mut errors, |v| v.parse()),
            registration_type: parse_param(&params.registration_type, "registrationType", &mut errors, |v| {
                v.parse()
            }),
        };

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(RegistryError::Validation(errors))
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &StudentFilter::default()
    }

    /// True when the record satisfies every present criterion
    pub fn matches(&self, student: &Student) -> bool {
        if let Some(query) = self.query.as_deref() {
            let needle = query.trim().to_lowercase();
            let haystacks = [
                &student.first_name,
                &student.last_name,
                &student.email,
                &student.mobile,
            ];
            if !needle.is_empty() && !haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
                return false;
            }
        }
        if let Some(gender) = self.gender {
            if student.gender != gender {
                return false;
            }
        }
        if let Some(subject) = self.subject {
            if !student.has_subject(subject) {
                return false;
            }
        }
        if let Some(month) = self.month.as_deref() {
            if student.register_date.format("%Y-%m").to_string() != month {
                return false;
            }
        }
        if let Some(fee) = self.fee {
            if student.registration_fee != fee {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if student.register_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if student.register_date > end {
                return false;
            }
        }
        if let Some(status) = self.status {
            if student.status != status {
                return false;
            }
        }
        if let Some(registration_type) = self.registration_type {
            if student.registration_type != registration_type {
                return false;
            }
        }
        true
    }

    /// Matching subset, input order preserved
    pub fn apply(&self, students: &[Student]) -> Vec<Student> {
        students.iter().filter(|s| self.matches(s)).cloned().collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_param<T>(
    value: &Option<String>,
    field: &str,
    errors: &mut Vec<FieldError>,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Option<T> {
    let raw = non_blank(value)?;
    match parse(raw) {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| "Date must be YYYY-MM-DD".to_string())
}

/// One page of a list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based, clamped to the available pages
    pub page: usize,
    pub per_page: usize,
    pub total_records: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    /// Zero-based index of the first item on this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1)) * self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice out a page. A zero `per_page` falls back to the default, page 0
/// is read as page 1 and pages past the end clamp to the last page.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
    let total_records = items.len();
    let total_pages = total_records.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let start = ((page - 1) * per_page).min(total_records);
    let end = (start + per_page).min(total_records);

    Page {
        items: &items[start..end],
        page,
        per_page,
        total_records,
        total_pages,
    }
}

/// Page-number strip: first and last page, the current page and its
/// neighbours, with a gap marker two steps away from the current page.
pub fn page_markers(current: usize, total_pages: usize) -> Vec<PageMarker> {
    let mut markers = Vec::new();
    let current = current as i64;

    for number in 1..=total_pages as i64 {
        let is_edge = number == 1 || number == total_pages as i64;
        let is_near = (number - current).abs() <= 1;
        if is_edge || is_near {
            markers.push(PageMarker::Page {
                number: number as usize,
                current: number == current,
            });
        } else if (number - current).abs() == 2 {
            markers.push(PageMarker::Gap);
        }
    }

    markers
}
