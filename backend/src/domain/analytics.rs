//! Student population analytics for the dashboard.

use chrono::{Datelike, Duration, NaiveDate};
use shared::{ClassCount, Gender, StudentOverview, Subject};

use crate::domain::models::Student;

/// Analytics service computing headcounts over every record regardless of
/// payment status
#[derive(Clone, Default)]
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    pub fn overview(&self, students: &[Student], today: NaiveDate) -> StudentOverview {
        let total = students.len();
        let male_count = students.iter().filter(|s| s.gender == Gender::Male).count();
        let female_count = students.iter().filter(|s| s.gender == Gender::Female).count();

        let (male_percentage, female_percentage) = if total == 0 {
            (50.0, 50.0)
        } else {
            (
                male_count as f64 / total as f64 * 100.0,
                female_count as f64 / total as f64 * 100.0,
            )
        };

        let class_counts = Subject::ALL
            .iter()
            .map(|&subject| ClassCount {
                subject,
                label: subject.label().to_string(),
                count: students.iter().filter(|s| s.has_subject(subject)).count(),
            })
            .collect();

        let week_start = today - Duration::days(7);
        let month_start = today.with_day(1).unwrap_or(today);

        StudentOverview {
            total_students: total,
            male_count,
            female_count,
            male_percentage,
            female_percentage,
            class_counts,
            this_week: students.iter().filter(|s| s.register_date >= week_start).count(),
            this_month: students.iter().filter(|s| s.register_date >= month_start).count(),
            pending_verification: students.iter().filter(|s| s.needs_verification()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::student::test_support::*;
    use shared::RegistrationStatus;

    #[test]
    fn test_overview_counts() {
        let mut female = student("B", 1000, &[Subject::Chemistry], "2024-05-10");
        female.gender = Gender::Female;
        let records = vec![
            student("A", 2000, &[Subject::Physics, Subject::CombinedMaths], "2024-05-14"),
            female,
            online(student("C", 1000, &[Subject::Physics], "2024-04-20"), RegistrationStatus::Pending),
            student("D", 1000, &[Subject::Physics], "2024-05-01"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

        let overview = AnalyticsService::new().overview(&records, today);

        assert_eq!(overview.total_students, 4);
        assert_eq!(overview.male_count, 3);
        assert_eq!(overview.female_percentage, 25.0);
        assert_eq!(overview.class_counts[0].count, 3);
        assert_eq!(overview.class_counts[2].label, "C. Maths");
        assert_eq!(overview.this_week, 2);
        assert_eq!(overview.this_month, 3);
        assert_eq!(overview.pending_verification, 1);
    }

    #[test]
    fn test_overview_of_no_students() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

        let overview = AnalyticsService::new().overview(&[], today);

        assert_eq!(overview.total_students, 0);
        assert_eq!(overview.male_percentage, 50.0);
        assert!(overview.class_counts.iter().all(|c| c.count == 0));
    }
}
