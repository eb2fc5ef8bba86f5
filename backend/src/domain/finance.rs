//! Finance aggregation over student registrations.
//!
//! Revenue only counts money that has actually been received: the verified
//! subset of the records (manual registrations are verified from the start,
//! online ones once their receipt is approved). The payment-type breakdown
//! is the exception and looks at every record it is given, so pending
//! transfers show up next to the settled ones.

use chrono::{Datelike, Months, NaiveDate};
use log::debug;
use shared::{
    ClassRevenue, FeeBracket, FinanceOverview, FinanceReport, MonthlyRevenue, PaymentBreakdown,
    RecentTransaction, RegistrationStatus, RegistrationType, Subject,
};

use crate::domain::models::Student;

/// Fee amounts shown in the fee distribution
pub const FEE_BRACKETS: [i64; 3] = [1000, 2000, 3000];

/// Trailing calendar months in the revenue chart, current month included
pub const MONTHLY_WINDOW: u32 = 6;

/// Smallest bar height in the revenue chart, in percent
pub const MIN_BAR_HEIGHT: f64 = 5.0;

pub const RECENT_LIMIT: usize = 10;

/// Finance service that turns a list of registrations into dashboard figures
#[derive(Clone, Default)]
pub struct FinanceService;

impl FinanceService {
    pub fn new() -> Self {
        Self
    }

    /// Full dashboard report relative to `today`
    pub fn build_report(&self, students: &[Student], today: NaiveDate) -> FinanceReport {
        let verified = self.verified_only(students);
        debug!(
            "Building finance report over {} verified of {} records",
            verified.len(),
            students.len()
        );

        FinanceReport {
            overview: self.overview(&verified, today),
            class_revenue: self.class_revenue(&verified),
            payment_breakdown: self.payment_breakdown(students),
            monthly_revenue: self.monthly_revenue(&verified, today),
            fee_distribution: self.fee_distribution(&verified),
            recent_transactions: self.recent_transactions(&verified),
        }
    }

    pub fn verified_only(&self, students: &[Student]) -> Vec<Student> {
        students.iter().filter(|s| s.is_verified()).cloned().collect()
    }

    pub fn overview(&self, verified: &[Student], today: NaiveDate) -> FinanceOverview {
        let (current_month_revenue, current_month_count) = verified
            .iter()
            .filter(|s| same_month(s.register_date, today))
            .fold((0, 0), |(revenue, count), s| (revenue + s.registration_fee, count + 1));

        FinanceOverview {
            total_revenue: self.total_revenue(verified),
            current_month_revenue,
            current_month_count,
            average_fee: self.average_fee(verified),
            verified_count: verified.len(),
            most_popular_class: self.most_popular_class(verified),
        }
    }

    pub fn total_revenue(&self, students: &[Student]) -> i64 {
        students.iter().map(|s| s.registration_fee).sum()
    }

    /// Mean fee rounded to the nearest whole amount; 0 for no records
    pub fn average_fee(&self, students: &[Student]) -> i64 {
        if students.is_empty() {
            return 0;
        }
        (self.total_revenue(students) as f64 / students.len() as f64).round() as i64
    }

    /// Subject with the most enrolled records. Ties go to the subject
    /// declared first; `None` when nobody takes any subject.
    pub fn most_popular_class(&self, students: &[Student]) -> Option<Subject> {
        let mut best: Option<(Subject, usize)> = None;
        for subject in Subject::ALL {
            let count = students.iter().filter(|s| s.has_subject(subject)).count();
            if count > best.map(|(_, c)| c).unwrap_or(0) {
                best = Some((subject, count));
            }
        }
        best.map(|(subject, _)| subject)
    }

    /// Each record's fee is split evenly over its subjects. Percentages are
    /// of the sum across subjects and are 0 when that sum is 0.
    pub fn class_revenue(&self, students: &[Student]) -> Vec<ClassRevenue> {
        let mut totals: Vec<(Subject, f64, usize)> = Subject::ALL.iter().map(|s| (*s, 0.0, 0)).collect();

        for student in students.iter().filter(|s| !s.classes.is_empty()) {
            let share = student.registration_fee as f64 / student.classes.len() as f64;
            for (subject, revenue, count) in totals.iter_mut() {
                if student.has_subject(*subject) {
                    *revenue += share;
                    *count += 1;
                }
            }
        }

        let grand_total: f64 = totals.iter().map(|(_, revenue, _)| revenue).sum();

        totals
            .into_iter()
            .map(|(subject, revenue, students)| ClassRevenue {
                subject,
                label: subject.label().to_string(),
                revenue,
                students,
                percentage: if grand_total > 0.0 { revenue / grand_total * 100.0 } else { 0.0 },
            })
            .collect()
    }

    /// Bank transfer = online and verified, local payment = manual, pending =
    /// online awaiting review. Percentages are of bank + local counts only.
    pub fn payment_breakdown(&self, students: &[Student]) -> PaymentBreakdown {
        let mut breakdown = PaymentBreakdown::default();

        for student in students {
            let bucket = match (student.registration_type, student.status) {
                (RegistrationType::Online, RegistrationStatus::Verified) => &mut breakdown.bank_transfer,
                (RegistrationType::Online, RegistrationStatus::Pending) => &mut breakdown.pending,
                (RegistrationType::Online, RegistrationStatus::Rejected) => continue,
                (RegistrationType::Manual, _) => &mut breakdown.local_payment,
            };
            bucket.count += 1;
            bucket.revenue += student.registration_fee;
        }

        let settled = breakdown.bank_transfer.count + breakdown.local_payment.count;
        if settled > 0 {
            breakdown.bank_transfer.percentage = percentage(breakdown.bank_transfer.count, settled);
            breakdown.local_payment.percentage = percentage(breakdown.local_payment.count, settled);
        }
        breakdown
    }

    /// Revenue for the trailing months ending with today's month, oldest
    /// first, months without registrations included as zero.
    pub fn monthly_revenue(&self, students: &[Student], today: NaiveDate) -> Vec<MonthlyRevenue> {
        let month_start = today.with_day(1).unwrap_or(today);

        let mut months: Vec<MonthlyRevenue> = (0..MONTHLY_WINDOW)
            .rev()
            .filter_map(|back| month_start.checked_sub_months(Months::new(back)))
            .map(|start| {
                let (revenue, count) = students
                    .iter()
                    .filter(|s| same_month(s.register_date, start))
                    .fold((0, 0), |(revenue, count), s| (revenue + s.registration_fee, count + 1));
                MonthlyRevenue {
                    month: start.format("%Y-%m").to_string(),
                    label: start.format("%b").to_string(),
                    revenue,
                    count,
                    bar_height: MIN_BAR_HEIGHT,
                }
            })
            .collect();

        let max = months.iter().map(|m| m.revenue).max().unwrap_or(0);
        if max > 0 {
            for month in months.iter_mut() {
                month.bar_height = (month.revenue as f64 / max as f64 * 100.0).max(MIN_BAR_HEIGHT);
            }
        }
        months
    }

    /// Count and total per fee bracket; other fee amounts are left out
    pub fn fee_distribution(&self, students: &[Student]) -> Vec<FeeBracket> {
        let mut brackets: Vec<FeeBracket> = FEE_BRACKETS
            .iter()
            .map(|&fee| {
                let count = students.iter().filter(|s| s.registration_fee == fee).count();
                FeeBracket {
                    fee,
                    count,
                    total: fee * count as i64,
                    bar_width: 0.0,
                }
            })
            .collect();

        let max_count = brackets.iter().map(|b| b.count).max().unwrap_or(0);
        if max_count > 0 {
            for bracket in brackets.iter_mut() {
                bracket.bar_width = percentage(bracket.count, max_count);
            }
        }
        brackets
    }

    /// Latest registrations by date, newest first, at most `RECENT_LIMIT`
    pub fn recent_transactions(&self, students: &[Student]) -> Vec<RecentTransaction> {
        let mut sorted: Vec<&Student> = students.iter().collect();
        sorted.sort_by(|a, b| b.register_date.cmp(&a.register_date));

        sorted
            .into_iter()
            .take(RECENT_LIMIT)
            .map(|s| RecentTransaction {
                id: s.id.clone(),
                name: s.full_name(),
                email: s.email.clone(),
                classes: s.classes.clone(),
                register_date: s.register_date.format("%Y-%m-%d").to_string(),
                fee: s.registration_fee,
                registration_type: s.registration_type,
            })
            .collect()
    }
}

fn same_month(date: NaiveDate, reference: NaiveDate) -> bool {
    date.year() == reference.year() && date.month() == reference.month()
}

fn percentage(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::student::test_support::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_class_revenue_splits_fee_evenly() {
        let records = vec![
            student("R1", 2000, &[Subject::Physics, Subject::Chemistry], "2024-01-10"),
            student("R2", 1000, &[Subject::Physics], "2024-01-11"),
        ];

        let revenue = FinanceService::new().class_revenue(&records);

        assert_eq!(revenue[0].subject, Subject::Physics);
        assert_eq!(revenue[0].revenue, 2000.0);
        assert_eq!(revenue[0].students, 2);
        assert_eq!(revenue[1].subject, Subject::Chemistry);
        assert_eq!(revenue[1].revenue, 1000.0);
        assert_eq!(revenue[2].revenue, 0.0);
        assert!((revenue[0].percentage - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_class_revenue_percentages_zero_without_revenue() {
        let revenue = FinanceService::new().class_revenue(&[]);

        assert_eq!(revenue.len(), 3);
        assert!(revenue.iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn test_average_fee() {
        let service = FinanceService::new();
        assert_eq!(service.average_fee(&[]), 0);

        let records = vec![
            student("A", 1000, &[Subject::Physics], "2024-01-10"),
            student("B", 1000, &[Subject::Physics], "2024-01-10"),
            student("C", 2000, &[Subject::Physics], "2024-01-10"),
        ];
        // 4000 / 3 = 1333.33
        assert_eq!(service.average_fee(&records), 1333);
    }

    #[test]
    fn test_most_popular_class_tie_goes_to_first_declared() {
        let records = vec![
            student("A", 2000, &[Subject::Chemistry, Subject::Physics], "2024-01-10"),
            student("B", 2000, &[Subject::Chemistry, Subject::Physics], "2024-01-10"),
        ];
        let service = FinanceService::new();

        assert_eq!(service.most_popular_class(&records), Some(Subject::Physics));
        assert_eq!(service.most_popular_class(&[]), None);
    }

    #[test]
    fn test_overview_uses_current_month() {
        let records = vec![
            student("A", 1000, &[Subject::Physics], "2024-05-02"),
            student("B", 2000, &[Subject::Physics], "2024-05-30"),
            student("C", 3000, &[Subject::Physics], "2024-04-30"),
            student("D", 3000, &[Subject::Physics], "2023-05-15"),
        ];

        let overview = FinanceService::new().overview(&records, date("2024-05-15"));

        assert_eq!(overview.total_revenue, 9000);
        assert_eq!(overview.current_month_revenue, 3000);
        assert_eq!(overview.current_month_count, 2);
        assert_eq!(overview.average_fee, 2250);
    }

    #[test]
    fn test_report_ignores_unverified_revenue() {
        let records = vec![
            student("M", 1000, &[Subject::Physics], "2024-05-02"),
            online(student("P", 2000, &[Subject::Chemistry], "2024-05-03"), RegistrationStatus::Pending),
            online(student("R", 3000, &[Subject::Chemistry], "2024-05-04"), RegistrationStatus::Rejected),
            online(student("V", 2000, &[Subject::Chemistry], "2024-05-05"), RegistrationStatus::Verified),
        ];

        let report = FinanceService::new().build_report(&records, date("2024-05-15"));

        assert_eq!(report.overview.total_revenue, 3000);
        assert_eq!(report.overview.verified_count, 2);
        assert_eq!(report.recent_transactions.len(), 2);

        let payments = report.payment_breakdown;
        assert_eq!(payments.bank_transfer.count, 1);
        assert_eq!(payments.local_payment.count, 1);
        assert_eq!(payments.pending.count, 1);
        assert_eq!(payments.pending.revenue, 2000);
        assert_eq!(payments.bank_transfer.percentage, 50.0);
        assert_eq!(payments.pending.percentage, 0.0);
    }

    #[test]
    fn test_monthly_revenue_window() {
        let records = vec![
            student("A", 1000, &[Subject::Physics], "2024-03-10"),
            student("B", 2000, &[Subject::Physics], "2024-03-20"),
            student("C", 1000, &[Subject::Physics], "2023-12-01"),
            // Outside the six-month window
            student("D", 3000, &[Subject::Physics], "2023-09-30"),
        ];

        let months = FinanceService::new().monthly_revenue(&records, date("2024-03-15"));

        let keys: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(keys, vec!["2023-10", "2023-11", "2023-12", "2024-01", "2024-02", "2024-03"]);
        assert_eq!(months[0].label, "Oct");
        assert_eq!(months.iter().map(|m| m.revenue).sum::<i64>(), 4000);
        assert_eq!(months[5].bar_height, 100.0);
        assert!((months[2].bar_height - 33.333).abs() < 0.01);
        assert_eq!(months[0].bar_height, MIN_BAR_HEIGHT);
    }

    #[test]
    fn test_fee_distribution_skips_other_amounts() {
        let records = vec![
            student("A", 1000, &[Subject::Physics], "2024-03-10"),
            student("B", 1000, &[Subject::Physics], "2024-03-10"),
            student("C", 3000, &[Subject::Physics], "2024-03-10"),
            student("D", 1500, &[Subject::Physics], "2024-03-10"),
        ];

        let brackets = FinanceService::new().fee_distribution(&records);

        assert_eq!(brackets.iter().map(|b| b.count).collect::<Vec<_>>(), vec![2, 0, 1]);
        assert_eq!(brackets[0].total, 2000);
        assert_eq!(brackets[0].bar_width, 100.0);
        assert_eq!(brackets[2].bar_width, 50.0);
    }

    #[test]
    fn test_recent_transactions_limit_and_order() {
        let records: Vec<Student> = (1..=12)
            .map(|day| student(&format!("S{}", day), 1000, &[Subject::Physics], &format!("2024-03-{:02}", day)))
            .collect();

        let recent = FinanceService::new().recent_transactions(&records);

        assert_eq!(recent.len(), RECENT_LIMIT);
        assert_eq!(recent[0].id, "S12");
        assert_eq!(recent[9].id, "S3");
    }
}
