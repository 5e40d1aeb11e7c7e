//! Workload fairness engine.
//!
//! Builds a workload vector per employee, computes Jain's fairness index
//! over total hours, and derives an individual 0–100 fairness score per
//! employee. The optimizer uses the individual scores to bias which
//! employees participate in swap moves; the index is reported as-is.
//!
//! # Reference
//! Jain, Chiu & Hawe (1984), "A Quantitative Measure of Fairness"

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Employee, RosterIndex, ScheduleAssignment, Shift, ShiftType};

/// Weekly hours above which the individual score is deducted.
const COMFORT_WEEKLY_HOURS: f64 = 45.0;
/// Weekend shifts allowed per month before deductions apply.
const WEEKEND_SHIFTS_PER_MONTH: u32 = 2;

/// Per-employee workload measures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadVector {
    /// Total worked hours (net of breaks).
    pub total_hours: f64,
    /// Night shifts worked.
    pub night_shifts: u32,
    /// Saturday/Sunday shifts worked.
    pub weekend_shifts: u32,
    /// Holiday shifts worked.
    pub holiday_shifts: u32,
    /// Longest consecutive-workday run.
    pub max_consecutive_days: u32,
}

/// One employee's fairness assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessRecord {
    /// Employee id.
    pub employee_id: String,
    /// Workload measures.
    pub workload: WorkloadVector,
    /// Individual fairness score, 0–100.
    pub score: f64,
}

/// Aggregate fairness assessment for a roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    /// Jain's fairness index over total hours, in `[1/n, 1]`.
    pub jain_index: f64,
    /// Per-employee records, in employee-id order.
    pub records: Vec<FairnessRecord>,
}

impl FairnessReport {
    /// Mean of the individual scores (100 for an empty roster).
    pub fn mean_score(&self) -> f64 {
        if self.records.is_empty() {
            return 100.0;
        }
        self.records.iter().map(|r| r.score).sum::<f64>() / self.records.len() as f64
    }

    /// The record for one employee, if present.
    pub fn record_for(&self, employee_id: &str) -> Option<&FairnessRecord> {
        self.records.iter().find(|r| r.employee_id == employee_id)
    }
}

/// Jain's fairness index: `(Σx)² / (n · Σx²)`.
///
/// Bounded by `[1/n, 1]`; equals 1.0 exactly when all values are equal.
/// An empty or all-zero population is treated as perfectly fair.
pub fn jains_index(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let sum: f64 = values.iter().sum();
    let sum_sq: f64 = values.iter().map(|x| x * x).sum();
    if sum_sq == 0.0 {
        return 1.0;
    }
    (sum * sum) / (values.len() as f64 * sum_sq)
}

/// Computes the fairness report for a roster.
///
/// `days` is the full roster period; it scales the weekly-hour pace and
/// the monthly weekend allowance.
pub fn compute_fairness(
    assignments: &[ScheduleAssignment],
    employees: &[Employee],
    shifts: &[Shift],
    holidays: &[NaiveDate],
    days: &[NaiveDate],
) -> FairnessReport {
    let index = RosterIndex::build(assignments, shifts);

    let weeks = (days.len() as f64 / 7.0).max(1.0);
    let months = (days.len() as f64 / 30.0).ceil().max(1.0) as u32;
    let weekend_allowance = WEEKEND_SHIFTS_PER_MONTH * months;

    let mut ids: Vec<&str> = employees.iter().map(|e| e.id.as_str()).collect();
    ids.sort_unstable();

    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        let workload = workload_vector(&index, id, holidays, days);
        let score = individual_score(&workload, weeks, weekend_allowance);
        records.push(FairnessRecord {
            employee_id: id.to_string(),
            workload,
            score,
        });
    }

    let hours: Vec<f64> = records.iter().map(|r| r.workload.total_hours).collect();
    FairnessReport {
        jain_index: jains_index(&hours),
        records,
    }
}

fn workload_vector(
    index: &RosterIndex<'_>,
    employee_id: &str,
    holidays: &[NaiveDate],
    days: &[NaiveDate],
) -> WorkloadVector {
    let mut vector = WorkloadVector {
        total_hours: index.total_work_hours(employee_id),
        max_consecutive_days: index.max_consecutive_days(employee_id, days) as u32,
        ..WorkloadVector::default()
    };

    for (date, shift) in index.assignments_for(employee_id) {
        if shift.shift_type == ShiftType::Night {
            vector.night_shifts += 1;
        }
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            vector.weekend_shifts += 1;
        }
        if holidays.contains(&date) {
            vector.holiday_shifts += 1;
        }
    }
    vector
}

/// Individual score: 100, minus 2 per hour of weekly pace beyond
/// [`COMFORT_WEEKLY_HOURS`], minus 10 per weekend shift beyond the
/// monthly allowance, clamped to `[0, 100]`.
fn individual_score(workload: &WorkloadVector, weeks: f64, weekend_allowance: u32) -> f64 {
    let mut score = 100.0;

    let weekly_pace = workload.total_hours / weeks;
    if weekly_pace > COMFORT_WEEKLY_HOURS {
        score -= 2.0 * (weekly_pace - COMFORT_WEEKLY_HOURS);
    }
    if workload.weekend_shifts > weekend_allowance {
        score -= 10.0 * (workload.weekend_shifts - weekend_allowance) as f64;
    }

    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Shift;

    fn date(day: u32) -> NaiveDate {
        // 2025-06-02 is a Monday.
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn week_days() -> Vec<NaiveDate> {
        (2..=8).map(date).collect()
    }

    fn staff(n: usize) -> Vec<Employee> {
        (1..=n).map(|i| Employee::new(format!("e{i:02}"))).collect()
    }

    #[test]
    fn test_jains_index_equal_allocation() {
        assert!((jains_index(&[8.0, 8.0, 8.0, 8.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_jains_index_lower_bound() {
        // One employee takes everything: index = 1/n.
        let n = 4;
        let index = jains_index(&[40.0, 0.0, 0.0, 0.0]);
        assert!((index - 1.0 / n as f64).abs() < 1e-12);
    }

    #[test]
    fn test_jains_index_bounds_hold() {
        let values = [8.0, 16.0, 24.0, 40.0, 0.0];
        let index = jains_index(&values);
        assert!(index >= 1.0 / values.len() as f64);
        assert!(index <= 1.0 + 1e-12);
    }

    #[test]
    fn test_jains_index_degenerate() {
        assert!((jains_index(&[]) - 1.0).abs() < 1e-12);
        assert!((jains_index(&[0.0, 0.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_workload_vector_counts() {
        let shifts = vec![Shift::day("D"), Shift::night("N")];
        // 2025-06-07 is a Saturday.
        let assignments = vec![
            ScheduleAssignment::new("e01", "N", date(2)),
            ScheduleAssignment::new("e01", "N", date(3)),
            ScheduleAssignment::new("e01", "D", date(7)),
        ];
        let holidays = vec![date(3)];
        let report = compute_fairness(&assignments, &staff(1), &shifts, &holidays, &week_days());

        let record = report.record_for("e01").unwrap();
        assert_eq!(record.workload.night_shifts, 2);
        assert_eq!(record.workload.weekend_shifts, 1);
        assert_eq!(record.workload.holiday_shifts, 1);
        assert_eq!(record.workload.max_consecutive_days, 2);
        assert!((record.workload.total_hours - 24.0).abs() < 1e-10);
    }

    #[test]
    fn test_individual_score_deducts_overwork() {
        let shifts = vec![Shift::day("D")];
        // Six 8h day shifts in one week: 48h pace, 3h over 45 → -6.
        let assignments: Vec<ScheduleAssignment> = (2..=7)
            .map(|d| ScheduleAssignment::new("e01", "D", date(d)))
            .collect();
        let report = compute_fairness(&assignments, &staff(1), &shifts, &[], &week_days());

        let record = report.record_for("e01").unwrap();
        assert!((record.score - 94.0).abs() < 1e-10);
    }

    #[test]
    fn test_individual_score_deducts_weekends() {
        let shifts = vec![Shift::day("D")];
        // 2025-06-07/08, 14/15 are weekends; four weekend shifts with a
        // monthly allowance of two → -20.
        let assignments = vec![
            ScheduleAssignment::new("e01", "D", date(7)),
            ScheduleAssignment::new("e01", "D", date(8)),
            ScheduleAssignment::new("e01", "D", date(14)),
            ScheduleAssignment::new("e01", "D", date(15)),
        ];
        let days: Vec<NaiveDate> = (2..=15).map(date).collect();
        let report = compute_fairness(&assignments, &staff(1), &shifts, &[], &days);

        let record = report.record_for("e01").unwrap();
        assert!((record.score - 80.0).abs() < 1e-10);
    }

    #[test]
    fn test_idle_employee_scores_full() {
        let shifts = vec![Shift::day("D")];
        let assignments = vec![ScheduleAssignment::new("e01", "D", date(2))];
        let report = compute_fairness(&assignments, &staff(2), &shifts, &[], &week_days());

        assert!((report.record_for("e02").unwrap().score - 100.0).abs() < 1e-10);
        assert!(report.jain_index < 1.0);
    }

    #[test]
    fn test_report_mean_score() {
        let report = FairnessReport {
            jain_index: 1.0,
            records: vec![
                FairnessRecord {
                    employee_id: "a".into(),
                    workload: WorkloadVector::default(),
                    score: 90.0,
                },
                FairnessRecord {
                    employee_id: "b".into(),
                    workload: WorkloadVector::default(),
                    score: 70.0,
                },
            ],
        };
        assert!((report.mean_score() - 80.0).abs() < 1e-10);
    }
}
