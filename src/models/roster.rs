//! Roster solution model.
//!
//! A roster is a set of (employee, shift, date) assignments; OFF days are
//! the absence of an assignment. [`RosterIndex`] is the derived read view
//! shared by the evaluator, fairness engine, and result composer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::Shift;
use crate::pattern::ShiftToken;

/// One employee working one shift on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    /// Assigned employee id.
    pub employee_id: String,
    /// Assigned shift id.
    pub shift_id: String,
    /// Assignment date (the shift's start date for overnight shifts).
    pub date: NaiveDate,
}

impl ScheduleAssignment {
    /// Creates a new assignment.
    pub fn new(
        employee_id: impl Into<String>,
        shift_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            shift_id: shift_id.into(),
            date,
        }
    }
}

/// Read-optimized view over an assignment set.
///
/// # Panics
///
/// `build` panics when an assignment references an unknown shift id or
/// when an employee holds two assignments on the same date. Both are
/// caller contract violations, not schedulability issues.
#[derive(Debug)]
pub struct RosterIndex<'a> {
    by_employee: BTreeMap<&'a str, BTreeMap<NaiveDate, &'a Shift>>,
    slots: HashMap<(NaiveDate, &'a str), Vec<&'a str>>,
}

impl<'a> RosterIndex<'a> {
    /// Builds the index from assignments and the shift catalogue.
    pub fn build(assignments: &'a [ScheduleAssignment], shifts: &'a [Shift]) -> Self {
        let shift_by_id: HashMap<&str, &Shift> =
            shifts.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut by_employee: BTreeMap<&str, BTreeMap<NaiveDate, &Shift>> = BTreeMap::new();
        let mut slots: HashMap<(NaiveDate, &str), Vec<&str>> = HashMap::new();

        for a in assignments {
            let shift = *shift_by_id.get(a.shift_id.as_str()).unwrap_or_else(|| {
                panic!("assignment references unknown shift id `{}`", a.shift_id)
            });

            let per_day = by_employee.entry(a.employee_id.as_str()).or_default();
            if per_day.insert(a.date, shift).is_some() {
                panic!(
                    "employee `{}` is double-booked on {}",
                    a.employee_id, a.date
                );
            }

            slots
                .entry((a.date, a.shift_id.as_str()))
                .or_default()
                .push(a.employee_id.as_str());
        }

        for ids in slots.values_mut() {
            ids.sort_unstable();
        }

        Self { by_employee, slots }
    }

    /// The shift an employee works on a date, if any.
    pub fn shift_on(&self, employee_id: &str, date: NaiveDate) -> Option<&'a Shift> {
        self.by_employee.get(employee_id)?.get(&date).copied()
    }

    /// Employee ids assigned to a slot, sorted.
    pub fn assigned_ids(&self, date: NaiveDate, shift_id: &'a str) -> &[&'a str] {
        self.slots
            .get(&(date, shift_id))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Headcount on a slot.
    pub fn assigned_count(&self, date: NaiveDate, shift_id: &str) -> usize {
        self.assigned_ids(date, shift_id).len()
    }

    /// Employee ids with at least one assignment, sorted.
    pub fn employee_ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.by_employee.keys().copied()
    }

    /// Date-ordered assignments for one employee.
    pub fn assignments_for(
        &self,
        employee_id: &str,
    ) -> impl Iterator<Item = (NaiveDate, &'a Shift)> + '_ {
        self.by_employee
            .get(employee_id)
            .into_iter()
            .flat_map(|m| m.iter().map(|(d, s)| (*d, *s)))
    }

    /// Total worked hours (net of breaks) for one employee.
    pub fn total_work_hours(&self, employee_id: &str) -> f64 {
        self.assignments_for(employee_id)
            .map(|(_, s)| s.work_hours())
            .sum()
    }

    /// Number of days an employee works.
    pub fn days_worked(&self, employee_id: &str) -> usize {
        self.by_employee
            .get(employee_id)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// The employee's realized token per day over the given period.
    pub fn realized_tokens(&self, employee_id: &str, days: &[NaiveDate]) -> Vec<ShiftToken> {
        days.iter()
            .map(|d| match self.shift_on(employee_id, *d) {
                Some(shift) => ShiftToken::from_shift_type(shift.shift_type),
                None => ShiftToken::Off,
            })
            .collect()
    }

    /// Longest run of consecutive worked days within the period.
    pub fn max_consecutive_days(&self, employee_id: &str, days: &[NaiveDate]) -> usize {
        let mut max_run = 0;
        let mut run = 0;
        for d in days {
            if self.shift_on(employee_id, *d).is_some() {
                run += 1;
                max_run = max_run.max(run);
            } else {
                run = 0;
            }
        }
        max_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShiftType;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn shifts() -> Vec<Shift> {
        vec![
            Shift::day("D").with_staffing(1, 2, 3),
            Shift::night("N").with_staffing(1, 1, 2),
        ]
    }

    fn sample_assignments() -> Vec<ScheduleAssignment> {
        vec![
            ScheduleAssignment::new("e01", "D", date(1)),
            ScheduleAssignment::new("e02", "D", date(1)),
            ScheduleAssignment::new("e01", "N", date(2)),
            ScheduleAssignment::new("e02", "D", date(3)),
        ]
    }

    #[test]
    fn test_slot_counts_and_ids() {
        let shifts = shifts();
        let assignments = sample_assignments();
        let index = RosterIndex::build(&assignments, &shifts);

        assert_eq!(index.assigned_count(date(1), "D"), 2);
        assert_eq!(index.assigned_ids(date(1), "D"), &["e01", "e02"]);
        assert_eq!(index.assigned_count(date(1), "N"), 0);
        assert_eq!(index.assigned_count(date(2), "N"), 1);
    }

    #[test]
    fn test_shift_on_and_hours() {
        let shifts = shifts();
        let assignments = sample_assignments();
        let index = RosterIndex::build(&assignments, &shifts);

        assert_eq!(index.shift_on("e01", date(1)).unwrap().shift_type, ShiftType::Day);
        assert!(index.shift_on("e01", date(3)).is_none());
        // e01: one day shift + one night shift, 8h each
        assert!((index.total_work_hours("e01") - 16.0).abs() < 1e-10);
        assert_eq!(index.days_worked("e01"), 2);
    }

    #[test]
    fn test_realized_tokens() {
        let shifts = shifts();
        let assignments = sample_assignments();
        let index = RosterIndex::build(&assignments, &shifts);

        let days = [date(1), date(2), date(3)];
        assert_eq!(
            index.realized_tokens("e01", &days),
            vec![ShiftToken::Day, ShiftToken::Night, ShiftToken::Off]
        );
        assert_eq!(
            index.realized_tokens("e02", &days),
            vec![ShiftToken::Day, ShiftToken::Off, ShiftToken::Day]
        );
    }

    #[test]
    fn test_max_consecutive_days() {
        let shifts = shifts();
        let assignments = vec![
            ScheduleAssignment::new("e01", "D", date(1)),
            ScheduleAssignment::new("e01", "D", date(2)),
            ScheduleAssignment::new("e01", "D", date(3)),
            ScheduleAssignment::new("e01", "D", date(5)),
        ];
        let index = RosterIndex::build(&assignments, &shifts);

        let days: Vec<NaiveDate> = (1..=6).map(date).collect();
        assert_eq!(index.max_consecutive_days("e01", &days), 3);
        assert_eq!(index.max_consecutive_days("e99", &days), 0);
    }

    #[test]
    #[should_panic(expected = "unknown shift id")]
    fn test_unknown_shift_panics() {
        let shifts = shifts();
        let assignments = vec![ScheduleAssignment::new("e01", "X", date(1))];
        let _ = RosterIndex::build(&assignments, &shifts);
    }

    #[test]
    #[should_panic(expected = "double-booked")]
    fn test_double_booking_panics() {
        let shifts = shifts();
        let assignments = vec![
            ScheduleAssignment::new("e01", "D", date(1)),
            ScheduleAssignment::new("e01", "N", date(1)),
        ];
        let _ = RosterIndex::build(&assignments, &shifts);
    }
}
