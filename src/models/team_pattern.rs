//! Department rotation configuration.
//!
//! A team pattern carries the per-shift-type staffing targets for a
//! department, the default rotation token sequences employees cycle
//! through, and department-wide avoid sequences. The engine consumes a
//! resolved copy per request; the configuration store owns the data.

use serde::{Deserialize, Serialize};

use super::ShiftType;
use crate::pattern::ShiftToken;

/// Per-department rotation and staffing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamPattern {
    /// Department this configuration applies to.
    pub department_id: String,
    /// Target headcount on day shifts.
    pub required_staff_day: u32,
    /// Target headcount on evening shifts.
    pub required_staff_evening: u32,
    /// Target headcount on night shifts.
    pub required_staff_night: u32,
    /// Default rotation sequences, assigned round-robin to employees.
    pub default_patterns: Vec<Vec<ShiftToken>>,
    /// Department-wide forbidden shift sequences.
    pub avoid_patterns: Vec<Vec<ShiftToken>>,
    /// Department headcount.
    pub total_members: u32,
}

impl TeamPattern {
    /// Creates an empty configuration for a department.
    pub fn new(department_id: impl Into<String>) -> Self {
        Self {
            department_id: department_id.into(),
            ..Self::default()
        }
    }

    /// Sets per-shift-type staffing targets.
    pub fn with_required_staff(mut self, day: u32, evening: u32, night: u32) -> Self {
        self.required_staff_day = day;
        self.required_staff_evening = evening;
        self.required_staff_night = night;
        self
    }

    /// Adds a default rotation sequence.
    pub fn with_default_pattern(mut self, tokens: Vec<ShiftToken>) -> Self {
        self.default_patterns.push(tokens);
        self
    }

    /// Adds a department-wide avoid sequence.
    pub fn with_avoid_pattern(mut self, tokens: Vec<ShiftToken>) -> Self {
        self.avoid_patterns.push(tokens);
        self
    }

    /// Sets the department headcount.
    pub fn with_total_members(mut self, members: u32) -> Self {
        self.total_members = members;
        self
    }

    /// Target headcount for a shift type (admin shifts have no target).
    pub fn required_for(&self, shift_type: ShiftType) -> u32 {
        match shift_type {
            ShiftType::Day => self.required_staff_day,
            ShiftType::Evening => self.required_staff_evening,
            ShiftType::Night => self.required_staff_night,
            ShiftType::Admin => 0,
        }
    }

    /// Sum of per-shift staffing targets.
    pub fn total_required(&self) -> u32 {
        self.required_staff_day + self.required_staff_evening + self.required_staff_night
    }

    /// Warning when the per-shift targets exceed the department headcount.
    ///
    /// Oversubscription is legitimate (part-period coverage, floats), so
    /// this never fails; the caller decides whether to surface it.
    pub fn headcount_warning(&self) -> Option<String> {
        if self.total_required() > self.total_members {
            Some(format!(
                "department '{}' requires {} staff per day across shifts but has {} members",
                self.department_id,
                self.total_required(),
                self.total_members
            ))
        } else {
            None
        }
    }

    /// The rotation sequence for the employee at `index` in the id-sorted
    /// roster, chosen round-robin; `None` when no defaults exist.
    pub fn rotation_for(&self, index: usize) -> Option<&[ShiftToken]> {
        if self.default_patterns.is_empty() {
            return None;
        }
        let seq = &self.default_patterns[index % self.default_patterns.len()];
        if seq.is_empty() {
            None
        } else {
            Some(seq)
        }
    }

    /// The rotation token for the employee at `employee_index` on day
    /// `day_index` of the period.
    ///
    /// The employee index doubles as the phase offset into the cycle, so
    /// a department does not start every employee on the same day of the
    /// rotation.
    pub fn token_on(&self, employee_index: usize, day_index: usize) -> Option<ShiftToken> {
        self.rotation_for(employee_index)
            .map(|seq| seq[(day_index + employee_index) % seq.len()])
    }
}
