//! Employee model.
//!
//! Employees are read-only inputs owned by the caller: identity,
//! department/team membership, career group, and scheduling preferences
//! (preferred shift types, teammates, avoid-patterns, and explicit
//! per-date requests scored 1–5).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ShiftType;
use crate::pattern::ShiftToken;

/// Explicit requests at or above this score override rotation patterns.
pub const REQUEST_OVERRIDE_SCORE: u8 = 4;

/// Seniority classification used for coverage-mix rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CareerGroup {
    /// Early-career staff; slots staffed only by juniors may be capped.
    Junior,
    /// Mid-career staff.
    Intermediate,
    /// Senior staff; some slots require at least one.
    Senior,
}

/// What an explicit per-date request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    /// A day off.
    DayOff,
    /// A specific shift type.
    Work(ShiftType),
}

/// An explicit per-date request with a 1–5 priority score.
///
/// Scores of [`REQUEST_OVERRIDE_SCORE`] and above take precedence over
/// the department rotation pattern during seed construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRequest {
    /// Requested date.
    pub date: NaiveDate,
    /// Day off or a specific shift type.
    pub kind: RequestKind,
    /// Priority score, 1 (mild preference) to 5 (must honor).
    pub score: u8,
}

impl ShiftRequest {
    /// Creates a day-off request.
    pub fn day_off(date: NaiveDate, score: u8) -> Self {
        Self {
            date,
            kind: RequestKind::DayOff,
            score,
        }
    }

    /// Creates a work request for a specific shift type.
    pub fn work(date: NaiveDate, shift_type: ShiftType, score: u8) -> Self {
        Self {
            date,
            kind: RequestKind::Work(shift_type),
            score,
        }
    }

    /// Whether this request overrides rotation patterns.
    #[inline]
    pub fn is_override(&self) -> bool {
        self.score >= REQUEST_OVERRIDE_SCORE
    }
}

/// Scheduling preferences for one employee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeePreferences {
    /// Shift types the employee prefers to work.
    pub preferred_shift_types: Vec<ShiftType>,
    /// Employee ids this employee likes to share a slot with.
    pub preferred_teammates: Vec<String>,
    /// Employee ids this employee should not share a slot with.
    pub avoided_teammates: Vec<String>,
    /// Forbidden consecutive shift-type sequences for this employee.
    pub avoid_patterns: Vec<Vec<ShiftToken>>,
    /// Explicit per-date requests.
    pub requests: Vec<ShiftRequest>,
}

/// An employee on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique employee identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Department the employee belongs to.
    pub department: String,
    /// Team within the department, if any.
    pub team: Option<String>,
    /// Seniority classification.
    pub career_group: CareerGroup,
    /// Scheduling preferences.
    pub preferences: EmployeePreferences,
}

impl Employee {
    /// Creates a new employee with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            department: String::new(),
            team: None,
            career_group: CareerGroup::Intermediate,
            preferences: EmployeePreferences::default(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Sets the team.
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Sets the career group.
    pub fn with_career_group(mut self, group: CareerGroup) -> Self {
        self.career_group = group;
        self
    }

    /// Adds a preferred shift type.
    pub fn with_preferred_shift(mut self, shift_type: ShiftType) -> Self {
        self.preferences.preferred_shift_types.push(shift_type);
        self
    }

    /// Adds an avoided teammate.
    pub fn with_avoided_teammate(mut self, employee_id: impl Into<String>) -> Self {
        self.preferences.avoided_teammates.push(employee_id.into());
        self
    }

    /// Adds a preferred teammate.
    pub fn with_preferred_teammate(mut self, employee_id: impl Into<String>) -> Self {
        self.preferences.preferred_teammates.push(employee_id.into());
        self
    }

    /// Adds an avoid-pattern.
    pub fn with_avoid_pattern(mut self, tokens: Vec<ShiftToken>) -> Self {
        self.preferences.avoid_patterns.push(tokens);
        self
    }

    /// Adds an explicit request.
    pub fn with_request(mut self, request: ShiftRequest) -> Self {
        self.preferences.requests.push(request);
        self
    }

    /// The highest-scored request for a given date, if any.
    pub fn request_on(&self, date: NaiveDate) -> Option<&ShiftRequest> {
        self.preferences
            .requests
            .iter()
            .filter(|r| r.date == date)
            .max_by_key(|r| r.score)
    }

    /// Whether the employee has an overriding day-off request on `date`.
    pub fn has_day_off_override(&self, date: NaiveDate) -> bool {
        self.preferences
            .requests
            .iter()
            .any(|r| r.date == date && r.kind == RequestKind::DayOff && r.is_override())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_employee_builder() {
        let e = Employee::new("e01")
            .with_name("Kim")
            .with_department("icu")
            .with_team("alpha")
            .with_career_group(CareerGroup::Senior)
            .with_preferred_shift(ShiftType::Night);

        assert_eq!(e.id, "e01");
        assert_eq!(e.department, "icu");
        assert_eq!(e.team.as_deref(), Some("alpha"));
        assert_eq!(e.career_group, CareerGroup::Senior);
        assert_eq!(e.preferences.preferred_shift_types, vec![ShiftType::Night]);
    }

    #[test]
    fn test_request_on_returns_highest_score() {
        let e = Employee::new("e01")
            .with_request(ShiftRequest::work(date(3), ShiftType::Day, 2))
            .with_request(ShiftRequest::day_off(date(3), 5));

        let top = e.request_on(date(3)).unwrap();
        assert_eq!(top.kind, RequestKind::DayOff);
        assert_eq!(top.score, 5);
        assert!(e.request_on(date(4)).is_none());
    }

    #[test]
    fn test_override_threshold() {
        assert!(ShiftRequest::day_off(date(1), 4).is_override());
        assert!(!ShiftRequest::day_off(date(1), 3).is_override());
    }

    #[test]
    fn test_day_off_override_lookup() {
        let e = Employee::new("e01").with_request(ShiftRequest::day_off(date(2), 5));
        assert!(e.has_day_off_override(date(2)));
        assert!(!e.has_day_off_override(date(3)));

        let weak = Employee::new("e02").with_request(ShiftRequest::day_off(date(2), 2));
        assert!(!weak.has_day_off_override(date(2)));
    }
}
