//! Input validation for scheduling requests.
//!
//! Checks structural integrity of the request before any analysis runs.
//! Inputs are expected to be validated at the storage boundary already;
//! this pass exists to turn broken-caller bugs into structured reports
//! instead of mid-pipeline panics. Detects:
//! - Duplicate employee and shift ids
//! - Staffing bands violating `min ≤ required ≤ max`
//! - Non-positive shift durations
//! - Request scores outside 1–5
//! - Inverted roster periods

use std::collections::HashSet;

use crate::engine::SchedulingRequest;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same id.
    DuplicateId,
    /// A shift's staffing band is not `min ≤ required ≤ max`.
    InvalidStaffingBand,
    /// A shift's paid duration is not positive.
    InvalidDuration,
    /// A request score is outside 1–5.
    InvalidRequestScore,
    /// The roster period ends before it starts.
    InvalidPeriod,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the structural integrity of a scheduling request.
///
/// Returns `Ok(())` if all checks pass, `Err(errors)` with every detected
/// issue otherwise.
pub fn validate_request(request: &SchedulingRequest) -> ValidationResult {
    let mut errors = Vec::new();

    if request.end_date < request.start_date {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidPeriod,
            format!(
                "period ends {} before it starts {}",
                request.end_date, request.start_date
            ),
        ));
    }

    let mut employee_ids = HashSet::new();
    for e in &request.employees {
        if !employee_ids.insert(e.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate employee id: {}", e.id),
            ));
        }
        for r in &e.preferences.requests {
            if r.score < 1 || r.score > 5 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidRequestScore,
                    format!(
                        "employee '{}' request on {} has score {} (expected 1-5)",
                        e.id, r.date, r.score
                    ),
                ));
            }
        }
    }

    let mut shift_ids = HashSet::new();
    for s in &request.shifts {
        if !shift_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate shift id: {}", s.id),
            ));
        }
        if !s.band_is_valid() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidStaffingBand,
                format!(
                    "shift '{}' staffing band {}/{}/{} violates min <= required <= max",
                    s.id, s.min_staff, s.required_staff, s.max_staff
                ),
            ));
        }
        if s.duration_hours <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("shift '{}' has non-positive duration", s.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SchedulingRequest;
    use crate::models::{Employee, Shift, ShiftRequest, ShiftType};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn valid_request() -> SchedulingRequest {
        SchedulingRequest::new("icu", date(2), date(8))
            .with_employees(vec![Employee::new("e01"), Employee::new("e02")])
            .with_shifts(vec![Shift::day("D").with_staffing(1, 1, 2)])
    }

    #[test]
    fn test_valid_request() {
        assert!(validate_request(&valid_request()).is_ok());
    }

    #[test]
    fn test_duplicate_employee_id() {
        let request = valid_request()
            .with_employees(vec![Employee::new("e01"), Employee::new("e01")]);
        let errors = validate_request(&request).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("employee")));
    }

    #[test]
    fn test_duplicate_shift_id() {
        let request = valid_request().with_shifts(vec![Shift::day("D"), Shift::night("D")]);
        let errors = validate_request(&request).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("shift")));
    }

    #[test]
    fn test_invalid_staffing_band() {
        let request = valid_request().with_shifts(vec![Shift::day("D").with_staffing(3, 2, 1)]);
        let errors = validate_request(&request).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidStaffingBand));
    }

    #[test]
    fn test_invalid_duration() {
        let request =
            valid_request().with_shifts(vec![Shift::day("D").with_duration_hours(0.0)]);
        let errors = validate_request(&request).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidDuration));
    }

    #[test]
    fn test_invalid_request_score() {
        let request = valid_request().with_employees(vec![Employee::new("e01")
            .with_request(ShiftRequest::work(date(3), ShiftType::Day, 9))]);
        let errors = validate_request(&request).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidRequestScore));
    }

    #[test]
    fn test_inverted_period() {
        let request = SchedulingRequest::new("icu", date(8), date(2));
        let errors = validate_request(&request).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidPeriod));
    }

    #[test]
    fn test_multiple_errors_collected() {
        let request = SchedulingRequest::new("icu", date(8), date(2))
            .with_employees(vec![Employee::new("e01"), Employee::new("e01")]);
        let errors = validate_request(&request).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
