//! Roster domain models.
//!
//! Immutable value types for the scheduling pipeline. All entities are
//! constructed fresh per request and treated as read-only inputs by the
//! solver; the in-progress assignment set is the only mutable state and
//! is owned by the run.

mod constraint;
mod employee;
mod roster;
mod score;
mod shift;
mod team_pattern;

pub use constraint::{
    Constraint, ConstraintCategory, ConstraintKind, ConstraintViolation, RuleCode, RulePolicy,
    Severity,
};
pub use employee::{
    CareerGroup, Employee, EmployeePreferences, RequestKind, ShiftRequest, REQUEST_OVERRIDE_SCORE,
};
pub use roster::{RosterIndex, ScheduleAssignment};
pub use score::{ScheduleScore, ScoreBreakdown};
pub use shift::{Shift, ShiftType};
pub use team_pattern::TeamPattern;
