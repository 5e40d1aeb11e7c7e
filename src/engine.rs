//! Scheduling engine entry point.
//!
//! Defines the request/result contract consumed by the surrounding
//! product and drives the pipeline: validation, preflight analysis,
//! constructive seeding, local-search optimization, final evaluation,
//! and result composition.
//!
//! Each invocation is a single synchronous, CPU-bound computation with
//! no shared state; concurrent requests are independent by construction.

use std::time::Instant;

use chrono::NaiveDate;
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{compose, GenerationDiagnostics, Suggestion};
use crate::models::{
    Constraint, ConstraintViolation, Employee, ScheduleAssignment, ScheduleScore, Shift,
    TeamPattern,
};
use crate::preflight::preflight;
use crate::solver::{build_seed, evaluate, optimize, OptimizerBudget, PostprocessStats};
use crate::validate::validate_request;

/// Statutory working-time limits, configurable per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRules {
    /// Maximum worked hours per roster week.
    pub max_weekly_hours: f64,
    /// Maximum consecutive workdays.
    pub max_consecutive_days: u32,
    /// Minimum rest between consecutive shifts, in hours.
    pub min_rest_hours: f64,
    /// Minimum rest days per full roster week.
    pub min_weekly_rest_days: u32,
    /// Tolerated deviation from the department mean workload, in hours.
    pub workload_tolerance_hours: f64,
}

impl Default for WorkRules {
    fn default() -> Self {
        Self {
            max_weekly_hours: 52.0,
            max_consecutive_days: 5,
            min_rest_hours: 11.0,
            min_weekly_rest_days: 1,
            workload_tolerance_hours: 4.0,
        }
    }
}

/// Team and career-group coverage requirements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageRules {
    /// Teams that must be represented on every staffed slot.
    pub required_teams: Vec<String>,
    /// Whether every staffed slot needs at least one senior.
    pub require_senior_presence: bool,
    /// Maximum headcount of an all-junior slot, if capped.
    pub max_junior_only: Option<u32>,
}

/// What the optimizer should favor when trading off soft constraints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationGoal {
    /// Equal weighting across objectives.
    #[default]
    Balanced,
    /// Favor workload equality.
    Fairness,
    /// Favor employee preferences.
    Preference,
    /// Favor staffing the operational targets.
    Coverage,
    /// Favor lean staffing.
    Cost,
}

/// A scheduling request for one department and period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    /// Department being rostered.
    pub department_id: String,
    /// First day of the period, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the period, inclusive.
    pub end_date: NaiveDate,
    /// Roster of available employees.
    pub employees: Vec<Employee>,
    /// Shift catalogue repeated each day.
    pub shifts: Vec<Shift>,
    /// Caller constraint configuration (see [`crate::models::RulePolicy`]).
    pub constraints: Vec<Constraint>,
    /// Department rotation configuration, if any.
    pub team_pattern: Option<TeamPattern>,
    /// Legal working-time limits.
    pub work_rules: WorkRules,
    /// Team and career-group coverage requirements.
    pub coverage: CoverageRules,
    /// Public holidays within the period.
    pub holidays: Vec<NaiveDate>,
    /// Optimization objective.
    pub optimization_goal: OptimizationGoal,
}

impl SchedulingRequest {
    /// Creates a request for a department and inclusive period.
    pub fn new(department_id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            department_id: department_id.into(),
            start_date,
            end_date,
            ..Self::default()
        }
    }

    /// Sets the employee roster.
    pub fn with_employees(mut self, employees: Vec<Employee>) -> Self {
        self.employees = employees;
        self
    }

    /// Sets the shift catalogue.
    pub fn with_shifts(mut self, shifts: Vec<Shift>) -> Self {
        self.shifts = shifts;
        self
    }

    /// Sets the constraint configuration.
    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the rotation configuration.
    pub fn with_team_pattern(mut self, pattern: TeamPattern) -> Self {
        self.team_pattern = Some(pattern);
        self
    }

    /// Sets the working-time limits.
    pub fn with_work_rules(mut self, rules: WorkRules) -> Self {
        self.work_rules = rules;
        self
    }

    /// Sets the coverage requirements.
    pub fn with_coverage(mut self, coverage: CoverageRules) -> Self {
        self.coverage = coverage;
        self
    }

    /// Sets the public holidays.
    pub fn with_holidays(mut self, holidays: Vec<NaiveDate>) -> Self {
        self.holidays = holidays;
        self
    }

    /// Sets the optimization objective.
    pub fn with_goal(mut self, goal: OptimizationGoal) -> Self {
        self.optimization_goal = goal;
        self
    }

    /// Every day of the period, in order (empty for inverted periods).
    pub fn period_days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.start_date;
        while day <= self.end_date {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}

/// The generated roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSchedule {
    /// All assignments, ordered by (date, shift, employee).
    pub assignments: Vec<ScheduleAssignment>,
}

/// The complete result contract for one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingResult {
    /// `false` only for genuine structural infeasibility.
    pub success: bool,
    /// The best roster found; `None` when nothing could be assigned.
    pub schedule: Option<RosterSchedule>,
    /// Normalized score components.
    pub score: ScheduleScore,
    /// Residual violations, hard and soft.
    pub violations: Vec<ConstraintViolation>,
    /// Ranked remediation suggestions.
    pub suggestions: Vec<Suggestion>,
    /// Wall-clock time of the run, in milliseconds.
    pub computation_time_ms: u64,
    /// Local-search iterations executed.
    pub iterations: u32,
    /// Typed diagnostic collections.
    pub diagnostics: GenerationDiagnostics,
    /// Local-search statistics.
    pub postprocess: PostprocessStats,
}

/// The roster generation engine.
///
/// Stateless between requests; the RNG seed and iteration budget are the
/// only configuration. A fixed seed makes runs reproducible end to end.
#[derive(Debug, Clone, Default)]
pub struct RosterEngine {
    rng_seed: u64,
    budget: OptimizerBudget,
}

impl RosterEngine {
    /// Creates an engine with the default budget and seed 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the RNG seed for the postprocessor.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Sets the postprocessor budget.
    pub fn with_budget(mut self, budget: OptimizerBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Generates a roster for the request.
    ///
    /// Callers are expected to validate inputs at the storage boundary;
    /// a structurally invalid request here is a broken caller and
    /// panics rather than producing a half-meaningful result. Use
    /// [`crate::validate::validate_request`] to check first.
    pub fn create_schedule(&self, request: &SchedulingRequest) -> SchedulingResult {
        if let Err(errors) = validate_request(request) {
            panic!("structurally invalid scheduling request: {errors:?}");
        }
        let started = Instant::now();
        info!(
            "scheduling department '{}': {} employees, {} shifts, {} days",
            request.department_id,
            request.employees.len(),
            request.shifts.len(),
            request.period_days().len()
        );

        let preflight_issues = preflight(request);
        let seed = build_seed(request);

        let mut rng = SmallRng::seed_from_u64(self.rng_seed);
        let (optimized, postprocess) = optimize(seed, request, &self.budget, &mut rng);

        let evaluation = evaluate(&optimized, request);
        let computation_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "department '{}' scheduled in {}ms: score {:.1}, {} violations",
            request.department_id,
            computation_time_ms,
            evaluation.score.total,
            evaluation.violations.len()
        );

        compose(
            optimized,
            evaluation,
            preflight_issues,
            postprocess,
            request,
            computation_time_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use std::collections::HashSet;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn ward_shifts() -> Vec<Shift> {
        vec![
            Shift::day("D").with_staffing(4, 4, 5).with_break_minutes(30),
            Shift::evening("E").with_staffing(3, 3, 4).with_break_minutes(30),
            Shift::night("N").with_staffing(2, 2, 3).with_break_minutes(30),
        ]
    }

    fn staff(n: usize) -> Vec<Employee> {
        (1..=n)
            .map(|i| Employee::new(format!("e{i:02}")).with_department("icu"))
            .collect()
    }

    fn week_request(n: usize) -> SchedulingRequest {
        SchedulingRequest::new("icu", date(2), date(8))
            .with_employees(staff(n))
            .with_shifts(ward_shifts())
    }

    #[test]
    fn test_full_ward_week_succeeds() {
        let result = RosterEngine::new().create_schedule(&week_request(12));

        assert!(result.success);
        assert!(result.schedule.is_some());
        assert!(result.score.coverage >= 95.0);
        assert!(!result
            .violations
            .iter()
            .any(|v| v.severity == Severity::Critical));
    }

    #[test]
    fn test_understaffed_ward_week_reports_shortages() {
        let result = RosterEngine::new().create_schedule(&week_request(3));

        assert!(result.success);
        assert!(!result.diagnostics.staffing_shortages.is_empty());
        assert!(!result.diagnostics.preflight_issues.is_empty());
        assert!(result.score.coverage < 60.0);
    }

    #[test]
    fn test_no_double_booking() {
        let result = RosterEngine::new().create_schedule(&week_request(12));
        let schedule = result.schedule.unwrap();

        let mut seen = HashSet::new();
        for a in &schedule.assignments {
            assert!(
                seen.insert((a.employee_id.clone(), a.date)),
                "{} double-booked on {}",
                a.employee_id,
                a.date
            );
        }
    }

    #[test]
    fn test_staffing_invariant_or_shortage_reported() {
        let result = RosterEngine::new().create_schedule(&week_request(9));
        let request = week_request(9);
        let schedule = result.schedule.unwrap();

        for day in request.period_days() {
            for shift in &request.shifts {
                let count = schedule
                    .assignments
                    .iter()
                    .filter(|a| a.date == day && a.shift_id == shift.id)
                    .count() as u32;
                let in_band = count >= shift.min_staff && count <= shift.max_staff;
                let reported = result
                    .diagnostics
                    .staffing_shortages
                    .iter()
                    .any(|s| s.date == day && s.shift_type == shift.shift_type)
                    || result
                        .violations
                        .iter()
                        .any(|v| v.message.contains(&day.to_string()));
                assert!(in_band || reported, "unexplained band breach on {day}");
            }
        }
    }

    #[test]
    fn test_engine_runs_are_reproducible() {
        let engine = RosterEngine::new().with_rng_seed(1234);
        let request = week_request(10);

        let first = engine.create_schedule(&request);
        let second = engine.create_schedule(&request);

        assert_eq!(first.schedule, second.schedule);
        assert_eq!(first.postprocess, second.postprocess);
        assert_eq!(first.violations, second.violations);
    }

    #[test]
    fn test_postprocess_is_monotone() {
        let result = RosterEngine::new().create_schedule(&week_request(10));
        assert!(result.postprocess.final_penalty <= result.postprocess.initial_penalty);
    }

    #[test]
    fn test_goal_changes_are_deterministic_per_goal() {
        let request = week_request(10).with_goal(OptimizationGoal::Fairness);
        let engine = RosterEngine::new().with_rng_seed(9);

        let first = engine.create_schedule(&request);
        let second = engine.create_schedule(&request);
        assert_eq!(first.schedule, second.schedule);
    }

    #[test]
    #[should_panic(expected = "structurally invalid")]
    fn test_invalid_request_panics() {
        let request = week_request(2)
            .with_shifts(vec![Shift::day("D").with_staffing(3, 2, 1)]);
        let _ = RosterEngine::new().create_schedule(&request);
    }

    #[test]
    fn test_result_serializes() {
        let result = RosterEngine::new().create_schedule(&week_request(6));
        let json = serde_json::to_string(&result).unwrap();
        let back: SchedulingResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }

    #[test]
    fn test_period_days_inclusive() {
        let request = SchedulingRequest::new("icu", date(2), date(8));
        let days = request.period_days();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(2));
        assert_eq!(days[6], date(8));
    }
}
