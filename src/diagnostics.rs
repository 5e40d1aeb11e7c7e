//! Diagnostics and result composition.
//!
//! Converts raw violation and feasibility data into the typed diagnostic
//! collections the UI consumes, generates ranked suggestions from the
//! dominant violation category, and assembles the final
//! [`SchedulingResult`]. Every diagnostic carries enough structured data
//! to render a one-line explanation without touching raw assignments.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::engine::{RosterSchedule, SchedulingRequest, SchedulingResult};
use crate::models::{
    CareerGroup, Employee, RequestKind, RosterIndex, RuleCode, ScheduleAssignment, ShiftType,
};
use crate::pattern::AvoidMatcher;
use crate::preflight::FeasibilityIssue;
use crate::solver::evaluator::Evaluation;
use crate::solver::optimizer::PostprocessStats;

/// Off-day counts further than this from the mean are flagged.
const OFF_BALANCE_TOLERANCE_DAYS: f64 = 2.0;
/// Fraction of rotation days an employee may deviate before flagging.
const PATTERN_BREAK_FRACTION: f64 = 0.25;

/// A slot staffed below its operational target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingShortage {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub required: u32,
    pub assigned: u32,
}

/// A staffed slot with no member of a required team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCoverageGap {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub team: String,
}

/// A staffed slot with a deficient career-group mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerGroupGap {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub group: CareerGroup,
}

/// A high-score explicit request that went unhonored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRequestMiss {
    pub employee_id: String,
    pub date: NaiveDate,
    pub kind: RequestKind,
    pub score: u8,
}

/// An employee whose off-day count strays from the roster mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffBalanceGap {
    pub employee_id: String,
    pub off_days: u32,
    pub mean_off_days: f64,
}

/// An employee whose realized roster strays from their rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPatternBreak {
    pub employee_id: String,
    /// Days deviating from the rotation, overrides excluded.
    pub deviations: u32,
}

/// A team whose mean workload strays from the department mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamWorkloadGap {
    pub team: String,
    pub team_mean_hours: f64,
    pub department_mean_hours: f64,
}

/// A realized occurrence of an avoided shift sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvoidPatternViolation {
    pub employee_id: String,
    pub start_date: NaiveDate,
    /// Human-readable sequence summary.
    pub pattern: String,
}

/// Typed diagnostic collections for the result contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationDiagnostics {
    pub staffing_shortages: Vec<StaffingShortage>,
    pub team_coverage_gaps: Vec<TeamCoverageGap>,
    pub career_group_gaps: Vec<CareerGroupGap>,
    pub special_request_misses: Vec<SpecialRequestMiss>,
    pub off_balance_gaps: Vec<OffBalanceGap>,
    pub shift_pattern_breaks: Vec<ShiftPatternBreak>,
    pub team_workload_gaps: Vec<TeamWorkloadGap>,
    pub avoid_pattern_violations: Vec<AvoidPatternViolation>,
    pub preflight_issues: Vec<FeasibilityIssue>,
}

/// Suggestion ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionPriority {
    High,
    Medium,
    Low,
}

/// A ranked, actionable suggestion derived from the violation profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub priority: SuggestionPriority,
    pub message: String,
}

/// Assembles the final scheduling result.
///
/// `success` is `false` only for genuine structural infeasibility: a
/// hard legal violation survived optimization *and* preflight proved the
/// supply could not cover some slot. Residual soft violations or
/// shortages with adequate supply still ship.
pub fn compose(
    assignments: Vec<ScheduleAssignment>,
    evaluation: Evaluation,
    preflight_issues: Vec<FeasibilityIssue>,
    postprocess: PostprocessStats,
    request: &SchedulingRequest,
    computation_time_ms: u64,
) -> SchedulingResult {
    let diagnostics = build_diagnostics(&assignments, &evaluation, preflight_issues, request);
    let suggestions = build_suggestions(&evaluation, &diagnostics);

    let has_hard_legal = evaluation.violations.iter().any(|v| v.is_hard_legal());
    let structurally_infeasible = diagnostics
        .preflight_issues
        .iter()
        .any(|i| matches!(i, FeasibilityIssue::InsufficientPotentialStaff { .. }));
    let success = !(has_hard_legal && structurally_infeasible);

    let iterations = postprocess.iterations;
    let schedule = if assignments.is_empty() {
        None
    } else {
        Some(RosterSchedule { assignments })
    };

    SchedulingResult {
        success,
        schedule,
        score: evaluation.score,
        violations: evaluation.violations,
        suggestions,
        computation_time_ms,
        iterations,
        diagnostics,
        postprocess,
    }
}

fn build_diagnostics(
    assignments: &[ScheduleAssignment],
    evaluation: &Evaluation,
    preflight_issues: Vec<FeasibilityIssue>,
    request: &SchedulingRequest,
) -> GenerationDiagnostics {
    let days = request.period_days();
    let index = RosterIndex::build(assignments, &request.shifts);
    let mut employees: Vec<&Employee> = request.employees.iter().collect();
    employees.sort_by(|a, b| a.id.cmp(&b.id));

    let mut diagnostics = GenerationDiagnostics {
        preflight_issues,
        ..GenerationDiagnostics::default()
    };

    collect_slot_gaps(request, &employees, &index, &days, &mut diagnostics);
    collect_request_misses(&employees, &index, &mut diagnostics);
    collect_off_balance(&employees, &index, &days, &mut diagnostics);
    collect_pattern_breaks(request, &employees, &index, &days, &mut diagnostics);
    collect_team_workloads(request, &evaluation.fairness, &mut diagnostics);
    collect_avoid_matches(request, &employees, &index, &days, &mut diagnostics);

    diagnostics
}

fn collect_slot_gaps(
    request: &SchedulingRequest,
    employees: &[&Employee],
    index: &RosterIndex<'_>,
    days: &[NaiveDate],
    diagnostics: &mut GenerationDiagnostics,
) {
    for &date in days {
        for shift in &request.shifts {
            let assigned = index.assigned_ids(date, &shift.id);
            let count = assigned.len() as u32;

            if count < shift.required_staff {
                diagnostics.staffing_shortages.push(StaffingShortage {
                    date,
                    shift_type: shift.shift_type,
                    required: shift.required_staff,
                    assigned: count,
                });
            }
            if count == 0 {
                continue;
            }

            for team in &request.coverage.required_teams {
                let covered = assigned.iter().any(|id| {
                    employees
                        .iter()
                        .find(|e| e.id == *id)
                        .map(|e| e.team.as_deref() == Some(team.as_str()))
                        .unwrap_or(false)
                });
                if !covered {
                    diagnostics.team_coverage_gaps.push(TeamCoverageGap {
                        date,
                        shift_type: shift.shift_type,
                        team: team.clone(),
                    });
                }
            }

            let groups: Vec<CareerGroup> = assigned
                .iter()
                .filter_map(|id| {
                    employees
                        .iter()
                        .find(|e| e.id == *id)
                        .map(|e| e.career_group)
                })
                .collect();
            if request.coverage.require_senior_presence && !groups.contains(&CareerGroup::Senior) {
                diagnostics.career_group_gaps.push(CareerGroupGap {
                    date,
                    shift_type: shift.shift_type,
                    group: CareerGroup::Senior,
                });
            }
            if let Some(cap) = request.coverage.max_junior_only {
                if groups.iter().all(|g| *g == CareerGroup::Junior) && count > cap {
                    diagnostics.career_group_gaps.push(CareerGroupGap {
                        date,
                        shift_type: shift.shift_type,
                        group: CareerGroup::Junior,
                    });
                }
            }
        }
    }
}

fn collect_request_misses(
    employees: &[&Employee],
    index: &RosterIndex<'_>,
    diagnostics: &mut GenerationDiagnostics,
) {
    for employee in employees {
        for r in &employee.preferences.requests {
            if !r.is_override() {
                continue;
            }
            let honored = match r.kind {
                RequestKind::DayOff => index.shift_on(&employee.id, r.date).is_none(),
                RequestKind::Work(shift_type) => index
                    .shift_on(&employee.id, r.date)
                    .map(|s| s.shift_type == shift_type)
                    .unwrap_or(false),
            };
            if !honored {
                diagnostics.special_request_misses.push(SpecialRequestMiss {
                    employee_id: employee.id.clone(),
                    date: r.date,
                    kind: r.kind,
                    score: r.score,
                });
            }
        }
    }
}

fn collect_off_balance(
    employees: &[&Employee],
    index: &RosterIndex<'_>,
    days: &[NaiveDate],
    diagnostics: &mut GenerationDiagnostics,
) {
    if employees.is_empty() || days.is_empty() {
        return;
    }
    let off_counts: Vec<u32> = employees
        .iter()
        .map(|e| (days.len() - index.days_worked(&e.id)) as u32)
        .collect();
    let mean_off =
        off_counts.iter().map(|c| *c as f64).sum::<f64>() / off_counts.len() as f64;

    for (employee, off_days) in employees.iter().zip(off_counts) {
        if (off_days as f64 - mean_off).abs() > OFF_BALANCE_TOLERANCE_DAYS {
            diagnostics.off_balance_gaps.push(OffBalanceGap {
                employee_id: employee.id.clone(),
                off_days,
                mean_off_days: mean_off,
            });
        }
    }
}

fn collect_pattern_breaks(
    request: &SchedulingRequest,
    employees: &[&Employee],
    index: &RosterIndex<'_>,
    days: &[NaiveDate],
    diagnostics: &mut GenerationDiagnostics,
) {
    let Some(pattern) = &request.team_pattern else {
        return;
    };
    if pattern.default_patterns.is_empty() || days.is_empty() {
        return;
    }

    for (employee_index, employee) in employees.iter().enumerate() {
        let realized = index.realized_tokens(&employee.id, days);
        let mut deviations = 0u32;
        for (day_index, &date) in days.iter().enumerate() {
            // Days the employee explicitly requested are not breaks.
            if employee.request_on(date).map(|r| r.is_override()).unwrap_or(false) {
                continue;
            }
            if let Some(expected) = pattern.token_on(employee_index, day_index) {
                if realized[day_index] != expected {
                    deviations += 1;
                }
            }
        }
        if f64::from(deviations) > PATTERN_BREAK_FRACTION * days.len() as f64 {
            diagnostics.shift_pattern_breaks.push(ShiftPatternBreak {
                employee_id: employee.id.clone(),
                deviations,
            });
        }
    }
}

fn collect_team_workloads(
    request: &SchedulingRequest,
    fairness: &crate::solver::fairness::FairnessReport,
    diagnostics: &mut GenerationDiagnostics,
) {
    let mut teams: Vec<&str> = request
        .employees
        .iter()
        .filter_map(|e| e.team.as_deref())
        .collect();
    teams.sort_unstable();
    teams.dedup();
    if teams.is_empty() || fairness.records.is_empty() {
        return;
    }

    let department_mean = fairness
        .records
        .iter()
        .map(|r| r.workload.total_hours)
        .sum::<f64>()
        / fairness.records.len() as f64;

    for team in teams {
        let members: Vec<f64> = request
            .employees
            .iter()
            .filter(|e| e.team.as_deref() == Some(team))
            .filter_map(|e| fairness.record_for(&e.id))
            .map(|r| r.workload.total_hours)
            .collect();
        if members.is_empty() {
            continue;
        }
        let team_mean = members.iter().sum::<f64>() / members.len() as f64;
        if (team_mean - department_mean).abs() > request.work_rules.workload_tolerance_hours {
            diagnostics.team_workload_gaps.push(TeamWorkloadGap {
                team: team.to_string(),
                team_mean_hours: team_mean,
                department_mean_hours: department_mean,
            });
        }
    }
}

fn collect_avoid_matches(
    request: &SchedulingRequest,
    employees: &[&Employee],
    index: &RosterIndex<'_>,
    days: &[NaiveDate],
    diagnostics: &mut GenerationDiagnostics,
) {
    let team_avoid = request
        .team_pattern
        .as_ref()
        .map(|p| p.avoid_patterns.clone())
        .unwrap_or_default();

    for employee in employees {
        let mut sequences = employee.preferences.avoid_patterns.clone();
        sequences.extend(team_avoid.iter().cloned());
        let matcher = AvoidMatcher::new(sequences);
        if matcher.is_empty() {
            continue;
        }
        let realized = index.realized_tokens(&employee.id, days);
        for m in matcher.find_matches(&realized) {
            diagnostics.avoid_pattern_violations.push(AvoidPatternViolation {
                employee_id: employee.id.clone(),
                start_date: days[m.start],
                pattern: matcher.describe(m.pattern_index),
            });
        }
    }
}

/// Ranks suggestion buckets by their share of the total penalty.
fn build_suggestions(
    evaluation: &Evaluation,
    diagnostics: &GenerationDiagnostics,
) -> Vec<Suggestion> {
    let mut staffing = 0.0;
    let mut legal = 0.0;
    let mut team = 0.0;
    let mut career = 0.0;
    let mut avoid = 0.0;
    let mut fairness = 0.0;
    let mut preference = 0.0;

    for v in &evaluation.violations {
        match v.rule {
            RuleCode::WeeklyHours
            | RuleCode::ConsecutiveDays
            | RuleCode::RestGap
            | RuleCode::WeeklyRest => legal += v.cost,
            RuleCode::StaffingBand => staffing += v.cost,
            RuleCode::TeamCoverage => team += v.cost,
            RuleCode::SeniorCoverage | RuleCode::JuniorOnly => career += v.cost,
            RuleCode::AvoidPattern => avoid += v.cost,
            RuleCode::FairnessDeviation => fairness += v.cost,
            RuleCode::PreferenceMiss => preference += v.cost,
        }
    }

    let mut buckets: Vec<(f64, String)> = Vec::new();
    if staffing > 0.0 {
        buckets.push((staffing, staffing_message(diagnostics)));
    }
    if legal > 0.0 {
        buckets.push((
            legal,
            "Relieve working-time breaches by shortening consecutive runs or adding headcount"
                .to_string(),
        ));
    }
    if team > 0.0 {
        buckets.push((
            team,
            "Assign at least one member of each required team to every staffed shift".to_string(),
        ));
    }
    if career > 0.0 {
        buckets.push((
            career,
            "Add senior coverage to shifts currently staffed only by juniors".to_string(),
        ));
    }
    if fairness > 0.0 {
        buckets.push((
            fairness,
            "Rebalance night and weekend shifts to even out workloads".to_string(),
        ));
    }
    if preference > 0.0 {
        buckets.push((
            preference,
            "Review high-score shift requests that conflict with the rotation".to_string(),
        ));
    }
    if avoid > 0.0 {
        buckets.push((
            avoid,
            "Adjust rotations to eliminate avoided shift sequences".to_string(),
        ));
    }

    buckets.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    buckets
        .into_iter()
        .enumerate()
        .map(|(rank, (_, message))| Suggestion {
            priority: match rank {
                0 => SuggestionPriority::High,
                1 => SuggestionPriority::Medium,
                _ => SuggestionPriority::Low,
            },
            message,
        })
        .collect()
}

/// Names the (shift type, weekday) pair with the deepest shortfall.
fn staffing_message(diagnostics: &GenerationDiagnostics) -> String {
    let mut worst: Option<(&StaffingShortage, u32)> = None;
    for shortage in &diagnostics.staffing_shortages {
        let missing = shortage.required - shortage.assigned;
        if worst.map(|(_, m)| missing > m).unwrap_or(true) {
            worst = Some((shortage, missing));
        }
    }
    match worst {
        Some((shortage, missing)) => format!(
            "Add {missing} additional staff to the {} shift on {}s",
            shortage.shift_type.label(),
            weekday_name(shortage.date.weekday())
        ),
        None => "Increase staffing to meet shift targets".to_string(),
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
