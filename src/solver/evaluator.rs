//! Constraint evaluator.
//!
//! Scores a candidate roster against the legal, operational, fairness,
//! and preference rule sets, producing violations with severity scaled
//! by overage magnitude, a scalar penalty for the optimizer, and the
//! normalized 0–100 score components.
//!
//! Hard violations contribute their full cost to the penalty; soft terms
//! are scaled by the rule weight and the optimization-goal multipliers.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::engine::{OptimizationGoal, SchedulingRequest};
use crate::models::{
    CareerGroup, ConstraintKind, ConstraintViolation, Employee, RequestKind, RosterIndex,
    RuleCode, RulePolicy, ScheduleAssignment, ScheduleScore, Severity,
};
use crate::pattern::AvoidMatcher;
use crate::solver::fairness::{compute_fairness, FairnessReport};

/// The outcome of evaluating one roster.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Normalized score components.
    pub score: ScheduleScore,
    /// Detected violations, in deterministic order.
    pub violations: Vec<ConstraintViolation>,
    /// Total penalty (hard costs plus weighted soft deviations).
    pub penalty: f64,
    /// Fairness report computed as part of the evaluation.
    pub fairness: FairnessReport,
}

impl Evaluation {
    /// Employee ids carrying at least one hard violation.
    pub fn hard_violation_employees(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .violations
            .iter()
            .filter(|v| v.kind == ConstraintKind::Hard)
            .flat_map(|v| v.employee_ids.iter().map(|s| s.as_str()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Soft-term multipliers derived from the optimization goal.
struct GoalWeights {
    coverage: f64,
    fairness: f64,
    preference: f64,
    cost: f64,
}

impl GoalWeights {
    fn for_goal(goal: OptimizationGoal) -> Self {
        match goal {
            OptimizationGoal::Balanced => Self {
                coverage: 1.0,
                fairness: 1.0,
                preference: 1.0,
                cost: 1.0,
            },
            OptimizationGoal::Fairness => Self {
                coverage: 1.0,
                fairness: 2.0,
                preference: 0.75,
                cost: 1.0,
            },
            OptimizationGoal::Preference => Self {
                coverage: 1.0,
                fairness: 0.75,
                preference: 2.0,
                cost: 1.0,
            },
            OptimizationGoal::Coverage => Self {
                coverage: 2.0,
                fairness: 0.75,
                preference: 0.75,
                cost: 1.0,
            },
            OptimizationGoal::Cost => Self {
                coverage: 0.75,
                fairness: 0.75,
                preference: 0.75,
                cost: 2.0,
            },
        }
    }
}

/// Evaluates a roster against the full rule set.
pub fn evaluate(assignments: &[ScheduleAssignment], request: &SchedulingRequest) -> Evaluation {
    let days = request.period_days();
    let index = RosterIndex::build(assignments, &request.shifts);
    let policy = RulePolicy::from_constraints(&request.constraints);
    let weights = GoalWeights::for_goal(request.optimization_goal);

    let mut employees: Vec<&Employee> = request.employees.iter().collect();
    employees.sort_by(|a, b| a.id.cmp(&b.id));
    let by_id: HashMap<&str, &Employee> =
        employees.iter().map(|e| (e.id.as_str(), *e)).collect();

    let mut violations = Vec::new();
    let mut penalty = 0.0;

    check_legal_rules(request, &employees, &index, &days, &policy, &mut violations);
    check_slot_rules(
        request,
        &by_id,
        &index,
        &days,
        &policy,
        &weights,
        &mut violations,
        &mut penalty,
    );
    check_avoid_patterns(request, &employees, &index, &days, &policy, &mut violations);

    let fairness = compute_fairness(
        assignments,
        &request.employees,
        &request.shifts,
        &request.holidays,
        &days,
    );
    check_fairness_deviation(request, &fairness, &policy, &weights, &mut violations);

    let preference_score = check_preferences(
        request,
        &employees,
        &index,
        &policy,
        &weights,
        &mut violations,
        &mut penalty,
    );

    penalty += violations.iter().map(|v| v.cost).sum::<f64>();

    let coverage_score = coverage_score(request, &index, &days);
    let score = assemble_score(
        request,
        &days,
        penalty,
        coverage_score,
        preference_score,
        &fairness,
    );

    Evaluation {
        score,
        violations,
        penalty,
        fairness,
    }
}

fn check_legal_rules(
    request: &SchedulingRequest,
    employees: &[&Employee],
    index: &RosterIndex<'_>,
    days: &[NaiveDate],
    policy: &RulePolicy,
    violations: &mut Vec<ConstraintViolation>,
) {
    let rules = &request.work_rules;

    for employee in employees {
        let id = employee.id.as_str();

        if policy.is_active(RuleCode::WeeklyHours) {
            for (week, chunk) in days.chunks(7).enumerate() {
                let hours: f64 = chunk
                    .iter()
                    .filter_map(|d| index.shift_on(id, *d))
                    .map(|s| s.work_hours())
                    .sum();
                if hours > rules.max_weekly_hours {
                    let overage = hours - rules.max_weekly_hours;
                    violations.push(
                        ConstraintViolation::new(
                            RuleCode::WeeklyHours,
                            policy.kind(RuleCode::WeeklyHours),
                            Severity::from_overage(overage / rules.max_weekly_hours),
                            format!(
                                "{id} worked {hours:.1}h in roster week {} (limit {:.0}h)",
                                week + 1,
                                rules.max_weekly_hours
                            ),
                        )
                        .with_employee(id)
                        .with_cost(20.0 + 2.0 * overage),
                    );
                }
            }
        }

        if policy.is_active(RuleCode::ConsecutiveDays) {
            let run = index.max_consecutive_days(id, days);
            let limit = rules.max_consecutive_days as usize;
            if run > limit {
                let extra = (run - limit) as f64;
                violations.push(
                    ConstraintViolation::new(
                        RuleCode::ConsecutiveDays,
                        policy.kind(RuleCode::ConsecutiveDays),
                        Severity::from_overage(extra / limit as f64),
                        format!("{id} works {run} consecutive days (limit {limit})"),
                    )
                    .with_employee(id)
                    .with_cost(15.0 + 5.0 * extra),
                );
            }
        }

        if policy.is_active(RuleCode::RestGap) {
            let worked: Vec<(NaiveDate, &crate::models::Shift)> =
                index.assignments_for(id).collect();
            for pair in worked.windows(2) {
                let (prev_date, prev_shift) = pair[0];
                let (next_date, next_shift) = pair[1];
                let gap_hours = (next_shift.start_on(next_date) - prev_shift.end_on(prev_date))
                    .num_minutes() as f64
                    / 60.0;
                if gap_hours < rules.min_rest_hours {
                    let shortfall = rules.min_rest_hours - gap_hours;
                    violations.push(
                        ConstraintViolation::new(
                            RuleCode::RestGap,
                            policy.kind(RuleCode::RestGap),
                            Severity::from_overage(shortfall / rules.min_rest_hours),
                            format!(
                                "{id} has {:.0}h rest between {} on {prev_date} and {} on {next_date} (minimum {:.0}h)",
                                gap_hours.max(0.0),
                                prev_shift.shift_type.label(),
                                next_shift.shift_type.label(),
                                rules.min_rest_hours
                            ),
                        )
                        .with_employee(id)
                        .with_cost(15.0 + shortfall),
                    );
                }
            }
        }

        if policy.is_active(RuleCode::WeeklyRest) {
            for (week, chunk) in days.chunks(7).enumerate() {
                if chunk.len() < 7 {
                    continue; // Partial trailing week carries no rest quota.
                }
                let worked = chunk
                    .iter()
                    .filter(|d| index.shift_on(id, **d).is_some())
                    .count();
                let off = chunk.len() - worked;
                let min_off = rules.min_weekly_rest_days as usize;
                if off < min_off {
                    let missing = (min_off - off) as f64;
                    violations.push(
                        ConstraintViolation::new(
                            RuleCode::WeeklyRest,
                            policy.kind(RuleCode::WeeklyRest),
                            Severity::from_overage(missing / min_off as f64),
                            format!(
                                "{id} has {off} rest days in roster week {} (minimum {min_off})",
                                week + 1
                            ),
                        )
                        .with_employee(id)
                        .with_cost(15.0 * missing),
                    );
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn check_slot_rules(
    request: &SchedulingRequest,
    by_id: &HashMap<&str, &Employee>,
    index: &RosterIndex<'_>,
    days: &[NaiveDate],
    policy: &RulePolicy,
    weights: &GoalWeights,
    violations: &mut Vec<ConstraintViolation>,
    penalty: &mut f64,
) {
    for &date in days {
        for shift in &request.shifts {
            let assigned = index.assigned_ids(date, &shift.id);
            let count = assigned.len();

            if policy.is_active(RuleCode::StaffingBand) {
                let kind = policy.kind(RuleCode::StaffingBand);
                let soft_scale = if kind == ConstraintKind::Soft {
                    policy.weight(RuleCode::StaffingBand)
                } else {
                    1.0
                };
                if count < shift.min_staff as usize {
                    let missing = shift.min_staff as usize - count;
                    violations.push(
                        ConstraintViolation::new(
                            RuleCode::StaffingBand,
                            kind,
                            Severity::from_overage(missing as f64 / shift.min_staff as f64),
                            format!(
                                "{} shift on {date} has {count} staff (minimum {})",
                                shift.shift_type.label(),
                                shift.min_staff
                            ),
                        )
                        .with_cost(25.0 * missing as f64 * soft_scale),
                    );
                } else if count > shift.max_staff as usize {
                    let excess = count - shift.max_staff as usize;
                    violations.push(
                        ConstraintViolation::new(
                            RuleCode::StaffingBand,
                            kind,
                            Severity::Medium,
                            format!(
                                "{} shift on {date} has {count} staff (maximum {})",
                                shift.shift_type.label(),
                                shift.max_staff
                            ),
                        )
                        .with_cost(5.0 * excess as f64 * soft_scale),
                    );
                }
            }

            // Shortfall against the operational target and staffing above
            // it are penalty-only pressure for the optimizer, not
            // violations: the band rule owns the min/max breaches.
            if count < shift.required_staff as usize {
                *penalty += 6.0 * (shift.required_staff as usize - count) as f64 * weights.coverage;
            } else if count > shift.required_staff as usize {
                *penalty += 2.0 * (count - shift.required_staff as usize) as f64 * weights.cost;
            }

            if count == 0 {
                continue;
            }

            if policy.is_active(RuleCode::TeamCoverage) {
                for team in &request.coverage.required_teams {
                    let covered = assigned.iter().any(|id| {
                        by_id
                            .get(*id)
                            .map(|e| e.team.as_deref() == Some(team.as_str()))
                            .unwrap_or(false)
                    });
                    if !covered {
                        violations.push(
                            ConstraintViolation::new(
                                RuleCode::TeamCoverage,
                                policy.kind(RuleCode::TeamCoverage),
                                Severity::High,
                                format!(
                                    "{} shift on {date} has no member of team '{team}'",
                                    shift.shift_type.label()
                                ),
                            )
                            .with_cost(12.0),
                        );
                    }
                }
            }

            let groups: Vec<CareerGroup> = assigned
                .iter()
                .filter_map(|id| by_id.get(*id).map(|e| e.career_group))
                .collect();

            if policy.is_active(RuleCode::SeniorCoverage)
                && request.coverage.require_senior_presence
                && !groups.contains(&CareerGroup::Senior)
            {
                violations.push(
                    ConstraintViolation::new(
                        RuleCode::SeniorCoverage,
                        policy.kind(RuleCode::SeniorCoverage),
                        Severity::High,
                        format!(
                            "{} shift on {date} has no senior staff",
                            shift.shift_type.label()
                        ),
                    )
                    .with_cost(12.0),
                );
            }

            if policy.is_active(RuleCode::JuniorOnly) {
                if let Some(cap) = request.coverage.max_junior_only {
                    let all_junior = groups.iter().all(|g| *g == CareerGroup::Junior);
                    if all_junior && count > cap as usize {
                        violations.push(
                            ConstraintViolation::new(
                                RuleCode::JuniorOnly,
                                policy.kind(RuleCode::JuniorOnly),
                                Severity::Medium,
                                format!(
                                    "{} shift on {date} is staffed by {count} juniors with no senior (cap {cap})",
                                    shift.shift_type.label()
                                ),
                            )
                            .with_cost(8.0 * policy.weight(RuleCode::JuniorOnly)),
                        );
                    }
                }
            }
        }
    }
}

fn check_avoid_patterns(
    request: &SchedulingRequest,
    employees: &[&Employee],
    index: &RosterIndex<'_>,
    days: &[NaiveDate],
    policy: &RulePolicy,
    violations: &mut Vec<ConstraintViolation>,
) {
    if !policy.is_active(RuleCode::AvoidPattern) {
        return;
    }
    let team_avoid: Vec<Vec<crate::pattern::ShiftToken>> = request
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
            violations.push(
                ConstraintViolation::new(
                    RuleCode::AvoidPattern,
                    policy.kind(RuleCode::AvoidPattern),
                    Severity::Low,
                    format!(
                        "{} works avoided sequence '{}' starting {}",
                        employee.id,
                        matcher.describe(m.pattern_index),
                        days[m.start]
                    ),
                )
                .with_employee(&employee.id)
                .with_cost(6.0 * policy.weight(RuleCode::AvoidPattern)),
            );
        }
    }
}

fn check_fairness_deviation(
    request: &SchedulingRequest,
    fairness: &FairnessReport,
    policy: &RulePolicy,
    weights: &GoalWeights,
    violations: &mut Vec<ConstraintViolation>,
) {
    if !policy.is_active(RuleCode::FairnessDeviation) || fairness.records.is_empty() {
        return;
    }
    let mean_hours: f64 = fairness
        .records
        .iter()
        .map(|r| r.workload.total_hours)
        .sum::<f64>()
        / fairness.records.len() as f64;
    let tolerance = request.work_rules.workload_tolerance_hours;

    for record in &fairness.records {
        let deviation = (record.workload.total_hours - mean_hours).abs();
        let excess = deviation - tolerance;
        if excess > 0.0 {
            let severity = if excess > tolerance {
                Severity::Medium
            } else {
                Severity::Low
            };
            violations.push(
                ConstraintViolation::new(
                    RuleCode::FairnessDeviation,
                    policy.kind(RuleCode::FairnessDeviation),
                    severity,
                    format!(
                        "{} carries {:.1}h against a department mean of {:.1}h",
                        record.employee_id, record.workload.total_hours, mean_hours
                    ),
                )
                .with_employee(&record.employee_id)
                .with_cost(policy.weight(RuleCode::FairnessDeviation) * excess * weights.fairness),
            );
        }
    }
}

/// Scores preference satisfaction and reports overriding-request misses.
///
/// Returns the 0–100 preference score: the weighted fraction of matched
/// units, where each assigned day with declared type preferences is one
/// unit, each explicit request weighs its score, and teammate
/// preferences weigh one unit per affected slot.
#[allow(clippy::too_many_arguments)]
fn check_preferences(
    request: &SchedulingRequest,
    employees: &[&Employee],
    index: &RosterIndex<'_>,
    policy: &RulePolicy,
    weights: &GoalWeights,
    violations: &mut Vec<ConstraintViolation>,
    penalty: &mut f64,
) -> f64 {
    let active = policy.is_active(RuleCode::PreferenceMiss);
    let rule_weight = policy.weight(RuleCode::PreferenceMiss);
    let mut total_units = 0.0;
    let mut matched_units = 0.0;

    for employee in employees {
        let prefs = &employee.preferences;
        let id = employee.id.as_str();

        if !prefs.preferred_shift_types.is_empty() {
            for (_, shift) in index.assignments_for(id) {
                total_units += 1.0;
                if prefs.preferred_shift_types.contains(&shift.shift_type) {
                    matched_units += 1.0;
                }
            }
        }

        for r in &prefs.requests {
            let honored = match r.kind {
                RequestKind::DayOff => index.shift_on(id, r.date).is_none(),
                RequestKind::Work(shift_type) => index
                    .shift_on(id, r.date)
                    .map(|s| s.shift_type == shift_type)
                    .unwrap_or(false),
            };
            total_units += r.score as f64;
            if honored {
                matched_units += r.score as f64;
            } else if active && r.is_override() {
                let severity = if r.score >= 5 {
                    Severity::Medium
                } else {
                    Severity::Low
                };
                let what = match r.kind {
                    RequestKind::DayOff => "day off".to_string(),
                    RequestKind::Work(t) => format!("{} shift", t.label()),
                };
                violations.push(
                    ConstraintViolation::new(
                        RuleCode::PreferenceMiss,
                        policy.kind(RuleCode::PreferenceMiss),
                        severity,
                        format!("{id} requested a {what} on {} (score {})", r.date, r.score),
                    )
                    .with_employee(id)
                    .with_cost(rule_weight * r.score as f64 * weights.preference),
                );
            }
        }

        if !prefs.avoided_teammates.is_empty() || !prefs.preferred_teammates.is_empty() {
            for (date, shift) in index.assignments_for(id) {
                let others = index.assigned_ids(date, &shift.id);
                if !prefs.avoided_teammates.is_empty() {
                    total_units += 1.0;
                    let clash = others
                        .iter()
                        .any(|o| prefs.avoided_teammates.iter().any(|a| a == o));
                    if !clash {
                        matched_units += 1.0;
                    }
                }
                if !prefs.preferred_teammates.is_empty() {
                    total_units += 1.0;
                    let together = others
                        .iter()
                        .any(|o| prefs.preferred_teammates.iter().any(|p| p == o));
                    if together {
                        matched_units += 1.0;
                    }
                }
            }
        }
    }

    // Unmatched preference weight presses on the objective even when it
    // produced no violation entry.
    if active {
        *penalty += (total_units - matched_units) * rule_weight * weights.preference;
    }

    if total_units == 0.0 {
        100.0
    } else {
        100.0 * matched_units / total_units
    }
}

fn coverage_score(
    request: &SchedulingRequest,
    index: &RosterIndex<'_>,
    days: &[NaiveDate],
) -> f64 {
    let mut required_total = 0usize;
    let mut filled_total = 0usize;
    for &date in days {
        for shift in &request.shifts {
            let required = shift.required_staff as usize;
            required_total += required;
            filled_total += index.assigned_count(date, &shift.id).min(required);
        }
    }
    if required_total == 0 {
        100.0
    } else {
        100.0 * filled_total as f64 / required_total as f64
    }
}

fn assemble_score(
    request: &SchedulingRequest,
    days: &[NaiveDate],
    penalty: f64,
    coverage: f64,
    preference: f64,
    fairness: &FairnessReport,
) -> ScheduleScore {
    // Saturation bound: the penalty of a roster that leaves every slot
    // empty, plus a per-employee allowance for legal/preference drift.
    let slot_ceiling: f64 = days.len() as f64
        * request
            .shifts
            .iter()
            .map(|s| 25.0 * s.min_staff as f64 + 6.0 * s.required_staff as f64)
            .sum::<f64>();
    let ceiling = slot_ceiling + request.employees.len() as f64 * 30.0 + 1.0;

    let total = (100.0 * (1.0 - penalty / ceiling)).clamp(0.0, 100.0);
    let fairness_score = fairness.mean_score();

    let mut score = ScheduleScore {
        total,
        fairness: fairness_score,
        preference,
        coverage,
        breakdown: Vec::new(),
    };
    score.push_breakdown("coverage", "slots filled to target", coverage);
    score.push_breakdown("fairness", "jain index x 100", fairness.jain_index * 100.0);
    score.push_breakdown("fairness", "mean individual score", fairness_score);
    score.push_breakdown("preference", "weighted match rate", preference);
    score
}
