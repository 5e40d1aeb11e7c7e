//! Preflight feasibility analysis.
//!
//! Static supply-vs-demand checks executed once before search begins.
//! Findings are advisory: they are surfaced to the caller even when
//! generation succeeds, and generation is always still attempted. Each
//! check is independent of the others.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::SchedulingRequest;
use crate::models::{CareerGroup, Employee, ShiftType};

/// A structural feasibility finding.
///
/// Closed set so the result composer and UI can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeasibilityIssue {
    /// Fewer employees could possibly work a slot than its legal floor.
    InsufficientPotentialStaff {
        date: NaiveDate,
        shift_type: ShiftType,
        available: u32,
        required: u32,
    },
    /// A required team has no eligible member on a date.
    TeamCoverageImpossible { date: NaiveDate, team: String },
    /// A required career group has no eligible member on a date.
    CareerGroupCoverageImpossible {
        date: NaiveDate,
        group: CareerGroup,
    },
    /// A must-honor work request falls on a rotation-mandated OFF day.
    SpecialRequestPatternConflict {
        employee_id: String,
        date: NaiveDate,
        requested: ShiftType,
    },
}

/// Runs all preflight checks over a request.
///
/// Issues feed `GenerationDiagnostics::preflight_issues`; none of them
/// aborts generation.
pub fn preflight(request: &SchedulingRequest) -> Vec<FeasibilityIssue> {
    let days = request.period_days();
    let mut issues = Vec::new();

    check_potential_staff(request, &days, &mut issues);
    check_team_coverage(request, &days, &mut issues);
    check_career_group_coverage(request, &days, &mut issues);
    check_special_request_conflicts(request, &days, &mut issues);

    issues
}

/// Employees not excluded ahead of assignment for a given date.
///
/// The only exclusion known before search is an overriding day-off
/// request; rest and consecutive-day exclusions depend on the eventual
/// assignment and are left to the evaluator.
fn eligible_on<'a>(request: &'a SchedulingRequest, date: NaiveDate) -> Vec<&'a Employee> {
    request
        .employees
        .iter()
        .filter(|e| !e.has_day_off_override(date))
        .collect()
}

fn check_potential_staff(
    request: &SchedulingRequest,
    days: &[NaiveDate],
    issues: &mut Vec<FeasibilityIssue>,
) {
    for &date in days {
        let available = eligible_on(request, date).len() as u32;
        for shift in &request.shifts {
            if available < shift.min_staff {
                issues.push(FeasibilityIssue::InsufficientPotentialStaff {
                    date,
                    shift_type: shift.shift_type,
                    available,
                    required: shift.min_staff,
                });
            }
        }
    }
}

fn check_team_coverage(
    request: &SchedulingRequest,
    days: &[NaiveDate],
    issues: &mut Vec<FeasibilityIssue>,
) {
    for team in &request.coverage.required_teams {
        for &date in days {
            let members = eligible_on(request, date)
                .iter()
                .filter(|e| e.team.as_deref() == Some(team.as_str()))
                .count();
            if members == 0 {
                issues.push(FeasibilityIssue::TeamCoverageImpossible {
                    date,
                    team: team.clone(),
                });
            }
        }
    }
}

fn check_career_group_coverage(
    request: &SchedulingRequest,
    days: &[NaiveDate],
    issues: &mut Vec<FeasibilityIssue>,
) {
    if !request.coverage.require_senior_presence {
        return;
    }
    for &date in days {
        let seniors = eligible_on(request, date)
            .iter()
            .filter(|e| e.career_group == CareerGroup::Senior)
            .count();
        if seniors == 0 {
            issues.push(FeasibilityIssue::CareerGroupCoverageImpossible {
                date,
                group: CareerGroup::Senior,
            });
        }
    }
}

fn check_special_request_conflicts(
    request: &SchedulingRequest,
    days: &[NaiveDate],
    issues: &mut Vec<FeasibilityIssue>,
) {
    let Some(pattern) = &request.team_pattern else {
        return;
    };

    // Employee index in the id-sorted roster anchors the rotation phase,
    // matching the seed builder.
    let mut sorted: Vec<&Employee> = request.employees.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    for (employee_index, employee) in sorted.iter().enumerate() {
        for r in &employee.preferences.requests {
            if r.score < 5 {
                continue;
            }
            let crate::models::RequestKind::Work(requested) = r.kind else {
                continue;
            };
            let Some(day_index) = days.iter().position(|d| *d == r.date) else {
                continue;
            };
            if let Some(token) = pattern.token_on(employee_index, day_index) {
                if token.is_off() {
                    issues.push(FeasibilityIssue::SpecialRequestPatternConflict {
                        employee_id: employee.id.clone(),
                        date: r.date,
                        requested,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CoverageRules, SchedulingRequest};
    use crate::models::{Shift, ShiftRequest, TeamPattern};
    use crate::pattern::parse_pattern;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn base_request(employees: Vec<Employee>) -> SchedulingRequest {
        SchedulingRequest::new("icu", date(2), date(4))
            .with_employees(employees)
            .with_shifts(vec![Shift::day("D").with_staffing(2, 2, 4)])
    }

    #[test]
    fn test_sufficient_staff_is_quiet() {
        let request = base_request(vec![
            Employee::new("e01"),
            Employee::new("e02"),
            Employee::new("e03"),
        ]);
        assert!(preflight(&request).is_empty());
    }

    #[test]
    fn test_insufficient_potential_staff() {
        let request = base_request(vec![Employee::new("e01")]);
        let issues = preflight(&request);

        // One issue per day of the three-day period
        assert_eq!(issues.len(), 3);
        assert!(matches!(
            issues[0],
            FeasibilityIssue::InsufficientPotentialStaff {
                available: 1,
                required: 2,
                shift_type: ShiftType::Day,
                ..
            }
        ));
    }

    #[test]
    fn test_day_off_override_reduces_supply() {
        let request = base_request(vec![
            Employee::new("e01").with_request(ShiftRequest::day_off(date(3), 5)),
            Employee::new("e02"),
        ]);
        let issues = preflight(&request);

        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0],
            FeasibilityIssue::InsufficientPotentialStaff { date: d, available: 1, .. }
            if d == date(3)
        ));
    }

    #[test]
    fn test_team_coverage_impossible() {
        let request = base_request(vec![
            Employee::new("e01").with_team("alpha"),
            Employee::new("e02").with_team("alpha"),
        ])
        .with_coverage(CoverageRules {
            required_teams: vec!["beta".to_string()],
            ..CoverageRules::default()
        });

        let issues = preflight(&request);
        assert!(issues
            .iter()
            .all(|i| matches!(i, FeasibilityIssue::TeamCoverageImpossible { team, .. } if team == "beta")));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn test_career_group_coverage_impossible() {
        let request = base_request(vec![
            Employee::new("e01").with_career_group(CareerGroup::Junior),
            Employee::new("e02").with_career_group(CareerGroup::Junior),
        ])
        .with_coverage(CoverageRules {
            require_senior_presence: true,
            ..CoverageRules::default()
        });

        let issues = preflight(&request);
        assert_eq!(issues.len(), 3);
        assert!(matches!(
            issues[0],
            FeasibilityIssue::CareerGroupCoverageImpossible {
                group: CareerGroup::Senior,
                ..
            }
        ));
    }

    #[test]
    fn test_special_request_pattern_conflict() {
        // D-OFF cycle: employee 0 is OFF on day 1 of the period.
        let pattern = TeamPattern::new("icu")
            .with_default_pattern(parse_pattern("D-OFF").unwrap().tokens);
        let request = base_request(vec![
            Employee::new("e01").with_request(ShiftRequest::work(date(3), ShiftType::Day, 5)),
            Employee::new("e02"),
        ])
        .with_team_pattern(pattern);

        let issues = preflight(&request);
        assert!(issues.iter().any(|i| matches!(
            i,
            FeasibilityIssue::SpecialRequestPatternConflict { employee_id, date: d, .. }
            if employee_id == "e01" && *d == date(3)
        )));
    }

    #[test]
    fn test_low_score_request_does_not_conflict() {
        let pattern = TeamPattern::new("icu")
            .with_default_pattern(parse_pattern("D-OFF").unwrap().tokens);
        let request = base_request(vec![
            Employee::new("e01").with_request(ShiftRequest::work(date(3), ShiftType::Day, 4)),
            Employee::new("e02"),
        ])
        .with_team_pattern(pattern);

        assert!(preflight(&request)
            .iter()
            .all(|i| !matches!(i, FeasibilityIssue::SpecialRequestPatternConflict { .. })));
    }
}
