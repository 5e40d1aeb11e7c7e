//! Constructive seed builder.
//!
//! # Algorithm
//!
//! 1. For each employee, resolve a daily shift sequence by priority:
//!    overriding explicit request (score ≥ 4), then the department
//!    rotation pattern anchored at an employee-specific phase offset,
//!    then OFF.
//! 2. For each (date, shift) slot below its legal floor, greedily assign
//!    the least-constrained idle employees (ascending assigned hours,
//!    ties broken by id) until the floor is met or no candidate remains.
//!
//! The seed is intentionally simple and fast; solution quality comes
//! from the postprocessor, not from this step.

use chrono::NaiveDate;
use log::debug;

use crate::engine::SchedulingRequest;
use crate::models::{Employee, RequestKind, ScheduleAssignment, Shift, ShiftType};

/// Builds the constructive seed roster for a request.
pub fn build_seed(request: &SchedulingRequest) -> Vec<ScheduleAssignment> {
    let days = request.period_days();
    let mut employees: Vec<&Employee> = request.employees.iter().collect();
    employees.sort_by(|a, b| a.id.cmp(&b.id));

    let mut grid = Grid::new(employees.len(), &days);

    // Pass 1: requests and rotation patterns.
    for (employee_index, employee) in employees.iter().enumerate() {
        for (day_index, &date) in days.iter().enumerate() {
            if let Some(request_override) = employee.request_on(date).filter(|r| r.is_override())
            {
                if let RequestKind::Work(shift_type) = request_override.kind {
                    if let Some(shift) = shift_for_type(request, shift_type) {
                        grid.assign(employee_index, day_index, shift);
                    }
                }
                // Overriding day-off requests leave the day empty.
                continue;
            }

            if let Some(pattern) = &request.team_pattern {
                if let Some(shift_type) =
                    pattern.token_on(employee_index, day_index).and_then(|t| t.shift_type())
                {
                    if let Some(shift) = shift_for_type(request, shift_type) {
                        grid.assign(employee_index, day_index, shift);
                    }
                }
            }
        }
    }

    // Pass 2: backfill slots below their legal floor.
    for (day_index, &date) in days.iter().enumerate() {
        for shift in &request.shifts {
            let mut count = grid.slot_count(day_index, &shift.id);
            while count < shift.min_staff as usize {
                let candidate = pick_backfill_candidate(
                    request,
                    &employees,
                    &grid,
                    day_index,
                    date,
                    shift,
                );
                match candidate {
                    Some(employee_index) => {
                        grid.assign(employee_index, day_index, shift);
                        count += 1;
                    }
                    None => break,
                }
            }
        }
    }

    let assignments = grid.into_assignments(&employees, &days);
    debug!(
        "seed built: {} assignments over {} days for {} employees",
        assignments.len(),
        days.len(),
        employees.len()
    );
    assignments
}

fn shift_for_type(request: &SchedulingRequest, shift_type: ShiftType) -> Option<&Shift> {
    request.shifts.iter().find(|s| s.shift_type == shift_type)
}

/// The least-constrained idle employee for a slot, or `None`.
///
/// Candidates must be idle that day, have no overriding day-off request,
/// and stay within the consecutive-day and weekly-hour limits. Ordered by
/// ascending assigned hours, ties broken by employee id (the iteration
/// order, since `employees` is id-sorted).
fn pick_backfill_candidate(
    request: &SchedulingRequest,
    employees: &[&Employee],
    grid: &Grid<'_>,
    day_index: usize,
    date: NaiveDate,
    shift: &Shift,
) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    for (employee_index, employee) in employees.iter().enumerate() {
        if grid.shift_at(employee_index, day_index).is_some() {
            continue;
        }
        if employee.has_day_off_override(date) {
            continue;
        }
        if grid.run_with(employee_index, day_index) > request.work_rules.max_consecutive_days as usize
        {
            continue;
        }
        let week = day_index / 7;
        if grid.week_hours(employee_index, week) + shift.work_hours()
            > request.work_rules.max_weekly_hours
        {
            continue;
        }

        let hours = grid.total_hours(employee_index);
        if best.map(|(h, _)| hours < h).unwrap_or(true) {
            best = Some((hours, employee_index));
        }
    }
    best.map(|(_, i)| i)
}

/// Working state: employee-by-day shift grid plus derived tallies.
struct Grid<'a> {
    cells: Vec<Vec<Option<&'a Shift>>>,
    week_count: usize,
}

impl<'a> Grid<'a> {
    fn new(employee_count: usize, days: &[NaiveDate]) -> Self {
        Self {
            cells: vec![vec![None; days.len()]; employee_count],
            week_count: days.len() / 7 + 1,
        }
    }

    fn assign(&mut self, employee_index: usize, day_index: usize, shift: &'a Shift) {
        self.cells[employee_index][day_index] = Some(shift);
    }

    fn shift_at(&self, employee_index: usize, day_index: usize) -> Option<&'a Shift> {
        self.cells[employee_index][day_index]
    }

    fn slot_count(&self, day_index: usize, shift_id: &str) -> usize {
        self.cells
            .iter()
            .filter(|row| row[day_index].map(|s| s.id == shift_id).unwrap_or(false))
            .count()
    }

    fn total_hours(&self, employee_index: usize) -> f64 {
        self.cells[employee_index]
            .iter()
            .flatten()
            .map(|s| s.work_hours())
            .sum()
    }

    fn week_hours(&self, employee_index: usize, week: usize) -> f64 {
        debug_assert!(week < self.week_count);
        self.cells[employee_index]
            .iter()
            .enumerate()
            .filter(|(d, _)| d / 7 == week)
            .filter_map(|(_, s)| *s)
            .map(|s| s.work_hours())
            .sum()
    }

    /// Length of the consecutive-workday run that would result from
    /// working `day_index` (joins the runs on both sides).
    fn run_with(&self, employee_index: usize, day_index: usize) -> usize {
        let row = &self.cells[employee_index];
        let mut run = 1;
        let mut d = day_index;
        while d > 0 && row[d - 1].is_some() {
            run += 1;
            d -= 1;
        }
        d = day_index;
        while d + 1 < row.len() && row[d + 1].is_some() {
            run += 1;
            d += 1;
        }
        run
    }

    fn into_assignments(
        self,
        employees: &[&Employee],
        days: &[NaiveDate],
    ) -> Vec<ScheduleAssignment> {
        let mut assignments = Vec::new();
        for (employee_index, row) in self.cells.iter().enumerate() {
            for (day_index, cell) in row.iter().enumerate() {
                if let Some(shift) = cell {
                    assignments.push(ScheduleAssignment::new(
                        &employees[employee_index].id,
                        &shift.id,
                        days[day_index],
                    ));
                }
            }
        }
        assignments.sort_by(|a, b| {
            (a.date, &a.shift_id, &a.employee_id).cmp(&(b.date, &b.shift_id, &b.employee_id))
        });
        assignments
    }
}
