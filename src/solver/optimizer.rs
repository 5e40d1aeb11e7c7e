//! Local-search postprocessor.
//!
//! Bounded hill-climbing over the constructive seed with probabilistic
//! worse-move acceptance: an improving move is always taken, a worsening
//! move is taken with probability `exp(-delta / temperature)` under a
//! geometrically cooling temperature. The RNG is injected so identical
//! inputs and seeds reproduce identical rosters.
//!
//! The incumbent may drift uphill, but the best roster seen is tracked
//! and returned, so the result never scores worse than the seed.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated
//! Annealing"

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::SchedulingRequest;
use crate::models::ScheduleAssignment;
use crate::solver::evaluator::{evaluate, Evaluation};

/// Attempts at generating a move candidate before an iteration stalls.
const MOVE_ATTEMPTS: usize = 10;

/// Iteration and acceptance parameters for the search.
#[derive(Debug, Clone)]
pub struct OptimizerBudget {
    /// Hard upper bound on iterations.
    pub max_iterations: u32,
    /// Consecutive non-improving iterations before convergence.
    pub stall_limit: u32,
    /// Starting temperature for worse-move acceptance.
    pub initial_temperature: f64,
    /// Geometric cooling factor per iteration.
    pub cooling: f64,
    /// Iterations between candidate-weight refreshes.
    pub reweight_interval: u32,
    /// Cooperative cancellation flag, checked at each iteration boundary.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for OptimizerBudget {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            stall_limit: 200,
            initial_temperature: 12.0,
            cooling: 0.995,
            reweight_interval: 25,
            cancel: None,
        }
    }
}

impl OptimizerBudget {
    /// Sets the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence stall limit.
    pub fn with_stall_limit(mut self, stall_limit: u32) -> Self {
        self.stall_limit = stall_limit;
        self
    }

    /// Sets the cancellation flag.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Terminal state of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOutcome {
    /// The stall limit was reached with no improving move.
    Converged,
    /// The iteration cap was reached first.
    IterationBudgetExhausted,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Search statistics for the result contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostprocessStats {
    /// Iterations executed.
    pub iterations: u32,
    /// Accepted improving moves.
    pub improvements: u32,
    /// Worse moves accepted via the temperature schedule.
    pub accepted_worse: u32,
    /// Penalty of the seed roster.
    pub initial_penalty: f64,
    /// Penalty of the returned roster (never above `initial_penalty`).
    pub final_penalty: f64,
    /// Why the search stopped.
    pub outcome: SearchOutcome,
}

/// Improves a seed roster within the given budget.
///
/// Never fails: with no applicable move the seed is returned unchanged
/// with `improvements = 0`. Deterministic for a fixed request, seed, and
/// RNG state.
pub fn optimize<R: Rng>(
    seed: Vec<ScheduleAssignment>,
    request: &SchedulingRequest,
    budget: &OptimizerBudget,
    rng: &mut R,
) -> (Vec<ScheduleAssignment>, PostprocessStats) {
    let initial = evaluate(&seed, request);
    let initial_penalty = initial.penalty;

    if seed.is_empty() {
        let stats = PostprocessStats {
            iterations: 0,
            improvements: 0,
            accepted_worse: 0,
            initial_penalty,
            final_penalty: initial_penalty,
            outcome: SearchOutcome::Converged,
        };
        return (seed, stats);
    }

    let mut current = seed.clone();
    let mut current_penalty = initial_penalty;
    let mut best = seed;
    let mut best_penalty = initial_penalty;

    let mut weights = candidate_weights(request, &initial);
    let mut improvements = 0u32;
    let mut accepted_worse = 0u32;
    let mut stall = 0u32;
    let mut iterations = 0u32;
    let mut outcome = SearchOutcome::IterationBudgetExhausted;

    for iter in 0..budget.max_iterations {
        if budget.cancelled() {
            outcome = SearchOutcome::Cancelled;
            break;
        }
        iterations = iter + 1;

        if iter > 0 && budget.reweight_interval > 0 && iter % budget.reweight_interval == 0 {
            let evaluation = evaluate(&current, request);
            weights = candidate_weights(request, &evaluation);
        }

        let Some(undo) = propose_and_apply(&mut current, request, &weights, rng) else {
            stall += 1;
            if stall >= budget.stall_limit {
                outcome = SearchOutcome::Converged;
                break;
            }
            continue;
        };

        let candidate_penalty = evaluate(&current, request).penalty;
        let delta = candidate_penalty - current_penalty;
        let temperature =
            (budget.initial_temperature * budget.cooling.powi(iter as i32)).max(1e-6);

        if delta < 0.0 {
            improvements += 1;
            current_penalty = candidate_penalty;
            stall = 0;
            if candidate_penalty < best_penalty {
                best = current.clone();
                best_penalty = candidate_penalty;
            }
        } else if rng.random::<f64>() < (-delta / temperature).exp() {
            accepted_worse += 1;
            current_penalty = candidate_penalty;
            stall += 1;
        } else {
            undo.revert(&mut current);
            stall += 1;
        }

        if stall >= budget.stall_limit {
            outcome = SearchOutcome::Converged;
            break;
        }
    }

    debug!(
        "postprocess: {iterations} iterations, {improvements} improvements, \
         penalty {initial_penalty:.1} -> {best_penalty:.1}"
    );

    let stats = PostprocessStats {
        iterations,
        improvements,
        accepted_worse,
        initial_penalty,
        final_penalty: best_penalty,
        outcome,
    };
    (best, stats)
}

/// Candidate-selection weights per employee, biased toward employees
/// with hard violations or poor individual fairness scores.
fn candidate_weights(request: &SchedulingRequest, evaluation: &Evaluation) -> Vec<(String, f64)> {
    let hard_ids = evaluation.hard_violation_employees();
    let mut ids: Vec<&str> = request.employees.iter().map(|e| e.id.as_str()).collect();
    ids.sort_unstable();

    ids.into_iter()
        .map(|id| {
            let mut weight = 1.0;
            if hard_ids.binary_search(&id).is_ok() {
                weight += 2.0;
            }
            if let Some(record) = evaluation.fairness.record_for(id) {
                weight += (100.0 - record.score) / 25.0;
            }
            (id.to_string(), weight)
        })
        .collect()
}

enum Undo {
    SwapShifts { a: usize, b: usize },
    Reassign { idx: usize, employee_id: String },
}

impl Undo {
    fn revert(self, current: &mut [ScheduleAssignment]) {
        match self {
            Undo::SwapShifts { a, b } => {
                let (a, b) = ordered_pair(current, a, b);
                std::mem::swap(&mut a.shift_id, &mut b.shift_id);
            }
            Undo::Reassign { idx, employee_id } => {
                current[idx].employee_id = employee_id;
            }
        }
    }
}

fn ordered_pair(
    slice: &mut [ScheduleAssignment],
    a: usize,
    b: usize,
) -> (&mut ScheduleAssignment, &mut ScheduleAssignment) {
    debug_assert!(a != b);
    if a < b {
        let (left, right) = slice.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Generates and applies one move candidate, returning its undo record.
///
/// A swap exchanges the shifts of two employees working the same date;
/// a reassignment hands a slot to an employee idle that date. Selection
/// is weighted toward flagged employees. Returns `None` when no
/// applicable move was found within the attempt budget.
fn propose_and_apply<R: Rng>(
    current: &mut Vec<ScheduleAssignment>,
    request: &SchedulingRequest,
    weights: &[(String, f64)],
    rng: &mut R,
) -> Option<Undo> {
    for _ in 0..MOVE_ATTEMPTS {
        let Some(anchor) = pick_weighted_assignment(current, weights, rng) else {
            continue;
        };
        let prefer_swap = rng.random_bool(0.5);

        if prefer_swap {
            if let Some(undo) = try_swap(current, anchor, rng) {
                return Some(undo);
            }
            if let Some(undo) = try_reassign(current, request, anchor, rng) {
                return Some(undo);
            }
        } else {
            if let Some(undo) = try_reassign(current, request, anchor, rng) {
                return Some(undo);
            }
            if let Some(undo) = try_swap(current, anchor, rng) {
                return Some(undo);
            }
        }
    }
    None
}

fn pick_weighted_assignment<R: Rng>(
    current: &[ScheduleAssignment],
    weights: &[(String, f64)],
    rng: &mut R,
) -> Option<usize> {
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }
    let mut target = rng.random::<f64>() * total;
    let mut chosen: Option<&str> = None;
    for (id, weight) in weights {
        target -= weight;
        if target <= 0.0 {
            chosen = Some(id.as_str());
            break;
        }
    }
    let chosen = chosen.or_else(|| weights.last().map(|(id, _)| id.as_str()))?;

    let owned: Vec<usize> = current
        .iter()
        .enumerate()
        .filter(|(_, a)| a.employee_id == chosen)
        .map(|(i, _)| i)
        .collect();
    if owned.is_empty() {
        return None;
    }
    Some(owned[rng.random_range(0..owned.len())])
}

fn try_swap<R: Rng>(
    current: &mut [ScheduleAssignment],
    anchor: usize,
    rng: &mut R,
) -> Option<Undo> {
    let date = current[anchor].date;
    let anchor_employee = current[anchor].employee_id.clone();
    let anchor_shift = current[anchor].shift_id.clone();
    let partners: Vec<usize> = current
        .iter()
        .enumerate()
        .filter(|(i, a)| {
            *i != anchor
                && a.date == date
                && a.employee_id != anchor_employee
                && a.shift_id != anchor_shift
        })
        .map(|(i, _)| i)
        .collect();
    if partners.is_empty() {
        return None;
    }
    let partner = partners[rng.random_range(0..partners.len())];

    let (a, b) = ordered_pair(current, anchor, partner);
    std::mem::swap(&mut a.shift_id, &mut b.shift_id);
    Some(Undo::SwapShifts {
        a: anchor,
        b: partner,
    })
}

fn try_reassign<R: Rng>(
    current: &mut [ScheduleAssignment],
    request: &SchedulingRequest,
    anchor: usize,
    rng: &mut R,
) -> Option<Undo> {
    let date = current[anchor].date;
    let anchor_employee = current[anchor].employee_id.clone();
    let mut idle: Vec<&str> = request
        .employees
        .iter()
        .map(|e| e.id.as_str())
        .filter(|id| {
            *id != anchor_employee.as_str()
                && !current.iter().any(|a| a.date == date && a.employee_id == **id)
        })
        .collect();
    idle.sort_unstable();
    if idle.is_empty() {
        return None;
    }
    let replacement = idle[rng.random_range(0..idle.len())].to_string();

    let previous = std::mem::replace(&mut current[anchor].employee_id, replacement);
    Some(Undo::Reassign {
        idx: anchor,
        employee_id: previous,
    })
}
