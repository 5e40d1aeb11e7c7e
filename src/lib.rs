//! Shift-roster constraint solver and fairness engine for hospital staffing.
//!
//! Given a roster period, a staff roster, a shift catalogue, and a set of
//! hard/soft constraints, the engine produces a near-optimal assignment of
//! employees to shift slots, a quantified score, a structured violation
//! list, and machine-readable diagnostics explaining residual gaps.
//!
//! # Modules
//!
//! - **`models`**: domain value types: `Employee`, `Shift`, `Constraint`,
//!   `TeamPattern`, `ScheduleAssignment`, `ConstraintViolation`,
//!   `ScheduleScore`
//! - **`pattern`**: rotation-pattern mini-language and avoid-sequence
//!   matcher
//! - **`validate`**: structural integrity checks on requests
//! - **`preflight`**: static supply-vs-demand feasibility analysis
//! - **`solver`**: constructive seeding, rule evaluation, fairness
//!   scoring, and local-search optimization
//! - **`diagnostics`**: typed diagnostic collections and suggestions
//! - **`engine`**: the request/result contract and pipeline entry point
//!
//! # Pipeline
//!
//! `RosterEngine::create_schedule` runs preflight, builds a greedy seed
//! from rotation patterns and explicit requests, improves it with
//! seeded-RNG annealing, and composes the final result. Every run is
//! deterministic for a fixed request and RNG seed.
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Cheang et al. (2003), "Nurse Rostering Problems - A Bibliographic
//!   Survey"
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"

pub mod diagnostics;
pub mod engine;
pub mod models;
pub mod pattern;
pub mod preflight;
pub mod solver;
pub mod validate;

pub use engine::{
    CoverageRules, OptimizationGoal, RosterEngine, RosterSchedule, SchedulingRequest,
    SchedulingResult, WorkRules,
};
