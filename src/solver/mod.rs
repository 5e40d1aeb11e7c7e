//! Roster construction and optimization.
//!
//! The solver pipeline: a constructive seed from rotation patterns and
//! explicit requests, a rule evaluator producing violations and a scalar
//! penalty, a fairness engine over per-employee workload vectors, and a
//! bounded local-search postprocessor that improves the seed.
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"

pub mod builder;
pub mod evaluator;
pub mod fairness;
pub mod optimizer;

pub use builder::build_seed;
pub use evaluator::{evaluate, Evaluation};
pub use fairness::{compute_fairness, jains_index, FairnessRecord, FairnessReport, WorkloadVector};
pub use optimizer::{optimize, OptimizerBudget, PostprocessStats, SearchOutcome};
