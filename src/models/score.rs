//! Schedule score model.
//!
//! All components are on a 0–100 scale: `total` is the normalized penalty
//! transform, the rest are direct measures. The breakdown carries the
//! intermediate figures the components were derived from.

use serde::{Deserialize, Serialize};

/// One line of the score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Component category ("coverage", "fairness", ...).
    pub category: String,
    /// What was measured.
    pub detail: String,
    /// The measured value on a 0–100 scale.
    pub score: f64,
}

impl ScoreBreakdown {
    /// Creates a breakdown line.
    pub fn new(category: impl Into<String>, detail: impl Into<String>, score: f64) -> Self {
        Self {
            category: category.into(),
            detail: detail.into(),
            score,
        }
    }
}

/// Multi-objective quality score for a roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleScore {
    /// Overall score: normalized transform of the total penalty.
    pub total: f64,
    /// Workload-distribution score.
    pub fairness: f64,
    /// Preference-match score.
    pub preference: f64,
    /// Staffing-target coverage score.
    pub coverage: f64,
    /// Component-level detail.
    pub breakdown: Vec<ScoreBreakdown>,
}

impl ScheduleScore {
    /// Adds a breakdown line.
    pub fn push_breakdown(
        &mut self,
        category: impl Into<String>,
        detail: impl Into<String>,
        score: f64,
    ) {
        self.breakdown.push(ScoreBreakdown::new(category, detail, score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_accumulates() {
        let mut score = ScheduleScore::default();
        score.push_breakdown("coverage", "slots filled to target", 95.0);
        score.push_breakdown("fairness", "jain index x 100", 98.2);

        assert_eq!(score.breakdown.len(), 2);
        assert_eq!(score.breakdown[0].category, "coverage");
        assert!((score.breakdown[1].score - 98.2).abs() < 1e-10);
    }
}
