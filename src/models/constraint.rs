//! Constraint catalogue, rule policy, and violation model.
//!
//! Constraints are caller-supplied configuration records; the evaluator
//! owns a built-in rule set keyed by [`RuleCode`] and consults the
//! constraint list to toggle rules, reclassify hard/soft, and reweight.
//! Violations reference their rule so downstream classification can be
//! matched exhaustively.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a constraint gates validity or only affects score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Must never be violated in a valid result.
    Hard,
    /// Traded off against other soft constraints via weight.
    Soft,
}

/// Constraint domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// Statutory working-time rules.
    Legal,
    /// Ward staffing and skill-mix rules.
    Operational,
    /// Workload distribution rules.
    Fairness,
    /// Employee preference rules.
    Preference,
}

/// Identifies one built-in scheduling rule.
///
/// Closed set: every violation carries its rule, and the result composer
/// matches over this enum exhaustively so no category can be silently
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCode {
    /// Weekly worked hours over the configured maximum.
    WeeklyHours,
    /// Consecutive-workday run over the configured maximum.
    ConsecutiveDays,
    /// Rest gap between consecutive shifts under the minimum.
    RestGap,
    /// Rest days within a roster week under the minimum.
    WeeklyRest,
    /// Slot headcount outside the `min..=max` staffing band.
    StaffingBand,
    /// A required team has no member on a slot.
    TeamCoverage,
    /// No senior staff on a slot that requires one.
    SeniorCoverage,
    /// Too many juniors on a slot with no senior present.
    JuniorOnly,
    /// An employee's realized sequence matches an avoid pattern.
    AvoidPattern,
    /// An employee's workload deviates from the department mean.
    FairnessDeviation,
    /// A preference or explicit request went unhonored.
    PreferenceMiss,
}

impl RuleCode {
    /// All rules, in evaluation order.
    pub const ALL: [RuleCode; 11] = [
        RuleCode::WeeklyHours,
        RuleCode::ConsecutiveDays,
        RuleCode::RestGap,
        RuleCode::WeeklyRest,
        RuleCode::StaffingBand,
        RuleCode::TeamCoverage,
        RuleCode::SeniorCoverage,
        RuleCode::JuniorOnly,
        RuleCode::AvoidPattern,
        RuleCode::FairnessDeviation,
        RuleCode::PreferenceMiss,
    ];

    /// Canonical constraint name used to match caller configuration.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::WeeklyHours => "weekly-hours",
            Self::ConsecutiveDays => "consecutive-days",
            Self::RestGap => "rest-between-shifts",
            Self::WeeklyRest => "weekly-rest-days",
            Self::StaffingBand => "staffing-band",
            Self::TeamCoverage => "team-coverage",
            Self::SeniorCoverage => "senior-coverage",
            Self::JuniorOnly => "junior-only-cap",
            Self::AvoidPattern => "avoid-pattern",
            Self::FairnessDeviation => "workload-balance",
            Self::PreferenceMiss => "shift-preference",
        }
    }

    /// Default hard/soft classification.
    pub fn default_kind(&self) -> ConstraintKind {
        match self {
            Self::WeeklyHours
            | Self::ConsecutiveDays
            | Self::RestGap
            | Self::WeeklyRest
            | Self::StaffingBand
            | Self::TeamCoverage
            | Self::SeniorCoverage => ConstraintKind::Hard,
            Self::JuniorOnly
            | Self::AvoidPattern
            | Self::FairnessDeviation
            | Self::PreferenceMiss => ConstraintKind::Soft,
        }
    }

    /// Constraint domain.
    pub fn category(&self) -> ConstraintCategory {
        match self {
            Self::WeeklyHours | Self::ConsecutiveDays | Self::RestGap | Self::WeeklyRest => {
                ConstraintCategory::Legal
            }
            Self::StaffingBand
            | Self::TeamCoverage
            | Self::SeniorCoverage
            | Self::JuniorOnly
            | Self::AvoidPattern => ConstraintCategory::Operational,
            Self::FairnessDeviation => ConstraintCategory::Fairness,
            Self::PreferenceMiss => ConstraintCategory::Preference,
        }
    }

    /// Default weight for soft scoring.
    pub fn default_weight(&self) -> f64 {
        match self {
            Self::JuniorOnly | Self::AvoidPattern => 0.6,
            Self::FairnessDeviation | Self::PreferenceMiss => 0.5,
            _ => 1.0,
        }
    }
}

/// A caller-supplied constraint configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Unique constraint identifier.
    pub id: String,
    /// Name; matched against [`RuleCode::canonical_name`].
    pub name: String,
    /// Hard or soft.
    pub kind: ConstraintKind,
    /// Constraint domain.
    pub category: ConstraintCategory,
    /// Weight in `[0, 1]` for soft scoring.
    pub weight: f64,
    /// Inactive constraints disable their rule entirely.
    pub active: bool,
}

impl Constraint {
    /// Creates a configuration record for a built-in rule with defaults.
    pub fn for_rule(rule: RuleCode) -> Self {
        Self {
            id: rule.canonical_name().to_string(),
            name: rule.canonical_name().to_string(),
            kind: rule.default_kind(),
            category: rule.category(),
            weight: rule.default_weight(),
            active: true,
        }
    }

    /// Reclassifies the constraint as soft.
    pub fn as_soft(mut self) -> Self {
        self.kind = ConstraintKind::Soft;
        self
    }

    /// Sets the weight, clamped to `[0, 1]`.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Deactivates the constraint.
    pub fn disabled(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Resolved per-rule policy: built-in defaults overridden by any matching
/// caller constraint.
#[derive(Debug, Clone, Default)]
pub struct RulePolicy {
    overrides: HashMap<RuleCode, (bool, ConstraintKind, f64)>,
}

impl RulePolicy {
    /// Resolves policy from a constraint list; unknown names are ignored.
    pub fn from_constraints(constraints: &[Constraint]) -> Self {
        let mut overrides = HashMap::new();
        for c in constraints {
            if let Some(rule) = RuleCode::ALL.iter().find(|r| r.canonical_name() == c.name) {
                overrides.insert(*rule, (c.active, c.kind, c.weight.clamp(0.0, 1.0)));
            }
        }
        Self { overrides }
    }

    /// Whether the rule should be evaluated.
    pub fn is_active(&self, rule: RuleCode) -> bool {
        self.overrides.get(&rule).map(|(a, _, _)| *a).unwrap_or(true)
    }

    /// Effective hard/soft classification.
    pub fn kind(&self, rule: RuleCode) -> ConstraintKind {
        self.overrides
            .get(&rule)
            .map(|(_, k, _)| *k)
            .unwrap_or_else(|| rule.default_kind())
    }

    /// Effective weight.
    pub fn weight(&self, rule: RuleCode) -> f64 {
        self.overrides
            .get(&rule)
            .map(|(_, _, w)| *w)
            .unwrap_or_else(|| rule.default_weight())
    }
}

/// Violation severity for ranking and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational; soft-constraint drift.
    Low,
    /// Noticeable but tolerable.
    Medium,
    /// Breach of a hard rule.
    High,
    /// Breach exceeding half the rule's limit.
    Critical,
}

impl Severity {
    /// Scales severity by how far a limit was exceeded, as a fraction of
    /// the limit: over 50% is critical, over 25% high, otherwise medium.
    pub fn from_overage(ratio: f64) -> Self {
        if ratio > 0.5 {
            Self::Critical
        } else if ratio > 0.25 {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// A detected constraint violation with its penalty contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// The rule that was breached.
    pub rule: RuleCode,
    /// Canonical constraint name.
    pub constraint_name: String,
    /// Human-readable description.
    pub message: String,
    /// Effective hard/soft classification at evaluation time.
    pub kind: ConstraintKind,
    /// Constraint domain.
    pub category: ConstraintCategory,
    /// Severity for ranking and display.
    pub severity: Severity,
    /// Affected employee ids (may be empty for slot-level violations).
    pub employee_ids: Vec<String>,
    /// Penalty contribution to the total.
    pub cost: f64,
}

impl ConstraintViolation {
    /// Creates a violation for a rule under the given policy classification.
    pub fn new(
        rule: RuleCode,
        kind: ConstraintKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule,
            constraint_name: rule.canonical_name().to_string(),
            message: message.into(),
            kind,
            category: rule.category(),
            severity,
            employee_ids: Vec::new(),
            cost: 0.0,
        }
    }

    /// Attaches an affected employee.
    pub fn with_employee(mut self, employee_id: impl Into<String>) -> Self {
        self.employee_ids.push(employee_id.into());
        self
    }

    /// Sets the penalty contribution.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Whether this is a hard legal breach.
    pub fn is_hard_legal(&self) -> bool {
        self.kind == ConstraintKind::Hard && self.category == ConstraintCategory::Legal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_unique() {
        let mut names: Vec<_> = RuleCode::ALL.iter().map(|r| r.canonical_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), RuleCode::ALL.len());
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RulePolicy::default();
        assert!(policy.is_active(RuleCode::WeeklyHours));
        assert_eq!(policy.kind(RuleCode::WeeklyHours), ConstraintKind::Hard);
        assert_eq!(policy.kind(RuleCode::AvoidPattern), ConstraintKind::Soft);
        assert!((policy.weight(RuleCode::FairnessDeviation) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_policy_overrides() {
        let constraints = vec![
            Constraint::for_rule(RuleCode::StaffingBand)
                .as_soft()
                .with_weight(0.3),
            Constraint::for_rule(RuleCode::AvoidPattern).disabled(),
        ];
        let policy = RulePolicy::from_constraints(&constraints);

        assert_eq!(policy.kind(RuleCode::StaffingBand), ConstraintKind::Soft);
        assert!((policy.weight(RuleCode::StaffingBand) - 0.3).abs() < 1e-10);
        assert!(!policy.is_active(RuleCode::AvoidPattern));
        // Untouched rules keep defaults
        assert!(policy.is_active(RuleCode::WeeklyHours));
    }

    #[test]
    fn test_policy_ignores_unknown_names() {
        let mut c = Constraint::for_rule(RuleCode::WeeklyHours);
        c.name = "not-a-rule".to_string();
        let policy = RulePolicy::from_constraints(&[c]);
        assert!(policy.is_active(RuleCode::WeeklyHours));
    }

    #[test]
    fn test_severity_from_overage() {
        assert_eq!(Severity::from_overage(0.6), Severity::Critical);
        assert_eq!(Severity::from_overage(0.3), Severity::High);
        assert_eq!(Severity::from_overage(0.1), Severity::Medium);
    }

    #[test]
    fn test_violation_builder() {
        let v = ConstraintViolation::new(
            RuleCode::WeeklyHours,
            ConstraintKind::Hard,
            Severity::Critical,
            "worked 80h in week 1",
        )
        .with_employee("e01")
        .with_cost(40.0);

        assert_eq!(v.constraint_name, "weekly-hours");
        assert_eq!(v.category, ConstraintCategory::Legal);
        assert!(v.is_hard_legal());
        assert_eq!(v.employee_ids, vec!["e01".to_string()]);
        assert!((v.cost - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_weight_clamped() {
        let c = Constraint::for_rule(RuleCode::PreferenceMiss).with_weight(3.0);
        assert!((c.weight - 1.0).abs() < 1e-10);
    }
}
