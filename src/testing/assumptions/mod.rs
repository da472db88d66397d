//! Diagnostics for the assumptions behind ANOVA and t-tests.
//!
//! - [`homogeneity`]: equal variances across groups (Levene, Brown-Forsythe, Bartlett)
//! - [`normality`]: Shapiro-Wilk on model residuals
//! - [`sphericity`]: Mauchly's test for repeated-measures designs

use crate::report::float;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod homogeneity;
pub mod normality;
pub mod sphericity;

/// Significance threshold below which an assumption is considered violated.
pub const ASSUMPTION_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionCheck {
    pub test: String,
    #[serde(with = "float")]
    pub statistic: f64,
    #[serde(with = "float")]
    pub p_value: f64,
    pub assumption_met: bool,
    /// Degrees of freedom, correction factors and other test-specific values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "float::map")]
    pub details: BTreeMap<String, f64>,
}

impl AssumptionCheck {
    pub fn new(test: &str, statistic: f64, p_value: f64) -> Self {
        AssumptionCheck {
            test: test.to_string(),
            statistic,
            p_value,
            assumption_met: p_value > ASSUMPTION_ALPHA,
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: f64) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

/// Outcome of one assumption check; `not_applicable` keeps the field present in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Diagnostic {
    Computed(AssumptionCheck),
    NotApplicable { reason: String },
}

impl Diagnostic {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Diagnostic::NotApplicable {
            reason: reason.into(),
        }
    }

    pub fn check(&self) -> Option<&AssumptionCheck> {
        match self {
            Diagnostic::Computed(check) => Some(check),
            Diagnostic::NotApplicable { .. } => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Diagnostic::Computed(_))
    }

    /// `None` when not applicable.
    pub fn assumption_met(&self) -> Option<bool> {
        self.check().map(|c| c.assumption_met)
    }
}

impl From<AssumptionCheck> for Diagnostic {
    fn from(check: AssumptionCheck) -> Self {
        Diagnostic::Computed(check)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub homogeneity_of_variance: Diagnostic,
    pub normality: Diagnostic,
    /// Present only for repeated-measures designs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sphericity: Option<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assumption_flag_uses_fixed_threshold() {
        assert!(AssumptionCheck::new("levene", 1.0, 0.2).assumption_met);
        assert!(!AssumptionCheck::new("levene", 9.0, 0.01).assumption_met);
        assert!(!AssumptionCheck::new("levene", 4.0, ASSUMPTION_ALPHA).assumption_met);
    }

    #[test]
    fn test_diagnostic_serialization() {
        let computed = Diagnostic::from(AssumptionCheck::new("shapiro_wilk", 0.98, 0.7));
        let json = serde_json::to_string(&computed).unwrap();
        assert_eq!(
            json,
            r#"{"status":"computed","test":"shapiro_wilk","statistic":0.98,"p_value":0.7,"assumption_met":true}"#
        );
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, computed);

        let skipped = Diagnostic::not_applicable("two conditions");
        let json = serde_json::to_string(&skipped).unwrap();
        assert_eq!(json, r#"{"status":"not_applicable","reason":"two conditions"}"#);
        assert_eq!(skipped.assumption_met(), None);
    }
}
