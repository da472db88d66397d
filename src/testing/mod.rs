use crate::report::float;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod assumptions;
pub mod effect;
pub mod inference;

pub mod utils;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TTestType {
    #[default]
    Student, // Equal variance
    Welch,   // Unequal variance
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMeasure {
    CohensD,
    /// Mean difference over the standard deviation of the differences (paired designs)
    CohensDz,
    EtaSquared,
    PartialEtaSquared,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub measure: EffectMeasure,
    #[serde(with = "float")]
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    #[serde(with = "float")]
    pub lower: f64,
    #[serde(with = "float")]
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// The test statistic value (t or F)
    #[serde(with = "float")]
    pub statistic: f64,
    /// The p-value of the test
    #[serde(with = "float")]
    pub p_value: f64,
    /// Degrees of freedom (t-tests), or numerator degrees of freedom (F-tests)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "float::option")]
    pub degrees_of_freedom: Option<f64>,
    /// Denominator degrees of freedom of an F-test
    #[serde(default, skip_serializing_if = "Option::is_none", with = "float::option")]
    pub error_degrees_of_freedom: Option<f64>,
    /// Effect size measurement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<EffectSize>,
    /// Confidence interval for the mean difference (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<ConfidenceInterval>,
    /// Standard error of the mean difference
    #[serde(default, skip_serializing_if = "Option::is_none", with = "float::option")]
    pub standard_error: Option<f64>,
    /// Additional test-specific information
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "float::map")]
    pub metadata: BTreeMap<String, f64>,
}

impl TestResult {
    /// Create a new test result with minimal information
    pub fn new(statistic: f64, p_value: f64) -> Self {
        TestResult {
            statistic,
            p_value,
            degrees_of_freedom: None,
            error_degrees_of_freedom: None,
            effect_size: None,
            confidence_interval: None,
            standard_error: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Add effect size to the result
    pub fn with_effect_size(mut self, measure: EffectMeasure, value: f64) -> Self {
        self.effect_size = Some(EffectSize { measure, value });
        self
    }

    /// Add confidence interval to the result
    pub fn with_confidence_interval(mut self, level: f64, lower: f64, upper: f64) -> Self {
        self.confidence_interval = Some(ConfidenceInterval {
            level,
            lower,
            upper,
        });
        self
    }

    /// Add degrees of freedom to the result
    pub fn with_degrees_of_freedom(mut self, df: f64) -> Self {
        self.degrees_of_freedom = Some(df);
        self
    }

    /// Add numerator and denominator degrees of freedom to an F-test result
    pub fn with_f_degrees_of_freedom(mut self, df_effect: f64, df_error: f64) -> Self {
        self.degrees_of_freedom = Some(df_effect);
        self.error_degrees_of_freedom = Some(df_error);
        self
    }

    /// Add standard error to the result
    pub fn with_standard_error(mut self, se: f64) -> Self {
        self.standard_error = Some(se);
        self
    }

    /// Add additional metadata
    pub fn with_metadata(mut self, key: &str, value: f64) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}
