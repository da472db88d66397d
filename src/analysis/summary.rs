//! Descriptive statistics reported alongside every test.

use crate::data::partition::GroupedSample;
use crate::report::float;
use crate::testing::utils::{mean, median, std_dev};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptives {
    pub count: usize,
    #[serde(with = "float")]
    pub mean: f64,
    /// Sample standard deviation; NaN for fewer than two observations
    #[serde(with = "float")]
    pub std_dev: f64,
    /// Standard error of the mean
    #[serde(with = "float")]
    pub sem: f64,
    #[serde(with = "float")]
    pub median: f64,
    #[serde(with = "float")]
    pub min: f64,
    #[serde(with = "float")]
    pub max: f64,
}

impl Descriptives {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        let sd = std_dev(values);
        let (min, max) = if count == 0 {
            (f64::NAN, f64::NAN)
        } else {
            values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
        };
        Descriptives {
            count,
            mean: mean(values),
            std_dev: sd,
            sem: sd / (count as f64).sqrt(),
            median: median(values),
            min,
            max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: String,
    #[serde(flatten)]
    pub descriptives: Descriptives,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub overall: Descriptives,
    /// One entry per group, in label order
    pub grouped: Vec<GroupSummary>,
}

impl SummaryStatistics {
    pub fn from_grouped(sample: &GroupedSample) -> Self {
        let all: Vec<f64> = sample
            .groups
            .iter()
            .flat_map(|g| g.values.iter().copied())
            .collect();
        SummaryStatistics {
            overall: Descriptives::from_values(&all),
            grouped: group_summaries(sample),
        }
    }

    pub fn group(&self, label: &str) -> Option<&Descriptives> {
        self.grouped
            .iter()
            .find(|g| g.group == label)
            .map(|g| &g.descriptives)
    }
}

pub fn group_summaries(sample: &GroupedSample) -> Vec<GroupSummary> {
    sample
        .groups
        .iter()
        .map(|g| GroupSummary {
            group: g.label.clone(),
            descriptives: Descriptives::from_values(&g.values),
        })
        .collect()
}

/// Summaries of a two-factor design: each factor on its own and every occupied cell (`a_b`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWaySummaryStatistics {
    pub overall: Descriptives,
    pub factor_a: Vec<GroupSummary>,
    pub factor_b: Vec<GroupSummary>,
    pub interaction: Vec<GroupSummary>,
}
