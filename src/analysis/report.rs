use crate::analysis::dispatch::{TestKind, TestOutcome};
use crate::analysis::summary::{GroupSummary, SummaryStatistics, TwoWaySummaryStatistics};
use crate::report::float;
use crate::report::plot::Curve;
use crate::report::Renderable;
use crate::testing::assumptions::Diagnostics;
use crate::testing::TestResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Columns an analysis was run on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Columns {
    pub group: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeated_measures: Option<String>,
}

/// Result of one analysed value column.
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub test: TestKind,
    pub columns: Columns,
    pub timestamp: DateTime<Utc>,
    pub result: TestResult,
    pub diagnostics: Diagnostics,
    pub summary_statistics: SummaryStatistics,
}

impl AnalysisReport {
    pub fn assemble(
        outcome: TestOutcome,
        columns: Columns,
        timestamp: DateTime<Utc>,
        summary_statistics: SummaryStatistics,
    ) -> Self {
        AnalysisReport {
            test: outcome.kind,
            columns,
            timestamp,
            result: outcome.result,
            diagnostics: outcome.diagnostics,
            summary_statistics,
        }
    }
}

fn curves(groups: &[GroupSummary]) -> Vec<Curve> {
    groups
        .iter()
        .map(|g| Curve {
            label: g.group.clone(),
            mean: g.descriptives.mean,
            std_dev: g.descriptives.std_dev,
        })
        .collect()
}

impl Renderable for AnalysisReport {
    fn curves(&self) -> Vec<Curve> {
        curves(&self.summary_statistics.grouped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWayColumns {
    pub group: String,
    pub group2: String,
    pub data: String,
}

/// One term of the two-way model, named after its column(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub term: String,
    pub result: TestResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residual {
    #[serde(with = "float")]
    pub ss: f64,
    #[serde(with = "float")]
    pub df: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWayResult {
    pub factor_a: Effect,
    pub factor_b: Effect,
    pub interaction: Effect,
    pub residual: Residual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWayAnovaReport {
    pub test: TestKind,
    pub columns: TwoWayColumns,
    pub timestamp: DateTime<Utc>,
    pub result: TwoWayResult,
    pub diagnostics: Diagnostics,
    pub summary_statistics: TwoWaySummaryStatistics,
}

impl Renderable for TwoWayAnovaReport {
    /// One curve per interaction cell.
    fn curves(&self) -> Vec<Curve> {
        curves(&self.summary_statistics.interaction)
    }
}
