//! Entry points: load a CSV file, run the test matching its design on each value column, and
//! optionally save a report per column.
//!
//! Every entry point returns one report per analysed column, in header order.

pub mod dispatch;
pub mod report;
pub mod summary;

use crate::config::{AnalysisOptions, Anova1WayConfig, Anova2WayConfig, TTestDepConfig, TTestIndConfig};
use crate::data::partition::GroupedSample;
use crate::data::table::{Dataset, Table};
use crate::error::{Result, StatsError};
use crate::report::{output_paths, save};
use crate::testing::assumptions::Diagnostics;
use crate::testing::inference::anova::two_way_anova;
use crate::testing::TTestType;
use chrono::{DateTime, Utc};
use dispatch::{homogeneity, normality, run_test, TestKind, TestParameters};
use log::info;
use report::{AnalysisReport, Columns, Effect, Residual, TwoWayAnovaReport, TwoWayColumns, TwoWayResult};
use std::collections::BTreeMap;
use std::path::PathBuf;
use summary::{group_summaries, Descriptives, SummaryStatistics, TwoWaySummaryStatistics};

/// One-way ANOVA, or repeated-measures ANOVA when a subject column is set.
///
/// Fewer groups fall through to the matching t-test.
pub fn anova1way(config: &Anova1WayConfig) -> Result<Vec<AnalysisReport>> {
    let params = TestParameters {
        popmean: 0.0,
        variance: TTestType::Student,
        homogeneity_test: config.options.homogeneity_test,
    };
    analyse(&config.options, config.repeated_measures_column.as_deref(), &params)
}

/// One-sample t-test for a single group, independent t-test for two.
pub fn ttest_ind(config: &TTestIndConfig) -> Result<Vec<AnalysisReport>> {
    let params = TestParameters {
        popmean: config.popmean,
        variance: config.variance,
        homogeneity_test: config.options.homogeneity_test,
    };
    analyse(&config.options, None, &params)
}

/// Paired t-test over subject-aligned conditions.
pub fn ttest_dep(config: &TTestDepConfig) -> Result<Vec<AnalysisReport>> {
    let params = TestParameters {
        popmean: 0.0,
        variance: TTestType::Student,
        homogeneity_test: config.options.homogeneity_test,
    };
    analyse(&config.options, Some(config.repeated_measures_column.as_str()), &params)
}

/// Table, value columns and output paths, all validated before any test runs.
struct Plan {
    table: Table,
    columns: Vec<String>,
    outputs: Vec<Option<PathBuf>>,
    timestamp: DateTime<Utc>,
}

fn plan(options: &AnalysisOptions, excluded: &[&str]) -> Result<Plan> {
    let table = Table::from_path(&options.data_path, options.delimiter_byte()?)?;
    let columns = table.value_columns(&options.data_column, excluded)?;
    let outputs = output_paths(options.filename.as_deref(), &columns)?;
    Ok(Plan {
        table,
        columns,
        outputs,
        timestamp: options.timestamp_or_now(),
    })
}

fn analyse(
    options: &AnalysisOptions,
    subject_column: Option<&str>,
    params: &TestParameters,
) -> Result<Vec<AnalysisReport>> {
    let mut excluded = vec![options.group_column.as_str()];
    excluded.extend(subject_column);
    let plan = plan(options, &excluded)?;

    let mut reports = Vec::with_capacity(plan.columns.len());
    for (column, output) in plan.columns.iter().zip(&plan.outputs) {
        info!("Analysing `{}` by `{}`", column, options.group_column);
        let dataset = plan
            .table
            .dataset(column, &[options.group_column.as_str()], subject_column)?;
        let sample = GroupedSample::from_dataset(&dataset);
        let outcome = run_test(&sample, subject_column.is_some(), params)?;
        info!(
            "{} on `{}`: statistic = {}, p = {}",
            outcome.kind, column, outcome.result.statistic, outcome.result.p_value
        );

        let report = AnalysisReport::assemble(
            outcome,
            Columns {
                group: options.group_column.clone(),
                data: column.clone(),
                repeated_measures: subject_column.map(str::to_string),
            },
            plan.timestamp,
            SummaryStatistics::from_grouped(&sample),
        );
        if let Some(path) = output {
            save(&report, path, options.render_plot)?;
        }
        reports.push(report);
    }
    Ok(reports)
}

/// Two-way between-subjects ANOVA with interaction.
///
/// `options.group_column` is the first factor and `group_column2` the second.
pub fn anova2way(config: &Anova2WayConfig) -> Result<Vec<TwoWayAnovaReport>> {
    let options = &config.options;
    let factors = [options.group_column.as_str(), config.group_column2.as_str()];
    let plan = plan(options, &factors)?;

    let mut reports = Vec::with_capacity(plan.columns.len());
    for (column, output) in plan.columns.iter().zip(&plan.outputs) {
        info!("Analysing `{}` by `{}` x `{}`", column, factors[0], factors[1]);
        let dataset = plan.table.dataset(column, &factors, None)?;
        let report = two_way_report(&dataset, options, &config.group_column2, plan.timestamp)?;
        if let Some(path) = output {
            save(&report, path, options.render_plot)?;
        }
        reports.push(report);
    }
    Ok(reports)
}

fn level_indices(dataset: &Dataset, sample: &GroupedSample, factor: usize) -> Vec<usize> {
    let index: BTreeMap<&str, usize> = sample
        .labels()
        .into_iter()
        .enumerate()
        .map(|(i, label)| (label, i))
        .collect();
    dataset
        .rows
        .iter()
        .map(|row| index[row.factors[factor].as_str()])
        .collect()
}

fn two_way_report(
    dataset: &Dataset,
    options: &AnalysisOptions,
    group_column2: &str,
    timestamp: DateTime<Utc>,
) -> Result<TwoWayAnovaReport> {
    let by_a = GroupedSample::by_factor(dataset, 0);
    let by_b = GroupedSample::by_factor(dataset, 1);
    let cells = GroupedSample::by_cells(dataset);
    if by_a.len() < 2 || by_b.len() < 2 {
        return Err(StatsError::InsufficientData(format!(
            "two-way ANOVA needs at least 2 levels per factor (`{}` has {}, `{}` has {})",
            options.group_column,
            by_a.len(),
            group_column2,
            by_b.len()
        )));
    }

    let a = level_indices(dataset, &by_a, 0);
    let b = level_indices(dataset, &by_b, 1);
    let anova = two_way_anova(&a, &b, &dataset.values(), by_a.len(), by_b.len())?;
    info!(
        "{} on `{}`: F = {} / {} / {}",
        TestKind::TwoWayAnova,
        dataset.value_column,
        anova.factor_a.statistic,
        anova.factor_b.statistic,
        anova.interaction.statistic
    );

    Ok(TwoWayAnovaReport {
        test: TestKind::TwoWayAnova,
        columns: TwoWayColumns {
            group: options.group_column.clone(),
            group2: group_column2.to_string(),
            data: dataset.value_column.clone(),
        },
        timestamp,
        result: TwoWayResult {
            factor_a: Effect {
                term: options.group_column.clone(),
                result: anova.factor_a,
            },
            factor_b: Effect {
                term: group_column2.to_string(),
                result: anova.factor_b,
            },
            interaction: Effect {
                term: format!("{}:{}", options.group_column, group_column2),
                result: anova.interaction,
            },
            residual: Residual {
                ss: anova.ss_residual,
                df: anova.df_residual,
            },
        },
        diagnostics: Diagnostics {
            homogeneity_of_variance: homogeneity(&cells, options.homogeneity_test),
            normality: normality(&cells.residuals()),
            sphericity: None,
        },
        summary_statistics: TwoWaySummaryStatistics {
            overall: Descriptives::from_values(&dataset.values()),
            factor_a: group_summaries(&by_a),
            factor_b: group_summaries(&by_b),
            interaction: group_summaries(&cells),
        },
    })
}
