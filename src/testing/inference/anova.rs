//! Analysis of variance: between-subjects one-way, within-subjects one-way, and two-way with
//! interaction (Type II sums of squares).

use crate::testing::effect::{eta_squared, omega_squared, partial_eta_squared};
use crate::testing::utils::{mean, sum_of_squares};
use crate::testing::{EffectMeasure, TestResult};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, Axis};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Upper-tail probability of an F statistic.
pub fn f_test_p_value(f_stat: f64, df1: f64, df2: f64) -> f64 {
    if f_stat.is_nan() {
        return 1.0;
    }
    if f_stat.is_infinite() {
        return 0.0;
    }
    if f_stat <= 0.0 {
        return 1.0;
    }
    match FisherSnedecor::new(df1, df2) {
        Ok(dist) => dist.sf(f_stat),
        Err(_) => 1.0,
    }
}

fn f_result(ss_effect: f64, df_effect: f64, ss_error: f64, df_error: f64) -> TestResult {
    let ms_effect = ss_effect / df_effect;
    let ms_error = ss_error / df_error;
    let f_stat = ms_effect / ms_error;
    TestResult::new(f_stat, f_test_p_value(f_stat, df_effect, df_error))
        .with_f_degrees_of_freedom(df_effect, df_error)
}

/// One-way between-subjects ANOVA.
///
/// Returns F, p, eta squared, and the sums of squares / mean squares as metadata
/// (`ss_between`, `ss_within`, `ms_between`, `ms_within`, `omega_squared`).
pub fn one_way_anova(groups: &[&[f64]]) -> anyhow::Result<TestResult> {
    let k = groups.len();
    if k < 2 {
        return Err(anyhow::anyhow!("ANOVA needs at least 2 groups (got {})", k));
    }
    if let Some(empty) = groups.iter().position(|g| g.is_empty()) {
        return Err(anyhow::anyhow!("Group {} has no observations", empty));
    }

    let total_n: usize = groups.iter().map(|g| g.len()).sum();
    if total_n <= k {
        return Err(anyhow::anyhow!(
            "ANOVA needs more observations ({}) than groups ({})",
            total_n,
            k
        ));
    }

    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let grand_mean = mean(&all);

    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups.iter().map(|g| sum_of_squares(g)).sum();
    let ss_total = ss_between + ss_within;

    let df_between = (k - 1) as f64;
    let df_within = (total_n - k) as f64;
    let ms_within = ss_within / df_within;

    Ok(f_result(ss_between, df_between, ss_within, df_within)
        .with_effect_size(EffectMeasure::EtaSquared, eta_squared(ss_between, ss_total))
        .with_metadata("ss_between", ss_between)
        .with_metadata("ss_within", ss_within)
        .with_metadata("ms_between", ss_between / df_between)
        .with_metadata("ms_within", ms_within)
        .with_metadata(
            "omega_squared",
            omega_squared(ss_between, ss_total, df_between, ms_within),
        ))
}

/// One-way repeated-measures ANOVA on a subjects x conditions matrix.
///
/// Subject variability is removed from the error term. The result carries partial eta squared
/// and the `ss_conditions`, `ss_subjects`, `ss_error`, `ms_conditions`, `ms_error` metadata.
pub fn repeated_measures_anova(data: &Array2<f64>) -> anyhow::Result<TestResult> {
    let (n, k) = data.dim();
    if k < 2 {
        return Err(anyhow::anyhow!(
            "Repeated-measures ANOVA needs at least 2 conditions (got {})",
            k
        ));
    }
    if n < 2 {
        return Err(anyhow::anyhow!(
            "Repeated-measures ANOVA needs at least 2 subjects (got {})",
            n
        ));
    }

    let grand_mean = data.iter().sum::<f64>() / (n * k) as f64;
    let condition_means = data
        .mean_axis(Axis(0))
        .ok_or_else(|| anyhow::anyhow!("Empty repeated-measures matrix"))?;
    let subject_means = data
        .mean_axis(Axis(1))
        .ok_or_else(|| anyhow::anyhow!("Empty repeated-measures matrix"))?;

    let ss_total: f64 = data.iter().map(|&v| (v - grand_mean).powi(2)).sum();
    let ss_conditions =
        n as f64 * condition_means.iter().map(|&m| (m - grand_mean).powi(2)).sum::<f64>();
    let ss_subjects =
        k as f64 * subject_means.iter().map(|&m| (m - grand_mean).powi(2)).sum::<f64>();
    let ss_error = (ss_total - ss_conditions - ss_subjects).max(0.0);

    let df_conditions = (k - 1) as f64;
    let df_error = ((k - 1) * (n - 1)) as f64;

    Ok(f_result(ss_conditions, df_conditions, ss_error, df_error)
        .with_effect_size(
            EffectMeasure::PartialEtaSquared,
            partial_eta_squared(ss_conditions, ss_error),
        )
        .with_metadata("ss_conditions", ss_conditions)
        .with_metadata("ss_subjects", ss_subjects)
        .with_metadata("ss_error", ss_error)
        .with_metadata("ms_conditions", ss_conditions / df_conditions)
        .with_metadata("ms_error", ss_error / df_error))
}

/// p-value of an F statistic with both degrees of freedom scaled by a sphericity epsilon.
pub fn sphericity_corrected_p_value(result: &TestResult, epsilon: f64) -> Option<f64> {
    let df1 = result.degrees_of_freedom?;
    let df2 = result.error_degrees_of_freedom?;
    Some(f_test_p_value(result.statistic, df1 * epsilon, df2 * epsilon))
}

/// Effects of a two-way between-subjects ANOVA.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoWayAnova {
    pub factor_a: TestResult,
    pub factor_b: TestResult,
    pub interaction: TestResult,
    pub ss_residual: f64,
    pub df_residual: f64,
}

/// Residual sum of squares after removing the mean of each level.
fn within_ss(levels: &[usize], values: &[f64], n_levels: usize) -> f64 {
    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); n_levels];
    for (&level, &value) in levels.iter().zip(values) {
        buckets[level].push(value);
    }
    buckets.iter().filter(|b| !b.is_empty()).map(|b| sum_of_squares(b)).sum()
}

/// Residual sum of squares and rank of the additive model `y ~ A + B`, fitted by least squares.
fn additive_fit(
    a: &[usize],
    b: &[usize],
    y: &[f64],
    levels_a: usize,
    levels_b: usize,
) -> anyhow::Result<(f64, usize)> {
    let n = y.len();
    let n_cols = levels_a + levels_b - 1;
    let design = DMatrix::from_fn(n, n_cols, |row, col| {
        if col == 0 {
            1.0
        } else if col < levels_a {
            // Treatment coding: level 0 is the reference
            if a[row] == col { 1.0 } else { 0.0 }
        } else if b[row] == col - levels_a + 1 {
            1.0
        } else {
            0.0
        }
    });
    let response = DVector::from_column_slice(y);

    let svd = design.clone().svd(true, true);
    let rank = svd.rank(1e-10);
    let beta = svd
        .solve(&response, 1e-10)
        .map_err(|e| anyhow::anyhow!("Least-squares fit failed: {}", e))?;
    let residuals = response - design * beta;
    Ok((residuals.norm_squared(), rank))
}

/// Two-way ANOVA with interaction using Type II sums of squares.
///
/// `a` and `b` are the level indices of each observation (`0..levels_a`, `0..levels_b`).
pub fn two_way_anova(
    a: &[usize],
    b: &[usize],
    y: &[f64],
    levels_a: usize,
    levels_b: usize,
) -> anyhow::Result<TwoWayAnova> {
    if a.len() != y.len() || b.len() != y.len() {
        return Err(anyhow::anyhow!("Factor and value vectors must have equal length"));
    }
    if levels_a < 2 || levels_b < 2 {
        return Err(anyhow::anyhow!(
            "Two-way ANOVA needs at least 2 levels per factor (got {} and {})",
            levels_a,
            levels_b
        ));
    }

    let cells: Vec<usize> = a.iter().zip(b).map(|(&i, &j)| i * levels_b + j).collect();
    let mut occupied = vec![false; levels_a * levels_b];
    for &cell in &cells {
        occupied[cell] = true;
    }
    let n_cells = occupied.iter().filter(|&&o| o).count();
    if y.len() <= n_cells {
        return Err(anyhow::anyhow!(
            "Two-way ANOVA needs more observations ({}) than occupied cells ({})",
            y.len(),
            n_cells
        ));
    }

    let rss_a = within_ss(a, y, levels_a);
    let rss_b = within_ss(b, y, levels_b);
    let (rss_additive, rank_additive) = additive_fit(a, b, y, levels_a, levels_b)?;
    let rss_full = within_ss(&cells, y, levels_a * levels_b);

    let ss_a = (rss_b - rss_additive).max(0.0);
    let ss_b = (rss_a - rss_additive).max(0.0);
    let ss_ab = (rss_additive - rss_full).max(0.0);

    let df_a = (levels_a - 1) as f64;
    let df_b = (levels_b - 1) as f64;
    // Empty cells remove interaction contrasts: df is occupied cells minus the additive rank.
    let df_ab = n_cells.saturating_sub(rank_additive) as f64;
    let df_residual = (y.len() - n_cells) as f64;

    let effect = |ss: f64, df: f64| {
        f_result(ss, df, rss_full, df_residual)
            .with_effect_size(
                EffectMeasure::PartialEtaSquared,
                partial_eta_squared(ss, rss_full),
            )
            .with_metadata("ss", ss)
            .with_metadata("ms", ss / df)
    };

    Ok(TwoWayAnova {
        factor_a: effect(ss_a, df_a),
        factor_b: effect(ss_b, df_b),
        interaction: effect(ss_ab, df_ab),
        ss_residual: rss_full,
        df_residual,
    })
}
