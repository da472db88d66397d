//! Parametric tests on the mean: one-sample, independent two-sample and paired t-tests.
//!
//! The two-sample kernel works from sums and sums of squares, so callers that already hold
//! those can skip a second pass over the data.

use crate::testing::effect::{cohens_d, hedges_g, one_sample_d};
use crate::testing::utils::{mean, variance};
use crate::testing::{EffectMeasure, TTestType, TestResult};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Confidence level of the reported mean-difference interval.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Perform a t-test comparing two samples.
///
/// This function performs either Student's t-test (assuming equal variances) or
/// Welch's t-test (allowing unequal variances) on two samples.
///
/// # Arguments
///
/// * `x` - First sample
/// * `y` - Second sample
/// * `test_type` - Type of t-test to perform
///
/// # Returns
///
/// `TestResult` containing the t-statistic, p-value, degrees of freedom and standard error.
pub fn t_test(x: &[f64], y: &[f64], test_type: TTestType) -> TestResult {
    let nx = x.len();
    let ny = y.len();

    if nx < 2 || ny < 2 {
        return TestResult::new(0.0, 1.0);
    }

    let (sum_x, sum_sq_x) = sums(x);
    let (sum_y, sum_sq_y) = sums(y);

    fast_t_test_from_sums(sum_x, sum_sq_x, nx as f64, sum_y, sum_sq_y, ny as f64, test_type)
}

#[inline]
fn sums(values: &[f64]) -> (f64, f64) {
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &val in values {
        sum += val;
        sum_sq += val * val;
    }
    (sum, sum_sq)
}

/// Perform a t-test using precomputed summary statistics.
///
/// # Arguments
///
/// * `sum1`, `sum_sq1`, `n1` - Sum, sum of squares, and count for group 1
/// * `sum2`, `sum_sq2`, `n2` - Sum, sum of squares, and count for group 2
/// * `test_type` - Type of t-test to perform (Student's or Welch's)
///
/// # Returns
///
/// `TestResult` containing the t-statistic, p-value, degrees of freedom and standard error.
pub fn fast_t_test_from_sums(
    sum1: f64,
    sum_sq1: f64,
    n1: f64,
    sum2: f64,
    sum_sq2: f64,
    n2: f64,
    test_type: TTestType,
) -> TestResult {
    // Early exit for insufficient sample sizes
    if n1 < 2.0 || n2 < 2.0 {
        return TestResult::new(0.0, 1.0);
    }

    let mean1 = sum1 / n1;
    let mean2 = sum2 / n2;

    // Calculate variances using the computational formula, clamped against rounding below zero
    let var1 = ((sum_sq1 - sum1 * sum1 / n1) / (n1 - 1.0)).max(0.0);
    let var2 = ((sum_sq2 - sum2 * sum2 / n2) / (n2 - 1.0)).max(0.0);

    let mean_diff = mean1 - mean2;

    let (std_err, df) = match test_type {
        TTestType::Student => {
            // Student's t-test (pooled variance)
            let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
            ((pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt(), n1 + n2 - 2.0)
        }
        TTestType::Welch => {
            // Welch's t-test (unequal variances)
            let term1 = var1 / n1;
            let term2 = var2 / n2;
            let combined_var = term1 + term2;

            // Welch-Satterthwaite equation for degrees of freedom
            let df = combined_var * combined_var
                / (term1 * term1 / (n1 - 1.0) + term2 * term2 / (n2 - 1.0));
            (combined_var.sqrt(), df)
        }
    };

    let t_stat = mean_diff / std_err;
    let p_value = t_test_p_value(t_stat, df);
    TestResult::new(t_stat, p_value)
        .with_degrees_of_freedom(df)
        .with_standard_error(std_err)
        .with_metadata("mean_difference", mean_diff)
}

/// Two-sided p-value of a t statistic.
pub fn t_test_p_value(t_stat: f64, df: f64) -> f64 {
    if t_stat.is_nan() {
        return 1.0;
    }
    if t_stat.is_infinite() {
        return 0.0;
    }
    if df <= 0.0 || !df.is_finite() {
        return 1.0;
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * t_dist.sf(t_stat.abs())).min(1.0),
        Err(_) => 1.0,
    }
}

/// Half-width multiplier of a two-sided interval at `level`.
fn t_critical(df: f64, level: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => t_dist.inverse_cdf(0.5 + level / 2.0),
        Err(_) => f64::NAN,
    }
}

fn with_interval(result: TestResult) -> TestResult {
    let (Some(df), Some(se)) = (result.degrees_of_freedom, result.standard_error) else {
        return result;
    };
    let diff = result.metadata.get("mean_difference").copied().unwrap_or(f64::NAN);
    let half_width = t_critical(df, CONFIDENCE_LEVEL) * se;
    result.with_confidence_interval(CONFIDENCE_LEVEL, diff - half_width, diff + half_width)
}

/// Independent two-sample t-test with Cohen's d, Hedges' g (`hedges_g` metadata) and a
/// confidence interval of `mean(x) - mean(y)`.
pub fn independent_t_test(x: &[f64], y: &[f64], test_type: TTestType) -> anyhow::Result<TestResult> {
    if x.len() < 2 || y.len() < 2 {
        return Err(anyhow::anyhow!(
            "Each group needs at least 2 observations for a two-sample t-test (got {} and {})",
            x.len(),
            y.len()
        ));
    }

    let d = cohens_d(x, y)?;
    let result = t_test(x, y, test_type)
        .with_effect_size(EffectMeasure::CohensD, d)
        .with_metadata("hedges_g", hedges_g(x, y)?);
    Ok(with_interval(result))
}

/// One-sample t-test of `mean(x) == popmean`.
pub fn one_sample_t_test(x: &[f64], popmean: f64) -> anyhow::Result<TestResult> {
    let n = x.len();
    if n < 2 {
        return Err(anyhow::anyhow!(
            "At least 2 observations are required for a one-sample t-test (got {})",
            n
        ));
    }

    let mean_diff = mean(x) - popmean;
    let std_err = (variance(x) / n as f64).sqrt();
    let df = (n - 1) as f64;
    let t_stat = mean_diff / std_err;

    let result = TestResult::new(t_stat, t_test_p_value(t_stat, df))
        .with_degrees_of_freedom(df)
        .with_standard_error(std_err)
        .with_metadata("mean_difference", mean_diff)
        .with_metadata("popmean", popmean)
        .with_effect_size(EffectMeasure::CohensD, one_sample_d(x, popmean)?);
    Ok(with_interval(result))
}

/// Paired t-test of `mean(x - y) == 0` over aligned observations.
pub fn paired_t_test(x: &[f64], y: &[f64]) -> anyhow::Result<TestResult> {
    if x.len() != y.len() {
        return Err(anyhow::anyhow!(
            "Paired samples must have equal length ({} vs {})",
            x.len(),
            y.len()
        ));
    }

    let differences: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    let mut result = one_sample_t_test(&differences, 0.0)?;
    result.metadata.remove("popmean");
    if let Some(effect) = result.effect_size.as_mut() {
        effect.measure = EffectMeasure::CohensDz;
    }
    Ok(result)
}
