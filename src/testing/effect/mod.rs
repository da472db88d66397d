use crate::testing::utils::{mean, variance};

/// Calculate Cohen's d for two independent samples, using the pooled standard deviation.
///
/// Positive when `x` has the larger mean.
pub fn cohens_d(x: &[f64], y: &[f64]) -> anyhow::Result<f64> {
    if x.len() < 2 || y.len() < 2 {
        return Err(anyhow::anyhow!(
            "Each group must have at least 2 samples for Cohen's d"
        ));
    }

    let n1 = x.len() as f64;
    let n2 = y.len() as f64;
    let pooled_sd =
        (((n1 - 1.0) * variance(x) + (n2 - 1.0) * variance(y)) / (n1 + n2 - 2.0)).sqrt();

    Ok((mean(x) - mean(y)) / pooled_sd)
}

/// Calculate Hedge's g (bias-corrected effect size)
pub fn hedges_g(x: &[f64], y: &[f64]) -> anyhow::Result<f64> {
    let d = cohens_d(x, y)?;

    // Correction factor J
    let n = (x.len() + y.len()) as f64;
    let j = 1.0 - 3.0 / (4.0 * (n - 2.0) - 1.0);

    Ok(j * d)
}

/// Standardized distance of a sample mean from a reference value.
///
/// For the differences of paired observations against zero this is Cohen's d_z.
pub fn one_sample_d(x: &[f64], popmean: f64) -> anyhow::Result<f64> {
    if x.len() < 2 {
        return Err(anyhow::anyhow!(
            "At least 2 observations are required for a standardized effect size"
        ));
    }
    Ok((mean(x) - popmean) / variance(x).sqrt())
}

/// Proportion of total variance explained by the effect.
pub fn eta_squared(ss_effect: f64, ss_total: f64) -> f64 {
    ss_effect / ss_total
}

/// Proportion of effect-plus-error variance explained by the effect.
pub fn partial_eta_squared(ss_effect: f64, ss_error: f64) -> f64 {
    ss_effect / (ss_effect + ss_error)
}

/// Less biased estimate of explained variance for between-subjects ANOVA.
pub fn omega_squared(ss_effect: f64, ss_total: f64, df_effect: f64, ms_error: f64) -> f64 {
    (ss_effect - df_effect * ms_error) / (ss_total + ms_error)
}
