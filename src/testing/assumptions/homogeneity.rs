use crate::testing::assumptions::AssumptionCheck;
use crate::testing::inference::anova::one_way_anova;
use crate::testing::utils::{mean, median, variance};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Variance-equality test applied across groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomogeneityTest {
    /// Levene's test on absolute deviations from the group median (Brown-Forsythe)
    #[default]
    Levene,
    /// Levene's original test on absolute deviations from the group mean
    LeveneMean,
    /// Bartlett's test; more powerful under normality, sensitive to departures from it
    Bartlett,
}

impl HomogeneityTest {
    pub fn name(&self) -> &'static str {
        match self {
            HomogeneityTest::Levene => "levene",
            HomogeneityTest::LeveneMean => "levene_mean",
            HomogeneityTest::Bartlett => "bartlett",
        }
    }
}

pub fn homogeneity_of_variance(
    groups: &[&[f64]],
    test: HomogeneityTest,
) -> anyhow::Result<AssumptionCheck> {
    match test {
        HomogeneityTest::Levene => levene(groups, median),
        HomogeneityTest::LeveneMean => levene(groups, mean),
        HomogeneityTest::Bartlett => bartlett(groups),
    }
    .map(|check| AssumptionCheck {
        test: test.name().to_string(),
        ..check
    })
}

/// Levene's test: one-way ANOVA on absolute deviations from each group's centre.
pub fn levene(groups: &[&[f64]], center: fn(&[f64]) -> f64) -> anyhow::Result<AssumptionCheck> {
    if groups.len() < 2 {
        return Err(anyhow::anyhow!(
            "Levene's test needs at least 2 groups (got {})",
            groups.len()
        ));
    }

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let c = center(g);
            g.iter().map(|&x| (x - c).abs()).collect()
        })
        .collect();
    let refs: Vec<&[f64]> = deviations.iter().map(|d| d.as_slice()).collect();
    let anova = one_way_anova(&refs)?;

    let mut check = AssumptionCheck::new("levene", anova.statistic, anova.p_value);
    if let (Some(df1), Some(df2)) = (anova.degrees_of_freedom, anova.error_degrees_of_freedom) {
        check = check.with_detail("df_between", df1).with_detail("df_within", df2);
    }
    Ok(check)
}

/// Bartlett's test for equal variances (chi-square approximation).
pub fn bartlett(groups: &[&[f64]]) -> anyhow::Result<AssumptionCheck> {
    let k = groups.len();
    if k < 2 {
        return Err(anyhow::anyhow!(
            "Bartlett's test needs at least 2 groups (got {})",
            k
        ));
    }
    if let Some(small) = groups.iter().position(|g| g.len() < 2) {
        return Err(anyhow::anyhow!(
            "Bartlett's test needs at least 2 observations in every group (group {} has {})",
            small,
            groups[small].len()
        ));
    }

    let total_n: usize = groups.iter().map(|g| g.len()).sum();
    let df_pooled = (total_n - k) as f64;

    let variances: Vec<f64> = groups.iter().map(|g| variance(g)).collect();
    let pooled = groups
        .iter()
        .zip(&variances)
        .map(|(g, &v)| (g.len() - 1) as f64 * v)
        .sum::<f64>()
        / df_pooled;

    let numerator = df_pooled * pooled.ln()
        - groups
            .iter()
            .zip(&variances)
            .map(|(g, &v)| (g.len() - 1) as f64 * v.ln())
            .sum::<f64>();
    let correction = 1.0
        + (groups.iter().map(|g| 1.0 / (g.len() - 1) as f64).sum::<f64>() - 1.0 / df_pooled)
            / (3.0 * (k - 1) as f64);
    let statistic = numerator / correction;

    let df = (k - 1) as f64;
    let p_value = if statistic.is_nan() {
        1.0
    } else if statistic.is_infinite() {
        0.0
    } else {
        ChiSquared::new(df)
            .map(|dist| dist.sf(statistic))
            .unwrap_or(1.0)
    };

    Ok(AssumptionCheck::new("bartlett", statistic, p_value).with_detail("df", df))
}
