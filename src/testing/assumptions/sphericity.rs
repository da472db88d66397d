use crate::testing::assumptions::{AssumptionCheck, Diagnostic};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Orthonormal Helmert contrasts, one row per contrast ((k - 1) x k).
fn helmert_contrasts(k: usize) -> DMatrix<f64> {
    let mut contrasts = DMatrix::zeros(k - 1, k);
    for row in 0..k - 1 {
        let level = row + 1;
        let norm = ((level * (level + 1)) as f64).sqrt();
        for col in 0..level {
            contrasts[(row, col)] = 1.0 / norm;
        }
        contrasts[(row, level)] = -(level as f64) / norm;
    }
    contrasts
}

/// Sample covariance of the columns of a subjects x conditions matrix.
fn covariance(data: &Array2<f64>) -> DMatrix<f64> {
    let (n, k) = data.dim();
    let means = data.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(k));
    let centered = DMatrix::from_fn(n, k, |i, j| data[[i, j]] - means[j]);
    centered.transpose() * &centered / (n as f64 - 1.0)
}

/// Sphericity of a repeated-measures design.
///
/// Two conditions have a single difference score, so sphericity holds trivially and the
/// result is `not_applicable`.
pub fn sphericity(data: &Array2<f64>) -> anyhow::Result<Diagnostic> {
    if data.ncols() < 3 {
        return Ok(Diagnostic::not_applicable(
            "sphericity is trivially satisfied with fewer than 3 conditions",
        ));
    }
    mauchly(data).map(Diagnostic::Computed)
}

/// Mauchly's test of sphericity with Greenhouse-Geisser and Huynh-Feldt epsilons.
///
/// The statistic is Mauchly's W; `details` holds `chi_square`, `df`, `greenhouse_geisser`
/// and `huynh_feldt`.
pub fn mauchly(data: &Array2<f64>) -> anyhow::Result<AssumptionCheck> {
    let (n, k) = data.dim();
    if k < 3 {
        return Err(anyhow::anyhow!(
            "Mauchly's test needs at least 3 conditions (got {})",
            k
        ));
    }
    // The contrast covariance is singular unless n - 1 >= k - 1.
    if n < k {
        return Err(anyhow::anyhow!(
            "Mauchly's test needs at least as many subjects as conditions (got {} subjects, {} conditions)",
            n,
            k
        ));
    }

    let p = (k - 1) as f64;
    let nf = n as f64;
    let contrasts = helmert_contrasts(k);
    let t = &contrasts * covariance(data) * contrasts.transpose();

    let trace = t.trace();
    let w = (t.determinant() / (trace / p).powf(p)).max(0.0);

    let d = 1.0 - (2.0 * p * p + p + 2.0) / (6.0 * p * (nf - 1.0));
    let chi_square = -(nf - 1.0) * d * w.ln();
    let df = p * (p + 1.0) / 2.0 - 1.0;
    let p_value = if chi_square.is_nan() {
        1.0
    } else if chi_square.is_infinite() {
        0.0
    } else {
        ChiSquared::new(df)
            .map(|dist| dist.sf(chi_square.max(0.0)))
            .unwrap_or(1.0)
    };

    let greenhouse_geisser = trace * trace / (p * (&t * &t).trace());
    let huynh_feldt = (nf * p * greenhouse_geisser - 2.0)
        / (p * (nf - 1.0 - p * greenhouse_geisser));
    let huynh_feldt = if huynh_feldt.is_finite() && huynh_feldt > 0.0 {
        huynh_feldt.min(1.0)
    } else {
        1.0
    };

    Ok(AssumptionCheck::new("mauchly", w, p_value)
        .with_detail("chi_square", chi_square)
        .with_detail("df", df)
        .with_detail("greenhouse_geisser", greenhouse_geisser)
        .with_detail("huynh_feldt", huynh_feldt))
}
