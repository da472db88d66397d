//! Shapiro-Wilk test for normality, via Royston's approximation (AS R94).
//!
//! Coefficients come from Blom's approximation of the expected normal order statistics with
//! Royston's polynomial corrections for the two outermost weights. The p-value uses a
//! log-normal transform of `1 - W` (separate fits for n <= 11 and n > 11). For n = 3 the
//! distribution of W is known exactly.

use crate::testing::assumptions::AssumptionCheck;
use crate::testing::utils::{mean, sorted};
use log::warn;
use statrs::distribution::{ContinuousCDF, Normal};

/// Largest sample size the approximation was fitted for.
pub const SHAPIRO_WILK_MAX_N: usize = 5000;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

// c[0] + c[1] x + c[2] x^2 + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

fn standard_normal() -> anyhow::Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| anyhow::anyhow!("standard normal: {}", e))
}

/// Normality of model residuals, reported as an assumption check.
pub fn normality_of_residuals(residuals: &[f64]) -> anyhow::Result<AssumptionCheck> {
    shapiro_wilk(residuals)
}

pub fn shapiro_wilk(data: &[f64]) -> anyhow::Result<AssumptionCheck> {
    let n = data.len();
    if n < 3 {
        return Err(anyhow::anyhow!(
            "Shapiro-Wilk needs at least 3 observations (got {})",
            n
        ));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(anyhow::anyhow!("Shapiro-Wilk input contains non-finite values"));
    }
    if n > SHAPIRO_WILK_MAX_N {
        warn!(
            "Shapiro-Wilk p-value may be inaccurate for n = {} > {}",
            n, SHAPIRO_WILK_MAX_N
        );
    }

    let x = sorted(data);
    let m = mean(&x);
    let ssq: f64 = x.iter().map(|&v| (v - m).powi(2)).sum();

    // Constant residuals carry no evidence against normality
    if x[n - 1] - x[0] <= f64::EPSILON * x[n - 1].abs().max(1.0) || ssq <= 0.0 {
        return Ok(AssumptionCheck::new("shapiro_wilk", 1.0, 1.0).with_detail("n", n as f64));
    }

    let (w, p_value) = if n == 3 {
        let a1 = std::f64::consts::FRAC_1_SQRT_2;
        let w = ((a1 * (x[2] - x[0])).powi(2) / ssq).clamp(0.75, 1.0);
        let p = 1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos();
        (w, p.clamp(0.0, 1.0))
    } else {
        let a = coefficients(n)?;
        let nn2 = n / 2;
        let sa: f64 = (0..nn2).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
        let w = (sa * sa / ssq).min(1.0);
        (w, p_value(w, n)?)
    };

    Ok(AssumptionCheck::new("shapiro_wilk", w, p_value).with_detail("n", n as f64))
}

/// Weights for the upper half of the ordered sample.
fn coefficients(n: usize) -> anyhow::Result<Vec<f64>> {
    let normal = standard_normal()?;
    let nn2 = n / 2;

    let m: Vec<f64> = (0..nn2)
        .map(|i| normal.inverse_cdf((i as f64 + 1.0 - 0.375) / (n as f64 + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / (n as f64).sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; nn2];
    a[0] = a1;

    let (corrected, fac_sq, one_minus) = if n <= 5 {
        (1, summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    } else {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        (
            2,
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    };
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return Err(anyhow::anyhow!(
            "Shapiro-Wilk coefficients are undefined for n = {}",
            n
        ));
    }

    let fac = (fac_sq / one_minus).sqrt();
    for i in corrected..nn2 {
        a[i] = -m[i] / fac;
    }
    Ok(a)
}

fn p_value(w: f64, n: usize) -> anyhow::Result<f64> {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok(1.0);
    }
    let y = w1.ln();
    let nf = n as f64;

    let z = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return Ok(0.0);
        }
        let y2 = -(gamma - y).ln();
        (y2 - poly(&C3, nf)) / poly(&C4, nf).exp()
    } else {
        let ln_n = nf.ln();
        (y - poly(&C5, ln_n)) / poly(&C6, ln_n).exp()
    };

    Ok(standard_normal()?.sf(z).clamp(0.0, 1.0))
}
