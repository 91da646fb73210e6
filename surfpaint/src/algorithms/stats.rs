// Multiple-comparison thresholds and statistic conversions

use crate::error::{PaintError, PaintResult};
use crate::geometry::tolerance::Z_CAP;
use serde::Serialize;
use std::cmp::Ordering;

/// Threshold plus per-entry survival (1 = survives), aligned with the input p-values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Correction {
    pub threshold: f64,
    pub mask: Vec<u8>,
    pub surviving: usize,
    /// Number of non-NaN p-values the correction was computed over.
    pub tests: usize,
}

fn check_unit_interval(param: &'static str, v: f64) -> PaintResult<()> {
    if v > 0.0 && v <= 1.0 {
        Ok(())
    } else {
        Err(PaintError::param(param, format!("must be in (0, 1], got {}", v)))
    }
}

fn survival(p_values: &[f64], threshold: f64, any: bool, tests: usize) -> Correction {
    let mask: Vec<u8> = p_values.iter().map(|&p| (any && !p.is_nan() && p <= threshold) as u8).collect();
    let surviving = mask.iter().filter(|&&m| m == 1).count();
    Correction { threshold, mask, surviving, tests }
}

/// Benjamini-Hochberg step-up threshold at false discovery rate `q`.
///
/// Scans every rank and keeps the largest `i` with `p(i) <= i/V * q`, so ties
/// at the boundary resolve the same way regardless of where the scan stops.
pub fn fdr_threshold(p_values: &[f64], q: f64) -> PaintResult<Correction> {
    check_unit_interval("q", q)?;

    let mut order: Vec<usize> = (0..p_values.len()).collect();
    order.sort_by(|&a, &b| cmp_nan_last(p_values[a], p_values[b]));
    let tests = p_values.iter().filter(|p| !p.is_nan()).count();

    let mut best: Option<f64> = None;
    for (rank0, &idx) in order.iter().take(tests).enumerate() {
        let p = p_values[idx];
        let critical = (rank0 + 1) as f64 / tests as f64 * q;
        if p <= critical {
            best = Some(p);
        }
    }

    let c = match best {
        Some(t) => survival(p_values, t, true, tests),
        None => survival(p_values, 0.0, false, tests),
    };
    log::debug!("fdr q={}: {} of {} tests survive (threshold {})", q, c.surviving, tests, c.threshold);
    Ok(c)
}

/// Bonferroni threshold `alpha / V`.
pub fn bonferroni_threshold(p_values: &[f64], alpha: f64) -> PaintResult<Correction> {
    check_unit_interval("alpha", alpha)?;
    let tests = p_values.iter().filter(|p| !p.is_nan()).count();
    let c = if tests == 0 {
        survival(p_values, 0.0, false, 0)
    } else {
        survival(p_values, alpha / tests as f64, true, tests)
    };
    log::debug!("bonferroni alpha={}: {} of {} tests survive", alpha, c.surviving, tests);
    Ok(c)
}

fn cmp_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

// Acklam's rational approximation to the inverse standard normal CDF.
const A: [f64; 6] = [
    -3.969683028665376e+01,
    2.209460984245205e+02,
    -2.759285104469687e+02,
    1.383577518672690e+02,
    -3.066479806614716e+01,
    2.506628277459239e+00,
];
const B: [f64; 5] = [
    -5.447609879822406e+01,
    1.615858368580409e+02,
    -1.556989798598866e+02,
    6.680131188771972e+01,
    -1.328068155288572e+01,
];
const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
    4.374664141464968e+00,
    2.938163982698783e+00,
];
const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];
const P_LOW: f64 = 0.02425;

/// Inverse standard normal CDF for `p` in (0, 1).
fn inverse_normal_cdf(p: f64) -> f64 {
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -inverse_normal_cdf(1.0 - p)
    }
}

/// Upper-tail probability of the standard normal, `P(Z > z)`.
fn normal_sf(z: f64) -> f64 {
    // erfc with fractional error below 1.2e-7
    let x = z / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + 0.5 * x.abs());
    let poly = -x * x - 1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398 + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    let erfc = t * poly.exp();
    let erfc = if x >= 0.0 { erfc } else { 2.0 - erfc };
    0.5 * erfc
}

/// Two-tailed p-value to a non-negative z-score.
pub fn p_to_z(p: f64) -> PaintResult<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(PaintError::param("p", format!("must be in [0, 1], got {}", p)));
    }
    if p == 0.0 {
        return Ok(Z_CAP);
    }
    if p == 1.0 {
        return Ok(0.0);
    }
    Ok((-inverse_normal_cdf(p / 2.0)).clamp(0.0, Z_CAP))
}

/// Two-tailed p-value of a z-score.
pub fn z_to_p(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    (2.0 * normal_sf(z.abs())).clamp(0.0, 1.0)
}

/// Student t with `df` degrees of freedom to an equivalent z, sign preserved.
///
/// Above 30 degrees of freedom a first-order correction is accurate enough;
/// below, the Wilson-Hilferty cube-root transform of `t^2 ~ F(1, df)` gives the
/// tail probability, which is then mapped back through [`p_to_z`].
pub fn t_to_z(t: f64, df: f64) -> PaintResult<f64> {
    if !(df >= 1.0) {
        return Err(PaintError::param("df", format!("must be >= 1, got {}", df)));
    }
    if t.is_nan() {
        return Ok(f64::NAN);
    }
    if t == 0.0 {
        return Ok(0.0);
    }
    if t.is_infinite() {
        return Ok(Z_CAP.copysign(t));
    }

    let z = if df > 30.0 {
        t.abs() * (1.0 - 1.0 / (4.0 * df)) / (1.0 + t * t / (2.0 * df)).sqrt()
    } else {
        let f = t * t;
        let a = 2.0 / (9.0 * df);
        let b = 2.0 / 9.0;
        let cube = f.cbrt();
        let zf = ((1.0 - a) * cube - (1.0 - b)) / (b + a * cube * cube).sqrt();
        p_to_z(normal_sf(zf).clamp(0.0, 1.0))?
    };
    Ok(z.copysign(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS: [f64; 10] = [0.001, 0.004, 0.008, 0.010, 0.15, 0.20, 0.30, 0.50, 0.70, 0.90];

    #[test]
    fn fdr_reference_example() {
        let c = fdr_threshold(&PS, 0.05).unwrap();
        assert_eq!(&c.mask[..4], &[1, 1, 1, 1]);
        assert_eq!(&c.mask[8..], &[0, 0]);
        assert_eq!(c.threshold, 0.010);
        assert_eq!(c.surviving, 4);
        assert_eq!(c.tests, 10);
    }

    #[test]
    fn fdr_keeps_largest_passing_rank() {
        // rank 1 fails (0.04 > 0.025) but rank 2 passes (0.045 <= 0.05)
        let c = fdr_threshold(&[0.045, 0.04], 0.05).unwrap();
        assert_eq!(c.mask, vec![1, 1]);
        assert_eq!(c.threshold, 0.045);
    }

    #[test]
    fn fdr_nothing_survives() {
        let c = fdr_threshold(&[0.5, 0.6, 0.9], 0.05).unwrap();
        assert_eq!(c.threshold, 0.0);
        assert_eq!(c.surviving, 0);
    }

    #[test]
    fn fdr_ignores_nan() {
        let c = fdr_threshold(&[f64::NAN, 0.001, f64::NAN, 0.02], 0.05).unwrap();
        assert_eq!(c.tests, 2);
        assert_eq!(c.mask, vec![0, 1, 0, 1]);
    }

    #[test]
    fn fdr_rejects_bad_q() {
        assert!(fdr_threshold(&PS, 0.0).is_err());
        assert!(fdr_threshold(&PS, 1.5).is_err());
        assert!(fdr_threshold(&PS, f64::NAN).is_err());
        assert!(fdr_threshold(&PS, 1.0).is_ok());
    }

    #[test]
    fn bonferroni_reference_example() {
        let c = bonferroni_threshold(&[0.001, 0.01, 0.05, 0.1], 0.05).unwrap();
        assert_eq!(c.threshold, 0.05 / 4.0);
        assert!((c.threshold - 0.0125).abs() < 1e-15);
        assert_eq!(c.mask, vec![1, 1, 0, 0]);
    }

    #[test]
    fn bonferroni_edge_cases() {
        assert!(bonferroni_threshold(&[0.1], 0.0).is_err());
        let c = bonferroni_threshold(&[f64::NAN, f64::NAN], 0.05).unwrap();
        assert_eq!(c.surviving, 0);
        assert_eq!(c.tests, 0);
    }

    #[test]
    fn p_to_z_reference_values() {
        assert!((p_to_z(0.05).unwrap() - 1.959964).abs() < 1e-3);
        assert!((p_to_z(0.01).unwrap() - 2.575829).abs() < 1e-3);
        assert_eq!(p_to_z(1.0).unwrap(), 0.0);
        assert_eq!(p_to_z(0.0).unwrap(), Z_CAP);
        assert!(p_to_z(1e-300).unwrap() > 30.0);
        assert!(p_to_z(-0.1).is_err());
        assert!(p_to_z(1.1).is_err());
    }

    #[test]
    fn z_to_p_inverts_p_to_z() {
        for p in [0.5, 0.05, 0.001] {
            let z = p_to_z(p).unwrap();
            assert!((z_to_p(z) - p).abs() / p < 1e-3);
        }
    }

    #[test]
    fn t_to_z_preserves_sign() {
        for df in [1.0, 5.0, 30.0, 31.0, 200.0] {
            for t in [-8.0, -2.0, -0.1, 0.1, 2.0, 8.0] {
                let z = t_to_z(t, df).unwrap();
                assert_eq!(z.signum(), f64::signum(t), "t={} df={}", t, df);
            }
        }
        assert_eq!(t_to_z(0.0, 10.0).unwrap(), 0.0);
        assert!(t_to_z(2.0, 0.5).is_err());
    }

    #[test]
    fn t_to_z_close_to_reference() {
        // t = 2.228 at df = 10 has two-tailed p = 0.05
        assert!((t_to_z(2.228, 10.0).unwrap() - 1.96).abs() < 0.05);
        // t = 2.021 at df = 40 has two-tailed p = 0.05
        assert!((t_to_z(2.021, 40.0).unwrap() - 1.96).abs() < 0.05);
        // large df converges to identity
        assert!((t_to_z(3.0, 10_000.0).unwrap() - 3.0).abs() < 0.01);
    }
}
