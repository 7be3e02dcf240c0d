//! Standard normal distribution helpers used by the analytic pricer.

use std::f64::consts::{ PI, SQRT_2 };

/// Abramowitz & Stegun 7.1.26 rational approximation of the error function,
/// maximum absolute error about 1.5e-7.
pub fn erf(x: f64) -> f64 {
    let t = if x < 0.0 { -1.0 } else { 1.0 };
    let e = x.abs();
    const N: f64 = 0.3275911;
    const A: f64 = 0.254829592;
    const R: f64 = -0.284496736;
    const I: f64 = 1.421413741;
    const L: f64 = -1.453152027;
    const D: f64 = 1.061405429;
    let u = 1.0 / (1.0 + N * e);
    let m = 1.0 - ((((D * u + L) * u + I) * u + R) * u + A) * u * (-e * e).exp();
    t * m
}

pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

#[test]
fn cdf_at_zero_is_half() {
    assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
}

#[test]
fn cdf_is_symmetric() {
    for i in -1000..=1000 {
        let x = i as f64 / 100.0;
        let sum = normal_cdf(x) + normal_cdf(-x);
        assert!((sum - 1.0).abs() < 1e-6, "x={x} cdf(x)+cdf(-x)={sum}");
    }
}

#[test]
fn cdf_stays_in_unit_interval() {
    for i in -1000..=1000 {
        let x = i as f64 / 100.0;
        let p = normal_cdf(x);
        assert!((0.0..=1.0).contains(&p), "x={x} p={p}");
    }
}

#[test]
fn cdf_is_monotone() {
    let mut prev = normal_cdf(-4.0);
    for i in -79..=80 {
        let x = i as f64 / 20.0;
        let p = normal_cdf(x);
        assert!(p >= prev, "cdf decreased at x={x}: {prev} -> {p}");
        prev = p;
    }
}

#[test]
fn cdf_matches_statrs() {
    use statrs::distribution::{ ContinuousCDF, Normal };

    let reference = Normal::new(0.0, 1.0).unwrap();
    for i in -600..=600 {
        let x = i as f64 / 100.0;
        let diff = (normal_cdf(x) - reference.cdf(x)).abs();
        assert!(diff <= 1e-7, "x={x} diff={diff}");
    }
}

#[test]
fn pdf_matches_statrs() {
    use statrs::distribution::{ Continuous, Normal };

    let reference = Normal::new(0.0, 1.0).unwrap();
    for x in [-3.0, -1.0, 0.0, 0.5, 2.0] {
        approx::assert_relative_eq!(normal_pdf(x), reference.pdf(x), max_relative = 1e-12);
    }
}
