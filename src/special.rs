//! Special functions needed by the general-ν Matérn kernel.
//!
//! The Gamma function comes from `statrs`. The modified Bessel function of
//! the second kind has no home in our dependency stack, so it is evaluated
//! here from its integral representation
//!
//! ```text
//! K_ν(x) = ∫₀^∞ exp(-x·cosh t) · cosh(ν t) dt,    x > 0
//! ```
//!
//! The integrand is even and analytic in a strip around the real axis, so the
//! trapezoidal rule converges geometrically in the step size. Summation is done
//! in log space around the integrand's peak, which keeps huge orders (ν ~ 1e4)
//! and tiny arguments (x ~ 1e-16) finite.

use statrs::function::gamma::ln_gamma;

/// Terms this far (in log units) below the peak no longer move the sum.
const LOG_CUTOFF: f64 = 40.0;

/// Largest trapezoid step; small enough for every (ν, x) we see.
const MAX_STEP: f64 = 0.1;

/// Natural log of `K_ν(x)`.
///
/// Returns `+∞` for `x <= 0` (the function diverges at the origin) and NaN
/// for NaN input. `K_ν` is symmetric in ν, so the sign of `nu` is ignored.
pub fn ln_bessel_k(nu: f64, x: f64) -> f64 {
    if x.is_nan() || nu.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x.is_infinite() {
        return f64::NEG_INFINITY;
    }
    let nu = nu.abs();

    // Log of the integrand, peaked at sinh t = ν / x with curvature ≈ √(ν² + x²).
    let ln_integrand = |t: f64| -> f64 {
        -x * t.cosh() + nu * t + (-2.0 * nu * t).exp().ln_1p() - std::f64::consts::LN_2
    };
    let width = (nu * nu + x * x).powf(-0.25);
    let step = MAX_STEP.min(0.25 * width);
    let peak_index = ((nu / x).asinh() / step).round() as u64;
    let peak = ln_integrand(peak_index as f64 * step);
    if !peak.is_finite() {
        return peak;
    }

    // Trapezoid weights on [0, ∞): the node at t = 0 counts half.
    let weight = |k: u64| if k == 0 { 0.5 } else { 1.0 };

    let mut sum = 0.0;
    let mut k = peak_index;
    loop {
        let rel = ln_integrand(k as f64 * step) - peak;
        sum += weight(k) * rel.exp();
        if k > peak_index && rel < -LOG_CUTOFF {
            break;
        }
        k += 1;
    }
    let mut k = peak_index;
    while k > 0 {
        k -= 1;
        let rel = ln_integrand(k as f64 * step) - peak;
        sum += weight(k) * rel.exp();
        if rel < -LOG_CUTOFF {
            break;
        }
    }

    peak + (step * sum).ln()
}

/// Modified Bessel function of the second kind, `K_ν(x)`.
pub fn bessel_k(nu: f64, x: f64) -> f64 {
    ln_bessel_k(nu, x).exp()
}

/// The general Matérn correlation at scaled argument `u = √(2ν)·d/ℓ`:
/// `2^(1-ν) / Γ(ν) · u^ν · K_ν(u)`.
///
/// Evaluated as a single exponent so that the individually overflowing
/// factors cancel for large ν.
pub fn matern_correlation(nu: f64, u: f64) -> f64 {
    let ln_value = (1.0 - nu) * std::f64::consts::LN_2 - ln_gamma(nu)
        + nu * u.ln()
        + ln_bessel_k(nu, u);
    ln_value.exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_half_order_closed_form() {
        for &x in &[1e-12, 0.3, 1.0, 4.0, 50.0] {
            let expected = (std::f64::consts::PI / (2.0 * x)).sqrt() * (-x).exp();
            assert_relative_eq!(bessel_k(0.5, x), expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_reference_values() {
        assert_relative_eq!(bessel_k(0.0, 1.0), 0.421_024_438_240_708_3, max_relative = 1e-12);
        assert_relative_eq!(bessel_k(1.0, 1.0), 0.601_907_230_197_234_6, max_relative = 1e-12);
        // K_{3/2}(x) = √(π/2x) e^{-x} (1 + 1/x)
        let x = 2.0_f64;
        let expected = (std::f64::consts::PI / (2.0 * x)).sqrt() * (-x).exp() * (1.0 + 1.0 / x);
        assert_relative_eq!(bessel_k(1.5, x), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_symmetric_in_order() {
        assert_relative_eq!(bessel_k(-2.3, 0.7), bessel_k(2.3, 0.7), max_relative = 1e-14);
    }

    #[test]
    fn test_degenerate_arguments() {
        assert_eq!(ln_bessel_k(1.0, 0.0), f64::INFINITY);
        assert_eq!(ln_bessel_k(1.0, f64::INFINITY), f64::NEG_INFINITY);
        assert!(ln_bessel_k(f64::NAN, 1.0).is_nan());
    }

    #[test]
    fn test_matern_correlation_limits() {
        // ν = 1/2 reduces to exp(-u)
        for &u in &[1e-10, 0.2, 1.0, 3.0] {
            assert_relative_eq!(matern_correlation(0.5, u), (-u).exp(), max_relative = 1e-10);
        }
        // approaches one at the origin for any ν
        assert_relative_eq!(matern_correlation(1.0, 1e-12), 1.0, max_relative = 1e-6);
    }

    #[test]
    fn test_large_order_stays_finite() {
        let value = matern_correlation(5.0e4, (1.0e5_f64).sqrt());
        assert!(value.is_finite());
        // RBF limit at d/ℓ = 1
        assert_relative_eq!(value, (-0.5_f64).exp(), max_relative = 1e-3);
    }
}
