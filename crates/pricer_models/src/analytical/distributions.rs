//! Standard normal distribution functions.

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Complementary error function.
///
/// Abramowitz and Stegun 7.1.26; maximum absolute error 1.5e-7.
#[inline]
fn erfc_approx(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + P * abs_x);
    let poly = A1 + t * (A2 + t * (A3 + t * (A4 + t * A5)));
    let erfc_abs = t * poly * (-abs_x * abs_x).exp();

    if x < 0.0 {
        2.0 - erfc_abs
    } else {
        erfc_abs
    }
}

/// Standard normal cumulative distribution function.
///
/// Φ(x) = erfc(-x / √2) / 2
///
/// # Examples
/// ```
/// use pricer_models::analytical::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(-3.0) < 0.01);
/// assert!(norm_cdf(3.0) > 0.99);
/// ```
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc_approx(-x / std::f64::consts::SQRT_2)
}

/// Standard normal probability density function.
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}
