//! Complementary error function and the standard normal tails built on it.
//!
//! `erfc` uses the Chebyshev fit from Numerical Recipes (`erfcc`), which
//! keeps a fractional error below 1.2 × 10⁻⁷ everywhere, including the far
//! tails where `1 - erf(x)` would cancel catastrophically.

/// Complementary error function, erfc(x) = 1 − erf(x).
#[must_use]
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / 0.5f64.mul_add(z, 1.0);
    let poly = 0.170_872_77_f64
        .mul_add(t, -0.822_152_23)
        .mul_add(t, 1.488_515_87)
        .mul_add(t, -1.135_203_98)
        .mul_add(t, 0.278_868_07)
        .mul_add(t, -0.186_288_06)
        .mul_add(t, 0.096_784_18)
        .mul_add(t, 0.374_091_96)
        .mul_add(t, 1.000_023_68)
        .mul_add(t, -1.265_512_23);
    let ans = t * (-z).mul_add(z, poly).exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Upper tail of the standard normal, P(Z > z).
#[must_use]
pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / std::f64::consts::SQRT_2)
}

/// Standard normal CDF, P(Z ≤ z).
#[must_use]
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}
