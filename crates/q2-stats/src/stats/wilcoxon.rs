//! Wilcoxon signed-rank test for paired samples.

use super::rank::{average_ranks, has_ties, tie_counts};
use super::special::{normal_cdf, normal_sf};
use super::{Alternative, PValueApprox, TestOutcome};
use crate::error::{Result, StatsError};

/// Largest number of non-zero differences for which `auto` picks the exact test.
pub const EXACT_MAX_PAIRS: usize = 50;

/// Signed-rank test of the paired differences `x - y`.
///
/// Zero differences are dropped before ranking. The statistic is
/// `min(R+, R-)` for the two-sided test and `R+` otherwise. The exact null
/// distribution is only valid without zeros and without tied `|d|`; an
/// exact request on such data falls back to the normal approximation.
pub fn wilcoxon(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
    method: PValueApprox,
) -> Result<TestOutcome> {
    if x.len() != y.len() {
        return Err(StatsError::PairedLengthMismatch(x.len(), y.len()));
    }
    if x.is_empty() {
        return Err(StatsError::EmptySample);
    }
    if x.iter().chain(y).any(|v| v.is_nan()) {
        return Err(StatsError::NonFiniteMeasure);
    }

    let all: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    let zeros = all.iter().filter(|&&d| d == 0.0).count();
    let d: Vec<f64> = all.into_iter().filter(|&d| d != 0.0).collect();
    if d.is_empty() {
        return Err(StatsError::AllZeroDifferences);
    }

    let n = d.len();
    let abs: Vec<f64> = d.iter().map(|v| v.abs()).collect();
    let ranks = average_ranks(&abs);
    let ties = tie_counts(&abs);
    let tied = has_ties(&ties);

    let r_plus: f64 = d
        .iter()
        .zip(&ranks)
        .filter(|(v, _)| **v > 0.0)
        .map(|(_, r)| r)
        .sum();
    let r_minus: f64 = d
        .iter()
        .zip(&ranks)
        .filter(|(v, _)| **v < 0.0)
        .map(|(_, r)| r)
        .sum();

    let mut method = match method {
        PValueApprox::Auto if n <= EXACT_MAX_PAIRS && zeros == 0 && !tied => PValueApprox::Exact,
        PValueApprox::Auto => PValueApprox::Asymptotic,
        PValueApprox::Exact if zeros > 0 || tied => {
            tracing::warn!(
                zeros,
                tied,
                "exact p-value is unavailable with zero or tied differences, using normal approximation"
            );
            PValueApprox::Asymptotic
        }
        other => other,
    };

    let statistic = match alternative {
        Alternative::TwoSided => r_plus.min(r_minus),
        _ => r_plus,
    };

    let mut p = match method {
        PValueApprox::Exact => exact_p(r_plus, n, alternative),
        _ => asymptotic_p(statistic, r_plus, n, &ties, alternative),
    };
    if !p.is_finite() && method == PValueApprox::Exact {
        tracing::warn!(n, "exact p-value is not finite, using normal approximation");
        method = PValueApprox::Asymptotic;
        p = asymptotic_p(statistic, r_plus, n, &ties, alternative);
    }

    tracing::trace!(r_plus, r_minus, p, method = %method, "wilcoxon signed-rank");
    Ok(TestOutcome {
        statistic,
        p_value: p.clamp(0.0, 1.0),
        method,
    })
}

/// Null probability of each R+ in `0..=n(n+1)/2`: the coefficients of
/// `prod_{k=1..n} (1 + q^k) / 2`.
fn exact_pmf(n: usize) -> Vec<f64> {
    let max = n * (n + 1) / 2;
    let mut c = vec![0.0; max + 1];
    c[0] = 1.0;
    let mut top = 0;
    for k in 1..=n {
        top += k;
        for j in (k..=top).rev() {
            c[j] = (c[j] + c[j - k]) / 2.0;
        }
        for v in &mut c[..k] {
            *v /= 2.0;
        }
    }
    c
}

fn exact_p(r_plus: f64, n: usize, alternative: Alternative) -> f64 {
    let pmf = exact_pmf(n);
    let k = r_plus as usize;
    let upper = || pmf[k..].iter().sum::<f64>();
    let lower = || pmf[..=k].iter().sum::<f64>();

    match alternative {
        Alternative::Greater => upper(),
        Alternative::Less => lower(),
        Alternative::TwoSided => {
            let mid = (pmf.len() - 1) as f64 / 2.0;
            if r_plus == mid {
                1.0
            } else if r_plus > mid {
                2.0 * upper()
            } else {
                2.0 * lower()
            }
        }
    }
}

fn asymptotic_p(
    statistic: f64,
    r_plus: f64,
    n: usize,
    ties: &[usize],
    alternative: Alternative,
) -> f64 {
    let nf = n as f64;
    let mean = nf * (nf + 1.0) / 4.0;
    let tie_term: f64 = ties
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * (t * t - 1.0)
        })
        .sum();
    let se = ((nf * (nf + 1.0) * (2.0 * nf + 1.0) - 0.5 * tie_term) / 24.0).sqrt();
    if se == 0.0 {
        return 1.0;
    }

    match alternative {
        Alternative::TwoSided => 2.0 * normal_sf(((statistic - mean) / se).abs()),
        Alternative::Greater => normal_sf((r_plus - mean) / se),
        Alternative::Less => normal_cdf((r_plus - mean) / se),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() <= 1e-6 * expected.abs().max(1e-12)
    }

    const X: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
    const ZEROS: [f64; 5] = [0.0; 5];

    #[test]
    fn test_exact_pmf_over_sign_assignments() {
        let pmf = exact_pmf(6);
        assert_eq!(pmf.len(), 22);
        assert!(close(pmf.iter().sum::<f64>(), 1.0));
        assert_eq!(pmf[0], 1.0 / 64.0);
        assert_eq!(pmf[3], 2.0 / 64.0);
    }

    #[test]
    fn test_exact_on_many_pairs_stays_finite() {
        // 2^1100 sign assignments exceed f64::MAX
        let x: Vec<f64> = (1..=1100)
            .map(|i| if i % 2 == 0 { i as f64 } else { -(i as f64) })
            .collect();
        let y = vec![0.0; x.len()];

        let exact = wilcoxon(&x, &y, Alternative::TwoSided, PValueApprox::Exact).unwrap();
        let asymptotic = wilcoxon(&x, &y, Alternative::TwoSided, PValueApprox::Asymptotic).unwrap();
        assert_eq!(exact.method, PValueApprox::Exact);
        assert!(exact.p_value.is_finite());
        assert!((exact.p_value - asymptotic.p_value).abs() < 0.01);
    }

    #[test]
    fn test_exact_with_zero_differences_uses_approximation() {
        // differences 0..=5: one zero, no tied magnitudes
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [1.0; 6];
        let exact = wilcoxon(&x, &y, Alternative::TwoSided, PValueApprox::Exact).unwrap();
        let asymptotic = wilcoxon(&x, &y, Alternative::TwoSided, PValueApprox::Asymptotic).unwrap();
        assert_eq!(exact.method, PValueApprox::Asymptotic);
        assert_eq!(exact, asymptotic);
    }

    #[test]
    fn test_all_positive_differences() {
        let two = wilcoxon(&X, &ZEROS, Alternative::TwoSided, PValueApprox::Auto).unwrap();
        assert_eq!(two.method, PValueApprox::Exact);
        assert_eq!(two.statistic, 0.0);
        assert!(close(two.p_value, 0.0625));

        let greater = wilcoxon(&X, &ZEROS, Alternative::Greater, PValueApprox::Auto).unwrap();
        assert_eq!(greater.statistic, 15.0);
        assert!(close(greater.p_value, 0.031_25));

        let less = wilcoxon(&X, &ZEROS, Alternative::Less, PValueApprox::Auto).unwrap();
        assert_eq!(less.statistic, 15.0);
        assert!(close(less.p_value, 1.0));
    }

    #[test]
    fn test_tied_differences_use_approximation() {
        let x = [1.0, 2.5, 3.1, 4.2, 5.7, 6.0];
        let y = [1.5, 2.0, 4.0, 3.0, 7.0, 4.1];

        let auto = wilcoxon(&x, &y, Alternative::TwoSided, PValueApprox::Auto).unwrap();
        assert_eq!(auto.method, PValueApprox::Asymptotic);
        assert!(close(auto.statistic, 9.5));
        assert!(close(auto.p_value, 0.833_484_035_435_862));

        let exact = wilcoxon(&x, &y, Alternative::TwoSided, PValueApprox::Exact).unwrap();
        assert_eq!(exact, auto);
    }

    #[test]
    fn test_zero_differences_are_dropped() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [1.0, 0.0, 1.0, 2.0, 2.0, 1.0];
        let out = wilcoxon(&x, &y, Alternative::TwoSided, PValueApprox::Auto).unwrap();
        assert_eq!(out.method, PValueApprox::Asymptotic);
        assert_eq!(out.statistic, 0.0);
        assert!(close(out.p_value, 0.039_359_505_220_127_05));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            wilcoxon(&[1.0, 2.0], &[1.0, 2.0], Alternative::TwoSided, PValueApprox::Auto),
            Err(StatsError::AllZeroDifferences)
        ));
        assert!(matches!(
            wilcoxon(&[1.0], &[1.0, 2.0], Alternative::TwoSided, PValueApprox::Auto),
            Err(StatsError::PairedLengthMismatch(1, 2))
        ));
        assert!(matches!(
            wilcoxon(&[], &[], Alternative::TwoSided, PValueApprox::Auto),
            Err(StatsError::EmptySample)
        ));
    }
}
