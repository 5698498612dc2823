//! Mann-Whitney U test for two independent samples.

use super::rank::{average_ranks, has_ties, tie_counts};
use super::special::normal_sf;
use super::{Alternative, PValueApprox, TestOutcome};
use crate::error::{Result, StatsError};

/// Largest smaller-sample size for which `auto` still picks the exact test.
pub const EXACT_MAX_SMALLER_SAMPLE: usize = 8;

/// Mann-Whitney U test of `x` against `y`.
///
/// The reported statistic is U of `x`. `auto` uses the exact null
/// distribution when there are no ties and either sample has at most
/// [`EXACT_MAX_SMALLER_SAMPLE`] observations, otherwise the tie-corrected
/// normal approximation with continuity correction.
pub fn mann_whitney_u(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
    method: PValueApprox,
) -> Result<TestOutcome> {
    if x.is_empty() || y.is_empty() {
        return Err(StatsError::EmptySample);
    }
    if x.iter().chain(y).any(|v| v.is_nan()) {
        return Err(StatsError::NonFiniteMeasure);
    }

    let (n1, n2) = (x.len(), y.len());
    let combined: Vec<f64> = x.iter().chain(y).copied().collect();
    let ranks = average_ranks(&combined);
    let ties = tie_counts(&combined);

    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let r1: f64 = ranks[..n1].iter().sum();
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;

    let mut method = match method {
        PValueApprox::Auto => {
            if !has_ties(&ties) && n1.min(n2) <= EXACT_MAX_SMALLER_SAMPLE {
                PValueApprox::Exact
            } else {
                PValueApprox::Asymptotic
            }
        }
        other => other,
    };

    let u = match alternative {
        Alternative::Greater => u1,
        Alternative::Less => u2,
        Alternative::TwoSided => u1.max(u2),
    };

    let mut p = match method {
        PValueApprox::Exact => exact_sf(u, n1, n2),
        _ => asymptotic_sf(u, n1, n2, &ties),
    };
    if !p.is_finite() && method == PValueApprox::Exact {
        tracing::warn!(n1, n2, "exact p-value is not finite, using normal approximation");
        method = PValueApprox::Asymptotic;
        p = asymptotic_sf(u, n1, n2, &ties);
    }
    if alternative == Alternative::TwoSided {
        p *= 2.0;
    }

    tracing::trace!(u1, u2, p, method = %method, "mann-whitney u");
    Ok(TestOutcome {
        statistic: u1,
        p_value: p.clamp(0.0, 1.0),
        method,
    })
}

/// Null probability of each U in `0..=m*n`.
///
/// These are the coefficients of the Gaussian binomial
/// `prod_{i=1..m} (1 - q^(n+i)) / (1 - q^i)`, built one factor at a time.
/// After factor `i` the coefficients sum to `C(n+i, i)`, so each step is
/// rescaled by `i / (n+i)` to keep the running total at one.
fn exact_pmf(m: usize, n: usize) -> Vec<f64> {
    let mut c = vec![0.0; m * n + m + 1];
    c[0] = 1.0;
    for i in 1..=m {
        let a = n + i;
        for k in (a..c.len()).rev() {
            c[k] -= c[k - a];
        }
        for k in i..c.len() {
            c[k] += c[k - i];
        }
        let scale = i as f64 / a as f64;
        c.iter_mut().for_each(|v| *v *= scale);
    }
    c.truncate(m * n + 1);
    c
}

/// P(U >= u) under the exact null distribution.
fn exact_sf(u: f64, n1: usize, n2: usize) -> f64 {
    let pmf = exact_pmf(n1.min(n2), n1.max(n2));
    let k = u.floor().max(0.0) as usize;
    if k >= pmf.len() {
        return 0.0;
    }
    pmf[k..].iter().sum::<f64>()
}

/// P(U >= u) from the tie-corrected normal approximation.
fn asymptotic_sf(u: f64, n1: usize, n2: usize, ties: &[usize]) -> f64 {
    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let n = n1f + n2f;
    let mu = n1f * n2f / 2.0;

    let tie_term: f64 = ties
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let var = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if var <= 0.0 {
        return 1.0;
    }

    let z = (u - mu - 0.5) / var.sqrt();
    normal_sf(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() <= 1e-6 * expected.abs().max(1e-12)
    }

    fn brute_force_counts(m: usize, n: usize) -> Vec<f64> {
        // every m-subset of 0..m+n is a placement of the first sample
        let mut counts = vec![0.0; m * n + 1];
        let total = m + n;
        for mask in 0u32..(1 << total) {
            if mask.count_ones() as usize != m {
                continue;
            }
            let mut u = 0;
            let mut ys_below = 0;
            for pos in 0..total {
                if mask & (1 << pos) != 0 {
                    u += ys_below;
                } else {
                    ys_below += 1;
                }
            }
            counts[u] += 1.0;
        }
        counts
    }

    fn binomial(n: usize, k: usize) -> f64 {
        (1..=k).fold(1.0, |acc, i| acc * (n + 1 - i) as f64 / i as f64)
    }

    #[test]
    fn test_exact_pmf_matches_enumeration() {
        for (m, n) in [(3, 4), (5, 5), (2, 7), (4, 8)] {
            let total = binomial(m + n, m);
            let pmf = exact_pmf(m, n);
            let counts = brute_force_counts(m, n);
            assert_eq!(pmf.len(), counts.len());
            for (p, c) in pmf.iter().zip(&counts) {
                assert!((p * total - c).abs() < 1e-9, "m={m} n={n}");
            }
        }
    }

    #[test]
    fn test_exact_on_large_samples_stays_finite() {
        // C(1040, 520) exceeds f64::MAX, so raw arrangement counts would overflow.
        let x: Vec<f64> = (0..520).map(|i| (2 * i) as f64).collect();
        let y: Vec<f64> = (0..520).map(|i| (2 * i + 1) as f64).collect();

        let exact = mann_whitney_u(&x, &y, Alternative::TwoSided, PValueApprox::Exact).unwrap();
        let asymptotic =
            mann_whitney_u(&x, &y, Alternative::TwoSided, PValueApprox::Asymptotic).unwrap();
        assert_eq!(exact.method, PValueApprox::Exact);
        assert!(exact.p_value.is_finite());
        assert!((exact.p_value - asymptotic.p_value).abs() < 0.01);
    }

    #[test]
    fn test_separated_samples_exact() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [6.0, 7.0, 8.0, 9.0, 10.0];

        let two = mann_whitney_u(&x, &y, Alternative::TwoSided, PValueApprox::Auto).unwrap();
        assert_eq!(two.statistic, 0.0);
        assert_eq!(two.method, PValueApprox::Exact);
        assert!(close(two.p_value, 2.0 / 252.0));

        let less = mann_whitney_u(&x, &y, Alternative::Less, PValueApprox::Exact).unwrap();
        assert!(close(less.p_value, 1.0 / 252.0));

        let greater = mann_whitney_u(&x, &y, Alternative::Greater, PValueApprox::Exact).unwrap();
        assert!(close(greater.p_value, 1.0));
    }

    #[test]
    fn test_separated_samples_asymptotic() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [6.0, 7.0, 8.0, 9.0, 10.0];
        let out = mann_whitney_u(&x, &y, Alternative::TwoSided, PValueApprox::Asymptotic).unwrap();
        assert_eq!(out.method, PValueApprox::Asymptotic);
        assert!(close(out.p_value, 0.012_185_779_678_704_638));
    }

    #[test]
    fn test_unequal_sizes_exact() {
        let x = [1.1, 3.4, 2.2, 5.0];
        let y = [4.1, 6.3, 7.7, 8.0, 9.9, 0.5];
        let out = mann_whitney_u(&x, &y, Alternative::TwoSided, PValueApprox::Auto).unwrap();
        assert_eq!(out.statistic, 5.0);
        assert!(close(out.p_value, 0.171_428_571_428_571_43));
    }

    #[test]
    fn test_ties_force_asymptotic() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [2.0, 3.0, 4.0, 5.0];
        let out = mann_whitney_u(&x, &y, Alternative::TwoSided, PValueApprox::Auto).unwrap();
        assert_eq!(out.method, PValueApprox::Asymptotic);
        assert_eq!(out.statistic, 2.5);
        assert!(close(out.p_value, 0.136_658_249_586_398_47));
    }

    #[test]
    fn test_all_values_tied() {
        let out = mann_whitney_u(&[1.0, 1.0], &[1.0, 1.0], Alternative::TwoSided, PValueApprox::Auto)
            .unwrap();
        assert_eq!(out.statistic, 2.0);
        assert_eq!(out.p_value, 1.0);
    }

    #[test]
    fn test_rejects_empty_and_nan() {
        assert!(matches!(
            mann_whitney_u(&[], &[1.0], Alternative::TwoSided, PValueApprox::Auto),
            Err(StatsError::EmptySample)
        ));
        assert!(matches!(
            mann_whitney_u(&[f64::NAN], &[1.0], Alternative::TwoSided, PValueApprox::Auto),
            Err(StatsError::NonFiniteMeasure)
        ));
    }
}
