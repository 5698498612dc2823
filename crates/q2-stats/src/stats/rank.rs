//! Ranking helpers shared by the rank-based tests.

use std::cmp::Ordering;

/// 1-based ranks, with tied values sharing the mean of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1 ..= end
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Sizes of every run of equal values, singletons included.
pub fn tie_counts(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut counts = Vec::new();
    let mut iter = sorted.iter().peekable();
    while let Some(&value) = iter.next() {
        let mut count = 1;
        while iter.next_if(|&&next| next == value).is_some() {
            count += 1;
        }
        counts.push(count);
    }
    counts
}

/// Whether any run reported by [`tie_counts`] holds more than one value.
pub fn has_ties(tie_counts: &[usize]) -> bool {
    tie_counts.iter().any(|&t| t > 1)
}

/// Median of the non-NaN values, NaN when there are none.
pub fn median(values: &[f64]) -> f64 {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    }
}
