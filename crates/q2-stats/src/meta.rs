//! Multiple-testing correction across the rows of a statistics table.

use crate::table::StatsTable;

/// Benjamini-Hochberg adjusted p-values.
///
/// NaN p-values are left out of the family size and map to NaN.
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = p_values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, p)| !p.is_nan())
        .collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let m = indexed.len() as f64;
    let mut adjusted = vec![f64::NAN; p_values.len()];
    let mut cummin = f64::INFINITY;
    for (i, &(idx, p)) in indexed.iter().enumerate().rev() {
        let rank = (i + 1) as f64;
        cummin = cummin.min(p * m / rank).min(1.0);
        adjusted[idx] = cummin;
    }
    adjusted
}

/// Fill the `q-value` column of `table` from its `p-value` column.
pub fn fdr_benjamini_hochberg(table: &mut StatsTable) {
    let p_values: Vec<f64> = table.rows.iter().map(|r| r.p_value).collect();
    for (row, q) in table.rows.iter_mut().zip(benjamini_hochberg(&p_values)) {
        row.q_value = q;
    }
    table.set_attrs(
        "q-value",
        "Benjamini-Hochberg FDR",
        "False discovery rate corrected p-value using the Benjamini-Hochberg procedure.",
    );
    tracing::debug!("applied Benjamini-Hochberg correction to {} rows", table.len());
}
