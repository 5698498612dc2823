use crate::table::{Distribution, StatsTable};

/// Wording used to describe one kind of pairwise test in the output table.
#[derive(Debug, Clone)]
pub struct PairwiseDescription<'a> {
    /// Summary of each group's measure, e.g. "Median"
    pub group_measure: &'a str,
    /// Name of the statistic, e.g. "Mann-Whitney U"
    pub test_stat: &'a str,
    pub test_desc: &'a str,
    /// "<alternative>, <p-value approximation>"
    pub p_val: String,
    pub null_desc: &'a str,
}

/// Title and describe every column of a pairwise table.
///
/// Group columns inherit the attributes of the `group` column of the
/// distribution they were drawn from.
pub fn set_pairwise_attrs(
    table: &mut StatsTable,
    group_a: &Distribution,
    group_b: &Distribution,
    desc: &PairwiseDescription<'_>,
) {
    for (column, source) in [("A:group", group_a), ("B:group", group_b)] {
        let attrs = source.column_attrs("group");
        table.set_attrs(
            column,
            attrs.title.unwrap_or_else(|| column.to_string()),
            attrs.description.unwrap_or_default(),
        );
    }

    table.set_attrs("A:n", "count", "Number of observations in group A.");
    table.set_attrs("B:n", "count", "Number of observations in group B.");

    for (column, side, source) in [("A:measure", "A", group_a), ("B:measure", "B", group_b)] {
        let measure = source.column_attrs("measure");
        let title = match measure.title {
            Some(t) => format!("{} {}", desc.group_measure, t),
            None => desc.group_measure.to_string(),
        };
        table.set_attrs(
            column,
            title,
            format!("{} of the measure in group {}.", desc.group_measure, side),
        );
    }

    table.set_attrs(
        "n",
        "count",
        "Number of observations or matched pairs entering the comparison.",
    );
    table.set_attrs("test-statistic", desc.test_stat, desc.test_desc);
    table.set_attrs(
        "p-value",
        "p-value",
        format!(
            "p-value ({}); the null distribution is {}",
            desc.p_val,
            desc.null_desc.trim()
        ),
    );
}
