//! Pairwise group comparisons producing a [`StatsTable`].

use super::util::{set_pairwise_attrs, PairwiseDescription};
use crate::error::{Result, StatsError};
use crate::meta::fdr_benjamini_hochberg;
use crate::stats::{self, rank::median, Alternative, PValueApprox, TestOutcome};
use crate::table::{Distribution, GroupValue, PairwiseRow, StatsTable};
use std::collections::HashMap;

/// A comparison between a group of one input and a group of another
/// (0 is the main distribution, 1 is `against_each`).
type Comparison = ((usize, GroupValue), (usize, GroupValue));

/// Compare groups of independent observations with the Mann-Whitney U test.
///
/// `compare` is `reference` (the reference group against every other group,
/// or against every group of `against_each`) or `all-pairwise` (every pair
/// of groups, or every group against every group of `against_each`).
pub fn mann_whitney_u(
    distribution: &Distribution,
    compare: &str,
    reference_group: Option<&str>,
    against_each: Option<&Distribution>,
    alternative: Alternative,
    p_val_approx: PValueApprox,
) -> Result<StatsTable> {
    let mut dists = vec![distribution];
    if let Some(other) = against_each {
        dists.push(other);
    }

    let comparisons = match compare {
        "reference" => comp_reference(distribution, reference_group, against_each)?,
        "all-pairwise" => {
            if reference_group.is_some() {
                return Err(StatsError::ConflictingGroupParameter {
                    selected: "all-pairwise",
                    param: "reference_group",
                    instead: "reference",
                });
            }
            comp_all_pairwise(distribution, against_each)
        }
        _ => return Err(StatsError::InvalidComparison("`reference` or `all-pairwise`")),
    };

    let mut rows = Vec::with_capacity(comparisons.len());
    for ((idx_a, comp_a), (idx_b, comp_b)) in comparisons {
        let a = dists[idx_a].measures(&comp_a);
        let b = dists[idx_b].measures(&comp_b);
        let outcome = stats::mann_whitney_u(&a, &b, alternative, p_val_approx)?;
        tracing::debug!(
            "{} vs {}: U={} p={} ({})",
            comp_a,
            comp_b,
            outcome.statistic,
            outcome.p_value,
            outcome.method
        );

        rows.push(PairwiseRow {
            a_group: comp_a,
            a_n: a.len(),
            a_measure: median(&a),
            b_group: comp_b,
            b_n: b.len(),
            b_measure: median(&b),
            n: a.len() + b.len(),
            test_statistic: outcome.statistic,
            p_value: outcome.p_value,
            q_value: f64::NAN,
        });
    }

    if rows.is_empty() {
        return Err(StatsError::NotEnoughGroups);
    }

    let mut table = StatsTable::new(rows);
    fdr_benjamini_hochberg(&mut table);

    let null_desc = match p_val_approx {
        PValueApprox::Auto => {
            "considered either asymptotically normal, or, if there are no ties and few \
             observations, the exact Mann-Whitney U distribution."
        }
        PValueApprox::Asymptotic => " asymptotically normal",
        PValueApprox::Exact => " the exact Mann-Whitney U distribution",
    };
    let group_b = against_each.unwrap_or(distribution);
    set_pairwise_attrs(
        &mut table,
        distribution,
        group_b,
        &PairwiseDescription {
            group_measure: "Median",
            test_stat: "Mann-Whitney U",
            test_desc: "The Mann-Whitney U test statistic of group A.",
            p_val: format!("{}, {}", alternative, p_val_approx),
            null_desc,
        },
    );
    Ok(table)
}

/// Compare matched observations of the same subjects with the Wilcoxon
/// signed-rank test.
///
/// `compare` is `baseline` (the baseline group against every later group)
/// or `consecutive` (each group against the next in sorted order). Subjects
/// are matched within each comparison; those without a measure in both
/// groups are dropped.
pub fn wilcoxon_srt(
    distribution: &Distribution,
    compare: &str,
    baseline_group: Option<&str>,
    alternative: Alternative,
    p_val_approx: PValueApprox,
    ignore_empty_comparator: bool,
) -> Result<StatsTable> {
    let comparisons = match compare {
        "baseline" => comp_baseline(distribution, baseline_group)?,
        "consecutive" => {
            if baseline_group.is_some() {
                return Err(StatsError::ConflictingGroupParameter {
                    selected: "consecutive",
                    param: "baseline_group",
                    instead: "baseline",
                });
            }
            comp_consecutive(distribution)
        }
        _ => return Err(StatsError::InvalidComparison("`baseline` or `consecutive`")),
    };

    let mut rows = Vec::with_capacity(comparisons.len());
    for (comp_a, comp_b) in comparisons {
        let a = distribution.subject_measures(&comp_a)?;
        let b = distribution.subject_measures(&comp_b)?;
        let (x, y) = match_subjects(&a, &b);

        let outcome = if x.is_empty() {
            if !ignore_empty_comparator {
                return Err(StatsError::NoSubjectOverlap {
                    group_a: comp_a.to_string(),
                    group_b: comp_b.to_string(),
                    subjects_a: a.into_iter().map(|(s, _)| s).collect(),
                    subjects_b: b.into_iter().map(|(s, _)| s).collect(),
                });
            }
            tracing::warn!("no subject overlap between {} and {}, recording NaN", comp_a, comp_b);
            TestOutcome::undefined(p_val_approx)
        } else {
            stats::wilcoxon(&x, &y, alternative, p_val_approx)?
        };

        let a_measures: Vec<f64> = a.iter().map(|(_, m)| *m).collect();
        let b_measures: Vec<f64> = b.iter().map(|(_, m)| *m).collect();
        rows.push(PairwiseRow {
            a_group: comp_a,
            a_n: a.len(),
            a_measure: median(&a_measures),
            b_group: comp_b,
            b_n: b.len(),
            b_measure: median(&b_measures),
            n: x.len(),
            test_statistic: outcome.statistic,
            p_value: outcome.p_value,
            q_value: f64::NAN,
        });
    }

    if rows.is_empty() {
        return Err(StatsError::NotEnoughGroups);
    }

    let mut table = StatsTable::new(rows);
    fdr_benjamini_hochberg(&mut table);

    let null_desc = match p_val_approx {
        PValueApprox::Auto => {
            "considered either asymptotically normal, or, if there are no ties and few \
             observations, the exact Wilcoxon T distribution."
        }
        PValueApprox::Asymptotic => " asymptotically normal",
        PValueApprox::Exact => " the exact Wilcoxon T distribution",
    };
    set_pairwise_attrs(
        &mut table,
        distribution,
        distribution,
        &PairwiseDescription {
            group_measure: "Median",
            test_stat: "Wilcoxon T",
            test_desc: "The sum of rank differences.",
            p_val: format!("{}, {}", alternative, p_val_approx),
            null_desc,
        },
    );
    Ok(table)
}

/// Resolve a user-supplied group, failing when the parameter is absent.
fn get_reference(
    distribution: &Distribution,
    value: Option<&str>,
    param_name: &'static str,
) -> Result<GroupValue> {
    let value = value.ok_or(StatsError::MissingGroupParameter(param_name))?;
    distribution.resolve_group(value)
}

fn comp_reference(
    distribution: &Distribution,
    reference_group: Option<&str>,
    against_each: Option<&Distribution>,
) -> Result<Vec<Comparison>> {
    let reference = get_reference(distribution, reference_group, "reference_group")?;

    let comparisons = match against_each {
        None => distribution
            .groups()
            .into_iter()
            .filter(|g| g != &reference)
            .map(|other| ((0, reference.clone()), (0, other)))
            .collect(),
        Some(each) => each
            .groups()
            .into_iter()
            .map(|other| ((0, reference.clone()), (1, other)))
            .collect(),
    };
    Ok(comparisons)
}

fn comp_all_pairwise(
    distribution: &Distribution,
    against_each: Option<&Distribution>,
) -> Vec<Comparison> {
    let groups = distribution.groups();
    match against_each {
        None => {
            let mut comparisons = Vec::new();
            for (i, a) in groups.iter().enumerate() {
                for b in &groups[i + 1..] {
                    comparisons.push(((0, a.clone()), (0, b.clone())));
                }
            }
            comparisons
        }
        Some(each) => {
            let others = each.groups();
            groups
                .iter()
                .flat_map(|a| others.iter().map(move |b| ((0, a.clone()), (1, b.clone()))))
                .collect()
        }
    }
}

fn comp_baseline(
    distribution: &Distribution,
    baseline_group: Option<&str>,
) -> Result<Vec<(GroupValue, GroupValue)>> {
    let baseline = get_reference(distribution, baseline_group, "baseline_group")?;
    Ok(distribution
        .groups()
        .into_iter()
        .filter(|g| g != &baseline)
        .map(|other| (baseline.clone(), other))
        .collect())
}

fn comp_consecutive(distribution: &Distribution) -> Vec<(GroupValue, GroupValue)> {
    let groups = distribution.groups();
    groups
        .windows(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Pair measures by subject, keeping subjects measured in both groups.
fn match_subjects(a: &[(String, f64)], b: &[(String, f64)]) -> (Vec<f64>, Vec<f64>) {
    let lookup: HashMap<&str, f64> = b.iter().map(|(s, m)| (s.as_str(), *m)).collect();
    a.iter()
        .filter(|(_, ma)| !ma.is_nan())
        .filter_map(|(s, ma)| {
            lookup
                .get(s.as_str())
                .filter(|mb| !mb.is_nan())
                .map(|mb| (*ma, *mb))
        })
        .unzip()
}
