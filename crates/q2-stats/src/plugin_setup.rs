//! Construction of the `q2-stats` plugin object
//!
//! The `qiime2.plugins` entry point `q2-stats` names
//! `q2_stats.plugin_setup:plugin`, which resolves to [`plugin`].

use crate::error::{Result, StatsError};
use crate::hypotheses::{self, Alternative, PValueApprox};
use crate::plugin::{
    Action, ActionArgs, InputSpec, OutputSpec, ParameterKind, ParameterSpec, Plugin,
};
use crate::table::StatsTable;
use crate::types::TypeRegistry;
use crate::version;
use q2_stats_manifest::PackageDescriptor;
use serde_json::Value;

/// Package descriptor shipped with the crate.
pub const DESCRIPTOR_TOML: &str = include_str!("../plugin.toml");

/// Object path the `q2-stats` entry point resolves to.
pub const ENTRY_POINT_TARGET: &str = "q2_stats.plugin_setup:plugin";

pub const PLUGIN_NAME: &str = "stats";
pub const PACKAGE: &str = "q2_stats";

const INDEPENDENT_DIST: &str = "Dist1D[Ordered | Unordered, Independent]";
const MATCHED_DIST: &str = "Dist1D[Ordered, Matched]";
const PAIRWISE_STATS: &str = "StatsTable[Pairwise]";

/// Parse and validate the embedded descriptor.
pub fn descriptor() -> Result<PackageDescriptor> {
    let descriptor = PackageDescriptor::from_toml_str(DESCRIPTOR_TOML)?;
    descriptor.validate()?;
    Ok(descriptor)
}

/// Build the plugin with its semantic types and actions.
pub fn plugin() -> Result<Plugin> {
    let descriptor = descriptor()?;
    let mut plugin = Plugin::new(
        PLUGIN_NAME,
        &version::package_version(&descriptor.versioning),
        PACKAGE,
    );
    plugin.website = descriptor
        .repository()
        .unwrap_or("https://github.com/qiime2/q2-stats")
        .to_string();
    plugin.description = "This QIIME 2 plugin supports statistical analyses of \
                          distributions, such as pairwise rank-based hypothesis tests."
        .to_string();
    plugin.short_description = "Plugin for statistical analyses.".to_string();
    plugin.types = TypeRegistry::builtin();

    plugin.register_action(mann_whitney_u_action())?;
    plugin.register_action(wilcoxon_srt_action())?;
    Ok(plugin)
}

fn alternative_param() -> ParameterSpec {
    ParameterSpec {
        name: "alternative",
        kind: ParameterKind::Choice {
            choices: &Alternative::CHOICES,
            invalid: StatsError::InvalidAlternative,
        },
        default: Some(Value::from("two-sided")),
        description: "The alternative hypothesis being tested.",
    }
}

fn p_val_approx_param() -> ParameterSpec {
    ParameterSpec {
        name: "p_val_approx",
        kind: ParameterKind::Choice {
            choices: &PValueApprox::CHOICES,
            invalid: StatsError::InvalidPValueApprox,
        },
        default: Some(Value::from("auto")),
        description: "\"exact\" computes an exact p-value for distributions which do not \
                      contain ties; \"asymptotic\" uses a normal approximation; \"auto\" picks \
                      \"exact\" when one of the groups is small and there are no ties.",
    }
}

fn stats_output() -> OutputSpec {
    OutputSpec {
        name: "stats",
        semantic_type: PAIRWISE_STATS,
        description: "The test statistic and p-value of each comparison, with \
                      Benjamini-Hochberg corrected q-values.",
    }
}

fn mann_whitney_u_action() -> Action {
    Action {
        id: "mann_whitney_u",
        name: "Mann-Whitney U Test",
        description: "Compare the distributions of independent groups with the \
                      Mann-Whitney U test, either against a reference group or between \
                      every pair of groups.",
        inputs: vec![
            InputSpec {
                name: "distribution",
                semantic_type: INDEPENDENT_DIST,
                optional: false,
                description: "The distribution to test.",
            },
            InputSpec {
                name: "against_each",
                semantic_type: INDEPENDENT_DIST,
                optional: true,
                description: "If provided, groups of `distribution` are compared \
                              against the groups of this distribution.",
            },
        ],
        parameters: vec![
            ParameterSpec {
                name: "compare",
                kind: ParameterKind::Choice {
                    choices: &["reference", "all-pairwise"],
                    invalid: |_| StatsError::InvalidComparison("`reference` or `all-pairwise`"),
                },
                default: None,
                description: "\"reference\" compares `reference_group` to every other \
                              group; \"all-pairwise\" compares every pair of groups.",
            },
            ParameterSpec {
                name: "reference_group",
                kind: ParameterKind::Str,
                default: Some(Value::Null),
                description: "The group the other groups are compared to. Required when \
                              `compare` is \"reference\".",
            },
            alternative_param(),
            p_val_approx_param(),
        ],
        outputs: vec![stats_output()],
        callable: run_mann_whitney_u,
    }
}

fn wilcoxon_srt_action() -> Action {
    Action {
        id: "wilcoxon_srt",
        name: "Wilcoxon Signed Rank Test",
        description: "Compare matched measures of the same subjects across groups with \
                      the Wilcoxon signed-rank test.",
        inputs: vec![InputSpec {
            name: "distribution",
            semantic_type: MATCHED_DIST,
            optional: false,
            description: "The matched distribution to test. Every row needs a subject.",
        }],
        parameters: vec![
            ParameterSpec {
                name: "compare",
                kind: ParameterKind::Choice {
                    choices: &["baseline", "consecutive"],
                    invalid: |_| StatsError::InvalidComparison("`baseline` or `consecutive`"),
                },
                default: None,
                description: "\"baseline\" compares `baseline_group` to every other \
                              group; \"consecutive\" compares each group to the next.",
            },
            ParameterSpec {
                name: "baseline_group",
                kind: ParameterKind::Str,
                default: Some(Value::Null),
                description: "The group the other groups are compared to. Required when \
                              `compare` is \"baseline\".",
            },
            alternative_param(),
            p_val_approx_param(),
            ParameterSpec {
                name: "ignore_empty_comparator",
                kind: ParameterKind::Bool,
                default: Some(Value::Bool(false)),
                description: "Report NaN instead of failing when two groups share no \
                              subjects.",
            },
        ],
        outputs: vec![stats_output()],
        callable: run_wilcoxon_srt,
    }
}

fn run_mann_whitney_u(args: &ActionArgs) -> Result<StatsTable> {
    let alternative: Alternative = args.required_str("alternative")?.parse()?;
    let p_val_approx: PValueApprox = args.required_str("p_val_approx")?.parse()?;
    hypotheses::mann_whitney_u(
        args.input("distribution")?,
        args.required_str("compare")?,
        args.str_param("reference_group"),
        args.optional_input("against_each"),
        alternative,
        p_val_approx,
    )
}

fn run_wilcoxon_srt(args: &ActionArgs) -> Result<StatsTable> {
    let alternative: Alternative = args.required_str("alternative")?.parse()?;
    let p_val_approx: PValueApprox = args.required_str("p_val_approx")?.parse()?;
    hypotheses::wilcoxon_srt(
        args.input("distribution")?,
        args.required_str("compare")?,
        args.str_param("baseline_group"),
        alternative,
        p_val_approx,
        args.bool_param("ignore_empty_comparator"),
    )
}
