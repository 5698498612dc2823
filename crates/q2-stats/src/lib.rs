//! q2-stats: statistical tests over distributions, packaged as a plugin
//!
//! - [`table`]: distributions and statistics tables, JSONL and TSV formats
//! - [`stats`]: Mann-Whitney U and Wilcoxon signed-rank kernels
//! - [`meta`]: Benjamini-Hochberg correction
//! - [`hypotheses`]: pairwise comparisons between groups
//! - [`types`]: semantic types and type expressions
//! - [`plugin`], [`plugin_setup`]: the plugin object and its entry point

pub mod error;
pub mod hypotheses;
pub mod meta;
pub mod plugin;
pub mod plugin_setup;
pub mod stats;
pub mod table;
pub mod types;
pub mod version;

pub use error::{Result, StatsError};
pub use plugin::{Action, ActionArgs, Plugin};
pub use stats::{Alternative, PValueApprox, TestOutcome};
pub use table::{Distribution, GroupValue, OutputFormat, PairwiseRow, StatsTable};
