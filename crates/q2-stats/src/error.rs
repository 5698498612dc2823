//! Centralized error type for the q2-stats library
//!
//! Messages for invalid user input mirror the wording users of the plugin
//! already know from the host framework.

use q2_stats_manifest::DescriptorError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse {format} table at line {line}: {message}")]
    TableParse {
        format: &'static str,
        line: usize,
        message: String,
    },

    #[error("Column '{0}' is required but missing")]
    MissingColumn(String),

    #[error("Failed to serialize table: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid comparison. Please either choose {0} as your comparison.")]
    InvalidComparison(&'static str),

    #[error(
        "`{selected}` was selected as the comparison, but a `{param}` was added. Please \
         either select `{instead}` as the comparison, or remove the `{param}` parameter \
         from your command."
    )]
    ConflictingGroupParameter {
        selected: &'static str,
        param: &'static str,
        instead: &'static str,
    },

    #[error(
        "Invalid `alternative` hypothesis selected. Please either choose `two-sided`, \
         `greater` or `less` as your alternative hypothesis."
    )]
    InvalidAlternative(String),

    #[error(
        "Invalid `p_val_approx` selected. Please either choose `auto`, `exact` or \
         `asymptotic` as your p-value approximation."
    )]
    InvalidPValueApprox(String),

    #[error("Invalid output format '{0}'. Please either choose `jsonl` or `tsv`.")]
    InvalidOutputFormat(String),

    #[error("{0} must be provided.")]
    MissingGroupParameter(&'static str),

    /// Holds the value as the user typed it.
    #[error("{} was not found as a group within the distribution.", group_repr(.0))]
    GroupNotFound(String),

    #[error("Not enough groups to compare.")]
    NotEnoughGroups,

    #[error(
        "There is no subject overlap between Group {group_a} and Group {group_b}. There has \
         to be at least 1 subject overlap between the groups. Group {group_a} contains these \
         subjects: {} and Group {group_b} contains these subjects: {}",
        list_repr(.subjects_a),
        list_repr(.subjects_b)
    )]
    NoSubjectOverlap {
        group_a: String,
        group_b: String,
        subjects_a: Vec<String>,
        subjects_b: Vec<String>,
    },

    #[error("Subject '{subject}' appears more than once in group {group}.")]
    DuplicateSubject { group: String, subject: String },

    #[error("Cannot compute a test statistic for an empty sample.")]
    EmptySample,

    #[error("The input contains NaN measures.")]
    NonFiniteMeasure,

    #[error("Paired samples must have equal lengths (got {0} and {1}).")]
    PairedLengthMismatch(usize, usize),

    #[error("All paired differences are zero; the signed-rank test is undefined.")]
    AllZeroDifferences,

    #[error("Invalid semantic type: {0}")]
    InvalidType(String),

    #[error("No plugin is registered for entry point target '{0}'")]
    EntryPointNotFound(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("Action '{0}' not found")]
    ActionNotFound(String),

    #[error("Missing required input '{0}'")]
    MissingInput(String),

    #[error("Invalid value for parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// Quote text the way the host language's `repr` does.
fn text_repr(s: &str) -> String {
    if s.contains('\'') && !s.contains('"') {
        format!("\"{}\"", s.replace('\\', "\\\\"))
    } else {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// A requested group is reported as a float when it parses as one, else as quoted text.
fn group_repr(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_nan() => "nan".to_string(),
        Ok(v) if v == f64::INFINITY => "inf".to_string(),
        Ok(v) if v == f64::NEG_INFINITY => "-inf".to_string(),
        Ok(v) if v.fract() == 0.0 && v.abs() < 1e16 => format!("{:.1}", v),
        Ok(v) => v.to_string(),
        Err(_) => text_repr(raw),
    }
}

fn list_repr(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| text_repr(s)).collect();
    format!("[{}]", quoted.join(", "))
}
