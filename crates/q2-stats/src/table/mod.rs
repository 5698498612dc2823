//! Tabular inputs and outputs
//!
//! Distributions are read from JSONL or TSV; statistics tables are written
//! to either. Each column carries an optional title and description that
//! travel with the JSONL header.

pub mod distribution;
pub mod group;
pub mod jsonl;
pub mod stats_table;
pub mod tsv;

pub use distribution::{DistRow, Distribution, DIST1D_DOCTYPE};
pub use group::GroupValue;
pub use stats_table::{PairwiseRow, StatsTable, COLUMNS, PAIRWISE_DOCTYPE};

use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAttrs {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Tsv,
}

impl OutputFormat {
    pub const CHOICES: [&'static str; 2] = ["jsonl", "tsv"];

    /// Format implied by a file extension; `.jsonl` is JSONL, anything else TSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => OutputFormat::Jsonl,
            _ => OutputFormat::Tsv,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Tsv => "tsv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "tsv" => Ok(OutputFormat::Tsv),
            _ => Err(StatsError::InvalidOutputFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read a distribution, choosing the parser from the file extension.
pub fn read_distribution(path: &Path) -> Result<Distribution> {
    let reader = BufReader::new(File::open(path)?);
    let dist = match OutputFormat::from_path(path) {
        OutputFormat::Jsonl => Distribution::from_jsonl(reader)?,
        OutputFormat::Tsv => Distribution::from_tsv(reader)?,
    };
    tracing::debug!(
        "read {} rows in {} groups from {}",
        dist.rows.len(),
        dist.groups().len(),
        path.display()
    );
    Ok(dist)
}

pub fn write_stats_table<W: Write>(
    table: &StatsTable,
    writer: &mut W,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Jsonl => table.to_jsonl(writer),
        OutputFormat::Tsv => table.to_tsv(writer),
    }
}
