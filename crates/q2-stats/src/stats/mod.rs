//! Rank-based two-sample tests
//!
//! Both tests return a [`TestOutcome`] carrying the statistic, the p-value
//! and the method that actually produced the p-value, which can differ from
//! the requested one (`auto` resolution, or an exact request that the data
//! cannot support).

pub mod mann_whitney;
pub mod rank;
pub mod special;
pub mod wilcoxon;

pub use mann_whitney::mann_whitney_u;
pub use wilcoxon::wilcoxon;

use crate::error::StatsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alternative hypothesis of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    #[default]
    TwoSided,
    Greater,
    Less,
}

impl Alternative {
    pub const CHOICES: [&'static str; 3] = ["two-sided", "greater", "less"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Alternative::TwoSided => "two-sided",
            Alternative::Greater => "greater",
            Alternative::Less => "less",
        }
    }
}

impl FromStr for Alternative {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two-sided" => Ok(Alternative::TwoSided),
            "greater" => Ok(Alternative::Greater),
            "less" => Ok(Alternative::Less),
            other => Err(StatsError::InvalidAlternative(other.to_string())),
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the null distribution is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PValueApprox {
    #[default]
    Auto,
    Exact,
    Asymptotic,
}

impl PValueApprox {
    pub const CHOICES: [&'static str; 3] = ["auto", "exact", "asymptotic"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PValueApprox::Auto => "auto",
            PValueApprox::Exact => "exact",
            PValueApprox::Asymptotic => "asymptotic",
        }
    }
}

impl FromStr for PValueApprox {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(PValueApprox::Auto),
            "exact" => Ok(PValueApprox::Exact),
            "asymptotic" => Ok(PValueApprox::Asymptotic),
            other => Err(StatsError::InvalidPValueApprox(other.to_string())),
        }
    }
}

impl fmt::Display for PValueApprox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
    /// Never `Auto`.
    pub method: PValueApprox,
}

impl TestOutcome {
    /// Placeholder for comparisons that could not be run.
    pub fn undefined(method: PValueApprox) -> Self {
        TestOutcome {
            statistic: f64::NAN,
            p_value: f64::NAN,
            method,
        }
    }
}
