use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Value of a `group` column: numeric (e.g. timepoints) or a label.
///
/// Groups are totally ordered: numbers first by value, then text
/// lexicographically. Sorted group lists drive comparison order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupValue {
    Number(f64),
    Text(String),
}

impl GroupValue {
    /// Parse a raw cell, preferring a number when the text is one.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) => GroupValue::Number(n),
            Err(_) => GroupValue::Text(raw.to_string()),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, GroupValue::Number(_))
    }

    /// Exact match of a label against user input. Numbers never match.
    pub fn matches_text(&self, raw: &str) -> bool {
        match self {
            GroupValue::Text(s) => s == raw,
            GroupValue::Number(_) => false,
        }
    }

    pub fn matches_number(&self, value: f64) -> bool {
        match self {
            GroupValue::Number(n) => *n == value,
            GroupValue::Text(_) => false,
        }
    }
}

impl PartialEq for GroupValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupValue {}

impl PartialOrd for GroupValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupValue::Number(a), GroupValue::Number(b)) => a.total_cmp(b),
            (GroupValue::Number(_), GroupValue::Text(_)) => Ordering::Less,
            (GroupValue::Text(_), GroupValue::Number(_)) => Ordering::Greater,
            (GroupValue::Text(a), GroupValue::Text(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::Number(n) => write!(f, "{}", n),
            GroupValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for GroupValue {
    fn from(s: &str) -> Self {
        GroupValue::Text(s.to_string())
    }
}

impl From<f64> for GroupValue {
    fn from(n: f64) -> Self {
        GroupValue::Number(n)
    }
}
