//! Plugin entry points
//!
//! An entry point maps a name within a group (e.g. `q2-stats` in
//! `qiime2.plugins`) to an object path of the form `module.path:object`.
//! Hosts discover plugins by scanning a group and loading every target.

use crate::errors::EntryPointError;
use serde::{Deserialize, Serialize};

/// Group under which the host framework looks for plugins.
pub const PLUGIN_GROUP: &str = "qiime2.plugins";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub group: String,
    pub name: String,
    /// Dotted module path, e.g. `q2_stats.plugin_setup`
    pub module: String,
    /// Object within the module, e.g. `plugin`
    pub attr: String,
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_dotted_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_identifier)
}

impl EntryPoint {
    /// Parse a `module.path:object` target. Trailing extras (`[extra]`) are
    /// ignored.
    pub fn parse(group: &str, name: &str, target: &str) -> Result<Self, EntryPointError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EntryPointError::EmptyName(group.to_string()));
        }

        let invalid = || EntryPointError::InvalidTarget {
            group: group.to_string(),
            name: name.to_string(),
            target: target.to_string(),
        };

        let value = target.split('[').next().unwrap_or(target).trim();
        let (module, attr) = value.split_once(':').ok_or_else(invalid)?;
        let (module, attr) = (module.trim(), attr.trim());
        if !is_dotted_path(module) || !is_dotted_path(attr) {
            return Err(invalid());
        }

        Ok(EntryPoint {
            group: group.to_string(),
            name: name.to_string(),
            module: module.to_string(),
            attr: attr.to_string(),
        })
    }

    /// The `module:object` string this entry point resolves.
    pub fn target(&self) -> String {
        format!("{}:{}", self.module, self.attr)
    }
}

/// Parse an INI-style `entry_points.txt`, returning entries of `group`.
///
/// Malformed lines are skipped.
pub fn parse_entry_points_txt(content: &str, group: &str) -> Vec<EntryPoint> {
    let header = format!("[{}]", group);
    let mut in_group = false;
    let mut entries = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if line.starts_with('[') {
            in_group = line == header;
            continue;
        }

        if !in_group || line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some((name, target)) = line.split_once('=') {
            if let Ok(entry) = EntryPoint::parse(group, name, target) {
                entries.push(entry);
            }
        }
    }

    entries
}

/// Render entry points as `entry_points.txt`, one section per group in
/// first-seen order.
pub fn render_entry_points_txt(entries: &[EntryPoint]) -> String {
    let mut groups: Vec<&str> = Vec::new();
    for entry in entries {
        if !groups.contains(&entry.group.as_str()) {
            groups.push(&entry.group);
        }
    }

    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", group));
        for entry in entries.iter().filter(|e| e.group == *group) {
            out.push_str(&format!("{} = {}\n", entry.name, entry.target()));
        }
    }
    out
}
