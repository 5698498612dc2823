//! Package descriptor
//!
//! Static metadata read once at build or load time: identity, authorship,
//! license, URLs, build requirements, entry points and the rules used to
//! derive the version from VCS state.

use crate::entry_point::EntryPoint;
use crate::errors::DescriptorError;
use crate::version::VersioningConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License reference: an SPDX expression, a file, or inline text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum License {
    Spdx(String),
    File { file: String },
    Text { text: String },
}

impl License {
    fn is_empty(&self) -> bool {
        match self {
            License::Spdx(s) | License::File { file: s } | License::Text { text: s } => {
                s.trim().is_empty()
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    /// A literal version. Must be absent: the version is always derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Fields computed at build time (must contain `version`).
    #[serde(default)]
    pub dynamic: Vec<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default)]
    pub urls: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSystem {
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct PackageDescriptor {
    pub package: PackageMetadata,
    #[serde(default)]
    pub build_system: BuildSystem,
    /// group -> (name -> `module:object`)
    #[serde(default)]
    pub entry_points: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub versioning: VersioningConfig,
}

impl PackageDescriptor {
    pub fn from_toml_str(content: &str) -> Result<Self, DescriptorError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Every declared entry point, ordered by group then name.
    pub fn entry_points(&self) -> Result<Vec<EntryPoint>, DescriptorError> {
        let mut entries = Vec::new();
        for (group, items) in &self.entry_points {
            for (name, target) in items {
                entries.push(EntryPoint::parse(group, name, target)?);
            }
        }
        Ok(entries)
    }

    pub fn entry_points_in(&self, group: &str) -> Result<Vec<EntryPoint>, DescriptorError> {
        Ok(self
            .entry_points()?
            .into_iter()
            .filter(|ep| ep.group == group)
            .collect())
    }

    pub fn homepage(&self) -> Option<&str> {
        self.package.urls.get("homepage").map(String::as_str)
    }

    pub fn repository(&self) -> Option<&str> {
        self.package.urls.get("repository").map(String::as_str)
    }

    /// Check that every declared field is present and well formed.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let pkg = &self.package;
        let missing = |field: &str| DescriptorError::MissingField(field.to_string());

        if pkg.name.trim().is_empty() {
            return Err(missing("package.name"));
        }
        if pkg.authors.is_empty() || pkg.authors.iter().any(|a| a.name.trim().is_empty()) {
            return Err(missing("package.authors"));
        }
        if pkg
            .description
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
        {
            return Err(missing("package.description"));
        }
        if pkg.license.as_ref().map_or(true, License::is_empty) {
            return Err(missing("package.license"));
        }
        if let Some(version) = &pkg.version {
            return Err(DescriptorError::StaticVersion(version.clone()));
        }
        if !pkg.dynamic.iter().any(|f| f == "version") {
            return Err(missing("package.dynamic"));
        }
        if self.homepage().map_or(true, |u| u.trim().is_empty()) {
            return Err(missing("package.urls.homepage"));
        }
        if self.repository().map_or(true, |u| u.trim().is_empty()) {
            return Err(missing("package.urls.repository"));
        }
        if self.build_system.requires.is_empty() {
            return Err(missing("build-system.requires"));
        }
        if self.entry_points.values().all(BTreeMap::is_empty) {
            return Err(missing("entry-points"));
        }

        self.entry_points()?;
        Ok(())
    }
}
