use crate::errors::ManifestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Registered plugin metadata, as a host would cache it after discovery.
///
/// The plugin's entry-point name is the key in [`PluginManifest::plugins`]
/// and is not repeated here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PluginEntry {
    /// Plugin name as the host refers to it (e.g. "stats")
    pub name: String,

    /// Importable package providing the plugin (e.g. "q2_stats")
    pub package: String,

    pub version: String,

    /// `module:object` the entry point resolves to
    pub entry_point: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    /// Semantic types registered by the plugin
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub semantic_types: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, ActionMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
}

/// Signature of one plugin action
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<SlotMetadata>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterMetadata>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<SlotMetadata>,
}

/// Typed artifact slot (input or output)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SlotMetadata {
    pub name: String,

    /// Semantic type expression, e.g. "StatsTable[Pairwise]"
    pub semantic_type: String,

    #[serde(default)]
    pub optional: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Primitive parameter of an action
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterMetadata {
    pub name: String,

    /// Type annotation (e.g. "Str % Choices(...)", "Bool")
    pub annotation: String,

    /// Default value as a JSON string (e.g. "null", "false", "\"auto\"")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    pub is_required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PluginEntry {
    /// Record the current time as the registration time.
    pub fn mark_registered(&mut self) {
        self.registered_at = Some(Utc::now());
    }

    fn validate(&self, key: &str) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::InvalidPlugin(format!(
                "'{}' has an empty plugin name",
                key
            )));
        }
        if !self.entry_point.contains(':') {
            return Err(ManifestError::InvalidPlugin(format!(
                "'{}' has entry point '{}' without ':'",
                key, self.entry_point
            )));
        }
        Ok(())
    }
}

/// Registry of discovered plugins
///
/// **This file is managed by the q2-stats CLI.**
/// **Do not edit manually - use `q2-stats plugin` commands instead.**
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PluginManifest {
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginEntry>,
}

impl PluginManifest {
    /// Manifest location for a cache directory.
    ///
    /// `Q2_STATS_MANIFEST` overrides `<cache_dir>/manifest.toml`.
    pub fn path_in(cache_dir: &Path) -> PathBuf {
        if let Ok(env_path) = std::env::var("Q2_STATS_MANIFEST") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }
        cache_dir.join("manifest.toml")
    }

    /// Load manifest from disk, returning empty manifest if file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Ok(PluginManifest::default());
        }

        let content = std::fs::read_to_string(path)?;
        let manifest: PluginManifest = toml::from_str(&content)?;

        for (key, plugin) in &manifest.plugins {
            plugin.validate(key)?;
        }

        Ok(manifest)
    }

    /// Save manifest to disk with validation
    pub fn save_to(&self, path: &Path) -> Result<(), ManifestError> {
        for (key, plugin) in &self.plugins {
            plugin.validate(key)?;
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("saved plugin manifest to {}", path.display());
        Ok(())
    }

    /// Add or update a plugin in the manifest
    pub fn add_plugin(&mut self, key: String, plugin: PluginEntry) -> Result<(), ManifestError> {
        plugin.validate(&key)?;
        self.plugins.insert(key, plugin);
        Ok(())
    }

    /// Remove a plugin from the manifest
    pub fn remove_plugin(&mut self, key: &str) -> bool {
        self.plugins.remove(key).is_some()
    }

    pub fn get_plugin(&self, key: &str) -> Option<&PluginEntry> {
        self.plugins.get(key)
    }

    /// All plugins, ordered by key
    pub fn list_plugins(&self) -> Vec<(&str, &PluginEntry)> {
        self.plugins.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn has_plugin(&self, key: &str) -> bool {
        self.plugins.contains_key(key)
    }

    /// Pretty JSON for CLI consumers. Returns "{}" if serialization fails.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }
}
