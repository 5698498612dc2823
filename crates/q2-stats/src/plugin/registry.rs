//! Entry-point resolution
//!
//! Maps `module:object` targets to the constructors that build them, the
//! way a host's plugin loader would import a module and fetch an attribute.

use super::Plugin;
use crate::error::{Result, StatsError};
use crate::plugin_setup;
use once_cell::sync::Lazy;
use q2_stats_manifest::{EntryPoint, PackageDescriptor};
use std::collections::BTreeMap;

pub type PluginLoader = fn() -> Result<Plugin>;

static LOADERS: Lazy<BTreeMap<&'static str, PluginLoader>> = Lazy::new(|| {
    let mut loaders: BTreeMap<&'static str, PluginLoader> = BTreeMap::new();
    loaders.insert(plugin_setup::ENTRY_POINT_TARGET, plugin_setup::plugin);
    loaders
});

/// Every loadable target, sorted.
pub fn targets() -> Vec<&'static str> {
    LOADERS.keys().copied().collect()
}

pub fn resolve(target: &str) -> Option<PluginLoader> {
    LOADERS.get(target).copied()
}

/// Build the plugin object an entry point refers to.
pub fn load(entry_point: &EntryPoint) -> Result<Plugin> {
    let target = entry_point.target();
    let loader = resolve(&target).ok_or_else(|| StatsError::EntryPointNotFound(target.clone()))?;
    tracing::debug!("loading {} from {}", entry_point.name, target);
    loader()
}

/// Load every entry point the descriptor declares in `group`.
pub fn discover(descriptor: &PackageDescriptor, group: &str) -> Result<Vec<(EntryPoint, Plugin)>> {
    descriptor
        .entry_points_in(group)?
        .into_iter()
        .map(|ep| {
            let plugin = load(&ep)?;
            Ok((ep, plugin))
        })
        .collect()
}
