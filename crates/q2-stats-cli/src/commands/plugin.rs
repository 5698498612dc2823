use crate::help;
use crate::GlobalOpts;
use clap::Subcommand;
use colored::*;
use q2_stats::plugin::registry;
use q2_stats::plugin_setup;
use q2_stats::Plugin;
use q2_stats_config::Config;
use q2_stats_logger as logger;
use q2_stats_manifest::{
    render_entry_points_txt, PackageDescriptor, PluginEntry, PluginManifest, PLUGIN_GROUP,
};
use std::path::{Path, PathBuf};

/// Key the plugin is registered under, matching its entry point name.
pub const MANIFEST_KEY: &str = "q2-stats";

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// Describe the plugin or one of its actions
    Info {
        /// Show the signature of a single action
        action: Option<String>,
        /// Print the plugin metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the declared entry points
    EntryPoints {
        /// Render as an entry_points.txt file
        #[arg(long)]
        txt: bool,
    },
    /// Validate a package descriptor (defaults to the bundled one)
    Validate {
        #[arg(long)]
        descriptor: Option<PathBuf>,
    },
    /// Record the plugin in the local manifest
    Register,
    /// List registered plugins
    List,
    /// Remove every registered plugin from the manifest
    Clean {
        /// Confirm removal
        #[arg(long)]
        yes: bool,
    },
}

pub fn handle_plugin(command: PluginCommand, opts: &GlobalOpts) -> Result<(), String> {
    match command {
        PluginCommand::Info { action, json } => match action {
            Some(id) => help::show_action_help(&id),
            None => show_info(json),
        },
        PluginCommand::EntryPoints { txt } => show_entry_points(txt),
        PluginCommand::Validate { descriptor } => validate_descriptor(descriptor),
        PluginCommand::Register => register_plugin(),
        PluginCommand::List => list_plugins(),
        PluginCommand::Clean { yes } => clean_manifest(yes, opts),
    }
}

/// `Q2_STATS_MANIFEST`, else `manifest.toml` in the configured cache directory.
pub fn manifest_path() -> PathBuf {
    let config = Config::load().unwrap_or_default();
    PluginManifest::path_in(&config.cache_dir())
}

pub fn load_manifest(path: &Path) -> Result<PluginManifest, String> {
    PluginManifest::load_from(path).map_err(|e| format!("Failed to load manifest: {}", e))
}

fn save_manifest(manifest: &PluginManifest, path: &Path) -> Result<(), String> {
    manifest
        .save_to(path)
        .map_err(|e| format!("Failed to save manifest: {}", e))
}

/// Resolve the `q2-stats` entry point and build the plugin it names.
pub fn load_stats_plugin() -> Result<Plugin, String> {
    let (_, plugin) = load_with_entry_point()?;
    Ok(plugin)
}

fn load_with_entry_point() -> Result<(String, Plugin), String> {
    let descriptor =
        plugin_setup::descriptor().map_err(|e| format!("Invalid package descriptor: {}", e))?;
    let discovered = registry::discover(&descriptor, PLUGIN_GROUP)
        .map_err(|e| format!("Failed to load plugin: {}", e))?;
    logger::debug(&format!(
        "Discovered {} plugin(s) in group {}",
        discovered.len(),
        PLUGIN_GROUP
    ));
    discovered
        .into_iter()
        .find(|(ep, _)| ep.name == MANIFEST_KEY)
        .map(|(ep, plugin)| (ep.target(), plugin))
        .ok_or_else(|| format!("No '{}' entry point in group {}", MANIFEST_KEY, PLUGIN_GROUP))
}

fn current_entry() -> Result<PluginEntry, String> {
    let (target, plugin) = load_with_entry_point()?;
    Ok(plugin.manifest(&target))
}

fn show_info(json: bool) -> Result<(), String> {
    let entry = current_entry()?;
    if json {
        let rendered = serde_json::to_string_pretty(&entry)
            .map_err(|e| format!("Failed to render plugin metadata: {}", e))?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("{} {}", entry.name.bold(), entry.version.dimmed());
    if let Some(desc) = &entry.short_description {
        println!("{}", desc);
    }
    println!("Package:     {}", entry.package);
    println!("Entry point: {}", entry.entry_point);
    if let Some(website) = &entry.website {
        println!("Website:     {}", website);
    }
    if !entry.semantic_types.is_empty() {
        println!("Types:       {}", entry.semantic_types.join(", "));
    }
    println!("\n{}", "Actions:".bold());
    for (id, action) in &entry.actions {
        println!("  {:<16} {}", id.cyan(), action.name);
    }
    Ok(())
}

fn show_entry_points(txt: bool) -> Result<(), String> {
    let descriptor =
        plugin_setup::descriptor().map_err(|e| format!("Invalid package descriptor: {}", e))?;
    let entries = descriptor
        .entry_points()
        .map_err(|e| format!("Invalid entry point: {}", e))?;

    if txt {
        print!("{}", render_entry_points_txt(&entries));
        return Ok(());
    }

    for ep in &entries {
        let status = if registry::resolve(&ep.target()).is_some() {
            "ok".green()
        } else {
            "unresolved".red()
        };
        println!("{} {} = {} ({})", ep.group.dimmed(), ep.name, ep.target(), status);
    }
    Ok(())
}

fn validate_descriptor(path: Option<PathBuf>) -> Result<(), String> {
    let descriptor = match &path {
        Some(path) => PackageDescriptor::load(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        None => PackageDescriptor::from_toml_str(plugin_setup::DESCRIPTOR_TOML)
            .map_err(|e| format!("Failed to parse bundled descriptor: {}", e))?,
    };
    descriptor.validate().map_err(|e| e.to_string())?;

    let entries = descriptor
        .entry_points_in(PLUGIN_GROUP)
        .map_err(|e| e.to_string())?;
    for ep in &entries {
        if registry::resolve(&ep.target()).is_none() {
            logger::warn(&format!(
                "Entry point {} targets {}, which this build cannot load (loadable: {})",
                ep.name,
                ep.target(),
                registry::targets().join(", ")
            ));
        }
    }

    logger::success(&format!(
        "Descriptor for {} is valid ({} plugin entry point(s))",
        descriptor.package.name,
        entries.len()
    ));
    Ok(())
}

fn register_plugin() -> Result<(), String> {
    let mut entry = current_entry()?;
    entry.mark_registered();

    let path = manifest_path();
    let mut manifest = load_manifest(&path)?;
    let replaced = manifest.has_plugin(MANIFEST_KEY);
    let version = entry.version.clone();
    manifest
        .add_plugin(MANIFEST_KEY.to_string(), entry)
        .map_err(|e| format!("Failed to register plugin: {}", e))?;
    save_manifest(&manifest, &path)?;

    let verb = if replaced { "Updated" } else { "Registered" };
    logger::success(&format!("{} {} {}", verb, MANIFEST_KEY, version));
    logger::debug(&format!("Manifest: {}", path.display()));
    Ok(())
}

fn list_plugins() -> Result<(), String> {
    let manifest = load_manifest(&manifest_path())?;

    if manifest.is_empty() {
        println!("{}", "No plugins registered.".yellow());
        println!("Register with: q2-stats plugin register");
        return Ok(());
    }

    for (key, plugin) in manifest.list_plugins() {
        let registered = plugin
            .registered_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{} {} - {} actions {}",
            key.cyan(),
            format!("({})", plugin.version).dimmed(),
            plugin.actions.len(),
            format!("[registered {}]", registered).dimmed()
        );
    }
    Ok(())
}

fn clean_manifest(yes: bool, _opts: &GlobalOpts) -> Result<(), String> {
    let path = manifest_path();
    let mut manifest = load_manifest(&path)?;

    if manifest.is_empty() {
        logger::warn("Manifest is empty.");
        return Ok(());
    }

    let total = manifest.plugins.len();
    logger::debug(&format!("Manifest has {} plugin entries.", total));

    if !yes {
        println!("To actually clean, run with --yes flag.");
        return Ok(());
    }

    manifest.plugins.clear();
    save_manifest(&manifest, &path)?;

    println!("{}", format!("Removed {} plugin(s)", total).dimmed());
    Ok(())
}
