use crate::commands::plugin::{load_manifest, load_stats_plugin, manifest_path, MANIFEST_KEY};
use colored::Colorize;
use q2_stats::plugin::ParameterSpec;
use q2_stats_logger as logger;

/// Show help for the run command when invoked with no action
pub fn show_run_help() -> Result<(), String> {
    let plugin = load_stats_plugin()?;

    println!();
    println!("{}", "No action specified.".bold());
    println!();

    println!("{}", "Available actions:".bold());
    for action in plugin.actions() {
        println!("  {:<16} {}", kebab(action.id).cyan(), action.name);
    }
    println!();

    match load_manifest(&manifest_path()) {
        Ok(manifest) if manifest.has_plugin(MANIFEST_KEY) => {}
        Ok(_) => {
            println!("{}", "Plugin is not registered.".yellow());
            println!("Register it with: q2-stats plugin register");
            println!();
        }
        Err(e) => logger::debug(&e),
    }

    println!("{}", "Usage:".bold());
    println!("  Compare independent groups:");
    println!("    q2-stats run mann-whitney-u --distribution <FILE> --compare all-pairwise");
    println!();
    println!("  Compare matched groups against a baseline:");
    println!(
        "    q2-stats run wilcoxon-srt --distribution <FILE> --compare baseline --baseline-group <GROUP>"
    );
    println!();
    println!("  Show an action's signature:");
    println!("    q2-stats plugin info <action>");
    println!();

    Ok(())
}

/// Show the typed signature of a single action
pub fn show_action_help(id: &str) -> Result<(), String> {
    let plugin = load_stats_plugin()?;
    let action = plugin
        .action(&id.replace('-', "_"))
        .map_err(|e| e.to_string())?;

    logger::step(&format!("Action: {}", action.name));
    println!("\n{}", action.description);

    println!("\nInputs:");
    for input in &action.inputs {
        let required = if input.optional { "optional" } else { "required" };
        println!(
            "  --{:<20} {:<42} {}",
            kebab(input.name),
            input.semantic_type,
            required
        );
    }

    if !action.parameters.is_empty() {
        println!("\nParameters:");
        for param in &action.parameters {
            print_parameter(param);
        }
    }

    println!("\nOutputs:");
    for output in &action.outputs {
        println!("  {:<22} {}", output.name, output.semantic_type);
    }

    println!("\nUsage:");
    println!("  q2-stats run {} [OPTIONS]", kebab(action.id));

    Ok(())
}

fn print_parameter(param: &ParameterSpec) {
    let required = if param.is_required() {
        "required"
    } else {
        "optional"
    };
    let default = param
        .default
        .as_ref()
        .filter(|d| !d.is_null())
        .map(|d| format!(" (default: {})", d))
        .unwrap_or_default();
    println!(
        "  --{:<20} {:<42} {}{}",
        kebab(param.name),
        param.annotation(),
        required,
        default
    );
}

fn kebab(name: &str) -> String {
    name.replace('_', "-")
}
