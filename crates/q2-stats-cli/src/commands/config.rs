use crate::GlobalOpts;
use clap::Subcommand;
use colored::*;
use q2_stats::{Alternative, OutputFormat, PValueApprox};
use q2_stats_config::{Config, KEYS};
use q2_stats_logger as logger;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show every configured value
    Show,
    /// Print one value
    Get { key: String },
    /// Set one value
    Set { key: String, value: String },
    /// Delete the config file
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Print the config file location
    Path,
}

pub fn handle_config(command: ConfigCommand, _opts: &GlobalOpts) -> Result<(), String> {
    match command {
        ConfigCommand::Show => show_config(),
        ConfigCommand::Get { key } => {
            let config = load()?;
            check_key(&key)?;
            match config.get(&key) {
                Some(value) => println!("{}", value),
                None => logger::info(&format!("'{}' is not set", key)),
            }
            Ok(())
        }
        ConfigCommand::Set { key, value } => set_value(&key, value),
        ConfigCommand::Reset { yes } => {
            if !yes {
                println!("To actually reset, run with --yes flag.");
                return Ok(());
            }
            Config::reset().map_err(|e| format!("Failed to reset config: {}", e))?;
            logger::success("Configuration reset");
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", Config::path().display());
            Ok(())
        }
    }
}

fn load() -> Result<Config, String> {
    Config::load().map_err(|e| format!("Failed to load config: {}", e))
}

fn check_key(key: &str) -> Result<(), String> {
    if KEYS.contains(&key) {
        Ok(())
    } else {
        Err(format!(
            "Unknown config key '{}'. Valid keys: {}",
            key,
            KEYS.join(", ")
        ))
    }
}

/// Reject values the run command would refuse later.
fn validate_value(key: &str, value: &str) -> Result<(), String> {
    let result = match key {
        "alternative" => value.parse::<Alternative>().map(|_| ()),
        "p-val-approx" => value.parse::<PValueApprox>().map(|_| ()),
        "output-format" => value.parse::<OutputFormat>().map(|_| ()),
        _ => Ok(()),
    };
    result.map_err(|e| e.to_string())
}

fn set_value(key: &str, value: String) -> Result<(), String> {
    check_key(key)?;
    validate_value(key, &value)?;

    let mut config = load()?;
    config.set(key, value.clone());
    config
        .save()
        .map_err(|e| format!("Failed to save config: {}", e))?;
    logger::success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn show_config() -> Result<(), String> {
    let config = load()?;
    println!("{}", format!("# {}", Config::path().display()).dimmed());
    if config.is_empty() {
        println!("{}", "No values set; built-in defaults apply.".yellow());
        return Ok(());
    }
    for (key, value) in config.values_iter() {
        println!("{} = {}", key.cyan(), value);
    }
    Ok(())
}
