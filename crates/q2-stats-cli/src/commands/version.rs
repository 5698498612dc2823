use colored::*;
use q2_stats::version::{version, GIT_DESCRIBE};

pub fn show_version(json: bool) -> Result<(), String> {
    let package_version = version();
    let describe = GIT_DESCRIBE.filter(|d| !d.trim().is_empty());

    if json {
        let value = serde_json::json!({
            "package": "q2-stats",
            "version": package_version,
            "cli_version": env!("CARGO_PKG_VERSION"),
            "git_describe": describe,
        });
        let rendered = serde_json::to_string_pretty(&value)
            .map_err(|e| format!("Failed to render version: {}", e))?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("q2-stats {}", package_version);
    if let Some(describe) = describe {
        println!("{}", format!("git: {}", describe).dimmed());
    }
    Ok(())
}
