use q2_stats_logger as logger;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use which::which;

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const KEYS: &[&str] = &[
    "cache-path",
    "cargo-path",
    "alternative",
    "p-val-approx",
    "output-format",
];

const DEFAULT_ALTERNATIVE: &str = "two-sided";
const DEFAULT_P_VAL_APPROX: &str = "auto";
const DEFAULT_OUTPUT_FORMAT: &str = "jsonl";

fn cargo_binary_name() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "cargo.exe"
    }
    #[cfg(not(target_os = "windows"))]
    {
        "cargo"
    }
}

fn cargo_runs(path: &Path) -> bool {
    let Ok(output) = Command::new(path).arg("--version").output() else {
        return false;
    };
    output.status.success()
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_val_approx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl Config {
    pub fn path() -> PathBuf {
        // Explicit override for tests and isolated runs.
        if let Ok(env_path) = std::env::var("Q2_STATS_CONFIG") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        #[cfg(not(target_os = "windows"))]
        let base = dirs::home_dir().map(|home| home.join(".config"));

        #[cfg(target_os = "windows")]
        let base = dirs::config_dir();

        base.unwrap_or_else(|| PathBuf::from("."))
            .join("q2-stats")
            .join("q2-stats.toml")
    }

    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "cache-path" => self.cache_path.clone(),
            "cargo-path" => self.cargo_path.clone(),
            "alternative" => self.alternative.clone(),
            "p-val-approx" => self.p_val_approx.clone(),
            "output-format" => self.output_format.clone(),
            _ => None,
        }
    }

    /// Set a key. Returns `false` when the key is unknown.
    pub fn set(&mut self, key: &str, value: String) -> bool {
        match key {
            "cache-path" => self.cache_path = Some(value),
            "cargo-path" => self.cargo_path = Some(value),
            "alternative" => self.alternative = Some(value),
            "p-val-approx" => self.p_val_approx = Some(value),
            "output-format" => self.output_format = Some(value),
            _ => return false,
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.cache_path.is_none()
            && self.cargo_path.is_none()
            && self.alternative.is_none()
            && self.p_val_approx.is_none()
            && self.output_format.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    pub fn reset() -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Directory holding the log file and the plugin manifest.
    ///
    /// `cache-path` when set, otherwise `~/.cache/q2-stats`.
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(ref path) = self.cache_path {
            return PathBuf::from(path);
        }

        #[cfg(not(target_os = "windows"))]
        let base = dirs::home_dir().map(|home| home.join(".cache"));

        #[cfg(target_os = "windows")]
        let base = dirs::cache_dir();

        base.unwrap_or_else(std::env::temp_dir).join("q2-stats")
    }

    pub fn alternative(&self) -> &str {
        self.alternative.as_deref().unwrap_or(DEFAULT_ALTERNATIVE)
    }

    pub fn p_val_approx(&self) -> &str {
        self.p_val_approx.as_deref().unwrap_or(DEFAULT_P_VAL_APPROX)
    }

    pub fn output_format(&self) -> &str {
        self.output_format.as_deref().unwrap_or(DEFAULT_OUTPUT_FORMAT)
    }

    /// Locate the cargo executable used by the task runner.
    ///
    /// A configured path wins when it still runs; otherwise `CARGO` (set when
    /// invoked through cargo itself) and then `PATH` are consulted. The
    /// resolved path is stored but not saved.
    pub fn ensure_cargo_path(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.cargo_path {
            let candidate = Path::new(path);
            if candidate.exists() && cargo_runs(candidate) {
                return Ok(path.clone());
            }
            logger::warn(&format!(
                "Configured cargo path {} is not usable; searching PATH.",
                candidate.display()
            ));
            self.cargo_path = None;
        }

        if let Ok(env_cargo) = std::env::var("CARGO") {
            let candidate = PathBuf::from(&env_cargo);
            if candidate.exists() && cargo_runs(&candidate) {
                self.cargo_path = Some(env_cargo.clone());
                return Ok(env_cargo);
            }
        }

        if let Ok(path) = which(cargo_binary_name()) {
            let path_str = path.to_string_lossy().trim().to_string();
            self.cargo_path = Some(path_str.clone());
            return Ok(path_str);
        }

        Err("Failed to locate cargo. Install the Rust toolchain or set `cargo-path`.".into())
    }
}

#[cfg(test)]
mod tests {
    use crate::Config;
    use tempfile::TempDir;

    #[test]
    fn test_config_new() {
        let config = Config::default();
        assert!(config.is_empty());
    }

    #[test]
    fn test_config_set_get() {
        let mut config = Config::default();
        assert!(config.set("cache-path", "test-value".to_string()));
        assert_eq!(config.get("cache-path"), Some("test-value".to_string()));
    }

    #[test]
    fn test_cache_dir_honours_cache_path() {
        let mut config = Config::default();
        config.set("cache-path", "/srv/q2-cache".to_string());
        assert_eq!(config.cache_dir(), std::path::PathBuf::from("/srv/q2-cache"));
    }

    #[test]
    fn test_config_unknown_key() {
        let mut config = Config::default();
        assert!(!config.set("unknown-key", "value".to_string()));
        assert_eq!(config.get("unknown-key"), None);
        assert!(config.is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.alternative(), "two-sided");
        assert_eq!(config.p_val_approx(), "auto");
        assert_eq!(config.output_format(), "jsonl");
        assert!(config.cache_dir().ends_with("q2-stats"));
    }

    #[test]
    fn test_values_iter_follows_key_order() {
        let mut config = Config::default();
        config.set("output-format", "tsv".to_string());
        config.set("alternative", "less".to_string());
        let values = config.values_iter();
        assert_eq!(
            values,
            vec![
                ("alternative", "less".to_string()),
                ("output-format", "tsv".to_string())
            ]
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("q2-stats.toml");

        let mut config = Config::default();
        config.set("p-val-approx", "exact".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.p_val_approx(), "exact");
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_empty());
    }
}
