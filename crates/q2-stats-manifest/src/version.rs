//! Version derivation from version-control state
//!
//! The package version is never written down. It is computed from the
//! nearest tag, the number of commits since that tag, the abbreviated
//! revision, and whether the working tree is dirty, as reported by
//! `git describe --tags --long --dirty --always`.

use crate::errors::VersionError;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Reported when no VCS information was available at build time.
pub const FALLBACK_VERSION: &str = "0.0.0+notfound";

static DESCRIBE_TAGGED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<tag>.+)-(?P<distance>\d+)-g(?P<rev>[0-9a-f]{4,40})(?P<dirty>-dirty)?$")
        .expect("static regex")
});

static DESCRIBE_UNTAGGED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<rev>[0-9a-f]{4,40})(?P<dirty>-dirty)?$").expect("static regex"));

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(?P<field>[a-z_]+)\}").expect("static regex"));

/// Templates used once the repository is not exactly at a clean tag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct VersionFormat {
    pub distance: String,
    pub dirty: String,
    pub distance_dirty: String,
}

impl Default for VersionFormat {
    fn default() -> Self {
        VersionFormat {
            distance: "{base_version}+{distance}.{vcs}{rev}".to_string(),
            dirty: "{base_version}+{distance}.{vcs}{rev}.dirty".to_string(),
            distance_dirty: "{base_version}+{distance}.{vcs}{rev}.dirty".to_string(),
        }
    }
}

/// `[versioning]` section of the package descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct VersioningConfig {
    /// Base version used when the repository has no tags yet.
    #[serde(default = "default_tag")]
    pub default_tag: String,
    #[serde(default)]
    pub format: VersionFormat,
}

fn default_tag() -> String {
    "0.0.1".to_string()
}

impl Default for VersioningConfig {
    fn default() -> Self {
        VersioningConfig {
            default_tag: default_tag(),
            format: VersionFormat::default(),
        }
    }
}

/// Repository state as seen by `git describe`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VcsState {
    /// Nearest tag, `None` for untagged repositories.
    pub tag: Option<String>,
    pub distance: u32,
    pub rev: String,
    pub dirty: bool,
}

impl VcsState {
    pub fn from_describe(describe: &str) -> Result<Self, VersionError> {
        let describe = describe.trim();

        if let Some(caps) = DESCRIBE_TAGGED.captures(describe) {
            let distance_str = &caps["distance"];
            let distance = distance_str
                .parse::<u32>()
                .map_err(|_| VersionError::InvalidDistance(distance_str.to_string()))?;
            return Ok(VcsState {
                tag: Some(caps["tag"].to_string()),
                distance,
                rev: caps["rev"].to_string(),
                dirty: caps.name("dirty").is_some(),
            });
        }

        if let Some(caps) = DESCRIBE_UNTAGGED.captures(describe) {
            return Ok(VcsState {
                tag: None,
                distance: 0,
                rev: caps["rev"].to_string(),
                dirty: caps.name("dirty").is_some(),
            });
        }

        Err(VersionError::UnrecognizedDescribe(describe.to_string()))
    }

    /// Tag with a leading `v` removed, or the configured default tag.
    pub fn base_version<'a>(&'a self, config: &'a VersioningConfig) -> &'a str {
        match self.tag.as_deref() {
            Some(tag) => tag.strip_prefix('v').unwrap_or(tag),
            None => &config.default_tag,
        }
    }
}

fn fill_template(template: &str, state: &VcsState, config: &VersioningConfig) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| match &caps["field"] {
            "base_version" | "version" => state.base_version(config).to_string(),
            "distance" => state.distance.to_string(),
            "vcs" => "g".to_string(),
            "rev" => state.rev.clone(),
            "build_date" => Utc::now().format("%Y%m%d").to_string(),
            // Unknown fields stay verbatim so a typo is visible in the output.
            _ => caps[0].to_string(),
        })
        .into_owned()
}

/// Render the version string for a repository state.
///
/// A clean checkout exactly at a tag yields the bare tag. Untagged
/// repositories always use the distance form so the revision is visible.
pub fn render_version(state: &VcsState, config: &VersioningConfig) -> String {
    let at_tag = state.tag.is_some() && state.distance == 0;
    let template = match (at_tag, state.dirty) {
        (true, false) => return state.base_version(config).to_string(),
        (true, true) => &config.format.dirty,
        (false, false) => &config.format.distance,
        (false, true) => &config.format.distance_dirty,
    };
    fill_template(template, state, config)
}

/// Compute the version from optional `git describe` output, falling back
/// to [`FALLBACK_VERSION`] when it is absent or unrecognized.
pub fn version_from_describe(describe: Option<&str>, config: &VersioningConfig) -> String {
    let Some(describe) = describe.filter(|d| !d.trim().is_empty()) else {
        return FALLBACK_VERSION.to_string();
    };
    match VcsState::from_describe(describe) {
        Ok(state) => render_version(&state, config),
        Err(e) => {
            tracing::debug!("ignoring VCS state: {}", e);
            FALLBACK_VERSION.to_string()
        }
    }
}
