//! Package version as captured by the build script.

use q2_stats_manifest::{version_from_describe, VersioningConfig};

/// `git describe --tags --long --dirty --always` output at build time, if any.
pub const GIT_DESCRIBE: Option<&str> = option_env!("Q2_STATS_GIT_DESCRIBE");

pub fn package_version(config: &VersioningConfig) -> String {
    version_from_describe(GIT_DESCRIBE, config)
}

/// Version using the descriptor's versioning rules.
pub fn version() -> String {
    let config = crate::plugin_setup::descriptor()
        .map(|d| d.versioning)
        .unwrap_or_default();
    package_version(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use q2_stats_manifest::FALLBACK_VERSION;

    #[test]
    fn test_version_is_never_empty() {
        let version = version();
        assert!(!version.is_empty());
        if GIT_DESCRIBE.map_or(true, |d| d.trim().is_empty()) {
            assert_eq!(version, FALLBACK_VERSION);
        }
    }
}
