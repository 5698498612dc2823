//! Packaging metadata for q2-stats
//!
//! - [`descriptor`]: the static package descriptor and its validation
//! - [`entry_point`]: `module:object` entry points and `entry_points.txt`
//! - [`version`]: dynamic versioning from `git describe`
//! - [`plugin_manifest`]: on-disk cache of registered plugins

pub mod descriptor;
pub mod entry_point;
pub mod errors;
pub mod plugin_manifest;
pub mod version;

pub use descriptor::{Author, BuildSystem, License, PackageDescriptor, PackageMetadata};
pub use entry_point::{parse_entry_points_txt, render_entry_points_txt, EntryPoint, PLUGIN_GROUP};
pub use errors::{DescriptorError, EntryPointError, ManifestError, VersionError};
pub use plugin_manifest::{
    ActionMetadata, ParameterMetadata, PluginEntry, PluginManifest, SlotMetadata,
};
pub use version::{
    render_version, version_from_describe, VcsState, VersionFormat, VersioningConfig,
    FALLBACK_VERSION,
};
