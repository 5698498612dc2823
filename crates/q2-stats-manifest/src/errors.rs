//! Error types for descriptor, entry point, version and manifest handling

use std::io;
use thiserror::Error;

/// Errors that can occur while reading or writing the plugin manifest cache
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid plugin: {0}")]
    InvalidPlugin(String),
}

/// Errors raised when a package descriptor is malformed or incomplete
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse descriptor: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Descriptor field '{0}' is missing or empty")]
    MissingField(String),

    #[error("Version must be declared dynamic, found static version '{0}'")]
    StaticVersion(String),

    #[error(transparent)]
    EntryPoint(#[from] EntryPointError),
}

/// Errors raised when an entry point declaration cannot be parsed
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EntryPointError {
    #[error("Entry point '{name}' in group '{group}' has invalid target '{target}': expected 'module.path:object'")]
    InvalidTarget {
        group: String,
        name: String,
        target: String,
    },

    #[error("Entry point in group '{0}' has an empty name")]
    EmptyName(String),
}

/// Errors raised while deriving a version from VCS state
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    #[error("Unrecognized `git describe` output: '{0}'")]
    UnrecognizedDescribe(String),

    #[error("Commit distance '{0}' is not a number")]
    InvalidDistance(String),
}
