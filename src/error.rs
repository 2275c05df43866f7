// Copyright (c) 2026 rezky_nightky

//! Error types for the stripe engine and its settings store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning preference values into a stripe configuration.
///
/// Every variant is fatal to the check cycle that produced it; the previous
/// configuration stays cached.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown theme: {0} (see --list-themes)")]
    UnknownTheme(String),
    #[error("invalid number for `{key}`: {value:?}")]
    Parse { key: &'static str, value: String },
    #[error("invalid value for `{key}`: {value} ({reason})")]
    Invalid {
        key: &'static str,
        value: f32,
        reason: &'static str,
    },
}

/// Errors raised by the file-backed preference store.
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unsupported value for `{key}` in settings file (expected a string, number or boolean)")]
    Unsupported { key: String },
    #[error("failed to watch settings file {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}
