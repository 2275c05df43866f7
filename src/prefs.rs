// Copyright (c) 2026 rezky_nightky

//! String-keyed preference store read by the engine.
//!
//! Values come from a TOML settings file with command-line overrides layered
//! on top. The engine only ever reads through [`Preferences`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PrefsError;

pub const KEY_THEME: &str = "theme";
pub const KEY_WIDTH: &str = "width";
pub const KEY_WIDTH_RANGE: &str = "widthRange";
pub const KEY_SPEED: &str = "speed";
pub const KEY_SPEED_RANGE: &str = "speedRange";
pub const KEY_TOUCH: &str = "touch";

/// Passive key/value read of the current settings.
pub trait Preferences {
    fn get(&self, key: &str) -> Option<&str>;

    fn get_string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Unrecognised values fall back to `default`.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => true,
            Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => false,
            _ => default,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PrefStore {
    path: Option<PathBuf>,
    stored: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl Preferences for PrefStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.overrides
            .get(key)
            .or_else(|| self.stored.get(key))
            .map(String::as_str)
    }
}

impl PrefStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the settings file at `path`. A missing file reads as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let mut store = Self {
            path: Some(path.into()),
            ..Self::default()
        };
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Overrides survive [`PrefStore::reload`] and [`PrefStore::reset`].
    pub fn set_override(&mut self, key: &str, value: impl Into<String>) {
        self.overrides.insert(key.to_string(), value.into());
    }

    /// Re-reads the settings file. Returns whether any stored value changed.
    ///
    /// On error the previous values are kept.
    pub fn reload(&mut self) -> Result<bool, PrefsError> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(PrefsError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        let fresh = parse_settings(&text, path)?;
        let changed = fresh != self.stored;
        self.stored = fresh;
        Ok(changed)
    }

    /// Clears every stored value and truncates the settings file.
    pub fn reset(&mut self) -> Result<(), PrefsError> {
        self.stored.clear();
        if let Some(path) = &self.path {
            if path.exists() {
                fs::write(path, "").map_err(|source| PrefsError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

fn parse_settings(text: &str, path: &Path) -> Result<BTreeMap<String, String>, PrefsError> {
    let table: toml::Table = toml::from_str(text).map_err(|source| PrefsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    table
        .into_iter()
        .map(|(key, value)| {
            let v = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                _ => return Err(PrefsError::Unsupported { key }),
            };
            Ok((key, v))
        })
        .collect()
}

#[cfg(test)]
impl PrefStore {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.stored.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let p = PrefStore::in_memory();
        assert_eq!(p.get_string(KEY_THEME, "algeria"), "algeria");
        assert!(p.get_bool(KEY_TOUCH, true));
    }

    #[test]
    fn overrides_win_over_stored_values() {
        let mut p = PrefStore::in_memory();
        p.set(KEY_WIDTH, "40");
        p.set_override(KEY_WIDTH, "60");
        assert_eq!(p.get(KEY_WIDTH), Some("60"));
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        let mut p = PrefStore::in_memory();
        p.set(KEY_TOUCH, "Off");
        assert!(!p.get_bool(KEY_TOUCH, true));
        p.set(KEY_TOUCH, "maybe");
        assert!(p.get_bool(KEY_TOUCH, true));
    }

    #[test]
    fn file_values_are_read_as_strings() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "theme = \"france\"\nwidth = 35\nspeedRange = 1.5\ntouch = false").unwrap();

        let p = PrefStore::open(f.path()).unwrap();
        assert_eq!(p.get(KEY_THEME), Some("france"));
        assert_eq!(p.get(KEY_WIDTH), Some("35"));
        assert_eq!(p.get(KEY_SPEED_RANGE), Some("1.5"));
        assert!(!p.get_bool(KEY_TOUCH, true));
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = PrefStore::open(dir.path().join("absent.toml")).unwrap();
        assert_eq!(p.get(KEY_THEME), None);
    }

    #[test]
    fn reload_reports_changes_and_keeps_values_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripes.toml");
        fs::write(&path, "width = \"50\"").unwrap();
        let mut p = PrefStore::open(&path).unwrap();

        assert!(!p.reload().unwrap());

        fs::write(&path, "width = \"45\"").unwrap();
        assert!(p.reload().unwrap());
        assert_eq!(p.get(KEY_WIDTH), Some("45"));

        fs::write(&path, "width = [1, 2").unwrap();
        assert!(matches!(p.reload(), Err(PrefsError::Parse { .. })));
        assert_eq!(p.get(KEY_WIDTH), Some("45"));
    }

    #[test]
    fn nested_tables_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripes.toml");
        fs::write(&path, "[theme]\nname = \"x\"").unwrap();
        assert!(matches!(
            PrefStore::open(&path),
            Err(PrefsError::Unsupported { key }) if key == "theme"
        ));
    }

    #[test]
    fn reset_clears_file_but_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripes.toml");
        fs::write(&path, "theme = \"japan\"\nwidth = 10").unwrap();
        let mut p = PrefStore::open(&path).unwrap();
        p.set_override(KEY_SPEED, "3");

        p.reset().unwrap();

        assert_eq!(p.get(KEY_THEME), None);
        assert_eq!(p.get(KEY_SPEED), Some("3"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
