// Copyright (c) 2026 rezky_nightky

//! Settings-change notifications.
//!
//! The settings side only ever holds an [`EngineHandle`]; the engine owns the
//! receiving end and drains it between frames.

use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{trace, warn};

use crate::error::PrefsError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    PreferencesChanged,
}

#[derive(Clone, Debug)]
pub struct EngineHandle {
    tx: Sender<EngineEvent>,
}

impl EngineHandle {
    /// Returns `false` once the engine side has been dropped.
    pub fn notify_preferences_changed(&self) -> bool {
        self.tx.send(EngineEvent::PreferencesChanged).is_ok()
    }
}

pub fn engine_channel() -> (EngineHandle, Receiver<EngineEvent>) {
    let (tx, rx) = mpsc::channel();
    (EngineHandle { tx }, rx)
}

/// Collapses a burst of queued events into one.
pub fn drain_pending(rx: &Receiver<EngineEvent>) -> Option<EngineEvent> {
    let mut last = None;
    while let Ok(ev) = rx.try_recv() {
        last = Some(ev);
    }
    last
}

/// Keeps the file watch alive; dropping it stops notifications.
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
}

/// Watches the settings file and notifies `handle` when it changes.
///
/// The parent directory is watched so editors that save through a temporary
/// file and a rename are still seen.
pub fn watch_prefs_file(path: &Path, handle: EngineHandle) -> Result<SettingsWatcher, PrefsError> {
    let file_name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    let watch_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                let affects_settings = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().is_some_and(|n| n == file_name));
                if affects_settings {
                    trace!(kind = ?event.kind, "settings file event");
                    handle.notify_preferences_changed();
                }
            }
            Err(err) => warn!("settings watch error: {err}"),
        }
    })
    .map_err(|source| PrefsError::Watch {
        path: path.to_path_buf(),
        source,
    })?;

    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .map_err(|source| PrefsError::Watch {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(SettingsWatcher { _watcher: watcher })
}
