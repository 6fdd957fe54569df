//! Theme hot-reload: watches `ticker.toml` and republishes its `[theme]`.
//!
//! The watcher sits on the *parent directory*: editors that save through a
//! temp file and rename would otherwise slip past a watch on the file
//! itself. Reloaded themes travel to the UI thread over an mpsc channel
//! that the render loop drains each frame.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::config::TickerConfig;
use crate::theme::ThemeTokens;

/// Parse file contents into the theme to apply, or `None` if invalid.
pub fn theme_from_contents(contents: &str) -> Option<ThemeTokens> {
    match TickerConfig::from_toml(contents) {
        Ok(config) => {
            for slot in config.theme.invalid_colors() {
                warn!(target: "config", slot, "Unparsable theme color, using default");
            }
            Some(config.theme)
        }
        Err(e) => {
            warn!(target: "config", "Ignoring invalid config on reload: {}", e);
            None
        }
    }
}

/// Spawn a watcher calling `on_change` when `path` is created or modified.
pub fn spawn_watcher<F>(path: &Path, on_change: F) -> Result<RecommendedWatcher>
where
    F: Fn() + Send + 'static,
{
    let target = path
        .file_name()
        .context("config path has no file name")?
        .to_os_string();
    let parent = path
        .parent()
        .context("config path has no parent directory")?
        .to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    return;
                }
                let hits_target = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().is_some_and(|f| f == target));
                if hits_target {
                    on_change();
                }
            }
            Err(e) => warn!(target: "config", "watch error: {}", e),
        }
    })
    .context("Failed to create config watcher")?;

    watcher
        .watch(&parent, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", parent.display()))?;
    Ok(watcher)
}

/// Owns the watcher; dropping it stops reloads.
pub struct ThemeWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ThemeWatcher {
    /// Start watching `path`; each valid reload sends a theme on the returned receiver.
    pub fn start(path: PathBuf) -> Result<(Self, mpsc::Receiver<ThemeTokens>)> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let (tx, rx) = mpsc::channel();
        let watched = path.clone();
        let watcher = spawn_watcher(&path, move || {
            let contents = match std::fs::read_to_string(&watched) {
                Ok(c) => c,
                Err(e) => {
                    warn!(target: "config", "Failed to read {}: {}", watched.display(), e);
                    return;
                }
            };
            if let Some(theme) = theme_from_contents(&contents) {
                info!(target: "config", "Theme reloaded");
                let _ = tx.send(theme);
            }
        })?;

        Ok((
            Self {
                _watcher: watcher,
                path,
            },
            rx,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_is_extracted_from_full_config() {
        let theme = theme_from_contents(
            r##"
[feed]
url = "ws://example:1"

[theme.tiers]
healthy = "#010203"
"##,
        )
        .expect("valid config");
        assert_eq!(theme.tiers.healthy, "#010203");
        assert_eq!(theme.tiers.low, ThemeTokens::default().tiers.low);
    }

    #[test]
    fn invalid_contents_are_ignored() {
        assert!(theme_from_contents("this is not [[ valid toml").is_none());
    }

    #[test]
    fn start_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ticker.toml");
        let (watcher, _rx) = ThemeWatcher::start(path.clone()).expect("watcher starts");
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(watcher.path(), path.as_path());
    }
}
