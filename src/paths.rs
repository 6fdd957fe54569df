//! Application directories for energy-ticker.
//!
//! - Config: `$XDG_CONFIG_HOME/energy-ticker/` or `~/.config/energy-ticker/`
//! - Logs:   `~/Library/Logs/energy-ticker/` on macOS, otherwise
//!   `$XDG_DATA_HOME/energy-ticker/logs` or `~/.local/share/energy-ticker/logs`

use std::path::{Path, PathBuf};
use tracing::info;

const APP_NAME: &str = "energy-ticker";
pub const CONFIG_FILE_NAME: &str = "ticker.toml";

#[derive(Debug, Clone)]
pub struct TickerPaths {
    pub config: PathBuf,
    pub logs: PathBuf,
}

impl TickerPaths {
    /// Resolve from the environment. `None` when `$HOME` is unset.
    pub fn resolve() -> Option<Self> {
        let home = std::env::var("HOME").ok().map(PathBuf::from)?;
        Some(Self {
            config: resolve_config_dir(&home),
            logs: resolve_log_dir(&home),
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config.join(CONFIG_FILE_NAME)
    }

    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [&self.config, &self.logs] {
            std::fs::create_dir_all(dir)?;
            info!(target: "paths", "ensured directory: {}", dir.display());
        }
        Ok(())
    }
}

fn resolve_config_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join(APP_NAME)
    } else {
        home.join(".config").join(APP_NAME)
    }
}

#[cfg(target_os = "macos")]
fn resolve_log_dir(home: &Path) -> PathBuf {
    home.join("Library").join("Logs").join(APP_NAME)
}

#[cfg(not(target_os = "macos"))]
fn resolve_log_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join(APP_NAME).join("logs")
    } else {
        home.join(".local").join("share").join(APP_NAME).join("logs")
    }
}
