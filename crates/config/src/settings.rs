// User settings
// Loaded from ~/.config/fleetpay/settings.json (FLEETPAY_SETTINGS overrides the path)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const SETTINGS_ENV: &str = "FLEETPAY_SETTINGS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the per-week history store
    #[serde(rename = "history.dir")]
    pub history_dir: Option<PathBuf>,

    /// Recon config TOML used when `--config` is not given
    #[serde(rename = "recon.config")]
    pub recon_config: Option<PathBuf>,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fleetpay")
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path. A missing file is not an error; an
    /// unreadable or malformed one is logged and ignored.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// History root: the configured directory, else `<data dir>/fleetpay/history`.
    pub fn history_root(&self) -> PathBuf {
        if let Some(dir) = &self.history_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fleetpay")
            .join("history")
    }
}
