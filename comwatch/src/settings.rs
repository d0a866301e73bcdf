//! Application settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use com_detect::{ScannerConfig, DEFAULT_WATCH_PATHS};
use com_registry::MonitorConfig;
use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// How long a discovered port is marked NEW (seconds)
    #[serde(default = "default_new_window_secs")]
    pub new_window_secs: u64,
    /// Quiet time after a device node event before reconciling (ms)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Device directories to watch for hardware changes (none needed on Windows)
    #[serde(default = "default_watch_paths")]
    pub watch_paths: Vec<PathBuf>,
    /// Skip ports whose name contains any of these
    #[serde(default = "default_skip_patterns")]
    pub skip_patterns: Vec<String>,
    /// Print the port list after every pass that changed something
    #[serde(default)]
    pub show_list_on_change: bool,
}

fn default_new_window_secs() -> u64 {
    5 * 60
}

fn default_settle_ms() -> u64 {
    250
}

fn default_watch_paths() -> Vec<PathBuf> {
    DEFAULT_WATCH_PATHS.iter().map(PathBuf::from).collect()
}

fn default_skip_patterns() -> Vec<String> {
    vec!["Bluetooth".to_string(), "debug".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            new_window_secs: default_new_window_secs(),
            settle_ms: default_settle_ms(),
            watch_paths: default_watch_paths(),
            skip_patterns: default_skip_patterns(),
            show_list_on_change: false,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for comwatch
    /// Uses $XDG_CONFIG_HOME/comwatch, falls back to ~/.config/comwatch
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("comwatch"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("comwatch"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the default location
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a file, falling back to defaults if it is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf, String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }

    /// Monitor configuration derived from these settings
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            new_window: Duration::from_secs(self.new_window_secs),
        }
    }

    /// Scanner configuration derived from these settings
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            skip_patterns: self.skip_patterns.clone(),
        }
    }

    /// Settle delay
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.monitor_config().new_window, Duration::from_secs(300));
        assert_eq!(settings.settle(), Duration::from_millis(250));
        if cfg!(windows) {
            assert!(settings.watch_paths.is_empty());
        } else {
            assert_eq!(settings.watch_paths, vec![PathBuf::from("/dev")]);
        }
        assert!(!settings.show_list_on_change);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"settle_ms": 1000}"#).unwrap();
        assert_eq!(settings.settle_ms, 1000);
        assert_eq!(settings.new_window_secs, 300);
        assert_eq!(settings.skip_patterns, default_skip_patterns());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            new_window_secs: 60,
            show_list_on_change: true,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_unreadable_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(Settings::load_from(&path), Settings::default());
        assert_eq!(Settings::load_from(&dir.path().join("missing.json")), Settings::default());
    }
}
