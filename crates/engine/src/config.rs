use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors from loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine configuration, read-only after construction.
///
/// Loaded from a JSON file or assembled by the embedding binary; the engine
/// only ever reads it through the accessors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map: Option<String>,
    pub map_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub profiler_enabled: bool,
    pub console_enabled: bool,
    pub cursor_visible: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: None,
            map_path: None,
            data_dir: PathBuf::from("data"),
            profiler_enabled: false,
            console_enabled: false,
            cursor_visible: false,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Named map, resolved relative to the data directory.
    pub fn map(&self) -> Option<&str> {
        self.map.as_deref()
    }

    /// Explicit map file path, used when no named map is set.
    pub fn map_path(&self) -> Option<&Path> {
        self.map_path.as_deref()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn profiler_enabled(&self) -> bool {
        self.profiler_enabled
    }

    pub fn console_enabled(&self) -> bool {
        self.console_enabled
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }
}
