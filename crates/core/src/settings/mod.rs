//! Application settings loaded from TOML.
//!
//! Every field has a default, so a partial (or missing) file is valid:
//!
//! ```toml
//! [logging]
//! enabled = true
//! level = "info"
//! max-files = 3
//! directory = "logs"
//!
//! [navigator]
//! show-navigation-bar = true
//! animated = true
//!
//! [tabs]
//! position = "bottom"
//! ```

use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIRECTORY: &str = "logs";
pub const DEFAULT_MAX_LOG_FILES: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub logging: LoggingSettings,
    pub navigator: NavigatorSettings,
    pub tabs: TabsSettings,
}

/// Configuration for structured log output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingSettings {
    /// Whether log files are written at all.
    pub enabled: bool,
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Number of run logs to keep (0 keeps everything).
    pub max_files: usize,
    /// Log directory, relative to the working directory.
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            enabled: true,
            level: DEFAULT_LOG_LEVEL.to_string(),
            max_files: DEFAULT_MAX_LOG_FILES,
            directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
        }
    }
}

/// Behaviour of the stack navigator shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NavigatorSettings {
    /// Render navigation bar chrome above the stack.
    pub show_navigation_bar: bool,
    /// Default for the `animated` flag of push and pop requests.
    pub animated: bool,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        NavigatorSettings {
            show_navigation_bar: true,
            animated: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TabsSettings {
    pub position: TabPosition,
}

/// Edge of the tab selector where the tab bar is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TabPosition {
    Top,
    #[default]
    Bottom,
}

impl Settings {
    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't valid settings TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, Error> {
        load_toml(path.as_ref())
    }

    /// Reads settings from `path`, falling back to defaults when the file
    /// is missing or invalid.
    ///
    /// Logging is usually configured from the returned value, so failures are
    /// reported on stderr rather than through `tracing`.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Settings {
        let path = path.as_ref();
        if !path.exists() {
            return Settings::default();
        }

        match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{:#}; using default settings", e);
                Settings::default()
            }
        }
    }
}

fn load_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, Error> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("can't read settings file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("can't parse settings file {}", path.display()))
}
