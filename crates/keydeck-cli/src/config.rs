//! Configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Serial number of the device to open (first device if unset)
    #[serde(default)]
    pub serial: Option<String>,

    /// Brightness in percent applied after opening the device
    #[serde(default)]
    pub brightness: Option<u8>,

    /// Key label rendering
    #[serde(default)]
    pub label: LabelConfig,
}

/// Key label configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Path to a TrueType/OpenType font
    #[serde(default)]
    pub font: Option<PathBuf>,

    /// Font size in pixels
    #[serde(default = "default_label_size")]
    pub size: f32,

    /// Text color (#RRGGBB)
    #[serde(default = "default_label_color")]
    pub color: String,

    /// Background color (#RRGGBB)
    #[serde(default = "default_label_background")]
    pub background: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font: None,
            size: default_label_size(),
            color: default_label_color(),
            background: default_label_background(),
        }
    }
}

// Default value functions
fn default_label_size() -> f32 {
    18.0
}

fn default_label_color() -> String {
    "#FFFFFF".to_string()
}

fn default_label_background() -> String {
    "#000000".to_string()
}

/// Returns `$XDG_CONFIG_HOME/keydeck/config.toml`, falling back to `~/.config`.
pub fn default_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("keydeck").join("config.toml"))
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Loads configuration, using defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
