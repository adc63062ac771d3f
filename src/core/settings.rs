//! User preference management
//!
//! Preferences (clock, network info, brightness control, button transparency)
//! are owned by the settings component. The reconciler only reads them through
//! [`ConfigProvider`].

use anyhow::{Context, Result};
use directories::ProjectDirs;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Default button transparency (percent)
pub const DEFAULT_ALPHA_TRANS: u8 = 50;

/// Minimum button transparency
pub const MIN_ALPHA_TRANS: u8 = 0;

/// Maximum button transparency
pub const MAX_ALPHA_TRANS: u8 = 100;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("preference {0} is unavailable")]
    Unavailable(&'static str),

    #[error("unknown preference: {0}")]
    UnknownKey(String),

    #[error("invalid value {value:?} for preference {key}")]
    InvalidValue { key: String, value: String },
}

/// Typed access to user preferences
pub trait ConfigProvider {
    fn show_clock(&self) -> Result<bool, SettingsError>;
    fn show_network_info(&self) -> Result<bool, SettingsError>;
    fn hide_brightness_control(&self) -> Result<bool, SettingsError>;
    fn alpha_trans(&self) -> Result<u8, SettingsError>;
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Show the clock in the header
    #[serde(default = "default_show_clock")]
    pub show_clock: bool,

    /// Show the network info panel
    #[serde(default)]
    pub show_network_info: bool,

    /// Hide the brightness (and volume) buttons
    #[serde(default)]
    pub hide_brightness_control: bool,

    /// Button transparency in percent
    #[serde(default = "default_alpha_trans", deserialize_with = "deserialize_alpha_trans")]
    pub alpha_trans: u8,
}

fn default_show_clock() -> bool {
    true
}

fn default_alpha_trans() -> u8 {
    DEFAULT_ALPHA_TRANS
}

/// Out-of-range integers are clamped, anything else falls back to the default
fn deserialize_alpha_trans<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = toml::Value::deserialize(deserializer)?;
    match value.as_integer() {
        Some(n) => Ok(n.clamp(i64::from(MIN_ALPHA_TRANS), i64::from(MAX_ALPHA_TRANS)) as u8),
        None => {
            warn!("Ignoring alpha_trans = {}, using default", value);
            Ok(DEFAULT_ALPHA_TRANS)
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_clock: default_show_clock(),
            show_network_info: false,
            hide_brightness_control: false,
            alpha_trans: default_alpha_trans(),
        }
    }
}

impl Settings {
    /// Create new settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        Self::load_from(&path)
    }

    /// Load settings from a file, falling back to defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file: {:?}", path))?;
            let mut settings: Settings = toml::from_str(&content)
                .with_context(|| format!("Failed to parse settings file: {:?}", path))?;
            settings.set_alpha_trans(settings.alpha_trans);
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {:?}", path))?;

        Ok(())
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "headunit", "HeadunitShell")
            .context("Failed to determine settings directory")?;
        Ok(proj_dirs.config_dir().join("settings.toml"))
    }

    /// Set transparency with clamping to valid range
    pub fn set_alpha_trans(&mut self, value: u8) {
        self.alpha_trans = value.clamp(MIN_ALPHA_TRANS, MAX_ALPHA_TRANS);
    }

    /// Names accepted by [`Settings::set`]
    pub fn keys() -> &'static [&'static str] {
        &[
            "show_clock",
            "show_network_info",
            "hide_brightness_control",
            "alpha_trans",
        ]
    }

    /// Set a preference from its textual form
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "show_clock" => self.show_clock = parse_bool(value).ok_or_else(invalid)?,
            "show_network_info" => self.show_network_info = parse_bool(value).ok_or_else(invalid)?,
            "hide_brightness_control" => {
                self.hide_brightness_control = parse_bool(value).ok_or_else(invalid)?
            }
            "alpha_trans" => {
                let parsed: u32 = value.trim().parse().map_err(|_| invalid())?;
                self.set_alpha_trans(parsed.min(u32::from(MAX_ALPHA_TRANS)) as u8);
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ConfigProvider for Settings {
    fn show_clock(&self) -> Result<bool, SettingsError> {
        Ok(self.show_clock)
    }

    fn show_network_info(&self) -> Result<bool, SettingsError> {
        Ok(self.show_network_info)
    }

    fn hide_brightness_control(&self) -> Result<bool, SettingsError> {
        Ok(self.hide_brightness_control)
    }

    fn alpha_trans(&self) -> Result<u8, SettingsError> {
        Ok(self.alpha_trans)
    }
}

/// Live settings shared between the settings component and the reconciler
#[derive(Debug, Clone)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
    path: Option<PathBuf>,
}

impl SharedSettings {
    /// Wrap settings; `path` is where `save`/`reset` persist them
    pub fn new(settings: Settings, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self::new(Settings::load_from(path)?, Some(path.to_path_buf())))
    }

    /// Like `load_from`, but starts from defaults when the file is unreadable
    pub fn load_or_default(path: &Path) -> Self {
        let settings = Settings::load_from(path).unwrap_or_else(|e| {
            warn!("Using default settings: {:#}", e);
            Settings::default()
        });
        Self::new(settings, Some(path.to_path_buf()))
    }

    /// Copy of the current preferences
    pub fn snapshot(&self) -> Settings {
        self.inner.read().clone()
    }

    /// Modify preferences in place (not persisted until `save`)
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut *self.inner.write());
    }

    /// Persist the current preferences
    pub fn save(&self) -> Result<()> {
        let settings = self.snapshot();
        match &self.path {
            Some(path) => settings.save_to(path),
            None => settings.save(),
        }
    }

    /// Re-read the persisted preferences, if they live in a file
    pub fn reload(&self) -> Result<()> {
        if let Some(path) = &self.path {
            *self.inner.write() = Settings::load_from(path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Restore defaults and persist them
    pub fn reset(&self) -> Result<()> {
        *self.inner.write() = Settings::default();
        self.save()
    }
}

impl ConfigProvider for SharedSettings {
    fn show_clock(&self) -> Result<bool, SettingsError> {
        Ok(self.inner.read().show_clock)
    }

    fn show_network_info(&self) -> Result<bool, SettingsError> {
        Ok(self.inner.read().show_network_info)
    }

    fn hide_brightness_control(&self) -> Result<bool, SettingsError> {
        Ok(self.inner.read().hide_brightness_control)
    }

    fn alpha_trans(&self) -> Result<u8, SettingsError> {
        Ok(self.inner.read().alpha_trans)
    }
}
