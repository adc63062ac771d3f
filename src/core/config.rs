//! Configuration management

use crate::signals::{Layout, SignalTable};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Signal store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory that relative markers resolve against
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
    /// Built-in marker naming scheme
    #[serde(default)]
    pub layout: Layout,
    /// Per-signal marker overrides (signal name -> marker path)
    #[serde(default)]
    pub markers: BTreeMap<String, String>,
}

fn default_store_root() -> PathBuf {
    PathBuf::from("/tmp")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            layout: Layout::default(),
            markers: BTreeMap::new(),
        }
    }
}

impl StoreConfig {
    /// Resolve the marker table for this configuration
    pub fn signal_table(&self) -> Result<SignalTable> {
        SignalTable::new(&self.root, self.layout)
            .with_overrides(&self.markers)
            .context("Invalid marker overrides")
    }
}

/// Reconciliation timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Periodic refresh interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Marker polling interval in milliseconds
    #[serde(default = "default_watch_interval")]
    pub watch_interval_ms: u64,
}

fn default_tick_interval() -> u64 {
    1000
}
fn default_watch_interval() -> u64 {
    250
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            watch_interval_ms: default_watch_interval(),
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms.max(1))
    }
}

/// Host device paths and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Backlight brightness file
    #[serde(default = "default_brightness_path")]
    pub brightness_path: PathBuf,
    /// Brightness file used while a custom brightness command is active
    #[serde(default = "default_custom_brightness_path")]
    pub custom_brightness_path: PathBuf,
    /// Directory where system update images are downloaded
    #[serde(default = "default_update_storage_dir")]
    pub update_storage_dir: PathBuf,
    #[serde(default = "default_brightness_min")]
    pub brightness_min: u32,
    #[serde(default = "default_brightness_max")]
    pub brightness_max: u32,
    #[serde(default = "default_brightness_step")]
    pub brightness_step: u32,
}

fn default_brightness_path() -> PathBuf {
    PathBuf::from("/sys/class/backlight/rpi_backlight/brightness")
}
fn default_custom_brightness_path() -> PathBuf {
    PathBuf::from("/tmp/custombrightness")
}
fn default_update_storage_dir() -> PathBuf {
    PathBuf::from("/media/USBDRIVES/CSSTORAGE")
}
fn default_brightness_min() -> u32 {
    30
}
fn default_brightness_max() -> u32 {
    255
}
fn default_brightness_step() -> u32 {
    25
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            brightness_path: default_brightness_path(),
            custom_brightness_path: default_custom_brightness_path(),
            update_storage_dir: default_update_storage_dir(),
            brightness_min: default_brightness_min(),
            brightness_max: default_brightness_max(),
            brightness_step: default_brightness_step(),
        }
    }
}

/// Command templates for host actions. `{value}` is replaced by the action
/// argument. An empty list means the action is not configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_set_volume")]
    pub set_volume: Vec<String>,
    #[serde(default = "default_mute")]
    pub mute: Vec<String>,
    #[serde(default = "default_unmute")]
    pub unmute: Vec<String>,
    #[serde(default = "default_enable_pairing")]
    pub enable_pairing: Vec<String>,
    #[serde(default = "default_debug_log")]
    pub debug_log: Vec<String>,
    #[serde(default)]
    pub day_mode: Vec<String>,
    #[serde(default)]
    pub night_mode: Vec<String>,
    #[serde(default)]
    pub reboot: Vec<String>,
    #[serde(default)]
    pub shutdown: Vec<String>,
    #[serde(default)]
    pub app_stop: Vec<String>,
    #[serde(default = "default_update")]
    pub update: Vec<String>,
    #[serde(default = "default_update_check")]
    pub update_check: Vec<String>,
    #[serde(default = "default_update_cancel")]
    pub update_cancel: Vec<String>,
    #[serde(default = "default_network")]
    pub network: Vec<String>,
    #[serde(default = "default_hotspot_start")]
    pub hotspot_start: Vec<String>,
    #[serde(default = "default_hotspot_stop")]
    pub hotspot_stop: Vec<String>,
    #[serde(default = "default_bluetooth_unpair")]
    pub bluetooth_unpair: Vec<String>,
    #[serde(default = "default_rtc_sync")]
    pub rtc_sync: Vec<String>,
    #[serde(default = "default_set_time")]
    pub set_time: Vec<String>,
    #[serde(default = "default_audio_test")]
    pub audio_test: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn default_set_volume() -> Vec<String> {
    argv(&["/usr/local/bin/autoapp_helper", "setvolume", "{value}"])
}
fn default_mute() -> Vec<String> {
    argv(&["/usr/local/bin/autoapp_helper", "setmute"])
}
fn default_unmute() -> Vec<String> {
    argv(&["/usr/local/bin/autoapp_helper", "setunmute"])
}
fn default_enable_pairing() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "bluetooth", "pairable"])
}
fn default_debug_log() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "debuglog"])
}
fn default_update() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "update", "{value}"])
}
fn default_update_check() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "update", "check"])
}
fn default_update_cancel() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "update", "cancel"])
}
fn default_network() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "network", "{value}"])
}
fn default_hotspot_start() -> Vec<String> {
    argv(&["/opt/crankshaft/service_hotspot.sh", "start"])
}
fn default_hotspot_stop() -> Vec<String> {
    argv(&["/opt/crankshaft/service_hotspot.sh", "stop"])
}
fn default_bluetooth_unpair() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "bluetooth", "unpair"])
}
fn default_rtc_sync() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "rtc", "sync"])
}
fn default_set_time() -> Vec<String> {
    argv(&["/usr/local/bin/autoapp_helper", "settime#{value}"])
}
fn default_audio_test() -> Vec<String> {
    argv(&["/usr/local/bin/crankshaft", "audio", "test"])
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            set_volume: default_set_volume(),
            mute: default_mute(),
            unmute: default_unmute(),
            enable_pairing: default_enable_pairing(),
            debug_log: default_debug_log(),
            day_mode: Vec::new(),
            night_mode: Vec::new(),
            reboot: Vec::new(),
            shutdown: Vec::new(),
            app_stop: Vec::new(),
            update: default_update(),
            update_check: default_update_check(),
            update_cancel: default_update_cancel(),
            network: default_network(),
            hotspot_start: default_hotspot_start(),
            hotspot_stop: default_hotspot_stop(),
            bluetooth_unpair: default_bluetooth_unpair(),
            rtc_sync: default_rtc_sync(),
            set_time: default_set_time(),
            audio_test: default_audio_test(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Signal store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Reconciliation timing
    #[serde(default)]
    pub timing: TimingConfig,
    /// Host device paths
    #[serde(default)]
    pub host: HostConfig,
    /// Host action command templates
    #[serde(default)]
    pub commands: CommandConfig,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a file, falling back to defaults if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "headunit", "HeadunitShell")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Get the default configuration embedded in the binary
    pub fn default_config_str() -> &'static str {
        include_str!("../../config/default.toml")
    }
}
