//! Marker layouts - which file backs which signal
//!
//! The shell has shipped with two naming schemes for its markers. Rather than
//! keeping one window implementation per scheme, the scheme is data: a
//! [`SignalTable`] built from a [`Layout`] plus per-signal overrides.

use super::Signal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Backlight sysfs node shared by both layouts
const BACKLIGHT_PATH: &str = "/sys/class/backlight/rpi_backlight/brightness";
const HOSTAPD_CONF_PATH: &str = "/etc/hostapd/hostapd.conf";
const WALLPAPER_DAY_PATH: &str = "/home/pi/wallpaper.png";
const WALLPAPER_NIGHT_PATH: &str = "/home/pi/wallpaper-night.png";

/// Built-in marker naming schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Underscore names (`night_mode_enabled`, `entityexit`, ...)
    #[default]
    Classic,
    /// Hyphenated names (`force-night-mode`, `app-stop`, ...)
    Hyphenated,
}

impl Layout {
    pub fn all() -> &'static [Layout] {
        &[Layout::Classic, Layout::Hyphenated]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Layout::Classic => "classic",
            Layout::Hyphenated => "hyphenated",
        }
    }

    pub fn from_name(name: &str) -> Option<Layout> {
        Layout::all()
            .iter()
            .copied()
            .find(|l| l.display_name().eq_ignore_ascii_case(name))
    }

    /// Default marker for a signal under this layout
    pub fn marker(&self, signal: Signal) -> &'static str {
        match (self, signal) {
            (_, Signal::BrightnessControl) => BACKLIGHT_PATH,
            (_, Signal::HostapdConfig) => HOSTAPD_CONF_PATH,
            (_, Signal::WallpaperDay) => WALLPAPER_DAY_PATH,
            (_, Signal::WallpaperNight) => WALLPAPER_NIGHT_PATH,
            (_, Signal::HotspotActive) => "hotspot_active",
            (_, Signal::AndroidDevice) => "android_device",
            (_, Signal::Screensaver) => "screensaver",
            (_, Signal::WifiSsid) => "wifi_ssid",
            (_, Signal::WifiGateway) => "gateway_wlan0",

            (Layout::Classic, Signal::NightMode) => "night_mode_enabled",
            (Layout::Classic, Signal::ForceWifi) => "force_wifi",
            (Layout::Classic, Signal::ForceBrightness) => "force_brightness",
            (Layout::Classic, Signal::CustomBrightness) => "custombrightness",
            (Layout::Classic, Signal::HotspotDetected) => "mobile_hotspot_detected",
            (Layout::Classic, Signal::RecentNetworks) => "temp_recent_list",
            (Layout::Classic, Signal::BluetoothDevice) => "btdevice",
            (Layout::Classic, Signal::BluetoothPairable) => "bluetooth_pairable",
            (Layout::Classic, Signal::PairingEnabled) => "enable_pairing",
            (Layout::Classic, Signal::DevMode) => "dev_mode_enabled",
            (Layout::Classic, Signal::ConfigInProgress) => "config_in_progress",
            (Layout::Classic, Signal::DebugInProgress) => "debug_in_progress",
            (Layout::Classic, Signal::ExternalExit) => "external_exit",
            (Layout::Classic, Signal::AppStopRequested) => "entityexit",
            (Layout::Classic, Signal::BlankScreen) => "blankscreen",
            (Layout::Classic, Signal::BlackScreen) => "blackscreen",
            (Layout::Classic, Signal::ModeChangeInProgress) => "mode_change_progress",
            (Layout::Classic, Signal::CsmtUpdating) => "csmt_updating",
            (Layout::Classic, Signal::CsmtUpdateAvailable) => "csmt_update_available",
            (Layout::Classic, Signal::UdevUpdating) => "udev_updating",
            (Layout::Classic, Signal::UdevUpdateAvailable) => "udev_update_available",
            (Layout::Classic, Signal::OpenautoUpdating) => "openauto_updating",
            (Layout::Classic, Signal::OpenautoUpdateAvailable) => "openauto_update_available",
            (Layout::Classic, Signal::SystemUpdateAvailable) => "system_update_available",
            (Layout::Classic, Signal::SystemUpdateDownloading) => "system_update_downloading",
            (Layout::Classic, Signal::SystemUpdateReady) => "system_update_ready",

            (Layout::Hyphenated, Signal::NightMode) => "force-night-mode",
            (Layout::Hyphenated, Signal::ForceWifi) => "force-wifi",
            (Layout::Hyphenated, Signal::ForceBrightness) => "force-brightness",
            (Layout::Hyphenated, Signal::CustomBrightness) => "custom-brightness",
            (Layout::Hyphenated, Signal::HotspotDetected) => "hotspot-detected",
            (Layout::Hyphenated, Signal::RecentNetworks) => "recent-ssids",
            (Layout::Hyphenated, Signal::BluetoothDevice) => "bt-device",
            (Layout::Hyphenated, Signal::BluetoothPairable) => "bt-pairable",
            (Layout::Hyphenated, Signal::PairingEnabled) => "enable-pairing",
            (Layout::Hyphenated, Signal::DevMode) => "dev-mode-enabled",
            (Layout::Hyphenated, Signal::ConfigInProgress) => "config-in-progress",
            (Layout::Hyphenated, Signal::DebugInProgress) => "debug-in-progress",
            (Layout::Hyphenated, Signal::ExternalExit) => "external-exit",
            (Layout::Hyphenated, Signal::AppStopRequested) => "app-stop",
            (Layout::Hyphenated, Signal::BlankScreen) => "blank-screen",
            (Layout::Hyphenated, Signal::BlackScreen) => "black-screen",
            (Layout::Hyphenated, Signal::ModeChangeInProgress) => "mode-change-progress",
            (Layout::Hyphenated, Signal::CsmtUpdating) => "csmt-updating",
            (Layout::Hyphenated, Signal::CsmtUpdateAvailable) => "csmt-update-available",
            (Layout::Hyphenated, Signal::UdevUpdating) => "udev-updating",
            (Layout::Hyphenated, Signal::UdevUpdateAvailable) => "udev-update-available",
            (Layout::Hyphenated, Signal::OpenautoUpdating) => "openauto-updating",
            (Layout::Hyphenated, Signal::OpenautoUpdateAvailable) => "openauto-update-available",
            (Layout::Hyphenated, Signal::SystemUpdateAvailable) => "system-update-available",
            (Layout::Hyphenated, Signal::SystemUpdateDownloading) => "system-update-downloading",
            (Layout::Hyphenated, Signal::SystemUpdateReady) => "system-update-ready",
        }
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("unknown signal in marker overrides: {0}")]
    UnknownSignal(String),

    #[error("empty marker path for signal {0}")]
    EmptyMarker(Signal),
}

/// Resolved mapping from every signal to its marker path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalTable {
    root: PathBuf,
    markers: HashMap<Signal, PathBuf>,
}

impl SignalTable {
    /// Build the table for a layout. Relative markers resolve against `root`.
    pub fn new(root: impl Into<PathBuf>, layout: Layout) -> Self {
        let root = root.into();
        let markers = Signal::ALL
            .iter()
            .map(|&signal| (signal, root.join(layout.marker(signal))))
            .collect();
        Self { root, markers }
    }

    /// Replace individual markers, keyed by signal name
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Result<Self, LayoutError> {
        for (name, marker) in overrides {
            let signal =
                Signal::from_name(name).ok_or_else(|| LayoutError::UnknownSignal(name.clone()))?;
            if marker.trim().is_empty() {
                return Err(LayoutError::EmptyMarker(signal));
            }
            self.markers.insert(signal, self.root.join(marker.trim()));
        }
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Marker path for a signal
    pub fn path(&self, signal: Signal) -> &Path {
        // Every signal is inserted by `new`, overrides only replace entries
        &self.markers[&signal]
    }

    /// All marker paths, ordered by signal
    pub fn paths(&self) -> Vec<(Signal, &Path)> {
        Signal::ALL
            .iter()
            .map(|&signal| (signal, self.path(signal)))
            .collect()
    }
}
