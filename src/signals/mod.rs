//! Signals - named facts published by out-of-process scripts and daemons
//!
//! A signal is backed by a marker (usually a file under `/tmp`). Flag signals
//! are true while the marker exists; text signals carry the marker content.

pub mod layout;
pub mod store;
pub mod watch;

pub use layout::{Layout, SignalTable};
pub use store::{FsSignalStore, MemorySignalStore, SignalError, SignalStore};
pub use watch::MarkerWatcher;

use serde::{Deserialize, Serialize};

/// How a signal's marker is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Presence of the marker
    Flag,
    /// Content of the marker (empty when absent)
    Text,
}

/// Every signal the shell knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    NightMode,
    ForceWifi,
    ForceBrightness,
    CustomBrightness,
    BrightnessControl,
    WallpaperDay,
    WallpaperNight,
    HotspotActive,
    HotspotDetected,
    RecentNetworks,
    AndroidDevice,
    BluetoothDevice,
    BluetoothPairable,
    PairingEnabled,
    DevMode,
    ConfigInProgress,
    DebugInProgress,
    ExternalExit,
    AppStopRequested,
    BlankScreen,
    Screensaver,
    BlackScreen,
    WifiSsid,
    WifiGateway,
    HostapdConfig,
    ModeChangeInProgress,
    CsmtUpdating,
    CsmtUpdateAvailable,
    UdevUpdating,
    UdevUpdateAvailable,
    OpenautoUpdating,
    OpenautoUpdateAvailable,
    SystemUpdateAvailable,
    SystemUpdateDownloading,
    SystemUpdateReady,
}

impl Signal {
    /// All signals, in declaration order
    pub const ALL: [Signal; 35] = [
        Signal::NightMode,
        Signal::ForceWifi,
        Signal::ForceBrightness,
        Signal::CustomBrightness,
        Signal::BrightnessControl,
        Signal::WallpaperDay,
        Signal::WallpaperNight,
        Signal::HotspotActive,
        Signal::HotspotDetected,
        Signal::RecentNetworks,
        Signal::AndroidDevice,
        Signal::BluetoothDevice,
        Signal::BluetoothPairable,
        Signal::PairingEnabled,
        Signal::DevMode,
        Signal::ConfigInProgress,
        Signal::DebugInProgress,
        Signal::ExternalExit,
        Signal::AppStopRequested,
        Signal::BlankScreen,
        Signal::Screensaver,
        Signal::BlackScreen,
        Signal::WifiSsid,
        Signal::WifiGateway,
        Signal::HostapdConfig,
        Signal::ModeChangeInProgress,
        Signal::CsmtUpdating,
        Signal::CsmtUpdateAvailable,
        Signal::UdevUpdating,
        Signal::UdevUpdateAvailable,
        Signal::OpenautoUpdating,
        Signal::OpenautoUpdateAvailable,
        Signal::SystemUpdateAvailable,
        Signal::SystemUpdateDownloading,
        Signal::SystemUpdateReady,
    ];

    /// Stable identifier used in config files and logs
    pub fn name(&self) -> &'static str {
        match self {
            Signal::NightMode => "night_mode",
            Signal::ForceWifi => "force_wifi",
            Signal::ForceBrightness => "force_brightness",
            Signal::CustomBrightness => "custom_brightness",
            Signal::BrightnessControl => "brightness_control",
            Signal::WallpaperDay => "wallpaper_day",
            Signal::WallpaperNight => "wallpaper_night",
            Signal::HotspotActive => "hotspot_active",
            Signal::HotspotDetected => "hotspot_detected",
            Signal::RecentNetworks => "recent_networks",
            Signal::AndroidDevice => "android_device",
            Signal::BluetoothDevice => "bluetooth_device",
            Signal::BluetoothPairable => "bluetooth_pairable",
            Signal::PairingEnabled => "pairing_enabled",
            Signal::DevMode => "dev_mode",
            Signal::ConfigInProgress => "config_in_progress",
            Signal::DebugInProgress => "debug_in_progress",
            Signal::ExternalExit => "external_exit",
            Signal::AppStopRequested => "app_stop_requested",
            Signal::BlankScreen => "blank_screen",
            Signal::Screensaver => "screensaver",
            Signal::BlackScreen => "black_screen",
            Signal::WifiSsid => "wifi_ssid",
            Signal::WifiGateway => "wifi_gateway",
            Signal::HostapdConfig => "hostapd_config",
            Signal::ModeChangeInProgress => "mode_change_in_progress",
            Signal::CsmtUpdating => "csmt_updating",
            Signal::CsmtUpdateAvailable => "csmt_update_available",
            Signal::UdevUpdating => "udev_updating",
            Signal::UdevUpdateAvailable => "udev_update_available",
            Signal::OpenautoUpdating => "openauto_updating",
            Signal::OpenautoUpdateAvailable => "openauto_update_available",
            Signal::SystemUpdateAvailable => "system_update_available",
            Signal::SystemUpdateDownloading => "system_update_downloading",
            Signal::SystemUpdateReady => "system_update_ready",
        }
    }

    /// Look up a signal by its stable name
    pub fn from_name(name: &str) -> Option<Signal> {
        Signal::ALL.iter().copied().find(|s| s.name() == name)
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::BluetoothDevice
            | Signal::WifiSsid
            | Signal::WifiGateway
            | Signal::HostapdConfig => SignalKind::Text,
            _ => SignalKind::Flag,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
