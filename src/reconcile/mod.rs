//! Host state reconciliation
//!
//! One pass reads every signal and preference, derives a fresh [`ShellState`]
//! and lists the side effects to perform. A pass never fails: unreadable
//! markers count as absent and unavailable preferences fall back to defaults.

pub mod effects;
pub mod update;

pub use effects::{EffectList, SideEffect};
pub use update::{
    scan_download_dir, Component, ComponentStatus, DownloadInfo, SystemStatus, UpdatePanel,
    UpdateReconciler,
};

use crate::core::settings::{ConfigProvider, Settings, SettingsError};
use crate::core::state::{
    truncate_string, NetworkInfo, NetworkMode, ShellState, StateDelta, Wallpaper, MAX_DISPLAY_LEN,
};
use crate::signals::{Signal, SignalStore};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Bottom status text while a configuration script runs
pub const STATUS_CONFIG_IN_PROGRESS: &str = "Config in progress ...";

/// Bottom status text while a debug archive is being created
pub const STATUS_DEBUG_IN_PROGRESS: &str = "Creating debug.zip ...";

/// Top status text while bluetooth pairing is open
pub const STATUS_PAIRING_ENABLED: &str = "Pairing enabled for 120 seconds!";

/// Result of one pass
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub state: ShellState,
    pub effects: Vec<SideEffect>,
    /// Fields changed relative to the previous state
    pub deltas: Vec<StateDelta>,
}

/// Fail-closed reads over a signal store
pub(crate) struct SignalReader<'a, S: SignalStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SignalStore + ?Sized> SignalReader<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub(crate) fn flag(&self, signal: Signal) -> bool {
        match self.store.exists(signal) {
            Ok(present) => present,
            Err(e) => {
                warn!("Treating {} as absent: {}", signal, e);
                false
            }
        }
    }

    pub(crate) fn text(&self, signal: Signal) -> String {
        match self.store.read_text(signal) {
            Ok(text) => text,
            Err(e) => {
                warn!("Treating {} as empty: {}", signal, e);
                String::new()
            }
        }
    }
}

fn preference<T>(name: &str, value: Result<T, SettingsError>, default: T) -> T {
    match value {
        Ok(v) => v,
        Err(e) => {
            warn!("Using default for {}: {}", name, e);
            default
        }
    }
}

/// Value of `key` in a `key=value` config file (hostapd style)
pub fn conf_param(text: &str, key: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().to_string())
}

/// Stateless reconciler for the main dashboard
#[derive(Debug, Clone, Copy, Default)]
pub struct HostStateReconciler;

impl HostStateReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Run one pass. `previous` only feeds the render deltas.
    pub fn reconcile<S, C>(
        &self,
        store: &S,
        config: &C,
        previous: Option<&ShellState>,
    ) -> Reconciliation
    where
        S: SignalStore + ?Sized,
        C: ConfigProvider + ?Sized,
    {
        let signals = SignalReader::new(store);
        let defaults = Settings::default();

        let show_clock = preference("show_clock", config.show_clock(), defaults.show_clock);
        let show_network_info = preference(
            "show_network_info",
            config.show_network_info(),
            defaults.show_network_info,
        );
        let hide_brightness = preference(
            "hide_brightness_control",
            config.hide_brightness_control(),
            defaults.hide_brightness_control,
        );
        let alpha = preference("alpha_trans", config.alpha_trans(), defaults.alpha_trans);

        let night_mode = signals.flag(Signal::NightMode);
        let black_screen = signals.flag(Signal::BlackScreen);
        let wallpaper = if black_screen {
            Wallpaper::Black
        } else if night_mode && signals.flag(Signal::WallpaperNight) {
            Wallpaper::Night
        } else if !night_mode && signals.flag(Signal::WallpaperDay) {
            Wallpaper::Day
        } else {
            Wallpaper::Plain
        };

        let hotspot_active = signals.flag(Signal::HotspotActive);
        let hotspot_detected = signals.flag(Signal::HotspotDetected);
        let wifi_visible = hotspot_active || hotspot_detected || signals.flag(Signal::ForceWifi);
        let wifi_button_visible = signals.flag(Signal::RecentNetworks) || hotspot_detected;

        let android_connected = signals.flag(Signal::AndroidDevice);

        let config_in_progress = signals.flag(Signal::ConfigInProgress);
        let debug_in_progress = signals.flag(Signal::DebugInProgress);
        let lock_settings = config_in_progress || debug_in_progress;
        // Config wins when both scripts run
        let status_message = if config_in_progress {
            STATUS_CONFIG_IN_PROGRESS
        } else if debug_in_progress {
            STATUS_DEBUG_IN_PROGRESS
        } else {
            ""
        };
        let status_top = if signals.flag(Signal::PairingEnabled) {
            STATUS_PAIRING_ENABLED
        } else {
            ""
        };

        let brightness_available = signals.flag(Signal::BrightnessControl)
            || signals.flag(Signal::ForceBrightness)
            || signals.flag(Signal::CustomBrightness);

        let bluetooth_connected = signals.flag(Signal::BluetoothDevice);
        let bluetooth_device = if bluetooth_connected {
            truncate_string(signals.text(Signal::BluetoothDevice).trim(), MAX_DISPLAY_LEN)
        } else {
            String::new()
        };
        let pairable = signals.flag(Signal::BluetoothPairable);

        let screensaver = signals.flag(Signal::Screensaver);
        let dev_mode = signals.flag(Signal::DevMode);

        let state = ShellState {
            night_mode,
            day_toggle_visible: night_mode,
            night_toggle_visible: !night_mode,
            wallpaper,
            wifi_visible,
            usb_visible: !wifi_visible,
            wifi_button_visible,
            no_wifi_device_visible: !wifi_button_visible,
            android_connected,
            no_device_visible: !android_connected,
            lock_settings,
            settings_button_visible: !lock_settings,
            status_message: status_message.to_string(),
            status_top: status_top.to_string(),
            clock_visible: show_clock,
            network_info_visible: show_network_info,
            alpha,
            brightness_button_visible: brightness_available && !hide_brightness,
            volume_button_visible: !hide_brightness,
            bluetooth_device_visible: !bluetooth_device.is_empty(),
            bluetooth_device,
            pairable_visible: pairable,
            bluetooth_button_visible: !pairable,
            main_visible: !signals.flag(Signal::BlankScreen) && !black_screen,
            header_visible: !screensaver,
            tiles_visible: !screensaver,
            connection_locked: bluetooth_connected || dev_mode || android_connected,
            network: network_info(&signals, hotspot_active),
        };

        let mut effects = EffectList::new();
        if signals.flag(Signal::ExternalExit) {
            info!("External exit requested");
            effects.push(SideEffect::RequestShutdown);
            effects.push(SideEffect::ClearMarker(Signal::ExternalExit));
        }
        if signals.flag(Signal::AppStopRequested) {
            info!("App stop requested");
            effects.push(SideEffect::RequestAppStop);
            effects.push(SideEffect::ClearMarker(Signal::AppStopRequested));
        }

        let deltas = state.diff(previous);
        debug!(
            "Reconciled: {} changed fields, {} effects",
            deltas.len(),
            effects.len()
        );
        if !effects.is_empty() {
            debug!("Effects: {:?}", effects);
        }

        Reconciliation {
            state,
            effects: effects.into_vec(),
            deltas,
        }
    }
}

fn network_info<S: SignalStore + ?Sized>(signals: &SignalReader<'_, S>, hotspot_active: bool) -> NetworkInfo {
    let gateway = truncate_string(signals.text(Signal::WifiGateway).trim(), MAX_DISPLAY_LEN);

    if signals.flag(Signal::ModeChangeInProgress) {
        return NetworkInfo {
            mode: NetworkMode::Switching,
            ssid: String::new(),
            gateway,
        };
    }

    let (mode, ssid) = if hotspot_active {
        let conf = signals.text(Signal::HostapdConfig);
        (NetworkMode::Hotspot, conf_param(&conf, "ssid").unwrap_or_default())
    } else {
        (NetworkMode::Client, signals.text(Signal::WifiSsid).trim().to_string())
    };

    NetworkInfo {
        mode,
        ssid: truncate_string(&ssid, MAX_DISPLAY_LEN),
        gateway,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::MemorySignalStore;

    struct BrokenPreferences;

    impl ConfigProvider for BrokenPreferences {
        fn show_clock(&self) -> Result<bool, SettingsError> {
            Err(SettingsError::Unavailable("show_clock"))
        }
        fn show_network_info(&self) -> Result<bool, SettingsError> {
            Ok(true)
        }
        fn hide_brightness_control(&self) -> Result<bool, SettingsError> {
            Err(SettingsError::Unavailable("hide_brightness_control"))
        }
        fn alpha_trans(&self) -> Result<u8, SettingsError> {
            Err(SettingsError::Unavailable("alpha_trans"))
        }
    }

    fn run(store: &MemorySignalStore) -> Reconciliation {
        HostStateReconciler::new().reconcile(store, &Settings::default(), None)
    }

    #[test]
    fn test_empty_store() {
        let store = MemorySignalStore::new();
        let state = run(&store).state;
        assert!(!state.night_mode);
        assert!(state.night_toggle_visible);
        assert!(!state.day_toggle_visible);
        assert!(state.usb_visible);
        assert!(state.no_device_visible);
        assert!(state.settings_button_visible);
        assert!(state.main_visible);
        assert!(state.clock_visible);
        assert!(!state.brightness_button_visible);
        assert_eq!(state.wallpaper, Wallpaper::Plain);
        assert_eq!(state.network.mode, NetworkMode::Client);
    }

    #[test]
    fn test_night_with_android_device() {
        let store = MemorySignalStore::new();
        store.set(Signal::NightMode);
        store.set(Signal::AndroidDevice);

        let result = run(&store);
        let state = result.state;
        assert!(state.night_mode);
        assert!(!state.wifi_visible);
        assert!(state.usb_visible);
        assert!(state.android_connected);
        assert!(!state.no_device_visible);
        assert!(!state.lock_settings);
        assert_eq!(state.status_message, "");
        assert!(state.connection_locked);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_config_takes_precedence_over_debug() {
        let store = MemorySignalStore::new();
        store.set(Signal::ConfigInProgress);
        store.set(Signal::DebugInProgress);

        let state = run(&store).state;
        assert!(state.lock_settings);
        assert!(!state.settings_button_visible);
        assert_eq!(state.status_message, STATUS_CONFIG_IN_PROGRESS);

        store.remove(Signal::ConfigInProgress);
        let state = run(&store).state;
        assert!(state.lock_settings);
        assert_eq!(state.status_message, STATUS_DEBUG_IN_PROGRESS);
    }

    #[test]
    fn test_wifi_sources() {
        for signal in [Signal::HotspotActive, Signal::HotspotDetected, Signal::ForceWifi] {
            let store = MemorySignalStore::new();
            store.set(signal);
            let state = run(&store).state;
            assert!(state.wifi_visible, "{} should show wifi", signal);
            assert!(!state.usb_visible);
        }
    }

    #[test]
    fn test_wallpaper_selection() {
        let store = MemorySignalStore::new();
        store.set(Signal::WallpaperDay);
        assert_eq!(run(&store).state.wallpaper, Wallpaper::Day);

        // Night mode without a night image falls back to plain
        store.set(Signal::NightMode);
        assert_eq!(run(&store).state.wallpaper, Wallpaper::Plain);

        store.set(Signal::WallpaperNight);
        assert_eq!(run(&store).state.wallpaper, Wallpaper::Night);

        store.set(Signal::BlackScreen);
        let state = run(&store).state;
        assert_eq!(state.wallpaper, Wallpaper::Black);
        assert!(!state.main_visible);
    }

    #[test]
    fn test_brightness_button_rules() {
        let store = MemorySignalStore::new();
        store.set(Signal::CustomBrightness);
        assert!(run(&store).state.brightness_button_visible);

        let hidden = Settings {
            hide_brightness_control: true,
            ..Settings::default()
        };
        let state = HostStateReconciler::new().reconcile(&store, &hidden, None).state;
        assert!(!state.brightness_button_visible);
        assert!(!state.volume_button_visible);
    }

    #[test]
    fn test_bluetooth_state() {
        let store = MemorySignalStore::new();
        store.set_text(Signal::BluetoothDevice, "Pixel 7\n");
        store.set(Signal::BluetoothPairable);
        store.set(Signal::PairingEnabled);

        let state = run(&store).state;
        assert_eq!(state.bluetooth_device, "Pixel 7");
        assert!(state.bluetooth_device_visible);
        assert!(state.pairable_visible);
        assert!(!state.bluetooth_button_visible);
        assert_eq!(state.status_top, STATUS_PAIRING_ENABLED);
        assert!(state.connection_locked);
    }

    #[test]
    fn test_blank_bluetooth_name_hides_device() {
        let store = MemorySignalStore::new();
        store.set_text(Signal::BluetoothDevice, "  \n");

        let state = run(&store).state;
        assert!(state.bluetooth_device.is_empty());
        assert!(!state.bluetooth_device_visible);
        // The marker alone still holds the connection
        assert!(state.connection_locked);
    }

    #[test]
    fn test_screensaver_and_blank_screen() {
        let store = MemorySignalStore::new();
        store.set(Signal::Screensaver);
        store.set(Signal::BlankScreen);
        let state = run(&store).state;
        assert!(!state.header_visible);
        assert!(!state.tiles_visible);
        assert!(!state.main_visible);
    }

    #[test]
    fn test_network_info_modes() {
        let store = MemorySignalStore::new();
        store.set_text(Signal::WifiSsid, "home\n");
        store.set_text(Signal::WifiGateway, "192.168.1.1\n");
        let network = run(&store).state.network;
        assert_eq!(network.mode, NetworkMode::Client);
        assert_eq!(network.ssid, "home");
        assert_eq!(network.gateway, "192.168.1.1");

        store.set(Signal::HotspotActive);
        store.set_text(
            Signal::HostapdConfig,
            "# hostapd\ninterface=wlan0\nssid=CarHotspot\nchannel=6\n",
        );
        let network = run(&store).state.network;
        assert_eq!(network.mode, NetworkMode::Hotspot);
        assert_eq!(network.ssid, "CarHotspot");

        store.set(Signal::ModeChangeInProgress);
        let network = run(&store).state.network;
        assert_eq!(network.mode, NetworkMode::Switching);
        assert!(network.ssid.is_empty());
    }

    #[test]
    fn test_unreadable_marker_fails_closed() {
        let store = MemorySignalStore::new();
        store.set(Signal::AndroidDevice);
        store.set(Signal::NightMode);
        store.fail(Signal::HotspotActive);
        store.fail(Signal::BluetoothDevice);

        let state = run(&store).state;
        assert!(!state.wifi_visible);
        assert!(state.usb_visible);
        assert!(state.android_connected);
        assert!(state.night_mode);
        assert!(!state.bluetooth_device_visible);
    }

    #[test]
    fn test_exclusive_pairs_hold_for_every_marker_combination() {
        const SIGNALS: [Signal; 7] = [
            Signal::HotspotActive,
            Signal::HotspotDetected,
            Signal::ForceWifi,
            Signal::RecentNetworks,
            Signal::AndroidDevice,
            Signal::BluetoothPairable,
            Signal::NightMode,
        ];

        // Each signal is absent (0), present (1) or unreadable (2)
        let combinations = 3usize.pow(SIGNALS.len() as u32);
        for combination in 0..combinations {
            let store = MemorySignalStore::new();
            let mut code = combination;
            for signal in SIGNALS {
                match code % 3 {
                    1 => store.set(signal),
                    2 => store.fail(signal),
                    _ => {}
                }
                code /= 3;
            }

            let state = run(&store).state;
            assert!(state.wifi_visible ^ state.usb_visible, "{}", combination);
            assert!(
                state.android_connected ^ state.no_device_visible,
                "{}",
                combination
            );
            assert!(
                state.wifi_button_visible ^ state.no_wifi_device_visible,
                "{}",
                combination
            );
            assert!(
                state.pairable_visible ^ state.bluetooth_button_visible,
                "{}",
                combination
            );
            assert!(
                state.day_toggle_visible ^ state.night_toggle_visible,
                "{}",
                combination
            );
        }
    }

    #[test]
    fn test_unavailable_preferences_use_defaults() {
        let store = MemorySignalStore::new();
        store.set(Signal::ForceBrightness);
        let state = HostStateReconciler::new()
            .reconcile(&store, &BrokenPreferences, None)
            .state;
        let defaults = Settings::default();
        assert_eq!(state.clock_visible, defaults.show_clock);
        assert!(state.network_info_visible);
        assert!(state.brightness_button_visible);
        assert_eq!(state.alpha, defaults.alpha_trans);
    }

    #[test]
    fn test_exit_markers_produce_effects_once() {
        let store = MemorySignalStore::new();
        store.set(Signal::ExternalExit);
        store.set(Signal::AppStopRequested);

        let effects = run(&store).effects;
        assert_eq!(
            effects,
            vec![
                SideEffect::RequestShutdown,
                SideEffect::ClearMarker(Signal::ExternalExit),
                SideEffect::RequestAppStop,
                SideEffect::ClearMarker(Signal::AppStopRequested),
            ]
        );
    }

    #[test]
    fn test_pass_is_idempotent() {
        let store = MemorySignalStore::new();
        store.set(Signal::HotspotDetected);
        store.set(Signal::DebugInProgress);
        store.set_text(Signal::BluetoothDevice, "Car Kit");

        let first = run(&store);
        let second = HostStateReconciler::new().reconcile(
            &store,
            &Settings::default(),
            Some(&first.state),
        );
        assert_eq!(first.state, second.state);
        assert!(second.deltas.is_empty());
    }

    #[test]
    fn test_conf_param() {
        let conf = "# ssid=commented\n ssid = Spaced \nwpa=2\n";
        assert_eq!(conf_param(conf, "ssid"), Some("Spaced".to_string()));
        assert_eq!(conf_param(conf, "wpa"), Some("2".to_string()));
        assert_eq!(conf_param(conf, "channel"), None);
    }
}
