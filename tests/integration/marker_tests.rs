//! Reconciliation over marker files

use crate::common::{store, touch};
use headunit_shell::core::state::{NetworkMode, Wallpaper};
use headunit_shell::reconcile::{ComponentStatus, SystemStatus, STATUS_CONFIG_IN_PROGRESS};
use headunit_shell::{
    HostStateReconciler, Layout, Settings, SideEffect, Signal, SignalStore, UpdateReconciler,
};
use std::fs;

#[test]
fn test_night_mode_with_android_device() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), Layout::Classic);
    touch(&store, Signal::NightMode, "");
    touch(&store, Signal::AndroidDevice, "");
    touch(&store, Signal::WallpaperNight, "png");

    let result = HostStateReconciler::new().reconcile(&store, &Settings::default(), None);
    let state = result.state;
    assert!(state.night_mode);
    assert!(state.day_toggle_visible);
    assert!(!state.night_toggle_visible);
    assert_eq!(state.wallpaper, Wallpaper::Night);
    assert!(state.android_connected);
    assert!(!state.no_device_visible);
    assert!(state.connection_locked);
    assert!(result.effects.is_empty());
}

#[test]
fn test_hyphenated_layout_reads_its_own_markers() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), Layout::Hyphenated);
    fs::write(dir.path().join("force-night-mode"), "").unwrap();
    fs::write(dir.path().join("night_mode_enabled"), "").unwrap();
    fs::write(dir.path().join("config-in-progress"), "").unwrap();

    let state = HostStateReconciler::new()
        .reconcile(&store, &Settings::default(), None)
        .state;
    assert!(state.night_mode);
    assert!(state.lock_settings);
    assert_eq!(state.status_message, STATUS_CONFIG_IN_PROGRESS);
}

#[cfg(unix)]
#[test]
fn test_symlinked_markers() {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), Layout::Classic);
    let target = dir.path().join("real-night");

    symlink(&target, store.table().path(Signal::NightMode)).unwrap();
    let reconciler = HostStateReconciler::new();
    assert!(!reconciler.reconcile(&store, &Settings::default(), None).state.night_mode);

    fs::write(&target, "").unwrap();
    assert!(reconciler.reconcile(&store, &Settings::default(), None).state.night_mode);
}

#[test]
fn test_app_stop_marker_is_consumed() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), Layout::Classic);
    touch(&store, Signal::AppStopRequested, "");

    let reconciler = HostStateReconciler::new();
    let first = reconciler.reconcile(&store, &Settings::default(), None);
    assert_eq!(
        first.effects,
        vec![
            SideEffect::RequestAppStop,
            SideEffect::ClearMarker(Signal::AppStopRequested)
        ]
    );

    store.clear(Signal::AppStopRequested).unwrap();
    assert!(!store.table().path(Signal::AppStopRequested).exists());

    let second = reconciler.reconcile(&store, &Settings::default(), Some(&first.state));
    assert!(second.effects.is_empty());
    assert!(second.deltas.is_empty());
}

#[test]
fn test_hotspot_ssid_from_hostapd_config() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), Layout::Classic);
    touch(&store, Signal::HotspotActive, "");
    touch(
        &store,
        Signal::HostapdConfig,
        include_str!("../fixtures/hostapd.conf"),
    );
    touch(&store, Signal::WifiSsid, "HomeNetwork\n");

    let state = HostStateReconciler::new()
        .reconcile(&store, &Settings::default(), None)
        .state;
    assert_eq!(state.network.mode, NetworkMode::Hotspot);
    assert_eq!(state.network.ssid, "HeadUnit-AP");
    assert!(state.wifi_visible);
    assert!(!state.usb_visible);
}

#[test]
fn test_bluetooth_device_name_is_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), Layout::Classic);
    touch(&store, Signal::BluetoothDevice, "Pixel 7\n");

    let state = HostStateReconciler::new()
        .reconcile(&store, &Settings::default(), None)
        .state;
    assert!(state.bluetooth_device_visible);
    assert_eq!(state.bluetooth_device, "Pixel 7");
}

#[test]
fn test_update_panel_with_download() {
    let dir = tempfile::tempdir().unwrap();
    let storage = tempfile::tempdir().unwrap();
    let store = store(dir.path(), Layout::Classic);
    touch(&store, Signal::OpenautoUpdating, "");
    touch(&store, Signal::SystemUpdateDownloading, "");
    fs::write(storage.path().join("system-2024.zip"), vec![0u8; 3 * 1024 * 1024]).unwrap();

    let panel = UpdateReconciler::new().reconcile_with_storage(&store, storage.path());
    assert_eq!(panel.openauto, ComponentStatus::Updating);
    assert_eq!(panel.csmt, ComponentStatus::UpToDate);
    assert_eq!(
        panel.system,
        SystemStatus::Downloading {
            file: Some("system-2024.zip".to_string()),
            downloaded_mb: 3,
        }
    );
    assert!(panel.cancel_visible);
}
