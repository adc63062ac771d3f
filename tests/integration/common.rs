//! Shared helpers

use headunit_shell::{FsSignalStore, Layout, Signal, SignalTable};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Signal table rooted at `dir`, with the absolute system markers
/// (backlight, hostapd config, wallpapers) moved inside it too
pub fn table(dir: &Path, layout: Layout) -> SignalTable {
    let overrides: BTreeMap<String, String> = [
        (Signal::BrightnessControl, "backlight"),
        (Signal::HostapdConfig, "hostapd.conf"),
        (Signal::WallpaperDay, "wallpaper.png"),
        (Signal::WallpaperNight, "wallpaper-night.png"),
    ]
    .into_iter()
    .map(|(signal, marker)| (signal.name().to_string(), marker.to_string()))
    .collect();

    SignalTable::new(dir, layout).with_overrides(&overrides).unwrap()
}

pub fn store(dir: &Path, layout: Layout) -> FsSignalStore {
    FsSignalStore::new(table(dir, layout))
}

/// Create the marker for `signal` with the given content
pub fn touch(store: &FsSignalStore, signal: Signal, content: &str) {
    fs::write(store.table().path(signal), content).unwrap();
}
