//! Shell state - the UI state vector produced by every reconciliation pass

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maximum length of marker-sourced display strings
pub const MAX_DISPLAY_LEN: usize = 64;

/// Background selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wallpaper {
    /// Day wallpaper image
    Day,
    /// Night wallpaper image
    Night,
    /// Tiled plain background (no wallpaper image available)
    #[default]
    Plain,
    /// Solid black, requested by a custom command
    Black,
}

/// Wifi operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    #[default]
    Client,
    Hotspot,
    /// A mode switch is in progress
    Switching,
}

/// Network info panel contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub mode: NetworkMode,
    pub ssid: String,
    pub gateway: String,
}

/// Derived view state. Computed fresh on every pass, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellState {
    pub night_mode: bool,
    /// Shown in night mode (switches back to day)
    pub day_toggle_visible: bool,
    /// Shown in day mode (switches to night)
    pub night_toggle_visible: bool,
    pub wallpaper: Wallpaper,

    pub wifi_visible: bool,
    pub usb_visible: bool,
    pub wifi_button_visible: bool,
    pub no_wifi_device_visible: bool,

    pub android_connected: bool,
    pub no_device_visible: bool,

    pub lock_settings: bool,
    pub settings_button_visible: bool,
    /// Bottom status line
    pub status_message: String,
    /// Top status line
    pub status_top: String,

    pub clock_visible: bool,
    pub network_info_visible: bool,
    /// Button transparency in percent
    pub alpha: u8,

    pub brightness_button_visible: bool,
    pub volume_button_visible: bool,

    pub bluetooth_device: String,
    pub bluetooth_device_visible: bool,
    pub pairable_visible: bool,
    pub bluetooth_button_visible: bool,

    pub main_visible: bool,
    pub header_visible: bool,
    pub tiles_visible: bool,
    /// Lock icon shown while a phone or dev session holds the unit
    pub connection_locked: bool,

    pub network: NetworkInfo,
}

/// One changed field, keyed by its dotted path (e.g. `network.ssid`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDelta {
    pub field: String,
    pub value: Value,
}

impl ShellState {
    /// Convert to JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Fields that differ from `previous`, or every field when there is none.
    /// Deltas are ordered by field path.
    pub fn diff(&self, previous: Option<&ShellState>) -> Vec<StateDelta> {
        let current = flatten(self);
        let before = previous.map(flatten).unwrap_or_default();

        current
            .into_iter()
            .filter(|(field, value)| before.get(field) != Some(value))
            .map(|(field, value)| StateDelta { field, value })
            .collect()
    }
}

fn flatten(state: &ShellState) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    if let Ok(value) = serde_json::to_value(state) {
        flatten_into(&mut out, String::new(), value);
    }
    out
}

fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: String, value: Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(out, path, inner);
            }
        }
        other => {
            out.insert(prefix, other);
        }
    }
}

/// Truncate a string to a maximum length, preserving UTF-8 boundaries
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    s[..end].to_string()
}
