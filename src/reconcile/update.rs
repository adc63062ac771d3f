//! Update dialog reconciliation
//!
//! Update scripts publish their progress as markers (`<component>_updating`,
//! `<component>_update_available`, `system_update_*`). The system image is
//! downloaded as a zip into the update storage directory, and its size is the
//! only progress indicator.

use super::SignalReader;
use crate::signals::{Signal, SignalStore};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Package components updated independently of the system image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Csmt,
    Udev,
    Openauto,
}

impl Component {
    pub fn all() -> &'static [Component] {
        &[Component::Csmt, Component::Udev, Component::Openauto]
    }

    /// Name passed to the update command
    pub fn name(&self) -> &'static str {
        match self {
            Component::Csmt => "csmt",
            Component::Udev => "udev",
            Component::Openauto => "openauto",
        }
    }

    pub fn from_name(name: &str) -> Option<Component> {
        Component::all().iter().copied().find(|c| c.name() == name)
    }

    fn updating_signal(&self) -> Signal {
        match self {
            Component::Csmt => Signal::CsmtUpdating,
            Component::Udev => Signal::UdevUpdating,
            Component::Openauto => Signal::OpenautoUpdating,
        }
    }

    fn available_signal(&self) -> Signal {
        match self {
            Component::Csmt => Signal::CsmtUpdateAvailable,
            Component::Udev => Signal::UdevUpdateAvailable,
            Component::Openauto => Signal::OpenautoUpdateAvailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    UpToDate,
    Available,
    Updating,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SystemStatus {
    UpToDate,
    Available,
    Downloading {
        file: Option<String>,
        downloaded_mb: u64,
    },
    ReadyToInstall,
}

/// A system image being downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadInfo {
    pub file: String,
    pub size_bytes: u64,
}

impl DownloadInfo {
    pub fn size_mb(&self) -> u64 {
        self.size_bytes / BYTES_PER_MB
    }
}

/// Last `*.zip` (by name) in the download directory
pub fn scan_download_dir(dir: &Path) -> io::Result<Option<DownloadInfo>> {
    let mut newest: Option<DownloadInfo> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".zip") {
            continue;
        }
        if newest.as_ref().is_some_and(|n| n.file >= name) {
            continue;
        }
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        newest = Some(DownloadInfo {
            file: name,
            size_bytes,
        });
    }
    Ok(newest)
}

/// Update dialog state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePanel {
    pub csmt: ComponentStatus,
    pub udev: ComponentStatus,
    pub openauto: ComponentStatus,
    pub system: SystemStatus,
    /// "Check for updates" button
    pub check_visible: bool,
    /// "Cancel download" button
    pub cancel_visible: bool,
    /// Update storage is mounted
    pub storage_ready: bool,
}

impl UpdatePanel {
    pub fn component(&self, component: Component) -> ComponentStatus {
        match component {
            Component::Csmt => self.csmt,
            Component::Udev => self.udev,
            Component::Openauto => self.openauto,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateReconciler;

impl UpdateReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Derive the dialog state. `download` is the current content of the
    /// download directory, `None` when storage is not mounted.
    pub fn reconcile<S: SignalStore + ?Sized>(
        &self,
        store: &S,
        download: Option<Option<DownloadInfo>>,
    ) -> UpdatePanel {
        let signals = SignalReader::new(store);

        let component = |c: Component| {
            if signals.flag(c.updating_signal()) {
                ComponentStatus::Updating
            } else if signals.flag(c.available_signal()) {
                ComponentStatus::Available
            } else {
                ComponentStatus::UpToDate
            }
        };

        let storage_ready = download.is_some();
        let system = if signals.flag(Signal::SystemUpdateReady) {
            SystemStatus::ReadyToInstall
        } else if signals.flag(Signal::SystemUpdateDownloading) {
            let current = download.flatten();
            SystemStatus::Downloading {
                downloaded_mb: current.as_ref().map(DownloadInfo::size_mb).unwrap_or(0),
                file: current.map(|d| d.file),
            }
        } else if signals.flag(Signal::SystemUpdateAvailable) {
            SystemStatus::Available
        } else {
            SystemStatus::UpToDate
        };

        let downloading = matches!(system, SystemStatus::Downloading { .. });
        let panel = UpdatePanel {
            csmt: component(Component::Csmt),
            udev: component(Component::Udev),
            openauto: component(Component::Openauto),
            system,
            check_visible: !downloading,
            cancel_visible: downloading,
            storage_ready,
        };
        debug!("Update panel: {:?}", panel);
        panel
    }

    /// Scan the storage directory and reconcile in one step
    pub fn reconcile_with_storage<S: SignalStore + ?Sized>(
        &self,
        store: &S,
        storage_dir: &Path,
    ) -> UpdatePanel {
        let download = match scan_download_dir(storage_dir) {
            Ok(found) => Some(found),
            Err(e) => {
                debug!("Update storage {:?} unavailable: {}", storage_dir, e);
                None
            }
        };
        self.reconcile(store, download)
    }
}
