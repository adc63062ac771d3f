//! Signal stores - where marker state is read from
//!
//! [`FsSignalStore`] is the production store (marker files on disk).
//! [`MemorySignalStore`] keeps markers in memory and can inject read failures.

use super::{Signal, SignalTable};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("marker {marker} is unreadable: {source}")]
    Unreadable {
        marker: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("signal {0} is unavailable")]
    Unavailable(Signal),
}

/// Read access to signals, plus removal of consume-once markers
pub trait SignalStore {
    /// Whether the marker backing `signal` exists
    fn exists(&self, signal: Signal) -> Result<bool, SignalError>;

    /// Marker content, or an empty string when the marker is absent
    fn read_text(&self, signal: Signal) -> Result<String, SignalError>;

    /// Remove the marker. Removing an absent marker succeeds.
    fn clear(&self, signal: Signal) -> Result<(), SignalError>;
}

/// Marker files on the local filesystem
#[derive(Debug, Clone)]
pub struct FsSignalStore {
    table: SignalTable,
}

impl FsSignalStore {
    pub fn new(table: SignalTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SignalTable {
        &self.table
    }

    fn unreadable(&self, signal: Signal, source: io::Error) -> SignalError {
        SignalError::Unreadable {
            marker: self.table.path(signal).to_path_buf(),
            source,
        }
    }
}

/// Existence check that follows symlinks.
///
/// A regular entry exists if it can be statted. A symlink exists only if its
/// target resolves, so a dangling link (or a link to one) reports `false`.
pub fn marker_exists(path: &Path) -> io::Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if !meta.file_type().is_symlink() {
        return Ok(true);
    }

    let target = fs::read_link(path)?;
    let target = match (target.is_relative(), path.parent()) {
        (true, Some(parent)) => parent.join(target),
        _ => target,
    };

    match fs::metadata(&target) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Dangling marker link {:?} -> {:?}", path, target);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

impl SignalStore for FsSignalStore {
    fn exists(&self, signal: Signal) -> Result<bool, SignalError> {
        marker_exists(self.table.path(signal)).map_err(|e| self.unreadable(signal, e))
    }

    fn read_text(&self, signal: Signal) -> Result<String, SignalError> {
        match fs::read(self.table.path(signal)) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(self.unreadable(signal, e)),
        }
    }

    fn clear(&self, signal: Signal) -> Result<(), SignalError> {
        match fs::remove_file(self.table.path(signal)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.unreadable(signal, e)),
        }
    }
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    Present(String),
    /// Present, but cannot be cleared
    Stuck(String),
    Failing,
}

/// In-memory store, usable as an event-bus backed alternative to marker files
#[derive(Debug, Default)]
pub struct MemorySignalStore {
    entries: Mutex<HashMap<Signal, MemoryEntry>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert a flag signal
    pub fn set(&self, signal: Signal) {
        self.set_text(signal, "");
    }

    /// Assert a signal with content
    pub fn set_text(&self, signal: Signal, text: impl Into<String>) {
        self.entries
            .lock()
            .insert(signal, MemoryEntry::Present(text.into()));
    }

    /// Withdraw a signal
    pub fn remove(&self, signal: Signal) {
        self.entries.lock().remove(&signal);
    }

    /// Make every access to `signal` fail until it is set or removed
    pub fn fail(&self, signal: Signal) {
        self.entries.lock().insert(signal, MemoryEntry::Failing);
    }

    /// Assert a flag signal that refuses to be cleared until set or removed
    pub fn fail_clear(&self, signal: Signal) {
        self.entries
            .lock()
            .insert(signal, MemoryEntry::Stuck(String::new()));
    }

    pub fn is_set(&self, signal: Signal) -> bool {
        matches!(
            self.entries.lock().get(&signal),
            Some(MemoryEntry::Present(_) | MemoryEntry::Stuck(_))
        )
    }
}

impl SignalStore for MemorySignalStore {
    fn exists(&self, signal: Signal) -> Result<bool, SignalError> {
        match self.entries.lock().get(&signal) {
            Some(MemoryEntry::Present(_) | MemoryEntry::Stuck(_)) => Ok(true),
            Some(MemoryEntry::Failing) => Err(SignalError::Unavailable(signal)),
            None => Ok(false),
        }
    }

    fn read_text(&self, signal: Signal) -> Result<String, SignalError> {
        match self.entries.lock().get(&signal) {
            Some(MemoryEntry::Present(text) | MemoryEntry::Stuck(text)) => Ok(text.clone()),
            Some(MemoryEntry::Failing) => Err(SignalError::Unavailable(signal)),
            None => Ok(String::new()),
        }
    }

    fn clear(&self, signal: Signal) -> Result<(), SignalError> {
        let mut entries = self.entries.lock();
        if let Some(MemoryEntry::Failing | MemoryEntry::Stuck(_)) = entries.get(&signal) {
            return Err(SignalError::Unavailable(signal));
        }
        entries.remove(&signal);
        Ok(())
    }
}
