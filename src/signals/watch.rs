//! Marker change detection
//!
//! Polls a cheap fingerprint of every marker and reports when it changes.
//! Bursts of changes between two polls collapse into one notification; the
//! reconciler re-reads everything anyway, so intermediate states may be lost.

use super::store::marker_exists;
use super::SignalTable;
use crate::core::events::{EventSender, ShellEvent};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Observable state of one marker
#[derive(Debug, Clone, PartialEq, Eq)]
struct MarkerStamp {
    present: bool,
    symlink: bool,
    len: u64,
    modified: Option<SystemTime>,
}

impl MarkerStamp {
    fn read(path: &std::path::Path) -> Self {
        let present = marker_exists(path).unwrap_or(false);
        match fs::symlink_metadata(path) {
            Ok(meta) => Self {
                present,
                symlink: meta.file_type().is_symlink(),
                len: meta.len(),
                modified: meta.modified().ok(),
            },
            Err(_) => Self {
                present,
                symlink: false,
                len: 0,
                modified: None,
            },
        }
    }
}

/// Edge-triggered watcher over a fixed set of marker paths
#[derive(Debug)]
pub struct MarkerWatcher {
    paths: Vec<PathBuf>,
    last: Option<Vec<MarkerStamp>>,
    event: ShellEvent,
}

impl MarkerWatcher {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            last: None,
            event: ShellEvent::StoreChanged,
        }
    }

    /// Send `event` instead of `StoreChanged` on change
    pub fn with_event(mut self, event: ShellEvent) -> Self {
        self.event = event;
        self
    }

    /// Watch every marker of a signal table
    pub fn for_table(table: &SignalTable) -> Self {
        let mut paths: Vec<PathBuf> = table
            .paths()
            .into_iter()
            .map(|(_, path)| path.to_path_buf())
            .collect();
        paths.sort();
        paths.dedup();
        Self::new(paths)
    }

    /// Take a fingerprint and report whether it differs from the previous one.
    /// The first poll only records a baseline.
    pub fn poll(&mut self) -> bool {
        let current: Vec<MarkerStamp> = self.paths.iter().map(|p| MarkerStamp::read(p)).collect();
        let changed = matches!(&self.last, Some(last) if *last != current);
        self.last = Some(current);
        changed
    }

    /// Run the watcher on the current runtime, sending its event on change.
    /// The task ends when the event receiver is dropped.
    pub fn spawn(mut self, interval: Duration, events: EventSender) -> JoinHandle<()> {
        info!(
            "Watching {} markers every {}ms",
            self.paths.len(),
            interval.as_millis()
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if self.poll() {
                    debug!("Marker change detected");
                    if events.send(self.event).is_err() {
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_poll_is_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = MarkerWatcher::new(vec![dir.path().join("a")]);
        assert!(!watcher.poll());
        assert!(!watcher.poll());
    }

    #[test]
    fn test_detects_create_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("a");
        let mut watcher = MarkerWatcher::new(vec![marker.clone()]);
        watcher.poll();

        fs::write(&marker, b"").unwrap();
        assert!(watcher.poll());
        assert!(!watcher.poll());

        fs::remove_file(&marker).unwrap();
        assert!(watcher.poll());
    }

    #[test]
    fn test_detects_content_length_change() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("btdevice");
        fs::write(&marker, b"a").unwrap();
        let mut watcher = MarkerWatcher::new(vec![marker.clone()]);
        watcher.poll();

        fs::write(&marker, b"a longer device name").unwrap();
        assert!(watcher.poll());
    }
}
