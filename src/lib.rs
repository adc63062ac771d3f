//! Headunit Shell
//!
//! Host-state reconciliation for an in-vehicle head unit dashboard.
//!
//! # Features
//! - Reads host signals from marker files (classic or hyphenated layouts)
//! - Derives the complete dashboard state from signals and user preferences
//! - Emits per-field deltas and consume-once side effects
//! - Tracks component and system update progress
//! - Brightness control and host actions through configurable commands

pub mod core;
pub mod host;
pub mod reconcile;
pub mod shell;
pub mod signals;
pub mod view;

pub use core::config::Config;
pub use core::events::{EventSender, ShellEvent};
pub use core::settings::{ConfigProvider, Settings, SharedSettings};
pub use core::state::{ShellState, StateDelta};
pub use reconcile::{HostStateReconciler, Reconciliation, SideEffect, UpdateReconciler};
pub use shell::{PassOutcome, Shell};
pub use signals::{FsSignalStore, Layout, MemorySignalStore, Signal, SignalStore, SignalTable};
pub use view::{HeadlessView, ViewApplier};
