//! Shell event definitions

use tokio::sync::mpsc;

/// Sender for shell events - wraps a tokio unbounded channel so producers
/// (ticker, marker watcher, settings) don't depend on the channel type.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ShellEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<ShellEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: ShellEvent) -> Result<(), mpsc::error::SendError<ShellEvent>> {
        self.tx.send(event)
    }
}

/// Everything that can trigger a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    /// Periodic refresh (clock, connectivity)
    Tick,

    /// One or more markers changed since the last poll
    StoreChanged,

    /// User preferences were saved or reset
    SettingsChanged,

    /// Stop the event loop
    Shutdown,
}

impl ShellEvent {
    /// Whether this event asks for a reconciliation pass
    pub fn triggers_pass(&self) -> bool {
        !matches!(self, ShellEvent::Shutdown)
    }
}
