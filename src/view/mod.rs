//! View layer - where reconciled state and side effects land

pub mod clock;
pub mod headless;

pub use headless::HeadlessView;

use crate::core::state::{ShellState, StateDelta};
use crate::reconcile::{SideEffect, UpdatePanel};
use crate::signals::SignalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EffectError {
    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no command configured for {0}")]
    NotConfigured(&'static str),
}

/// Consumer of reconciliation results
pub trait ViewApplier {
    /// Render a new state. `deltas` lists the fields that changed since the
    /// last applied state (every field on the first call).
    fn apply(&mut self, state: &ShellState, deltas: &[StateDelta]);

    /// Render the update dialog
    fn apply_updates(&mut self, panel: &UpdatePanel);

    /// Execute one side effect
    fn perform(&mut self, effect: &SideEffect) -> Result<(), EffectError>;
}
