//! Side effects requested by a reconciliation pass

use crate::signals::Signal;
use serde::Serialize;

/// An action the reconciler asks a collaborator to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "effect", content = "signal")]
pub enum SideEffect {
    /// Delete a consume-once marker after it has been acted on
    ClearMarker(Signal),
    /// Stop the projection app (the "stop requested" marker was seen)
    RequestAppStop,
    /// Exit the shell (the "external exit" marker was seen)
    RequestShutdown,
}

impl SideEffect {
    pub fn name(&self) -> &'static str {
        match self {
            SideEffect::ClearMarker(_) => "clear_marker",
            SideEffect::RequestAppStop => "request_app_stop",
            SideEffect::RequestShutdown => "request_shutdown",
        }
    }
}

impl std::fmt::Display for SideEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideEffect::ClearMarker(signal) => write!(f, "clear_marker({})", signal),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Ordered list holding each effect at most once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectList {
    effects: Vec<SideEffect>,
}

impl EffectList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless already present. Returns whether it was added.
    pub fn push(&mut self, effect: SideEffect) -> bool {
        if self.effects.contains(&effect) {
            return false;
        }
        self.effects.push(effect);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn into_vec(self) -> Vec<SideEffect> {
        self.effects
    }
}
