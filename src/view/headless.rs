//! Headless view - logs state changes and executes effects directly

use super::clock;
use super::{EffectError, ViewApplier};
use crate::core::state::{ShellState, StateDelta};
use crate::host::{CommandRunner, HostAction, HostError, RunOutcome};
use crate::reconcile::{Component, SideEffect, UpdatePanel};
use crate::signals::SignalStore;
use std::sync::Arc;
use tracing::{debug, info};

pub struct HeadlessView<S: SignalStore + ?Sized> {
    store: Arc<S>,
    runner: CommandRunner,
    applied: usize,
    clock: Option<String>,
    date: Option<String>,
}

impl<S: SignalStore + ?Sized> HeadlessView<S> {
    pub fn new(store: Arc<S>, runner: CommandRunner) -> Self {
        Self {
            store,
            runner,
            applied: 0,
            clock: None,
            date: None,
        }
    }

    /// Number of states applied so far
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Clock text last shown, `None` while the clock is hidden
    pub fn clock(&self) -> Option<&str> {
        self.clock.as_deref()
    }

    /// Date text shown under the clock
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    fn refresh_clock(&mut self, visible: bool) {
        if !visible {
            self.clock = None;
            self.date = None;
            return;
        }
        let (time, date) = clock::now_texts();
        self.clock = Some(time);
        self.date = Some(date);
    }

    fn run(&self, action: HostAction) -> Result<(), EffectError> {
        match self.runner.run(action) {
            Ok(RunOutcome::Spawned(pid)) => {
                debug!("{} running as pid {}", action.name(), pid);
                Ok(())
            }
            Ok(RunOutcome::NotConfigured) => Err(EffectError::NotConfigured(action.name())),
            Err(HostError::Spawn { program, source }) => Err(EffectError::Spawn { program, source }),
            Err(e) => Err(EffectError::Spawn {
                program: action.name().to_string(),
                source: std::io::Error::other(e.to_string()),
            }),
        }
    }
}

impl<S: SignalStore + ?Sized> ViewApplier for HeadlessView<S> {
    fn apply(&mut self, state: &ShellState, deltas: &[StateDelta]) {
        self.applied += 1;
        self.refresh_clock(state.clock_visible);
        if deltas.is_empty() {
            debug!("State unchanged");
            return;
        }
        for delta in deltas {
            info!("{} = {}", delta.field, delta.value);
        }
        debug!("State: {}", state.to_json());
    }

    fn apply_updates(&mut self, panel: &UpdatePanel) {
        for component in Component::all() {
            info!("Update {}: {:?}", component.name(), panel.component(*component));
        }
        info!(
            "Update system: {:?} (check={} cancel={})",
            panel.system, panel.check_visible, panel.cancel_visible
        );
    }

    fn perform(&mut self, effect: &SideEffect) -> Result<(), EffectError> {
        info!("Performing {}", effect);
        match effect {
            SideEffect::ClearMarker(signal) => Ok(self.store.clear(*signal)?),
            SideEffect::RequestAppStop => self.run(HostAction::AppStop),
            SideEffect::RequestShutdown => self.run(HostAction::Shutdown),
        }
    }
}
