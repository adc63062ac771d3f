//! Shell driver - runs reconciliation passes in response to events

use crate::core::events::{EventSender, ShellEvent};
use crate::core::settings::SharedSettings;
use crate::core::state::ShellState;
use crate::reconcile::{HostStateReconciler, SideEffect, UpdatePanel, UpdateReconciler};
use crate::signals::SignalStore;
use crate::view::{EffectError, ViewApplier};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Continue,
    /// A shutdown was requested; the driver should stop
    Exit,
}

pub struct Shell<S: SignalStore + ?Sized, V: ViewApplier> {
    store: Arc<S>,
    settings: SharedSettings,
    view: V,
    reconciler: HostStateReconciler,
    updates: UpdateReconciler,
    storage_dir: PathBuf,
    previous: Option<ShellState>,
    panel: Option<UpdatePanel>,
}

impl<S: SignalStore + ?Sized, V: ViewApplier> Shell<S, V> {
    pub fn new(
        store: Arc<S>,
        settings: SharedSettings,
        view: V,
        storage_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            settings,
            view,
            reconciler: HostStateReconciler::new(),
            updates: UpdateReconciler::new(),
            storage_dir: storage_dir.into(),
            previous: None,
            panel: None,
        }
    }

    /// Last applied state
    pub fn state(&self) -> Option<&ShellState> {
        self.previous.as_ref()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Reconcile, apply to the view and perform side effects
    pub fn pass(&mut self) -> PassOutcome {
        let result = self
            .reconciler
            .reconcile(&*self.store, &self.settings, self.previous.as_ref());
        self.view.apply(&result.state, &result.deltas);

        let panel = self
            .updates
            .reconcile_with_storage(&*self.store, &self.storage_dir);
        if self.panel.as_ref() != Some(&panel) {
            self.view.apply_updates(&panel);
            self.panel = Some(panel);
        }

        let mut outcome = PassOutcome::Continue;
        for effect in &result.effects {
            match self.view.perform(effect) {
                Ok(()) => debug!("{} done", effect),
                Err(EffectError::NotConfigured(action)) => {
                    info!("Skipping {}: no command configured for {}", effect, action)
                }
                Err(e) => warn!("Side effect {} failed: {}", effect, e),
            }
            if *effect == SideEffect::RequestShutdown {
                outcome = PassOutcome::Exit;
            }
        }

        self.previous = Some(result.state);
        outcome
    }

    fn reload_settings(&self) {
        if let Err(e) = self.settings.reload() {
            warn!("Keeping current settings: {:#}", e);
        }
    }

    /// Process events until shutdown. Queued events are drained before each
    /// pass so a burst of changes costs a single pass.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ShellEvent>) {
        if self.pass() == PassOutcome::Exit {
            info!("Exit requested at startup");
            return;
        }

        while let Some(event) = events.recv().await {
            let mut settings_changed = event == ShellEvent::SettingsChanged;
            let mut shutdown = !event.triggers_pass();
            while let Ok(next) = events.try_recv() {
                settings_changed |= next == ShellEvent::SettingsChanged;
                shutdown |= !next.triggers_pass();
            }
            if shutdown {
                info!("Shutting down");
                break;
            }
            if settings_changed {
                self.reload_settings();
            }
            if self.pass() == PassOutcome::Exit {
                info!("External exit requested, stopping");
                break;
            }
        }
    }
}

/// Send `Tick` every `interval` until the receiver goes away
pub fn spawn_ticker(interval: Duration, events: EventSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; the initial pass already ran
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if events.send(ShellEvent::Tick).is_err() {
                error!("Event receiver dropped, stopping ticker");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::Settings;
    use crate::reconcile::UpdatePanel;
    use crate::signals::{MemorySignalStore, Signal};

    #[derive(Default)]
    struct RecordingView {
        states: Vec<ShellState>,
        deltas: Vec<usize>,
        panels: usize,
        performed: Vec<SideEffect>,
        store: Option<Arc<MemorySignalStore>>,
    }

    impl ViewApplier for RecordingView {
        fn apply(&mut self, state: &ShellState, deltas: &[crate::core::state::StateDelta]) {
            self.states.push(state.clone());
            self.deltas.push(deltas.len());
        }

        fn apply_updates(&mut self, _panel: &UpdatePanel) {
            self.panels += 1;
        }

        fn perform(&mut self, effect: &SideEffect) -> Result<(), EffectError> {
            self.performed.push(*effect);
            if let (SideEffect::ClearMarker(signal), Some(store)) = (effect, &self.store) {
                store.clear(*signal)?;
            }
            Ok(())
        }
    }

    fn shell(store: &Arc<MemorySignalStore>) -> Shell<MemorySignalStore, RecordingView> {
        let view = RecordingView {
            store: Some(Arc::clone(store)),
            ..RecordingView::default()
        };
        Shell::new(
            Arc::clone(store),
            SharedSettings::new(Settings::default(), None),
            view,
            "/nonexistent/update-storage",
        )
    }

    #[test]
    fn test_second_pass_has_no_deltas() {
        let store = Arc::new(MemorySignalStore::new());
        let mut shell = shell(&store);

        assert_eq!(shell.pass(), PassOutcome::Continue);
        assert_eq!(shell.pass(), PassOutcome::Continue);
        assert!(shell.view().deltas[0] > 0);
        assert_eq!(shell.view().deltas[1], 0);
        assert_eq!(shell.view().states[0], shell.view().states[1]);
        assert_eq!(shell.view().panels, 1);
    }

    #[test]
    fn test_app_stop_is_consumed_once() {
        let store = Arc::new(MemorySignalStore::new());
        store.set(Signal::AppStopRequested);
        let mut shell = shell(&store);

        assert_eq!(shell.pass(), PassOutcome::Continue);
        assert_eq!(
            shell.view().performed,
            vec![
                SideEffect::RequestAppStop,
                SideEffect::ClearMarker(Signal::AppStopRequested)
            ]
        );

        shell.pass();
        assert_eq!(shell.view().performed.len(), 2);
    }

    #[test]
    fn test_failed_clear_retriggers_on_next_pass() {
        let store = Arc::new(MemorySignalStore::new());
        store.fail_clear(Signal::AppStopRequested);
        let mut shell = shell(&store);
        let stop_and_clear = [
            SideEffect::RequestAppStop,
            SideEffect::ClearMarker(Signal::AppStopRequested),
        ];

        assert_eq!(shell.pass(), PassOutcome::Continue);
        assert_eq!(shell.view().performed, stop_and_clear);
        assert!(store.is_set(Signal::AppStopRequested));

        store.set(Signal::AppStopRequested);
        shell.pass();
        assert_eq!(shell.view().performed[2..], stop_and_clear);
        assert!(!store.is_set(Signal::AppStopRequested));

        shell.pass();
        assert_eq!(shell.view().performed.len(), 4);
    }

    #[test]
    fn test_external_exit_stops_driver() {
        let store = Arc::new(MemorySignalStore::new());
        store.set(Signal::ExternalExit);
        let mut shell = shell(&store);

        assert_eq!(shell.pass(), PassOutcome::Exit);
        assert!(!store.is_set(Signal::ExternalExit));
    }

    #[test]
    fn test_settings_apply_on_next_pass() {
        let store = Arc::new(MemorySignalStore::new());
        let mut shell = shell(&store);
        shell.pass();
        assert!(shell.state().unwrap().clock_visible);

        shell.settings.update(|s| s.show_clock = false);
        shell.pass();
        assert!(!shell.state().unwrap().clock_visible);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_event() {
        let store = Arc::new(MemorySignalStore::new());
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ShellEvent::StoreChanged).unwrap();
        tx.send(ShellEvent::Shutdown).unwrap();

        shell(&store).run(rx).await;
    }

    #[tokio::test]
    async fn test_run_stops_on_external_exit() {
        let store = Arc::new(MemorySignalStore::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let shell = shell(&store);

        store.set(Signal::ExternalExit);
        tx.send(ShellEvent::Tick).unwrap();
        shell.run(rx).await;
        assert!(!store.is_set(Signal::ExternalExit));
    }
}
