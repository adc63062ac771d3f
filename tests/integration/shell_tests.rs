//! Event loop tests: marker watcher feeding the shell driver

use crate::common::{store, touch};
use headunit_shell::core::config::CommandConfig;
use headunit_shell::host::CommandRunner;
use headunit_shell::signals::MarkerWatcher;
use headunit_shell::{
    EventSender, HeadlessView, Layout, PassOutcome, Settings, Shell, ShellEvent, SharedSettings,
    Signal,
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const POLL: Duration = Duration::from_millis(10);

#[tokio::test]
async fn test_watcher_reports_new_marker() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path(), Layout::Classic);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = MarkerWatcher::for_table(store.table()).spawn(POLL, EventSender::new(tx));
    tokio::time::sleep(POLL * 3).await;
    touch(&store, Signal::HotspotDetected, "");

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert_eq!(event, Some(ShellEvent::StoreChanged));
    handle.abort();
}

#[test]
fn test_settings_watcher_sends_settings_changed() {
    tokio_test::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = MarkerWatcher::new(vec![path.clone()])
            .with_event(ShellEvent::SettingsChanged)
            .spawn(POLL, EventSender::new(tx));
        tokio::time::sleep(POLL * 3).await;
        Settings::default().save_to(&path).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(ShellEvent::SettingsChanged));
        handle.abort();
    });
}

#[tokio::test]
async fn test_external_exit_marker_stops_shell() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store(dir.path(), Layout::Classic));
    let exit_marker = store.table().path(Signal::ExternalExit).to_path_buf();
    let (tx, rx) = mpsc::unbounded_channel();

    let watcher = MarkerWatcher::for_table(store.table()).spawn(POLL, EventSender::new(tx));
    let view = HeadlessView::new(
        Arc::clone(&store),
        CommandRunner::new(CommandConfig::default()),
    );
    let shell = Shell::new(
        Arc::clone(&store),
        SharedSettings::new(Settings::default(), None),
        view,
        dir.path().join("storage"),
    );

    let trigger = async {
        tokio::time::sleep(POLL * 5).await;
        fs::write(&exit_marker, "").unwrap();
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(shell.run(rx), trigger)
    })
    .await
    .unwrap();

    assert!(!exit_marker.exists());
    watcher.abort();
}

#[test]
fn test_settings_file_reload() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("settings.toml");
    let store = Arc::new(store(dir.path(), Layout::Classic));
    let settings = SharedSettings::load_from(&settings_path).unwrap();
    let view = HeadlessView::new(
        Arc::clone(&store),
        CommandRunner::new(CommandConfig::default()),
    );
    let mut shell = Shell::new(Arc::clone(&store), settings.clone(), view, dir.path());

    assert_eq!(shell.pass(), PassOutcome::Continue);
    assert_eq!(shell.state().unwrap().alpha, 50);

    let mut changed = Settings::default();
    changed.set("alpha_trans", "80").unwrap();
    changed.save_to(&settings_path).unwrap();
    settings.reload().unwrap();

    shell.pass();
    assert_eq!(shell.state().unwrap().alpha, 80);
    assert_eq!(shell.view().applied(), 2);
}
