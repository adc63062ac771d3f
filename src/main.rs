//! Headunit Shell - Entry Point
//!
//! Runs the reconciliation loop by default. Subcommands give one-shot access
//! to the same machinery for scripts and debugging.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use headunit_shell::{
    core::{
        config::Config,
        events::{EventSender, ShellEvent},
        settings::{Settings, SharedSettings},
    },
    host::{Brightness, CommandRunner, HostAction, RunOutcome},
    reconcile::{HostStateReconciler, UpdateReconciler},
    shell::{spawn_ticker, Shell},
    signals::{FsSignalStore, Layout, MarkerWatcher, Signal, SignalStore},
    view::HeadlessView,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "headunit-shell", version, about = "Head unit dashboard state reconciler")]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the marker directory
    #[arg(long)]
    store_root: Option<PathBuf>,

    /// Override the marker layout (classic, hyphenated)
    #[arg(long)]
    layout: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reconciliation loop (default)
    Run,
    /// Run one pass and print the state and effects as JSON
    Status,
    /// Print the update dialog state as JSON
    Updates,
    /// Read or set display brightness
    Brightness {
        #[command(subcommand)]
        command: BrightnessCommand,
    },
    /// Run a host action (set-volume, mute, update, network, ...)
    Action { name: String, value: Option<String> },
    /// Show or change user preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum BrightnessCommand {
    Get,
    Set { value: u32 },
    Up,
    Down,
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Reset,
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let settings_path = match &cli.config {
        Some(path) => path.with_file_name("settings.toml"),
        None => Settings::settings_path()?,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, &settings_path),
        Commands::Status => {
            let store = FsSignalStore::new(config.store.signal_table()?);
            let settings = Settings::load_from(&settings_path)?;
            let result = HostStateReconciler::new().reconcile(&store, &settings, None);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Updates => {
            let store = FsSignalStore::new(config.store.signal_table()?);
            let panel = UpdateReconciler::new()
                .reconcile_with_storage(&store, &config.host.update_storage_dir);
            println!("{}", serde_json::to_string_pretty(&panel)?);
            Ok(())
        }
        Commands::Brightness { command } => brightness(&config, command),
        Commands::Action { name, value } => {
            let action = HostAction::parse(&name, value.as_deref())?;
            match CommandRunner::new(config.commands.clone()).run(action)? {
                RunOutcome::Spawned(pid) => info!("{} started (pid {})", action.name(), pid),
                RunOutcome::NotConfigured => warn!("{} is not configured", action.name()),
            }
            Ok(())
        }
        Commands::Settings { command } => settings(&settings_path, command),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(root) = &cli.store_root {
        config.store.root = root.clone();
    }
    if let Some(name) = &cli.layout {
        config.store.layout = match Layout::from_name(name) {
            Some(layout) => layout,
            None => bail!("Unknown layout: {}", name),
        };
    }
    Ok(config)
}

fn run(config: Config, settings_path: &Path) -> Result<()> {
    let table = config.store.signal_table()?;
    info!(
        "Starting headunit shell ({} layout, markers in {:?})",
        config.store.layout.display_name(),
        table.root()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(async move {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ShellEvent>();
        let events = EventSender::new(event_tx);

        let settings = SharedSettings::load_or_default(settings_path);
        let watcher = MarkerWatcher::for_table(&table);
        let settings_watcher = MarkerWatcher::new(vec![settings_path.to_path_buf()])
            .with_event(ShellEvent::SettingsChanged);

        let store = Arc::new(FsSignalStore::new(table));
        let view = HeadlessView::new(Arc::clone(&store), CommandRunner::new(config.commands.clone()));
        let shell = Shell::new(store, settings, view, config.host.update_storage_dir.clone());

        let ticker = spawn_ticker(config.timing.tick_interval(), events.clone());
        let marker_task = watcher.spawn(config.timing.watch_interval(), events.clone());
        let settings_task = settings_watcher.spawn(config.timing.watch_interval(), events.clone());

        tokio::select! {
            _ = shell.run(event_rx) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
            }
        }

        ticker.abort();
        marker_task.abort();
        settings_task.abort();
        Ok::<_, anyhow::Error>(())
    })
}

fn brightness(config: &Config, command: BrightnessCommand) -> Result<()> {
    let store = FsSignalStore::new(config.store.signal_table()?);
    let custom = store.exists(Signal::CustomBrightness).unwrap_or(false);
    let brightness = Brightness::from_config(&config.host, custom);

    let value = match command {
        BrightnessCommand::Get => brightness.read()?,
        BrightnessCommand::Set { value } => brightness.write(value)?,
        BrightnessCommand::Up => brightness.nudge(true)?,
        BrightnessCommand::Down => brightness.nudge(false)?,
    };
    println!("{}", value);
    Ok(())
}

fn settings(path: &Path, command: SettingsCommand) -> Result<()> {
    let shared = SharedSettings::load_from(path)?;
    match command {
        SettingsCommand::Show => {}
        SettingsCommand::Reset => shared.reset()?,
        SettingsCommand::Set { key, value } => {
            let mut result = Ok(());
            shared.update(|s| result = s.set(&key, &value));
            result.with_context(|| format!("Valid keys: {}", Settings::keys().join(", ")))?;
            shared.save()?;
        }
    }
    print!("{}", toml::to_string_pretty(&shared.snapshot())?);
    Ok(())
}
