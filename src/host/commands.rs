//! Host actions - OS operations delegated to external scripts
//!
//! Actions are symbolic; the command line for each comes from the
//! `[commands]` config section. Commands are spawned detached, the shell
//! never waits for them.

use super::HostError;
use crate::core::config::CommandConfig;
use crate::reconcile::Component;
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Placeholder replaced by the action argument in command templates
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Maximum volume percentage
pub const MAX_VOLUME: u8 = 100;

/// `update` argument selecting the system image
const SYSTEM_COMPONENT: &str = "system";

/// `network` argument selecting automatic network choice
const NETWORK_AUTO: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    SetVolume(u8),
    Mute,
    Unmute,
    EnablePairing,
    DebugLog,
    DayMode,
    NightMode,
    Reboot,
    Shutdown,
    AppStop,
    UpdateCheck,
    UpdateCancel,
    Update(Component),
    /// Install the downloaded system image
    UpdateSystem,
    /// Switch to a stored wifi network slot
    Network(u8),
    /// Let the network script pick a network
    NetworkAuto,
    HotspotStart,
    HotspotStop,
    BluetoothUnpair,
    /// Sync the RTC from NTP
    RtcSync,
    SetTime { hour: u8, minute: u8 },
    AudioTest,
}

impl HostAction {
    pub fn name(&self) -> &'static str {
        match self {
            HostAction::SetVolume(_) => "set-volume",
            HostAction::Mute => "mute",
            HostAction::Unmute => "unmute",
            HostAction::EnablePairing => "enable-pairing",
            HostAction::DebugLog => "debug-log",
            HostAction::DayMode => "day-mode",
            HostAction::NightMode => "night-mode",
            HostAction::Reboot => "reboot",
            HostAction::Shutdown => "shutdown",
            HostAction::AppStop => "app-stop",
            HostAction::UpdateCheck => "update-check",
            HostAction::UpdateCancel => "update-cancel",
            HostAction::Update(_) | HostAction::UpdateSystem => "update",
            HostAction::Network(_) | HostAction::NetworkAuto => "network",
            HostAction::HotspotStart => "hotspot-start",
            HostAction::HotspotStop => "hotspot-stop",
            HostAction::BluetoothUnpair => "bluetooth-unpair",
            HostAction::RtcSync => "rtc-sync",
            HostAction::SetTime { .. } => "set-time",
            HostAction::AudioTest => "audio-test",
        }
    }

    /// Parse an action name plus its optional argument
    pub fn parse(name: &str, value: Option<&str>) -> Result<HostAction, HostError> {
        let require = |action: &'static str| value.ok_or(HostError::MissingValue(action));
        let invalid = |action: &'static str, v: &str| HostError::InvalidValue {
            action,
            value: v.to_string(),
        };

        let action = match name {
            "set-volume" => {
                let v = require("set-volume")?;
                let volume: u32 = v.trim().parse().map_err(|_| invalid("set-volume", v))?;
                HostAction::SetVolume(volume.min(u32::from(MAX_VOLUME)) as u8)
            }
            "mute" => HostAction::Mute,
            "unmute" => HostAction::Unmute,
            "enable-pairing" => HostAction::EnablePairing,
            "debug-log" => HostAction::DebugLog,
            "day-mode" => HostAction::DayMode,
            "night-mode" => HostAction::NightMode,
            "reboot" => HostAction::Reboot,
            "shutdown" => HostAction::Shutdown,
            "app-stop" => HostAction::AppStop,
            "update-check" => HostAction::UpdateCheck,
            "update-cancel" => HostAction::UpdateCancel,
            "update" => match require("update")?.trim() {
                SYSTEM_COMPONENT => HostAction::UpdateSystem,
                v => HostAction::Update(Component::from_name(v).ok_or_else(|| invalid("update", v))?),
            },
            "network" => match require("network")?.trim() {
                NETWORK_AUTO => HostAction::NetworkAuto,
                v => HostAction::Network(v.parse().map_err(|_| invalid("network", v))?),
            },
            "hotspot-start" => HostAction::HotspotStart,
            "hotspot-stop" => HostAction::HotspotStop,
            "bluetooth-unpair" => HostAction::BluetoothUnpair,
            "rtc-sync" => HostAction::RtcSync,
            "set-time" => {
                let v = require("set-time")?;
                let (hour, minute) = v
                    .trim()
                    .split_once(':')
                    .and_then(|(h, m)| Some((h.parse::<u8>().ok()?, m.parse::<u8>().ok()?)))
                    .filter(|&(h, m)| h < 24 && m < 60)
                    .ok_or_else(|| invalid("set-time", v))?;
                HostAction::SetTime { hour, minute }
            }
            "audio-test" => HostAction::AudioTest,
            other => return Err(HostError::UnknownAction(other.to_string())),
        };
        Ok(action)
    }

    fn template<'a>(&self, commands: &'a CommandConfig) -> &'a [String] {
        match self {
            HostAction::SetVolume(_) => &commands.set_volume,
            HostAction::Mute => &commands.mute,
            HostAction::Unmute => &commands.unmute,
            HostAction::EnablePairing => &commands.enable_pairing,
            HostAction::DebugLog => &commands.debug_log,
            HostAction::DayMode => &commands.day_mode,
            HostAction::NightMode => &commands.night_mode,
            HostAction::Reboot => &commands.reboot,
            HostAction::Shutdown => &commands.shutdown,
            HostAction::AppStop => &commands.app_stop,
            HostAction::UpdateCheck => &commands.update_check,
            HostAction::UpdateCancel => &commands.update_cancel,
            HostAction::Update(_) | HostAction::UpdateSystem => &commands.update,
            HostAction::Network(_) | HostAction::NetworkAuto => &commands.network,
            HostAction::HotspotStart => &commands.hotspot_start,
            HostAction::HotspotStop => &commands.hotspot_stop,
            HostAction::BluetoothUnpair => &commands.bluetooth_unpair,
            HostAction::RtcSync => &commands.rtc_sync,
            HostAction::SetTime { .. } => &commands.set_time,
            HostAction::AudioTest => &commands.audio_test,
        }
    }

    fn value(&self) -> Option<String> {
        match self {
            HostAction::SetVolume(v) | HostAction::Network(v) => Some(v.to_string()),
            HostAction::Update(component) => Some(component.name().to_string()),
            HostAction::UpdateSystem => Some(SYSTEM_COMPONENT.to_string()),
            HostAction::NetworkAuto => Some(NETWORK_AUTO.to_string()),
            // autoapp_helper expects `H#M#`
            HostAction::SetTime { hour, minute } => Some(format!("{}#{}#", hour, minute)),
            _ => None,
        }
    }

    /// Command line for this action, or `None` when not configured
    pub fn argv(&self, commands: &CommandConfig) -> Option<Vec<String>> {
        let template = self.template(commands);
        if template.is_empty() {
            return None;
        }
        let value = self.value().unwrap_or_default();
        Some(
            template
                .iter()
                .map(|part| part.replace(VALUE_PLACEHOLDER, &value))
                .collect(),
        )
    }
}

/// What happened to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Spawned(u32),
    NotConfigured,
}

/// Spawns host action commands
#[derive(Debug, Clone)]
pub struct CommandRunner {
    commands: CommandConfig,
}

impl CommandRunner {
    pub fn new(commands: CommandConfig) -> Self {
        Self { commands }
    }

    pub fn run(&self, action: HostAction) -> Result<RunOutcome, HostError> {
        let Some(argv) = action.argv(&self.commands) else {
            info!("No command configured for {}", action.name());
            return Ok(RunOutcome::NotConfigured);
        };

        let (program, args) = argv
            .split_first()
            .ok_or(HostError::MissingValue("program"))?;
        info!("Running {}: {} {:?}", action.name(), program, args);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| {
                warn!("Failed to spawn {}: {}", program, source);
                HostError::Spawn {
                    program: program.clone(),
                    source,
                }
            })?;

        Ok(RunOutcome::Spawned(child.id()))
    }
}
