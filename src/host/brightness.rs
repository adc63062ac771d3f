//! Display brightness control
//!
//! Brightness is a decimal integer in a file: the backlight sysfs node, or a
//! plain file polled by a custom brightness script when one is installed.

use super::HostError;
use crate::core::config::HostConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Brightness {
    path: PathBuf,
    min: u32,
    max: u32,
    step: u32,
}

impl Brightness {
    pub fn new(path: impl Into<PathBuf>, min: u32, max: u32, step: u32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            path: path.into(),
            min,
            max,
            step: step.max(1),
        }
    }

    /// Pick the backlight node, or the custom file when `custom` is set
    pub fn from_config(host: &HostConfig, custom: bool) -> Self {
        let path = if custom {
            &host.custom_brightness_path
        } else {
            &host.brightness_path
        };
        Self::new(
            path.clone(),
            host.brightness_min,
            host.brightness_max,
            host.brightness_step,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current brightness
    pub fn read(&self) -> Result<u32, HostError> {
        let content = fs::read_to_string(&self.path).map_err(|source| HostError::Io {
            path: self.path.clone(),
            source,
        })?;
        let trimmed = content.trim();
        trimmed.parse().map_err(|_| HostError::Parse {
            path: self.path.clone(),
            value: trimmed.to_string(),
        })
    }

    /// Write a brightness value, clamped to the configured range.
    /// Returns the value actually written.
    pub fn write(&self, value: u32) -> Result<u32, HostError> {
        let clamped = value.clamp(self.min, self.max);
        debug!("Setting brightness {} in {:?}", clamped, self.path);
        fs::write(&self.path, format!("{}\n", clamped)).map_err(|source| HostError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(clamped)
    }

    /// Move one step up or down from the current value
    pub fn nudge(&self, up: bool) -> Result<u32, HostError> {
        let current = self.read()?;
        let next = if up {
            current.saturating_add(self.step)
        } else {
            current.saturating_sub(self.step)
        };
        self.write(next)
    }
}
