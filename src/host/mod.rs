//! Host module - brightness control and external command dispatch

pub mod brightness;
pub mod commands;

pub use brightness::Brightness;
pub use commands::{CommandRunner, HostAction, RunOutcome};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown host action: {0}")]
    UnknownAction(String),

    #[error("{0} requires a value")]
    MissingValue(&'static str),

    #[error("invalid value {value:?} for {action}")]
    InvalidValue { action: &'static str, value: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected content {value:?} in {path:?}")]
    Parse { path: PathBuf, value: String },
}
