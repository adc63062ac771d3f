//! Core module - Shell state, configuration, preferences, and events

pub mod config;
pub mod events;
pub mod settings;
pub mod state;
