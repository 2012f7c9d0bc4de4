//! Configuration module for clipcoach
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{DebounceScope, Settings};
