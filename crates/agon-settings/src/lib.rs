//! # agon-settings
//!
//! Configuration management with layered sources for the agon client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`AgonSettings::default()`]
//! 2. **User file** — `~/.agon/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `AGON_*` overrides (highest priority)
//!
//! The loaded value is handed to the session constructor explicitly; there
//! is no process-wide singleton. A session lives with the configuration it
//! was built with.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides_from, deep_merge, load_settings,
    load_settings_from_path, settings_path,
};
pub use types::{AgonSettings, ConnectionSettings, LoggingSettings};
