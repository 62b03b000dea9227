//! Settings error types.

use thiserror::Error;

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors loading or parsing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading the settings file failed.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file contained invalid JSON, or the merged document
    /// did not fit the settings schema.
    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}
