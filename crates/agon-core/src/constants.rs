//! Package-level constants.

/// Current version of the agon client (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "agon";

/// Well-known WebSocket close codes.
///
/// See <https://developer.mozilla.org/en-US/docs/Web/API/CloseEvent/code>.
pub mod close_code {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;
    /// Endpoint going away (navigation, server shutdown).
    pub const GOING_AWAY: u16 = 1001;
    /// Abnormal closure — no close frame received.
    pub const ABNORMAL: u16 = 1006;
    /// Server encountered an unexpected condition.
    pub const SERVER_ERROR: u16 = 1011;
    /// Server is restarting.
    pub const SERVICE_RESTART: u16 = 1012;
}
