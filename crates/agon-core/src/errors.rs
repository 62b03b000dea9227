//! Error hierarchy for the agon client.
//!
//! Built on [`thiserror`]:
//!
//! - [`AgonError`]: top-level enum covering all client error domains
//! - [`TransportError`]: connection dial/close/send failures
//! - [`CodecError`]: frame encode/decode failures
//!
//! Server-reported *semantic* rejections (no-such-node, remove-root,
//! duplicate link, …) are not errors in this hierarchy — they are ordinary
//! protocol messages, surfaced to the consumer as session events, because
//! the client performs no optimistic mutation that would need rolling back.

use thiserror::Error;

use crate::ids::ParseStatementIdError;

/// Top-level error type for the agon client.
#[derive(Debug, Error)]
pub enum AgonError {
    /// Transport-level failure.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Frame encode/decode failure.
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// A canonical `"seq,gen"` id string failed to parse.
    #[error("{0}")]
    InvalidStatementId(#[from] ParseStatementIdError),
}

/// Connection lifecycle and I/O errors.
///
/// All of these are non-fatal to the process; an unexpected close ends the
/// session (no auto-reconnect) and the surrounding application decides
/// whether to start a new one.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Dialing the endpoint failed after all backoff attempts.
    #[error("failed to connect to {endpoint}: {reason}")]
    ConnectFailed {
        /// Endpoint that was dialed.
        endpoint: String,
        /// Last dial error.
        reason: String,
    },

    /// An operation required an open connection.
    #[error("connection is not open")]
    NotConnected,

    /// Writing a frame to the socket failed.
    #[error("failed to send frame: {reason}")]
    Send {
        /// Underlying write error.
        reason: String,
    },
}

/// Frame codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An inbound frame was not a recognized envelope shape.
    ///
    /// Non-fatal: the frame is dropped and the connection stays alive.
    #[error("malformed inbound frame: {detail} (frame: {excerpt:?})")]
    MalformedFrame {
        /// Parser diagnostic.
        detail: String,
        /// Leading excerpt of the offending frame.
        excerpt: String,
    },

    /// An outbound message failed to serialize.
    #[error("failed to encode outbound message: {0}")]
    Encode(String),
}
