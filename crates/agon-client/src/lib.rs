//! # agon-client
//!
//! Client-side session and state-synchronization protocol for a remote
//! argument-graph judge.
//!
//! A session holds a local graph of statements (nodes) and implication
//! edges, proposes mutations to an authoritative judge over one persistent
//! WebSocket, and folds the full-state snapshots the judge pushes back into
//! its local view. Layers, leaves first:
//!
//! - [`protocol`] — pure JSON codec for the tagged-union wire frames
//! - [`connection`] — one transport connection: dial with backoff, offline
//!   FIFO queue with flush-on-open, lifecycle events, explicit reconnect
//! - [`dispatch`] — closed-enum table routing inbound messages to handlers
//! - [`view`] / [`reconcile`] — rendering-ready graph projection and the
//!   full-replace merge that preserves client-only pin metadata
//! - [`session`] — domain operations (add/edit/delete/link/unlink/prove)
//!   and the inbound handlers that mutate session state
//!
//! Everything runs on a single cooperative task: inbound frames are decoded,
//! dispatched, and applied strictly in arrival order, so no two handlers
//! ever interleave.

#![deny(unsafe_code)]

pub mod connection;
pub mod dispatch;
pub mod protocol;
pub mod reconcile;
pub mod session;
pub mod view;

pub use connection::{
    CloseInfo, ConnectionEvent, ConnectionEventKind, ConnectionManager, ConnectionState,
};
pub use dispatch::{DispatchTable, ServerMessageKind};
pub use protocol::{ClientMessage, ServerMessage, ServerRejection, decode, encode};
pub use reconcile::reconcile;
pub use session::{SessionCommand, SessionController, SessionEvent, SessionPhase};
pub use view::{GraphView, Pin, RenderEdge, RenderNode};
