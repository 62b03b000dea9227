//! Inbound message dispatch.
//!
//! Maps the closed set of inbound message kinds to handler functions. One
//! handler per kind — registering again replaces the previous handler (last
//! registration wins). A message whose kind has no handler is logged and
//! dropped, never raised: unknown or future server message kinds must not
//! break older clients.
//!
//! Dispatch is synchronous and delivers exactly one handler invocation per
//! message, so inbound frames are fully processed one at a time.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::protocol::ServerMessage;

/// Kind tag of an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServerMessageKind {
    /// [`ServerMessage::NewNodeId`]
    NewNodeId,
    /// [`ServerMessage::GameState`]
    GameState,
    /// [`ServerMessage::Comment`]
    Comment,
    /// [`ServerMessage::AICooldown`]
    AICooldown,
    /// [`ServerMessage::Error`]
    Error,
    /// [`ServerMessage::Win`]
    Win,
}

impl ServerMessage {
    /// The message's kind tag.
    #[must_use]
    pub fn kind(&self) -> ServerMessageKind {
        match self {
            Self::NewNodeId { .. } => ServerMessageKind::NewNodeId,
            Self::GameState { .. } => ServerMessageKind::GameState,
            Self::Comment { .. } => ServerMessageKind::Comment,
            Self::AICooldown { .. } => ServerMessageKind::AICooldown,
            Self::Error(_) => ServerMessageKind::Error,
            Self::Win => ServerMessageKind::Win,
        }
    }
}

/// Handler invoked for one inbound message, with mutable access to the
/// caller's context (the session state, in production use).
pub type Handler<Ctx> = Box<dyn FnMut(ServerMessage, &mut Ctx) + Send>;

/// Table mapping message kinds to handlers.
pub struct DispatchTable<Ctx> {
    handlers: HashMap<ServerMessageKind, Handler<Ctx>>,
}

impl<Ctx> DispatchTable<Ctx> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a kind, replacing any previous one.
    pub fn register<F>(&mut self, kind: ServerMessageKind, handler: F)
    where
        F: FnMut(ServerMessage, &mut Ctx) + Send + 'static,
    {
        if self.handlers.insert(kind, Box::new(handler)).is_some() {
            debug!(?kind, "replaced message handler");
        }
    }

    /// Route a message to its handler.
    ///
    /// Returns `false` (after logging a warning) when no handler is
    /// registered for the message's kind; the message is dropped.
    pub fn dispatch(&mut self, message: ServerMessage, ctx: &mut Ctx) -> bool {
        let kind = message.kind();
        match self.handlers.get_mut(&kind) {
            Some(handler) => {
                handler(message, ctx);
                true
            }
            None => {
                warn!(?kind, "no handler registered for message kind, dropping");
                false
            }
        }
    }

    /// Whether a handler is registered for a kind.
    #[must_use]
    pub fn is_registered(&self, kind: ServerMessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// All registered kinds (sorted).
    #[must_use]
    pub fn kinds(&self) -> Vec<ServerMessageKind> {
        let mut kinds: Vec<ServerMessageKind> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl<Ctx> Default for DispatchTable<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerRejection;
    use agon_core::ids::StatementId;

    #[derive(Default)]
    struct Trace {
        calls: Vec<&'static str>,
    }

    #[test]
    fn kind_tags_cover_every_variant() {
        assert_eq!(
            ServerMessage::NewNodeId {
                id: StatementId::ROOT
            }
            .kind(),
            ServerMessageKind::NewNodeId
        );
        assert_eq!(
            ServerMessage::GameState {
                statements: vec![],
                root: StatementId::ROOT
            }
            .kind(),
            ServerMessageKind::GameState
        );
        assert_eq!(
            ServerMessage::Comment {
                id: StatementId::ROOT,
                comment: String::new(),
                success: true
            }
            .kind(),
            ServerMessageKind::Comment
        );
        assert_eq!(
            ServerMessage::AICooldown { seconds: 1 }.kind(),
            ServerMessageKind::AICooldown
        );
        assert_eq!(
            ServerMessage::Error(ServerRejection::RemoveRoot).kind(),
            ServerMessageKind::Error
        );
        assert_eq!(ServerMessage::Win.kind(), ServerMessageKind::Win);
    }

    #[test]
    fn dispatch_invokes_registered_handler() {
        let mut table: DispatchTable<Trace> = DispatchTable::new();
        table.register(ServerMessageKind::Win, |_, trace: &mut Trace| {
            trace.calls.push("win");
        });

        let mut trace = Trace::default();
        assert!(table.dispatch(ServerMessage::Win, &mut trace));
        assert_eq!(trace.calls, vec!["win"]);
    }

    #[test]
    fn unregistered_kind_is_dropped_without_mutation() {
        let mut table: DispatchTable<Trace> = DispatchTable::new();
        let mut trace = Trace::default();
        assert!(!table.dispatch(ServerMessage::Win, &mut trace));
        assert!(trace.calls.is_empty());
    }

    #[test]
    fn last_registration_wins() {
        let mut table: DispatchTable<Trace> = DispatchTable::new();
        table.register(ServerMessageKind::Win, |_, trace: &mut Trace| {
            trace.calls.push("first");
        });
        table.register(ServerMessageKind::Win, |_, trace: &mut Trace| {
            trace.calls.push("second");
        });

        let mut trace = Trace::default();
        assert!(table.dispatch(ServerMessage::Win, &mut trace));
        assert_eq!(trace.calls, vec!["second"]);
    }

    #[test]
    fn one_invocation_per_message() {
        let mut table: DispatchTable<Trace> = DispatchTable::new();
        table.register(ServerMessageKind::AICooldown, |_, trace: &mut Trace| {
            trace.calls.push("cooldown");
        });
        table.register(ServerMessageKind::Win, |_, trace: &mut Trace| {
            trace.calls.push("win");
        });

        let mut trace = Trace::default();
        assert!(table.dispatch(ServerMessage::AICooldown { seconds: 5 }, &mut trace));
        assert_eq!(trace.calls, vec!["cooldown"]);
    }

    #[test]
    fn kinds_are_sorted_and_registration_tracked() {
        let mut table: DispatchTable<()> = DispatchTable::new();
        table.register(ServerMessageKind::Win, |_, _: &mut ()| {});
        table.register(ServerMessageKind::NewNodeId, |_, _: &mut ()| {});

        assert!(table.is_registered(ServerMessageKind::Win));
        assert!(!table.is_registered(ServerMessageKind::Comment));
        assert_eq!(
            table.kinds(),
            vec![ServerMessageKind::NewNodeId, ServerMessageKind::Win]
        );
    }

    #[test]
    fn handler_receives_message_payload() {
        let mut table: DispatchTable<Option<u64>> = DispatchTable::new();
        table.register(ServerMessageKind::AICooldown, |msg, slot: &mut Option<u64>| {
            if let ServerMessage::AICooldown { seconds } = msg {
                *slot = Some(seconds);
            }
        });

        let mut slot = None;
        assert!(table.dispatch(ServerMessage::AICooldown { seconds: 42 }, &mut slot));
        assert_eq!(slot, Some(42));
    }
}
