//! Wire-format messages and the frame codec.
//!
//! The protocol is a JSON tagged union, one frame per logical message, no
//! batching. Externally tagged serde enums produce the exact envelope
//! shapes: struct variants become `{"Tag": {...}}` objects and unit
//! variants become bare strings (`"Win"`, `"GetGameState"`,
//! `"RemoveRoot"`).
//!
//! The codec is pure and synchronous — serialization only, no I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

use agon_core::errors::CodecError;
use agon_core::ids::StatementId;
use agon_core::statement::StatementDto;

/// Longest frame excerpt carried inside a [`CodecError::MalformedFrame`].
const EXCERPT_LEN: usize = 120;

/// Outbound message: a mutation or query proposed to the judge.
///
/// All mutations only take effect server-side; the local view reflects the
/// snapshot pushed back, never an optimistic local edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Request a fresh full snapshot (used to resync after reconnect).
    GetGameState,
    /// Create a statement; the server assigns its id.
    Add {
        /// The claim text.
        statement: String,
    },
    /// Delete a statement and every edge touching it.
    Delete {
        /// Target id.
        id: StatementId,
    },
    /// Replace a statement's text.
    Edit {
        /// Target id.
        id: StatementId,
        /// New claim text.
        statement: String,
    },
    /// Claim that `conclusion` follows from `premise`.
    Link {
        /// Premise id.
        premise: StatementId,
        /// Conclusion id.
        conclusion: StatementId,
    },
    /// Retract a previously claimed implication.
    Unlink {
        /// Premise id.
        premise: StatementId,
        /// Conclusion id.
        conclusion: StatementId,
    },
    /// Ask the judge to accept the statement as a standalone fact.
    ProveDirect {
        /// Target id.
        id: StatementId,
    },
    /// Ask the judge to evaluate the statement against its premises.
    ProveImplication {
        /// Target id.
        id: StatementId,
    },
}

/// Inbound message pushed by the judge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Id assigned to a recently added statement.
    ///
    /// Informational only: the wire carries no request/response correlation,
    /// so under rapid concurrent adds this cannot be tied to a specific
    /// `Add`. That is a protocol gap, not something to paper over
    /// client-side.
    NewNodeId {
        /// The assigned id.
        id: StatementId,
    },
    /// Full-state snapshot of the authoritative graph.
    GameState {
        /// Every statement currently in the graph.
        statements: Vec<StatementDto>,
        /// The designated root.
        root: StatementId,
    },
    /// The judge's natural-language rationale for an action outcome.
    Comment {
        /// Statement the rationale refers to.
        id: StatementId,
        /// Rationale text.
        comment: String,
        /// Whether the action was accepted.
        success: bool,
    },
    /// Rate-limit notice; advisory, never enforced client-side.
    AICooldown {
        /// Seconds until the judge accepts the next prove request.
        seconds: u64,
    },
    /// Semantic rejection of a proposed mutation.
    Error(ServerRejection),
    /// Terminal signal: the root statement has been judged proven.
    ///
    /// Encoded as the bare JSON string `"Win"`.
    Win,
}

/// Server-reported semantic rejection.
///
/// Surfaced to the consumer; never rolls local state back, because the
/// client performed no optimistic mutation in the first place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerRejection {
    /// The referenced statement does not exist (stale id or bad generation).
    NoSuchNode(StatementId),
    /// The root statement may never be deleted.
    RemoveRoot,
    /// The claimed implication already exists.
    AddExistingLink {
        /// Conclusion side of the existing edge.
        child: StatementId,
        /// Premise side of the existing edge.
        parent: StatementId,
    },
    /// The implication to retract does not exist.
    RemoveExistentLink {
        /// Conclusion side of the missing edge.
        child: StatementId,
        /// Premise side of the missing edge.
        parent: StatementId,
    },
}

impl fmt::Display for ServerRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchNode(id) => write!(f, "no statement with id {id}"),
            Self::RemoveRoot => write!(f, "the root statement cannot be removed"),
            Self::AddExistingLink { child, parent } => {
                write!(f, "link {parent} -> {child} already exists")
            }
            Self::RemoveExistentLink { child, parent } => {
                write!(f, "link {parent} -> {child} does not exist")
            }
        }
    }
}

/// Serialize an outbound message to a text frame.
pub fn encode(message: &ClientMessage) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Parse a text frame into an inbound message.
///
/// Fails with [`CodecError::MalformedFrame`] when the frame is not a
/// recognized envelope shape; callers treat that as non-fatal and keep the
/// connection alive.
pub fn decode(frame: &str) -> Result<ServerMessage, CodecError> {
    serde_json::from_str(frame).map_err(|e| CodecError::MalformedFrame {
        detail: e.to_string(),
        excerpt: excerpt(frame),
    })
}

/// Leading excerpt of a frame, cut on a char boundary.
fn excerpt(frame: &str) -> String {
    if frame.len() <= EXCERPT_LEN {
        return frame.to_owned();
    }
    let mut end = EXCERPT_LEN;
    while !frame.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &frame[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_core::statement::StatementState;
    use assert_matches::assert_matches;

    // ── Outbound frames ─────────────────────────────────────────────

    #[test]
    fn encode_add() {
        let frame = encode(&ClientMessage::Add {
            statement: "water is wet".into(),
        })
        .unwrap();
        assert_eq!(frame, r#"{"Add":{"statement":"water is wet"}}"#);
    }

    #[test]
    fn encode_edit_root() {
        let frame = encode(&ClientMessage::Edit {
            id: StatementId::ROOT,
            statement: "The earth is flat.".into(),
        })
        .unwrap();
        assert_eq!(frame, r#"{"Edit":{"id":[0,0],"statement":"The earth is flat."}}"#);
    }

    #[test]
    fn encode_link() {
        let frame = encode(&ClientMessage::Link {
            premise: StatementId::new(1, 0),
            conclusion: StatementId::ROOT,
        })
        .unwrap();
        assert_eq!(frame, r#"{"Link":{"premise":[1,0],"conclusion":[0,0]}}"#);
    }

    #[test]
    fn encode_prove_variants() {
        let id = StatementId::new(2, 1);
        assert_eq!(
            encode(&ClientMessage::ProveDirect { id }).unwrap(),
            r#"{"ProveDirect":{"id":[2,1]}}"#
        );
        assert_eq!(
            encode(&ClientMessage::ProveImplication { id }).unwrap(),
            r#"{"ProveImplication":{"id":[2,1]}}"#
        );
    }

    #[test]
    fn encode_get_game_state_is_bare_string() {
        assert_eq!(encode(&ClientMessage::GetGameState).unwrap(), "\"GetGameState\"");
    }

    #[test]
    fn encode_delete_and_unlink() {
        assert_eq!(
            encode(&ClientMessage::Delete {
                id: StatementId::new(4, 2)
            })
            .unwrap(),
            r#"{"Delete":{"id":[4,2]}}"#
        );
        assert_eq!(
            encode(&ClientMessage::Unlink {
                premise: StatementId::new(1, 0),
                conclusion: StatementId::new(2, 0),
            })
            .unwrap(),
            r#"{"Unlink":{"premise":[1,0],"conclusion":[2,0]}}"#
        );
    }

    // ── Inbound frames ──────────────────────────────────────────────

    #[test]
    fn decode_new_node_id() {
        let msg = decode(r#"{"NewNodeId":{"id":[3,1]}}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::NewNodeId {
                id: StatementId::new(3, 1)
            }
        );
    }

    #[test]
    fn decode_game_state() {
        let raw = r#"{"GameState":{"statements":[{"id":[0,0],"statement":"The earth is flat.","state":"None","parents":[],"children":[]}],"root":[0,0]}}"#;
        let msg = decode(raw).unwrap();
        let ServerMessage::GameState { statements, root } = msg else {
            panic!("expected GameState");
        };
        assert_eq!(root, StatementId::ROOT);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].statement, "The earth is flat.");
        assert_eq!(statements[0].state, StatementState::None);
    }

    #[test]
    fn decode_comment() {
        let raw = r#"{"Comment":{"id":[1,0],"comment":"That is not a fact.","success":false}}"#;
        assert_eq!(
            decode(raw).unwrap(),
            ServerMessage::Comment {
                id: StatementId::new(1, 0),
                comment: "That is not a fact.".into(),
                success: false,
            }
        );
    }

    #[test]
    fn decode_cooldown() {
        assert_eq!(
            decode(r#"{"AICooldown":{"seconds":30}}"#).unwrap(),
            ServerMessage::AICooldown { seconds: 30 }
        );
    }

    #[test]
    fn decode_bare_win_string() {
        // "Win" arrives as a bare JSON string literal, not an object.
        assert_eq!(decode("\"Win\"").unwrap(), ServerMessage::Win);
    }

    #[test]
    fn decode_error_no_such_node() {
        assert_eq!(
            decode(r#"{"Error":{"NoSuchNode":[5,2]}}"#).unwrap(),
            ServerMessage::Error(ServerRejection::NoSuchNode(StatementId::new(5, 2)))
        );
    }

    #[test]
    fn decode_error_remove_root() {
        assert_eq!(
            decode(r#"{"Error":"RemoveRoot"}"#).unwrap(),
            ServerMessage::Error(ServerRejection::RemoveRoot)
        );
    }

    #[test]
    fn decode_error_add_existing_link() {
        assert_eq!(
            decode(r#"{"Error":{"AddExistingLink":{"child":[0,0],"parent":[1,0]}}}"#).unwrap(),
            ServerMessage::Error(ServerRejection::AddExistingLink {
                child: StatementId::ROOT,
                parent: StatementId::new(1, 0),
            })
        );
    }

    #[test]
    fn decode_error_remove_existent_link() {
        assert_eq!(
            decode(r#"{"Error":{"RemoveExistentLink":{"child":[2,0],"parent":[1,0]}}}"#).unwrap(),
            ServerMessage::Error(ServerRejection::RemoveExistentLink {
                child: StatementId::new(2, 0),
                parent: StatementId::new(1, 0),
            })
        );
    }

    // ── Malformed frames ────────────────────────────────────────────

    #[test]
    fn decode_rejects_non_json() {
        assert_matches!(decode("hello"), Err(CodecError::MalformedFrame { .. }));
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        assert_matches!(
            decode(r#"{"FutureMessage":{"x":1}}"#),
            Err(CodecError::MalformedFrame { .. })
        );
    }

    #[test]
    fn decode_rejects_wrong_payload_shape() {
        assert_matches!(
            decode(r#"{"NewNodeId":{"id":"not-an-array"}}"#),
            Err(CodecError::MalformedFrame { .. })
        );
    }

    #[test]
    fn malformed_excerpt_is_truncated() {
        let frame = format!("{{\"x\":\"{}\"}}", "a".repeat(500));
        let Err(CodecError::MalformedFrame { excerpt, .. }) = decode(&frame) else {
            panic!("expected malformed frame");
        };
        assert!(excerpt.chars().count() <= 121); // 120 chars + ellipsis
    }

    // ── Display ─────────────────────────────────────────────────────

    #[test]
    fn rejection_display_uses_canonical_ids() {
        let rejection = ServerRejection::AddExistingLink {
            child: StatementId::ROOT,
            parent: StatementId::new(1, 0),
        };
        assert_eq!(rejection.to_string(), "link 1,0 -> 0,0 already exists");
        assert_eq!(
            ServerRejection::NoSuchNode(StatementId::new(5, 2)).to_string(),
            "no statement with id 5,2"
        );
    }
}
