//! The session controller.
//!
//! Ties the layers together: domain operations encode outbound mutations
//! through the connection, inbound messages route through the dispatch
//! table into [`SessionState`], and the resulting [`SessionEvent`]s flow
//! out to whatever frontend is driving the session.
//!
//! Starting a session connects, then asserts the root claim with an `Edit`
//! of the root id; the judge answers every accepted mutation with a full
//! snapshot, which reconciliation folds into the local view. Mutations are
//! never applied optimistically: the view only changes when a snapshot
//! arrives (pins excepted, which are client-only).

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use agon_core::errors::AgonError;
use agon_core::ids::StatementId;
use agon_core::retry::RetryConfig;

use crate::connection::{CloseInfo, ConnectionEvent, ConnectionEventKind, ConnectionManager};
use crate::dispatch::{DispatchTable, ServerMessageKind};
use crate::protocol::{ClientMessage, ServerMessage, ServerRejection};
use crate::reconcile::reconcile;
use crate::view::{GraphView, Pin};

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not connected (never started, or the connection closed).
    #[default]
    Idle,
    /// Connected and arguing.
    Playing,
    /// The judge declared the root proven. The connection stays up; the
    /// graph can still be inspected.
    Won,
}

/// A frontend request to the session.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionCommand {
    /// Propose a new statement.
    Add {
        /// The claim text.
        statement: String,
    },
    /// Propose deleting a statement.
    Delete {
        /// Target id.
        id: StatementId,
    },
    /// Propose replacing a statement's text.
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
    /// Retract a claimed implication.
    Unlink {
        /// Premise id.
        premise: StatementId,
        /// Conclusion id.
        conclusion: StatementId,
    },
    /// Ask the judge to accept a statement as a standalone fact.
    ProveDirect {
        /// Target id.
        id: StatementId,
    },
    /// Ask the judge to evaluate a statement against its premises.
    ProveImplication {
        /// Target id.
        id: StatementId,
    },
    /// Request a fresh snapshot.
    Resync,
    /// Tear down and redial; re-asserts the root claim and resyncs.
    Reconnect {
        /// Redial even while the connection is open.
        force: bool,
    },
    /// Pin a node at fixed layout coordinates (client-only).
    Pin {
        /// Target id.
        id: StatementId,
        /// Coordinates to hold the node at.
        pin: Pin,
    },
    /// Release a pinned node back to the layout engine (client-only).
    Unpin {
        /// Target id.
        id: StatementId,
    },
    /// Close the connection and end the run loop.
    Quit,
}

/// Outward notification from the session to its frontend.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// The connection opened.
    Connected,
    /// The connection closed; no automatic reconnect follows.
    Disconnected(CloseInfo),
    /// A transport or decode problem that left the connection up, or a
    /// failed explicit reconnect.
    TransportFailed(String),
    /// The local view was replaced by a reconciled snapshot or updated by
    /// a pin change.
    GraphUpdated(GraphView),
    /// The judge assigned an id to a recently added statement.
    NodeAssigned(StatementId),
    /// The judge's rationale for an action outcome.
    JudgeComment {
        /// Statement the rationale refers to.
        id: StatementId,
        /// Rationale text.
        comment: String,
        /// Whether the action was accepted.
        success: bool,
    },
    /// Advisory rate-limit notice.
    Cooldown {
        /// Seconds until the judge accepts the next prove request.
        seconds: u64,
    },
    /// The judge rejected a proposed mutation. Nothing to roll back.
    Rejected(ServerRejection),
    /// The root statement was judged proven.
    Won,
}

/// Mutable session state, the dispatch context for inbound handlers.
#[derive(Debug, Default)]
pub struct SessionState {
    view: GraphView,
    phase: SessionPhase,
    /// Events produced by handlers during one dispatch, drained afterwards.
    pending: Vec<SessionEvent>,
}

impl SessionState {
    /// The current graph projection.
    #[must_use]
    pub fn view(&self) -> &GraphView {
        &self.view
    }

    /// The current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn drain_pending(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending)
    }
}

/// Build the dispatch table with one handler per inbound kind.
fn default_table() -> DispatchTable<SessionState> {
    let mut table: DispatchTable<SessionState> = DispatchTable::new();

    table.register(ServerMessageKind::GameState, |msg, state: &mut SessionState| {
        if let ServerMessage::GameState { statements, root } = msg {
            debug!(statements = statements.len(), %root, "applying snapshot");
            state.view = reconcile(&state.view, &statements, root);
            state.pending.push(SessionEvent::GraphUpdated(state.view.clone()));
        }
    });

    table.register(ServerMessageKind::NewNodeId, |msg, state: &mut SessionState| {
        if let ServerMessage::NewNodeId { id } = msg {
            state.pending.push(SessionEvent::NodeAssigned(id));
        }
    });

    table.register(ServerMessageKind::Comment, |msg, state: &mut SessionState| {
        if let ServerMessage::Comment { id, comment, success } = msg {
            state.pending.push(SessionEvent::JudgeComment { id, comment, success });
        }
    });

    table.register(ServerMessageKind::AICooldown, |msg, state: &mut SessionState| {
        if let ServerMessage::AICooldown { seconds } = msg {
            state.pending.push(SessionEvent::Cooldown { seconds });
        }
    });

    table.register(ServerMessageKind::Error, |msg, state: &mut SessionState| {
        if let ServerMessage::Error(rejection) = msg {
            warn!(%rejection, "mutation rejected");
            state.pending.push(SessionEvent::Rejected(rejection));
        }
    });

    table.register(ServerMessageKind::Win, |_, state: &mut SessionState| {
        info!("root statement proven");
        state.phase = SessionPhase::Won;
        state.pending.push(SessionEvent::Won);
    });

    table
}

/// Drives one argument session against the judge.
pub struct SessionController {
    connection: ConnectionManager,
    table: DispatchTable<SessionState>,
    state: SessionState,
    root_statement: String,
}

impl SessionController {
    /// Create a controller for an endpoint and root claim. Nothing is
    /// dialed until [`start`](Self::start).
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        retry: RetryConfig,
        root_statement: impl Into<String>,
    ) -> Self {
        Self {
            connection: ConnectionManager::new(endpoint, retry),
            table: default_table(),
            state: SessionState::default(),
            root_statement: root_statement.into(),
        }
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Replace the handler for an inbound kind (last registration wins).
    pub fn register<F>(&mut self, kind: ServerMessageKind, handler: F)
    where
        F: FnMut(ServerMessage, &mut SessionState) + Send + 'static,
    {
        self.table.register(kind, handler);
    }

    /// Connect and assert the root claim. The judge answers with the first
    /// snapshot.
    pub async fn start(&mut self) -> Result<(), AgonError> {
        self.connection.connect().await?;
        self.state.phase = SessionPhase::Playing;
        self.assert_root().await
    }

    async fn assert_root(&mut self) -> Result<(), AgonError> {
        self.connection
            .send(&ClientMessage::Edit {
                id: StatementId::ROOT,
                statement: self.root_statement.clone(),
            })
            .await
    }

    /// Request a fresh snapshot.
    pub async fn resync(&mut self) -> Result<(), AgonError> {
        self.connection.send(&ClientMessage::GetGameState).await
    }

    /// Tear down and redial, then re-assert the root claim and resync.
    ///
    /// A no-op when already open, unless `force` is set.
    pub async fn reconnect(&mut self, force: bool) -> Result<(), AgonError> {
        if self.connection.is_open() && !force {
            return Ok(());
        }
        self.connection.reconnect(force).await?;
        self.state.phase = SessionPhase::Playing;
        self.assert_root().await?;
        self.resync().await
    }

    /// Propose a new statement.
    pub async fn add(&mut self, statement: impl Into<String>) -> Result<(), AgonError> {
        self.connection
            .send(&ClientMessage::Add {
                statement: statement.into(),
            })
            .await
    }

    /// Propose deleting a statement.
    pub async fn delete(&mut self, id: StatementId) -> Result<(), AgonError> {
        self.connection.send(&ClientMessage::Delete { id }).await
    }

    /// Propose replacing a statement's text.
    pub async fn edit(&mut self, id: StatementId, statement: impl Into<String>) -> Result<(), AgonError> {
        self.connection
            .send(&ClientMessage::Edit {
                id,
                statement: statement.into(),
            })
            .await
    }

    /// Claim that `conclusion` follows from `premise`.
    pub async fn link(
        &mut self,
        premise: StatementId,
        conclusion: StatementId,
    ) -> Result<(), AgonError> {
        self.connection
            .send(&ClientMessage::Link { premise, conclusion })
            .await
    }

    /// Retract a claimed implication.
    pub async fn unlink(
        &mut self,
        premise: StatementId,
        conclusion: StatementId,
    ) -> Result<(), AgonError> {
        self.connection
            .send(&ClientMessage::Unlink { premise, conclusion })
            .await
    }

    /// Ask the judge to accept a statement as a standalone fact.
    pub async fn prove_direct(&mut self, id: StatementId) -> Result<(), AgonError> {
        self.connection.send(&ClientMessage::ProveDirect { id }).await
    }

    /// Ask the judge to evaluate a statement against its premises.
    pub async fn prove_implication(&mut self, id: StatementId) -> Result<(), AgonError> {
        self.connection
            .send(&ClientMessage::ProveImplication { id })
            .await
    }

    /// Receive and apply the next inbound message, returning the events it
    /// produced. `None` once the connection has closed.
    pub async fn pump(&mut self) -> Option<Vec<SessionEvent>> {
        let message = self.connection.recv().await?;
        let _ = self.table.dispatch(message, &mut self.state);
        Some(self.state.drain_pending())
    }

    /// Drive the session until the connection closes, `Quit` arrives, or
    /// the command channel is dropped.
    ///
    /// Inbound messages and frontend commands are interleaved on this one
    /// task, so handlers and command effects never race.
    pub async fn run(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<(), AgonError> {
        self.wire_lifecycle_events(&events);
        self.start().await?;

        loop {
            tokio::select! {
                inbound = self.connection.recv() => match inbound {
                    Some(message) => {
                        let _ = self.table.dispatch(message, &mut self.state);
                        for event in self.state.drain_pending() {
                            if events.send(event).is_err() {
                                return Ok(());
                            }
                        }
                    }
                    None => {
                        self.state.phase = SessionPhase::Idle;
                        return Ok(());
                    }
                },
                command = commands.recv() => match command {
                    Some(SessionCommand::Quit) | None => {
                        self.connection.disconnect().await;
                        self.state.phase = SessionPhase::Idle;
                        return Ok(());
                    }
                    Some(command) => self.apply(command, &events).await,
                },
            }
        }
    }

    /// Forward connection lifecycle events into the session event stream.
    fn wire_lifecycle_events(&mut self, events: &mpsc::UnboundedSender<SessionEvent>) {
        let sink = events.clone();
        self.connection
            .register_event(ConnectionEventKind::Connect, move |_| {
                let _ = sink.send(SessionEvent::Connected);
            });
        let sink = events.clone();
        self.connection
            .register_event(ConnectionEventKind::Disconnect, move |event| {
                if let ConnectionEvent::Disconnect(info) = event {
                    let _ = sink.send(SessionEvent::Disconnected(info.clone()));
                }
            });
        let sink = events.clone();
        self.connection
            .register_event(ConnectionEventKind::Error, move |event| {
                if let ConnectionEvent::Error(reason) = event {
                    let _ = sink.send(SessionEvent::TransportFailed(reason.clone()));
                }
            });
    }

    async fn apply(
        &mut self,
        command: SessionCommand,
        events: &mpsc::UnboundedSender<SessionEvent>,
    ) {
        let outcome = match command {
            SessionCommand::Add { statement } => self.add(statement).await,
            SessionCommand::Delete { id } => self.delete(id).await,
            SessionCommand::Edit { id, statement } => self.edit(id, statement).await,
            SessionCommand::Link { premise, conclusion } => self.link(premise, conclusion).await,
            SessionCommand::Unlink { premise, conclusion } => {
                self.unlink(premise, conclusion).await
            }
            SessionCommand::ProveDirect { id } => self.prove_direct(id).await,
            SessionCommand::ProveImplication { id } => self.prove_implication(id).await,
            SessionCommand::Resync => self.resync().await,
            SessionCommand::Reconnect { force } => self.reconnect(force).await,
            SessionCommand::Pin { id, pin } => {
                if self.state.view.set_pin(id, pin) {
                    let _ = events.send(SessionEvent::GraphUpdated(self.state.view.clone()));
                } else {
                    warn!(%id, "cannot pin unknown node");
                }
                Ok(())
            }
            SessionCommand::Unpin { id } => {
                if self.state.view.clear_pin(id) {
                    let _ = events.send(SessionEvent::GraphUpdated(self.state.view.clone()));
                } else {
                    warn!(%id, "cannot unpin unknown node");
                }
                Ok(())
            }
            SessionCommand::Quit => Ok(()),
        };
        if let Err(err) = outcome {
            let _ = events.send(SessionEvent::TransportFailed(err.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_core::statement::{StatementDto, StatementState};
    use assert_matches::assert_matches;

    fn dto(seq: u64, text: &str) -> StatementDto {
        StatementDto {
            id: StatementId::new(seq, 0),
            statement: text.into(),
            state: StatementState::None,
            parents: vec![],
            children: vec![],
        }
    }

    #[test]
    fn default_table_covers_every_inbound_kind() {
        let table = default_table();
        assert_eq!(
            table.kinds(),
            vec![
                ServerMessageKind::NewNodeId,
                ServerMessageKind::GameState,
                ServerMessageKind::Comment,
                ServerMessageKind::AICooldown,
                ServerMessageKind::Error,
                ServerMessageKind::Win,
            ]
        );
    }

    #[test]
    fn snapshot_replaces_view_and_emits_update() {
        let mut table = default_table();
        let mut state = SessionState::default();

        let _ = table.dispatch(
            ServerMessage::GameState {
                statements: vec![dto(0, "the root claim"), dto(1, "a premise")],
                root: StatementId::ROOT,
            },
            &mut state,
        );

        assert_eq!(state.view().nodes().len(), 2);
        let events = state.drain_pending();
        assert_matches!(events.as_slice(), [SessionEvent::GraphUpdated(view)] => {
            assert_eq!(view.nodes().len(), 2);
        });
    }

    #[test]
    fn win_sets_phase_and_emits() {
        let mut table = default_table();
        let mut state = SessionState::default();

        let _ = table.dispatch(ServerMessage::Win, &mut state);

        assert_eq!(state.phase(), SessionPhase::Won);
        assert_eq!(state.drain_pending(), vec![SessionEvent::Won]);
    }

    #[test]
    fn rejection_emits_without_touching_view() {
        let mut table = default_table();
        let mut state = SessionState::default();
        let _ = table.dispatch(
            ServerMessage::GameState {
                statements: vec![dto(0, "the root claim")],
                root: StatementId::ROOT,
            },
            &mut state,
        );
        let _ = state.drain_pending();
        let before = state.view().clone();

        let _ = table.dispatch(
            ServerMessage::Error(ServerRejection::RemoveRoot),
            &mut state,
        );

        assert_eq!(state.view(), &before);
        assert_eq!(
            state.drain_pending(),
            vec![SessionEvent::Rejected(ServerRejection::RemoveRoot)]
        );
    }

    #[test]
    fn comment_and_cooldown_pass_through() {
        let mut table = default_table();
        let mut state = SessionState::default();

        let _ = table.dispatch(
            ServerMessage::Comment {
                id: StatementId::new(1, 0),
                comment: "Not a fact.".into(),
                success: false,
            },
            &mut state,
        );
        let _ = table.dispatch(ServerMessage::AICooldown { seconds: 30 }, &mut state);

        assert_eq!(
            state.drain_pending(),
            vec![
                SessionEvent::JudgeComment {
                    id: StatementId::new(1, 0),
                    comment: "Not a fact.".into(),
                    success: false,
                },
                SessionEvent::Cooldown { seconds: 30 },
            ]
        );
    }

    #[test]
    fn new_node_id_is_informational() {
        let mut table = default_table();
        let mut state = SessionState::default();

        let _ = table.dispatch(
            ServerMessage::NewNodeId {
                id: StatementId::new(4, 1),
            },
            &mut state,
        );

        assert!(state.view().is_empty());
        assert_eq!(
            state.drain_pending(),
            vec![SessionEvent::NodeAssigned(StatementId::new(4, 1))]
        );
    }

    #[tokio::test]
    async fn operations_queue_while_idle() {
        let mut session =
            SessionController::new("ws://127.0.0.1:9", RetryConfig::no_retries(), "root claim");

        session.add("a premise").await.unwrap();
        session.prove_direct(StatementId::new(1, 0)).await.unwrap();

        assert_eq!(session.connection().queued_len(), 2);
        assert_eq!(session.state().phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn pin_commands_update_view_locally() {
        let mut session =
            SessionController::new("ws://127.0.0.1:9", RetryConfig::no_retries(), "root claim");
        let mut table = default_table();
        let _ = table.dispatch(
            ServerMessage::GameState {
                statements: vec![dto(0, "the root claim")],
                root: StatementId::ROOT,
            },
            &mut session.state,
        );
        let _ = session.state.drain_pending();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        session
            .apply(
                SessionCommand::Pin {
                    id: StatementId::ROOT,
                    pin: Pin::planar(12.0, -3.0),
                },
                &events_tx,
            )
            .await;

        assert_eq!(
            session.state().view().node(StatementId::ROOT).unwrap().pin,
            Some(Pin::planar(12.0, -3.0))
        );
        assert_matches!(events_rx.try_recv(), Ok(SessionEvent::GraphUpdated(_)));

        session
            .apply(SessionCommand::Unpin { id: StatementId::ROOT }, &events_tx)
            .await;
        assert_eq!(
            session.state().view().node(StatementId::ROOT).unwrap().pin,
            None
        );
    }

    #[tokio::test]
    async fn pin_on_unknown_node_emits_nothing() {
        let mut session =
            SessionController::new("ws://127.0.0.1:9", RetryConfig::no_retries(), "root claim");
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        session
            .apply(
                SessionCommand::Pin {
                    id: StatementId::new(9, 9),
                    pin: Pin::planar(0.0, 0.0),
                },
                &events_tx,
            )
            .await;

        assert_matches!(
            events_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        );
    }
}
