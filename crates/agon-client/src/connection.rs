//! Connection management over one persistent WebSocket.
//!
//! The manager owns a single transport connection to the judge endpoint and
//! is driven cooperatively by its caller: `recv()` yields decoded inbound
//! messages one at a time, `send()` transmits immediately only while the
//! connection is `Open` and otherwise queues the encoded frame in an
//! unbounded FIFO that is flushed (in order, exactly once) on the next
//! successful open.
//!
//! Dialing retries with exponential backoff inside an explicit `connect()`
//! or `reconnect()` call. An *unexpected* close never triggers a reconnect:
//! the session is considered over and the surrounding application decides
//! whether to start a new one.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use agon_core::constants::close_code;
use agon_core::errors::{AgonError, TransportError};
use agon_core::retry::{RetryConfig, backoff_delay_ms};

use crate::protocol::{self, ClientMessage, ServerMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle state of the managed connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been attempted yet.
    Uninstantiated,
    /// A dial is in progress.
    Connecting,
    /// The connection is open; sends go out immediately.
    Open,
    /// A client-initiated close is in progress.
    Closing,
    /// The connection is closed (cleanly or not).
    Closed,
}

/// Close details reported with a [`ConnectionEvent::Disconnect`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseInfo {
    /// WebSocket close code (see [`close_code`]).
    pub code: u16,
    /// Close reason, possibly empty.
    pub reason: String,
}

/// Connection lifecycle event delivered to registered meta-handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection transitioned to `Open`.
    Connect,
    /// The connection closed (cleanly or unexpectedly).
    Disconnect(CloseInfo),
    /// A transport or decode problem that did not close the connection by
    /// itself (dial failure, malformed frame).
    Error(String),
}

/// Kind tag of a [`ConnectionEvent`], used as registration key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionEventKind {
    /// [`ConnectionEvent::Connect`]
    Connect,
    /// [`ConnectionEvent::Disconnect`]
    Disconnect,
    /// [`ConnectionEvent::Error`]
    Error,
}

impl ConnectionEvent {
    /// The event's kind tag.
    #[must_use]
    pub fn kind(&self) -> ConnectionEventKind {
        match self {
            Self::Connect => ConnectionEventKind::Connect,
            Self::Disconnect(_) => ConnectionEventKind::Disconnect,
            Self::Error(_) => ConnectionEventKind::Error,
        }
    }
}

type EventHandler = Box<dyn FnMut(&ConnectionEvent) + Send>;

/// Owner of one transport connection to the judge.
pub struct ConnectionManager {
    endpoint: String,
    retry: RetryConfig,
    state: ConnectionState,
    ws: Option<WsStream>,
    /// Encoded frames awaiting the next open, oldest first.
    queue: VecDeque<String>,
    meta_handlers: HashMap<ConnectionEventKind, EventHandler>,
    last_message_at: Option<Instant>,
}

impl ConnectionManager {
    /// Create a manager for an endpoint. Nothing is dialed until
    /// [`connect`](Self::connect).
    #[must_use]
    pub fn new(endpoint: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            retry,
            state: ConnectionState::Uninstantiated,
            ws: None,
            queue: VecDeque::new(),
            meta_handlers: HashMap::new(),
            last_message_at: None,
        }
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether sends currently go out immediately.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Number of frames waiting for the next open.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// When the last inbound message was decoded, if any.
    #[must_use]
    pub fn last_message_at(&self) -> Option<Instant> {
        self.last_message_at
    }

    /// Register a lifecycle meta-handler. At most one handler per event
    /// kind; registering again replaces the previous one.
    pub fn register_event<F>(&mut self, kind: ConnectionEventKind, handler: F)
    where
        F: FnMut(&ConnectionEvent) + Send + 'static,
    {
        if self.meta_handlers.insert(kind, Box::new(handler)).is_some() {
            debug!(?kind, "replaced lifecycle handler");
        }
    }

    fn emit(&mut self, event: &ConnectionEvent) {
        if let Some(handler) = self.meta_handlers.get_mut(&event.kind()) {
            handler(event);
        }
    }

    /// Dial the endpoint, retrying with exponential backoff per the
    /// configured [`RetryConfig`]. A no-op when already open.
    ///
    /// On success the state becomes `Open`, the `Connect` event fires, and
    /// the outbound queue is flushed in FIFO order.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        if self.is_open() {
            return Ok(());
        }
        self.state = ConnectionState::Connecting;
        info!(endpoint = %self.endpoint, "connecting");

        let mut attempt: u32 = 0;
        loop {
            match connect_async(self.endpoint.as_str()).await {
                Ok((ws, _response)) => {
                    self.ws = Some(ws);
                    self.state = ConnectionState::Open;
                    info!(endpoint = %self.endpoint, queued = self.queue.len(), "connection open");
                    self.emit(&ConnectionEvent::Connect);
                    return self.flush_queue().await;
                }
                Err(err) if attempt < self.retry.max_retries => {
                    let delay = backoff_delay_ms(attempt, &self.retry, rand::random::<f64>());
                    warn!(%err, attempt, delay_ms = delay, "dial failed, backing off");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(err) => {
                    self.state = ConnectionState::Closed;
                    let reason = err.to_string();
                    self.emit(&ConnectionEvent::Error(reason.clone()));
                    return Err(TransportError::ConnectFailed {
                        endpoint: self.endpoint.clone(),
                        reason,
                    });
                }
            }
        }
    }

    /// Tear down any existing connection and dial the same endpoint again.
    ///
    /// A no-op when already open, unless `force` is set.
    pub async fn reconnect(&mut self, force: bool) -> Result<(), TransportError> {
        if self.is_open() && !force {
            debug!("reconnect requested but connection already open");
            return Ok(());
        }
        self.disconnect().await;
        self.connect().await
    }

    /// Close the connection deliberately. Queued frames are kept for a
    /// later explicit reconnect.
    pub async fn disconnect(&mut self) {
        let Some(mut ws) = self.ws.take() else {
            return;
        };
        self.state = ConnectionState::Closing;
        debug!("closing connection");
        let _ = ws.close(None).await;
        self.state = ConnectionState::Closed;
        let event = ConnectionEvent::Disconnect(CloseInfo {
            code: close_code::NORMAL,
            reason: "client disconnect".into(),
        });
        self.emit(&event);
    }

    /// Send a message now if open; otherwise queue its encoded frame for
    /// the next open.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), AgonError> {
        let frame = protocol::encode(message)?;
        if self.is_open() {
            self.send_frame(frame).await?;
        } else {
            debug!(state = ?self.state, queued = self.queue.len() + 1, "queueing outbound frame");
            self.queue.push_back(frame);
        }
        Ok(())
    }

    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError> {
        let Some(ws) = self.ws.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        match ws.send(Message::text(frame)).await {
            Ok(()) => Ok(()),
            Err(err) => Err(TransportError::Send {
                reason: err.to_string(),
            }),
        }
    }

    /// Flush queued frames oldest-first. A frame that fails to send is put
    /// back at the head so nothing is dropped or duplicated.
    async fn flush_queue(&mut self) -> Result<(), TransportError> {
        while let Some(frame) = self.queue.pop_front() {
            if let Err(err) = self.send_frame(frame.clone()).await {
                self.queue.push_front(frame);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Receive the next inbound message.
    ///
    /// Malformed frames are logged, reported via the `Error` meta-handler,
    /// and skipped — the connection stays alive. Returns `None` once the
    /// connection has finalized (server close, transport error, or stream
    /// end), after emitting `Disconnect`.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        loop {
            let frame = {
                let ws = self.ws.as_mut()?;
                ws.next().await
            };
            match frame {
                Some(Ok(Message::Text(text))) => {
                    self.last_message_at = Some(Instant::now());
                    match protocol::decode(text.as_str()) {
                        Ok(message) => return Some(message),
                        Err(err) => {
                            warn!(%err, "dropping malformed frame");
                            self.emit(&ConnectionEvent::Error(err.to_string()));
                        }
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    if let Some(ws) = self.ws.as_mut() {
                        let _ = ws.send(Message::Pong(payload)).await;
                    }
                }
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Binary(_))) => {
                    warn!("ignoring unexpected binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    let info = frame.map_or(
                        CloseInfo {
                            code: close_code::ABNORMAL,
                            reason: String::new(),
                        },
                        |f| CloseInfo {
                            code: u16::from(f.code),
                            reason: f.reason.to_string(),
                        },
                    );
                    self.finalize(info);
                    return None;
                }
                Some(Err(err)) => {
                    let reason = err.to_string();
                    self.emit(&ConnectionEvent::Error(reason.clone()));
                    self.finalize(CloseInfo {
                        code: close_code::ABNORMAL,
                        reason,
                    });
                    return None;
                }
                None => {
                    self.finalize(CloseInfo {
                        code: close_code::ABNORMAL,
                        reason: "stream ended".into(),
                    });
                    return None;
                }
            }
        }
    }

    /// Record an unexpected close. No auto-reconnect: the session is over
    /// until the application explicitly reconnects.
    fn finalize(&mut self, info: CloseInfo) {
        self.ws = None;
        self.state = ConnectionState::Closed;
        info!(code = info.code, reason = %info.reason, "connection closed");
        let event = ConnectionEvent::Disconnect(info);
        self.emit(&event);
    }
}
