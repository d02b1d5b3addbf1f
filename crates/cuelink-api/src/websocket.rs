//! Socket.IO push channel with auto-reconnect.
//!
//! Connects to the device's Socket.IO endpoint over a WebSocket, completes
//! the Engine.IO / namespace handshake, then hands the connection to a
//! background task. The task forwards every pushed event, in arrival
//! order, through an unbounded [`mpsc`] pipe of [`SocketMessage`]s, answers
//! heartbeats, writes outgoing events, and reconnects with exponential
//! backoff after an unsolicited drop.
//!
//! # Example
//!
//! ```rust,ignore
//! use cuelink_api::websocket::{PushSocket, SocketMessage, SocketOptions};
//! use cuelink_api::ClientConfig;
//! use tokio::sync::mpsc;
//!
//! let config = ClientConfig::new("192.168.2.21", 80);
//! let options = SocketOptions::default();
//! let (tx, mut rx) = mpsc::unbounded_channel();
//!
//! let socket = PushSocket::connect(config.socket_url(options.version)?, options, tx).await?;
//! socket.emitter().emit("playback:play", None);
//!
//! while let Some(SocketMessage::Event(event)) = rx.recv().await {
//!     println!("{}: {}", event.name, event.data);
//! }
//!
//! socket.close().await;
//! ```

use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::{CancellationToken, DropGuard};
use url::Url;

use crate::error::Error;
use crate::socketio::{EngineIoVersion, OpenPacket, Packet, ROOT_NAMESPACE, SocketPacket};
use crate::transport::TransportConfig;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Floor for the heartbeat period, whatever the server advertises.
const MIN_HEARTBEAT: Duration = Duration::from_millis(500);

// ── Messages ─────────────────────────────────────────────────────────

/// A named event pushed by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    /// Event name, e.g. `"event:state"`.
    pub name: String,
    /// First event argument (`null` for argument-less events).
    pub data: Value,
}

impl PushEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Why a push session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// [`PushSocket::close`] / [`PushSocket::shutdown`] was called.
    ClientDisconnect,
    /// The device sent a namespace `DISCONNECT`.
    ServerDisconnect,
    /// The WebSocket or Engine.IO session was closed.
    TransportClose,
    /// Read/write failure or heartbeat timeout.
    TransportError(String),
}

/// Lifecycle and event notifications from the socket task, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketMessage {
    Event(PushEvent),
    /// A new session was established after a drop.
    Reconnected,
    /// The current session ended. `reconnecting` is `true` when the task
    /// keeps trying to re-establish it.
    Closed {
        reason: CloseReason,
        reconnecting: bool,
    },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for push channel reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Reconnect at all after an unsolicited drop. Default: `true`.
    pub enabled: bool,

    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 5s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            max_retries: None,
        }
    }
}

// ── SocketOptions ────────────────────────────────────────────────────

/// Per-connection socket settings.
#[derive(Debug, Clone, Default)]
pub struct SocketOptions {
    pub version: EngineIoVersion,
    pub handshake_timeout: Option<Duration>,
    pub reconnect: ReconnectConfig,
}

impl From<&TransportConfig> for SocketOptions {
    fn from(transport: &TransportConfig) -> Self {
        Self {
            version: transport.engine_io,
            handshake_timeout: Some(transport.handshake_timeout),
            reconnect: transport.reconnect.clone(),
        }
    }
}

// ── PushSocket ───────────────────────────────────────────────────────

/// Handle to a running push connection.
///
/// Dropping the handle stops the background task.
pub struct PushSocket {
    outgoing: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    sid: String,
    _guard: DropGuard,
}

impl PushSocket {
    /// Open the WebSocket, complete the handshake, and spawn the reader.
    ///
    /// Returns once the default namespace is connected. Handshake failures
    /// are returned directly and never retried; only sessions that were
    /// established once are reconnected.
    pub async fn connect(
        url: Url,
        options: SocketOptions,
        messages: mpsc::UnboundedSender<SocketMessage>,
    ) -> Result<Self, Error> {
        let session = open_session(&url, &options).await?;
        let sid = session.open.sid.clone();
        tracing::info!(url = %url, sid = %sid, "push channel connected");

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            socket_loop(session, url, options, outgoing_rx, messages, task_cancel).await;
        });

        Ok(Self {
            outgoing,
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
            sid,
        })
    }

    /// Engine.IO session id of the initial session.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// A cloneable handle for sending events.
    pub fn emitter(&self) -> SocketEmitter {
        SocketEmitter {
            outgoing: self.outgoing.clone(),
        }
    }

    /// Signal the background task to disconnect and stop reconnecting.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Shut down and wait for the background task to finish. The final
    /// [`SocketMessage::Closed`] has been delivered when this returns.
    pub async fn close(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "push socket task failed");
        }
    }
}

/// Sends events over a [`PushSocket`].
#[derive(Debug, Clone)]
pub struct SocketEmitter {
    outgoing: mpsc::UnboundedSender<String>,
}

impl SocketEmitter {
    /// Queue an event for the writer. Returns `false` if the socket task
    /// has already exited.
    pub fn emit(&self, name: &str, data: Option<Value>) -> bool {
        let frame = Packet::event(name, data).encode();
        tracing::trace!(frame = %frame, "emit");
        self.outgoing.send(frame).is_ok()
    }
}

// ── Handshake ────────────────────────────────────────────────────────

struct Session {
    ws: WsStream,
    open: OpenPacket,
}

async fn open_session(url: &Url, options: &SocketOptions) -> Result<Session, Error> {
    match options.handshake_timeout {
        Some(limit) => tokio::time::timeout(limit, handshake(url, options.version))
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: limit.as_secs(),
            })?,
        None => handshake(url, options.version).await,
    }
}

/// WebSocket upgrade → Engine.IO `open` → namespace `CONNECT`.
async fn handshake(url: &Url, version: EngineIoVersion) -> Result<Session, Error> {
    tracing::debug!(url = %url, ?version, "opening push channel");

    let (mut ws, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let open = loop {
        match next_packet(&mut ws).await? {
            Packet::Open(open) => break open,
            other => tracing::trace!(?other, "ignoring packet before open"),
        }
    };

    if version.client_connects_namespace() {
        send_packet(&mut ws, &Packet::connect()).await?;
    }

    loop {
        match next_packet(&mut ws).await? {
            Packet::Message(SocketPacket::Connect { namespace, .. })
                if namespace == ROOT_NAMESPACE =>
            {
                break;
            }
            Packet::Message(SocketPacket::ConnectError { message, .. }) => {
                return Err(Error::ConnectRejected(message));
            }
            Packet::Ping(data) => send_packet(&mut ws, &Packet::Pong(data)).await?,
            Packet::Close => {
                return Err(Error::Handshake("session closed before namespace connect".into()));
            }
            other => tracing::trace!(?other, "ignoring packet before namespace connect"),
        }
    }

    Ok(Session { ws, open })
}

async fn next_packet(ws: &mut WsStream) -> Result<Packet, Error> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Packet::decode(text.as_str()),
            Some(Ok(Message::Close(_))) | None => {
                return Err(Error::Handshake("connection closed during handshake".into()));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
        }
    }
}

async fn send_packet(ws: &mut WsStream, packet: &Packet) -> Result<(), Error> {
    ws.send(Message::Text(packet.encode().into()))
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))
}

// ── Background loop ──────────────────────────────────────────────────

enum SessionEnd {
    Cancelled,
    ServerDisconnect,
    Closed,
    Failed(String),
}

impl SessionEnd {
    fn reason(&self) -> CloseReason {
        match self {
            Self::Cancelled => CloseReason::ClientDisconnect,
            Self::ServerDisconnect => CloseReason::ServerDisconnect,
            Self::Closed => CloseReason::TransportClose,
            Self::Failed(reason) => CloseReason::TransportError(reason.clone()),
        }
    }
}

/// Main loop: run session → report close → backoff → reconnect.
async fn socket_loop(
    mut session: Session,
    url: Url,
    options: SocketOptions,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    messages: mpsc::UnboundedSender<SocketMessage>,
    cancel: CancellationToken,
) {
    loop {
        let end = run_session(session, options.version, &mut outgoing, &messages, &cancel).await;

        // A namespace disconnect from the device is deliberate; the stock
        // client does not retry it either.
        let reconnecting = options.reconnect.enabled
            && matches!(end, SessionEnd::Closed | SessionEnd::Failed(_));

        match &end {
            SessionEnd::Cancelled => tracing::info!("push channel disconnected"),
            SessionEnd::ServerDisconnect => tracing::info!("device closed the push channel"),
            SessionEnd::Closed => tracing::info!(reconnecting, "push channel closed"),
            SessionEnd::Failed(reason) => {
                tracing::warn!(error = %reason, reconnecting, "push channel dropped");
            }
        }

        let _ = messages.send(SocketMessage::Closed {
            reason: end.reason(),
            reconnecting,
        });

        if !reconnecting {
            break;
        }

        let Some(next) = reconnect(&url, &options, &cancel).await else {
            break;
        };

        // Anything emitted while offline is dropped, not replayed.
        while outgoing.try_recv().is_ok() {}

        let _ = messages.send(SocketMessage::Reconnected);
        session = next;
    }

    tracing::debug!("push socket task exiting");
}

/// Read frames until the session ends.
async fn run_session(
    session: Session,
    version: EngineIoVersion,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
    messages: &mpsc::UnboundedSender<SocketMessage>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let Session { ws, open } = session;
    let (mut write, mut read) = ws.split();

    let period = Duration::from_millis(open.ping_interval).max(MIN_HEARTBEAT);
    let deadline = period + Duration::from_millis(open.ping_timeout);
    let mut heartbeat = tokio::time::interval(period);
    heartbeat.tick().await;
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                // emits queued before the close still go out
                while let Ok(frame) = outgoing.try_recv() {
                    if write.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                let _ = write.send(Message::Text(Packet::disconnect().encode().into())).await;
                let _ = write.close().await;
                return SessionEnd::Cancelled;
            }
            Some(frame) = outgoing.recv() => {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    return SessionEnd::Failed(e.to_string());
                }
            }
            _ = heartbeat.tick() => {
                if last_seen.elapsed() > deadline {
                    return SessionEnd::Failed("heartbeat timeout".into());
                }
                if version.client_sends_pings() {
                    let ping = Packet::Ping(None).encode();
                    if let Err(e) = write.send(Message::Text(ping.into())).await {
                        return SessionEnd::Failed(e.to_string());
                    }
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        match Packet::decode(text.as_str()) {
                            Ok(Packet::Ping(data)) => {
                                let pong = Packet::Pong(data).encode();
                                if let Err(e) = write.send(Message::Text(pong.into())).await {
                                    return SessionEnd::Failed(e.to_string());
                                }
                            }
                            Ok(Packet::Message(SocketPacket::Event { name, args, .. })) => {
                                tracing::trace!(event = %name, "push event");
                                let data = SocketPacket::payload(&args);
                                let _ = messages.send(SocketMessage::Event(PushEvent { name, data }));
                            }
                            Ok(Packet::Message(SocketPacket::Disconnect { namespace }))
                                if namespace == ROOT_NAMESPACE =>
                            {
                                return SessionEnd::ServerDisconnect;
                            }
                            Ok(Packet::Close) => return SessionEnd::Closed,
                            Ok(other) => tracing::trace!(?other, "ignoring packet"),
                            Err(e) => tracing::debug!(error = %e, "dropping undecodable frame"),
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::debug!(code = %cf.code, reason = %cf.reason, "close frame received");
                        }
                        return SessionEnd::Closed;
                    }
                    Some(Ok(_)) => {
                        // Binary, Ping, Pong, Frame -- tungstenite answers pings itself
                        last_seen = Instant::now();
                    }
                    Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
                    None => return SessionEnd::Closed,
                }
            }
        }
    }
}

/// Retry the handshake with backoff until it succeeds, the retry budget
/// runs out, or the socket is shut down.
async fn reconnect(url: &Url, options: &SocketOptions, cancel: &CancellationToken) -> Option<Session> {
    let mut attempt: u32 = 0;

    loop {
        if let Some(max) = options.reconnect.max_retries {
            if attempt >= max {
                tracing::error!(max_retries = max, "push channel reconnection limit reached, giving up");
                return None;
            }
        }

        let delay = calculate_backoff(attempt, &options.reconnect);
        tracing::debug!(delay_ms = delay.as_millis() as u64, attempt, "waiting before reconnect");

        tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            () = tokio::time::sleep(delay) => {}
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            result = open_session(url, options) => result,
        };

        match result {
            Ok(session) => {
                tracing::info!(attempt, sid = %session.open.sid, "push channel reconnected");
                return Some(session);
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "reconnect attempt failed");
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with up to ±20% deterministic spread.
///
/// `delay = min(initial * 2^attempt, max) * spread(attempt)`
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Knuth multiplicative hash of the attempt, mapped onto [-0.2, 0.2].
    let hashed = attempt.wrapping_mul(2_654_435_761) % 1000;
    let spread = 1.0 + 0.4 * (f64::from(hashed) / 1000.0 - 0.5);

    Duration::from_secs_f64((capped * spread).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────
