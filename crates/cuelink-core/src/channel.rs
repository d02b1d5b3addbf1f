// ── Transport channel ──
//
// One connection to one device: the REST request path plus the Socket.IO
// push channel. Owns the connection state machine and the single
// multiplexed event source every subscriber reads from.

use std::sync::{Arc, Weak};

use arc_swap::{ArcSwap, ArcSwapOption};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{AsRefStr, Display};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, trace, warn};

use cuelink_api::{
    ClientConfig, Method, PushEvent, PushSocket, RestClient, SocketEmitter, SocketMessage, SocketOptions,
    TransportConfig, UploadFile,
};

use crate::error::CoreError;
use crate::event::{self, SocketEvent};

const EVENT_CHANNEL_SIZE: usize = 1024;

// ── ConnectionState ──────────────────────────────────────────────

/// Health of the push channel.
///
/// Starts at `Error`, becomes `Ok` after a successful handshake and falls
/// back to `Error` when the channel closes. `Warning` is part of the
/// vocabulary but never produced by the channel itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ConnectionState {
    Ok,
    Warning,
    #[default]
    Error,
}

// ── Channel ──────────────────────────────────────────────────────

/// Cheaply cloneable handle to a device connection.
///
/// Event subscriptions live on the channel, not the socket, so they keep
/// receiving across disconnect/connect cycles.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    transport: TransportConfig,
    config: ArcSwap<ClientConfig>,
    rest: ArcSwap<RestClient>,
    /// Held for the whole of `connect`/`disconnect`, serializing them.
    connection: Mutex<Option<Connection>>,
    emitter: ArcSwapOption<SocketEmitter>,
    state: watch::Sender<ConnectionState>,
    events: broadcast::Sender<Arc<PushEvent>>,
}

/// A live socket plus the task forwarding its messages.
struct Connection {
    socket: PushSocket,
    pump: JoinHandle<()>,
}

impl Connection {
    async fn close(self) {
        self.socket.close().await;
        if let Err(e) = self.pump.await {
            warn!(error = %e, "event pump task failed");
        }
    }
}

impl Channel {
    /// Create a disconnected channel pointed at the default address.
    pub fn new(transport: TransportConfig) -> Result<Self, CoreError> {
        Self::with_address(ClientConfig::default(), transport)
    }

    /// Create a disconnected channel whose requests already go to `config`.
    pub fn with_address(config: ClientConfig, transport: TransportConfig) -> Result<Self, CoreError> {
        let rest = RestClient::new(&config, &transport)?;
        let (state, _) = watch::channel(ConnectionState::Error);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(ChannelInner {
                transport,
                config: ArcSwap::from_pointee(config),
                rest: ArcSwap::from_pointee(rest),
                connection: Mutex::new(None),
                emitter: ArcSwapOption::empty(),
                state,
                events,
            }),
        })
    }

    /// The address used by the last `connect` (or the default).
    pub fn config(&self) -> ClientConfig {
        self.inner.config.load().as_ref().clone()
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.inner.transport
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Open the push channel.
    ///
    /// `None` reuses the current address. Fails with
    /// [`CoreError::AlreadyConnected`] while the state is `Ok`, leaving the
    /// live connection untouched. A handle left over from a dropped
    /// session (still reconnecting, or told to go away by the device) is
    /// shut down and replaced.
    pub async fn connect(&self, config: Option<ClientConfig>) -> Result<(), CoreError> {
        let mut connection = self.inner.connection.lock().await;

        if self.connection_state() == ConnectionState::Ok {
            return Err(CoreError::AlreadyConnected);
        }

        if let Some(stale) = connection.take() {
            debug!("replacing stale push connection");
            self.inner.emitter.store(None);
            stale.close().await;
        }

        let config = config.unwrap_or_else(|| self.config());
        let rest = RestClient::new(&config, &self.inner.transport)?;
        self.inner.config.store(Arc::new(config.clone()));
        self.inner.rest.store(Arc::new(rest));

        let url = config.socket_url(self.inner.transport.engine_io)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let socket = PushSocket::connect(url.clone(), SocketOptions::from(&self.inner.transport), tx)
            .await
            .map_err(|e| match CoreError::from(e) {
                CoreError::ConnectionFailed { reason, .. } => CoreError::ConnectionFailed {
                    url: url.to_string(),
                    reason,
                },
                other => other,
            })?;

        info!(host = %config.host, port = config.port, "connected");
        self.inner.emitter.store(Some(Arc::new(socket.emitter())));
        self.inner.set_state(ConnectionState::Ok);
        self.inner.dispatch(PushEvent::new(event::CONNECT, Value::Null));

        let pump = tokio::spawn(pump_messages(Arc::downgrade(&self.inner), rx));
        *connection = Some(Connection { socket, pump });
        Ok(())
    }

    /// Close the push channel, if any.
    ///
    /// The state flips to `Error` through the socket's close notification,
    /// which has been processed when this returns.
    pub async fn disconnect(&self) {
        let connection = self.inner.connection.lock().await.take();
        if let Some(connection) = connection {
            self.inner.emitter.store(None);
            connection.close().await;
            debug!("push connection released");
        }
    }

    // ── Connection state ─────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Watch receiver for the connection state.
    pub fn watch_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Current state, then every change.
    pub fn connection_state_stream(&self) -> BoxStream<'static, ConnectionState> {
        WatchStream::new(self.inner.state.subscribe()).boxed()
    }

    // ── Events ───────────────────────────────────────────────────

    /// Raw receiver on the multiplexed event source.
    pub fn subscribe_all(&self) -> broadcast::Receiver<Arc<PushEvent>> {
        self.inner.events.subscribe()
    }

    /// Payloads of one named event, from now on.
    pub fn subscribe_event(&self, name: &str) -> BoxStream<'static, Value> {
        let mut rx = self.inner.events.subscribe();
        let name = name.to_owned();
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) if event.name == name => yield event.data.clone(),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(event = %name, skipped, "event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
        .boxed()
    }

    /// Typed payloads of a known event. Payloads that fail to decode are
    /// logged and skipped.
    pub fn on<E: SocketEvent + 'static>(&self) -> BoxStream<'static, E::Payload> {
        self.subscribe_event(E::NAME)
            .filter_map(|data| async move {
                serde_json::from_value(data)
                    .map_err(|e| warn!(event = E::NAME, error = %e, "undecodable event payload"))
                    .ok()
            })
            .boxed()
    }

    /// Send an event to the device. Nothing happens unless connected.
    pub fn emit(&self, name: &str, data: Option<Value>) {
        if self.connection_state() != ConnectionState::Ok {
            trace!(event = name, "not connected, dropping emit");
            return;
        }
        if let Some(emitter) = self.inner.emitter.load_full() {
            emitter.emit(name, data);
        }
    }

    #[cfg(test)]
    pub(crate) fn dispatch(&self, event: PushEvent) {
        self.inner.dispatch(event);
    }

    // ── Requests ─────────────────────────────────────────────────

    fn rest(&self) -> Arc<RestClient> {
        self.inner.rest.load_full()
    }

    /// One request against `http://{host}:{port}/api/{path}`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, CoreError> {
        Ok(self.rest().request(method, path, body).await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        Ok(self.rest().get(path).await?)
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, CoreError> {
        Ok(self.rest().post(path, body).await?)
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, CoreError> {
        Ok(self.rest().put(path, body).await?)
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, CoreError> {
        Ok(self.rest().patch(path, body).await?)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        Ok(self.rest().delete(path).await?)
    }

    /// Multipart upload; see [`RestClient::upload_files`].
    pub async fn upload_files<T: DeserializeOwned>(
        &self,
        path: &str,
        files: Vec<UploadFile>,
        fields: Option<&Value>,
    ) -> Result<T, CoreError> {
        Ok(self.rest().upload_files(path, files, fields).await?)
    }
}

impl ChannelInner {
    fn set_state(&self, next: ConnectionState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            debug!(state = %next, "connection state changed");
        }
    }

    fn dispatch(&self, event: PushEvent) {
        // No receivers is fine: events nobody listens to are dropped.
        let _ = self.events.send(Arc::new(event));
    }
}

/// Forward socket messages into the channel until the socket task exits
/// or the channel is dropped.
async fn pump_messages(inner: Weak<ChannelInner>, mut rx: mpsc::UnboundedReceiver<SocketMessage>) {
    while let Some(message) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        match message {
            SocketMessage::Event(event) => inner.dispatch(event),
            SocketMessage::Reconnected => {
                info!("push channel back online");
                inner.set_state(ConnectionState::Ok);
                inner.dispatch(PushEvent::new(event::CONNECT, Value::Null));
            }
            SocketMessage::Closed {
                reason,
                reconnecting,
            } => {
                info!(?reason, reconnecting, "push channel closed");
                inner.set_state(ConnectionState::Error);
                inner.dispatch(PushEvent::new(event::DISCONNECT, Value::Null));
            }
        }
    }
    trace!("event pump exiting");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channel() -> Channel {
        Channel::new(TransportConfig::default()).unwrap()
    }

    #[test]
    fn starts_in_error_state() {
        let channel = channel();
        assert_eq!(channel.connection_state(), ConnectionState::Error);
        assert_eq!(channel.config(), ClientConfig::default());
        assert_eq!(ConnectionState::Ok.to_string(), "OK");
    }

    #[tokio::test]
    async fn subscribers_share_one_event_source() {
        let channel = channel();
        let mut first = channel.subscribe_event(event::STATE);
        let mut second = channel.subscribe_event(event::STATE);

        channel.dispatch(PushEvent::new(event::ENTITY, json!({"name": "MediaFile"})));
        channel.dispatch(PushEvent::new(event::STATE, json!({"name": "Settings"})));

        assert_eq!(first.next().await.unwrap(), json!({"name": "Settings"}));
        assert_eq!(second.next().await.unwrap(), json!({"name": "Settings"}));
    }

    #[tokio::test]
    async fn events_without_subscribers_are_dropped() {
        let channel = channel();
        channel.dispatch(PushEvent::new(event::STATE, json!({"name": "early"})));

        let mut late = channel.subscribe_event(event::STATE);
        channel.dispatch(PushEvent::new(event::STATE, json!({"name": "late"})));
        assert_eq!(late.next().await.unwrap()["name"], "late");
    }

    #[tokio::test]
    async fn typed_subscription_decodes_payload() {
        let channel = channel();
        let mut updates = channel.on::<event::StateChanged>();

        channel.dispatch(PushEvent::new(event::STATE, json!("not an update")));
        channel.dispatch(PushEvent::new(
            event::STATE,
            json!({"name": "DeviceState", "state": {"isReady": true}}),
        ));

        let update = updates.next().await.unwrap();
        assert_eq!(update.name, "DeviceState");
        assert_eq!(update.state["isReady"], true);
    }

    #[test]
    fn emit_while_disconnected_is_a_no_op() {
        let channel = channel();
        channel.emit("playback:play", None);
        assert_eq!(channel.connection_state(), ConnectionState::Error);
    }

    #[tokio::test]
    async fn disconnect_without_connection_is_a_no_op() {
        let channel = channel();
        channel.disconnect().await;
        assert_eq!(channel.connection_state(), ConnectionState::Error);
    }

    #[test]
    fn duplicate_states_are_not_republished() {
        let channel = channel();
        let mut rx = channel.watch_connection_state();
        rx.mark_unchanged();

        channel.inner.set_state(ConnectionState::Error);
        assert!(!rx.has_changed().unwrap());

        channel.inner.set_state(ConnectionState::Ok);
        assert!(rx.has_changed().unwrap());
    }
}
