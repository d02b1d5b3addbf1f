#![allow(clippy::unwrap_used, clippy::expect_used)]
// End-to-end tests for `PushSocket` against an in-process Socket.IO server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use cuelink_api::socketio::{OpenPacket, Packet};
use cuelink_api::{
    CloseReason, EngineIoVersion, Error, PushEvent, PushSocket, ReconnectConfig, SocketMessage,
    SocketOptions,
};

// ── Fake server ─────────────────────────────────────────────────────

type ServerWs = WebSocketStream<TcpStream>;

#[derive(Clone, Copy)]
enum Greeting {
    /// `open` then `40` (Engine.IO v3 auto-connect).
    AutoConnect,
    /// `open`, wait for the client's `40`, answer `40` (v4).
    AwaitConnect,
    /// `open` then `44{"message":...}`.
    Reject,
}

/// Accept connections forever; hand each greeted socket to the test.
async fn spawn_server(greeting: Greeting) -> (Url, mpsc::UnboundedReceiver<ServerWs>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut sid = 0;
        while let Ok((stream, _)) = listener.accept().await {
            sid += 1;
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let open = Packet::Open(OpenPacket {
                sid: format!("sid-{sid}"),
                upgrades: Vec::new(),
                ping_interval: 25_000,
                ping_timeout: 20_000,
            });
            send(&mut ws, &open.encode()).await;
            match greeting {
                Greeting::AutoConnect => send(&mut ws, "40").await,
                Greeting::AwaitConnect => {
                    assert_eq!(recv(&mut ws).await, "40");
                    send(&mut ws, r#"40{"sid":"ns"}"#).await;
                }
                Greeting::Reject => send(&mut ws, r#"44{"message":"not allowed"}"#).await,
            }
            if tx.send(ws).is_err() {
                break;
            }
        }
    });

    let url = Url::parse(&format!("ws://{addr}/socket.io/?EIO=3&transport=websocket")).unwrap();
    (url, rx)
}

async fn send(ws: &mut ServerWs, frame: &str) {
    ws.send(Message::Text(frame.to_owned().into())).await.unwrap();
}

/// Next text frame from the client, skipping heartbeats.
async fn recv(ws: &mut ServerWs) -> String {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for client frame")
            .expect("client went away")
            .unwrap();
        if let Message::Text(text) = msg {
            if text.as_str() != "2" {
                return text.as_str().to_owned();
            }
        }
    }
}

async fn next_message(rx: &mut mpsc::UnboundedReceiver<SocketMessage>) -> SocketMessage {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for socket message")
        .expect("socket task dropped its sender")
}

fn fast_options(version: EngineIoVersion) -> SocketOptions {
    SocketOptions {
        version,
        handshake_timeout: Some(Duration::from_secs(5)),
        reconnect: ReconnectConfig {
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(50),
            ..ReconnectConfig::default()
        },
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_events_arrive_in_order() {
    let (url, mut conns) = spawn_server(Greeting::AutoConnect).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let socket = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx)
        .await
        .unwrap();
    assert_eq!(socket.sid(), "sid-1");

    let mut server = conns.recv().await.unwrap();
    send(&mut server, r#"42["event:state",{"name":"deviceState","state":{"isReady":true}}]"#).await;
    send(&mut server, r#"42["event:entity",{"name":"media","type":"create"}]"#).await;
    send(&mut server, r#"42["ping:custom"]"#).await;

    assert_eq!(
        next_message(&mut rx).await,
        SocketMessage::Event(PushEvent::new(
            "event:state",
            json!({"name": "deviceState", "state": {"isReady": true}})
        ))
    );
    assert_eq!(
        next_message(&mut rx).await,
        SocketMessage::Event(PushEvent::new(
            "event:entity",
            json!({"name": "media", "type": "create"})
        ))
    );
    assert_eq!(
        next_message(&mut rx).await,
        SocketMessage::Event(PushEvent::new("ping:custom", serde_json::Value::Null))
    );

    socket.close().await;
}

#[tokio::test]
async fn test_emit_writes_event_frame() {
    let (url, mut conns) = spawn_server(Greeting::AutoConnect).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let socket = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx)
        .await
        .unwrap();
    let mut server = conns.recv().await.unwrap();

    let emitter = socket.emitter();
    assert!(emitter.emit("playback:play", None));
    assert!(emitter.emit("playback:skip", Some(json!({"distance": -1}))));

    assert_eq!(recv(&mut server).await, r#"42["playback:play"]"#);
    assert_eq!(recv(&mut server).await, r#"42["playback:skip",{"distance":-1}]"#);

    socket.close().await;
    assert!(!emitter.emit("playback:stop", None));
}

#[tokio::test]
async fn test_server_ping_is_answered() {
    let (url, mut conns) = spawn_server(Greeting::AutoConnect).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let socket = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx)
        .await
        .unwrap();
    let mut server = conns.recv().await.unwrap();

    send(&mut server, "2probe").await;
    assert_eq!(recv(&mut server).await, "3probe");

    socket.close().await;
}

#[tokio::test]
async fn test_v4_client_sends_namespace_connect() {
    let (url, mut conns) = spawn_server(Greeting::AwaitConnect).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let socket = PushSocket::connect(url, fast_options(EngineIoVersion::V4), tx)
        .await
        .unwrap();
    assert!(conns.recv().await.is_some());

    socket.close().await;
}

#[tokio::test]
async fn test_rejected_namespace_fails_connect() {
    let (url, _conns) = spawn_server(Greeting::Reject).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let result = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx).await;
    match result {
        Err(Error::ConnectRejected(message)) => assert_eq!(message, "not allowed"),
        Err(other) => panic!("expected ConnectRejected, got: {other:?}"),
        Ok(_) => panic!("expected ConnectRejected, got a socket"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_fails_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("ws://{addr}/socket.io/?EIO=3&transport=websocket")).unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();
    let result = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx).await;
    assert!(matches!(result, Err(Error::WebSocketConnect(_))));
}

#[tokio::test]
async fn test_handshake_times_out_without_open_packet() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let url = Url::parse(&format!("ws://{addr}/socket.io/?EIO=3&transport=websocket")).unwrap();
    let options = SocketOptions {
        handshake_timeout: Some(Duration::from_millis(200)),
        ..fast_options(EngineIoVersion::V3)
    };
    let (tx, _rx) = mpsc::unbounded_channel();
    let result = PushSocket::connect(url, options, tx).await;
    let err = result.err();
    assert!(matches!(err, Some(Error::Timeout { .. })), "got: {err:?}");
}

#[tokio::test]
async fn test_reconnects_after_transport_drop() {
    let (url, mut conns) = spawn_server(Greeting::AutoConnect).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let socket = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx)
        .await
        .unwrap();

    let first = conns.recv().await.unwrap();
    drop(first);

    match next_message(&mut rx).await {
        SocketMessage::Closed { reconnecting, .. } => assert!(reconnecting),
        other => panic!("expected Closed, got: {other:?}"),
    }
    assert_eq!(next_message(&mut rx).await, SocketMessage::Reconnected);

    let mut second = conns.recv().await.unwrap();
    send(&mut second, r#"42["event:reset",{"name":"settings","state":{}}]"#).await;
    match next_message(&mut rx).await {
        SocketMessage::Event(event) => assert_eq!(event.name, "event:reset"),
        other => panic!("expected Event, got: {other:?}"),
    }

    socket.close().await;
}

#[tokio::test]
async fn test_server_disconnect_is_not_retried() {
    let (url, mut conns) = spawn_server(Greeting::AutoConnect).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let socket = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx)
        .await
        .unwrap();
    let mut server = conns.recv().await.unwrap();
    send(&mut server, "41").await;

    assert_eq!(
        next_message(&mut rx).await,
        SocketMessage::Closed {
            reason: CloseReason::ServerDisconnect,
            reconnecting: false,
        }
    );
    socket.close().await;
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_close_reports_client_disconnect() {
    let (url, mut conns) = spawn_server(Greeting::AutoConnect).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let socket = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx)
        .await
        .unwrap();
    let mut server = conns.recv().await.unwrap();

    socket.close().await;

    assert_eq!(recv(&mut server).await, "41");
    assert_eq!(
        next_message(&mut rx).await,
        SocketMessage::Closed {
            reason: CloseReason::ClientDisconnect,
            reconnecting: false,
        }
    );
}

#[tokio::test]
async fn test_close_flushes_queued_emits() {
    let (url, mut conns) = spawn_server(Greeting::AutoConnect).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let socket = PushSocket::connect(url, fast_options(EngineIoVersion::V3), tx)
        .await
        .unwrap();
    let mut server = conns.recv().await.unwrap();

    let emitter = socket.emitter();
    assert!(emitter.emit("playback:play", None));
    assert!(emitter.emit("playback:skip", Some(json!({"distance": 1}))));
    socket.close().await;

    assert_eq!(recv(&mut server).await, r#"42["playback:play"]"#);
    assert_eq!(recv(&mut server).await, r#"42["playback:skip",{"distance":1}]"#);
    assert_eq!(recv(&mut server).await, "41");
}
