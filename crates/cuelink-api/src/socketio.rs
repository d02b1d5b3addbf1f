//! Text codec for Engine.IO (v3/v4) frames carrying Socket.IO packets.
//!
//! Every WebSocket text frame is one Engine.IO packet: a single type digit
//! followed by an optional payload. `message` packets (`4`) wrap a
//! Socket.IO packet with the shape
//! `<type>[<namespace>,][<ack id>][<json>]`, e.g. `42["event:state",{...}]`.
//!
//! Binary attachments (`5`/`6`) are not used by the device and are
//! rejected as protocol errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Default namespace.
pub const ROOT_NAMESPACE: &str = "/";

// ── Protocol revision ────────────────────────────────────────────────

/// Engine.IO protocol revision.
///
/// `V3` is what Socket.IO 2.x servers speak (the device's stock client):
/// the server joins the default namespace on its own and the *client*
/// sends heartbeats. `V4` (Socket.IO 3+/4) requires an explicit `40` from
/// the client and the *server* sends heartbeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineIoVersion {
    #[default]
    V3,
    V4,
}

impl EngineIoVersion {
    /// Value of the `EIO` query parameter.
    pub fn query_value(self) -> &'static str {
        match self {
            Self::V3 => "3",
            Self::V4 => "4",
        }
    }

    /// Whether the client must send `CONNECT` for the default namespace.
    pub fn client_connects_namespace(self) -> bool {
        matches!(self, Self::V4)
    }

    /// Whether the client is responsible for sending pings.
    pub fn client_sends_pings(self) -> bool {
        matches!(self, Self::V3)
    }
}

// ── Engine.IO packets ────────────────────────────────────────────────

/// Payload of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPacket {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Heartbeat interval in milliseconds.
    pub ping_interval: u64,
    /// Heartbeat timeout in milliseconds.
    pub ping_timeout: u64,
}

/// One Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(OpenPacket),
    Close,
    Ping(Option<String>),
    Pong(Option<String>),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

impl Packet {
    /// Socket.IO `CONNECT` for the default namespace.
    pub fn connect() -> Self {
        Self::Message(SocketPacket::Connect {
            namespace: ROOT_NAMESPACE.into(),
            data: None,
        })
    }

    /// Socket.IO `DISCONNECT` for the default namespace.
    pub fn disconnect() -> Self {
        Self::Message(SocketPacket::Disconnect {
            namespace: ROOT_NAMESPACE.into(),
        })
    }

    /// Socket.IO `EVENT` on the default namespace with an optional payload.
    pub fn event(name: impl Into<String>, data: Option<Value>) -> Self {
        Self::Message(SocketPacket::Event {
            namespace: ROOT_NAMESPACE.into(),
            id: None,
            name: name.into(),
            args: data.into_iter().collect(),
        })
    }

    /// Decode a WebSocket text frame.
    pub fn decode(frame: &str) -> Result<Self, Error> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty frame".into()))?;
        let rest = chars.as_str();
        let text_payload = || (!rest.is_empty()).then(|| rest.to_owned());

        match kind {
            '0' => serde_json::from_str(rest)
                .map(Self::Open)
                .map_err(|e| Error::Protocol(format!("invalid open packet: {e}"))),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(text_payload())),
            '3' => Ok(Self::Pong(text_payload())),
            '4' => SocketPacket::decode(rest).map(Self::Message),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(Error::Protocol(format!(
                "unknown engine.io packet type '{other}'"
            ))),
        }
    }

    /// Encode into a WebSocket text frame.
    pub fn encode(&self) -> String {
        match self {
            Self::Open(open) => format!(
                "0{}",
                serde_json::json!({
                    "sid": open.sid,
                    "upgrades": open.upgrades,
                    "pingInterval": open.ping_interval,
                    "pingTimeout": open.ping_timeout,
                })
            ),
            Self::Close => "1".into(),
            Self::Ping(data) => format!("2{}", data.as_deref().unwrap_or("")),
            Self::Pong(data) => format!("3{}", data.as_deref().unwrap_or("")),
            Self::Message(packet) => format!("4{}", packet.encode()),
            Self::Upgrade => "5".into(),
            Self::Noop => "6".into(),
        }
    }
}

// ── Socket.IO packets ────────────────────────────────────────────────

/// One Socket.IO packet (the payload of an Engine.IO `message`).
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
}

impl SocketPacket {
    /// First event argument, or `null` for argument-less events.
    pub fn payload(args: &[Value]) -> Value {
        args.first().cloned().unwrap_or(Value::Null)
    }

    fn decode(input: &str) -> Result<Self, Error> {
        let mut chars = input.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty socket.io packet".into()))?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(Error::Protocol("binary packets are not supported".into()));
        }

        let namespace = if rest.starts_with('/') {
            let (ns, tail) = rest.split_once(',').unwrap_or((rest, ""));
            rest = tail;
            ns.to_owned()
        } else {
            ROOT_NAMESPACE.to_owned()
        };

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let (id_str, json) = rest.split_at(digits);
        let id = if id_str.is_empty() {
            None
        } else {
            Some(
                id_str
                    .parse::<u64>()
                    .map_err(|e| Error::Protocol(format!("invalid ack id: {e}")))?,
            )
        };

        let data = if json.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(json)
                    .map_err(|e| Error::Protocol(format!("invalid packet data: {e}")))?,
            )
        };

        match kind {
            '0' => Ok(Self::Connect { namespace, data }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let Some(Value::Array(mut items)) = data else {
                    return Err(Error::Protocol("event packet without argument array".into()));
                };
                if items.is_empty() {
                    return Err(Error::Protocol("event packet without a name".into()));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(Error::Protocol("event name is not a string".into()));
                };
                Ok(Self::Event {
                    namespace,
                    id,
                    name,
                    args: items,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| Error::Protocol("ack packet without id".into()))?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    Some(other) => vec![other],
                    None => Vec::new(),
                };
                Ok(Self::Ack {
                    namespace,
                    id,
                    args,
                })
            }
            '4' => {
                let message = match data {
                    Some(Value::String(s)) => s,
                    Some(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .map_or_else(|| Value::Object(map.clone()).to_string(), String::from),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Ok(Self::ConnectError { namespace, message })
            }
            other => Err(Error::Protocol(format!(
                "unknown socket.io packet type '{other}'"
            ))),
        }
    }

    fn encode(&self) -> String {
        fn prefix(kind: char, namespace: &str) -> String {
            if namespace == ROOT_NAMESPACE {
                kind.to_string()
            } else {
                format!("{kind}{namespace},")
            }
        }

        match self {
            Self::Connect { namespace, data } => {
                let mut out = prefix('0', namespace);
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
            Self::Disconnect { namespace } => prefix('1', namespace),
            Self::Event {
                namespace,
                id,
                name,
                args,
            } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                let mut out = prefix('2', namespace);
                if let Some(id) = id {
                    out.push_str(&id.to_string());
                }
                out.push_str(&Value::Array(items).to_string());
                out
            }
            Self::Ack {
                namespace,
                id,
                args,
            } => format!("{}{id}{}", prefix('3', namespace), Value::Array(args.clone())),
            Self::ConnectError { namespace, message } => format!(
                "{}{}",
                prefix('4', namespace),
                serde_json::json!({ "message": message })
            ),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_open_packet() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":5000}"#;
        let Packet::Open(open) = Packet::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(open.sid, "abc");
        assert_eq!(open.ping_interval, 25_000);
        assert_eq!(open.ping_timeout, 5_000);
    }

    #[test]
    fn decode_heartbeats() {
        assert_eq!(Packet::decode("2").unwrap(), Packet::Ping(None));
        assert_eq!(
            Packet::decode("3probe").unwrap(),
            Packet::Pong(Some("probe".into()))
        );
    }

    #[test]
    fn decode_namespace_connect() {
        assert_eq!(
            Packet::decode("40").unwrap(),
            Packet::Message(SocketPacket::Connect {
                namespace: "/".into(),
                data: None,
            })
        );

        let Packet::Message(SocketPacket::Connect { data, .. }) =
            Packet::decode(r#"40{"sid":"xyz"}"#).unwrap()
        else {
            panic!("expected connect");
        };
        assert_eq!(data, Some(json!({ "sid": "xyz" })));
    }

    #[test]
    fn decode_state_event() {
        let frame = r#"42["event:state",{"name":"Settings","state":{"masterVolume":80}}]"#;
        let Packet::Message(SocketPacket::Event { name, args, id, .. }) =
            Packet::decode(frame).unwrap()
        else {
            panic!("expected event");
        };
        assert_eq!(name, "event:state");
        assert_eq!(id, None);
        assert_eq!(
            SocketPacket::payload(&args),
            json!({ "name": "Settings", "state": { "masterVolume": 80 } })
        );
    }

    #[test]
    fn decode_event_with_namespace_and_ack_id() {
        let frame = r#"42/admin,17["ping",1,2]"#;
        let Packet::Message(SocketPacket::Event {
            namespace,
            id,
            name,
            args,
        }) = Packet::decode(frame).unwrap()
        else {
            panic!("expected event");
        };
        assert_eq!(namespace, "/admin");
        assert_eq!(id, Some(17));
        assert_eq!(name, "ping");
        assert_eq!(args, vec![json!(1), json!(2)]);
    }

    #[test]
    fn decode_connect_error_both_revisions() {
        let v3 = Packet::decode(r#"44"Not authorized""#).unwrap();
        let v4 = Packet::decode(r#"44{"message":"Not authorized"}"#).unwrap();
        for packet in [v3, v4] {
            let Packet::Message(SocketPacket::ConnectError { message, .. }) = packet else {
                panic!("expected connect error");
            };
            assert_eq!(message, "Not authorized");
        }
    }

    #[test]
    fn reject_malformed_frames() {
        assert!(Packet::decode("").is_err());
        assert!(Packet::decode("9").is_err());
        assert!(Packet::decode("42{}").is_err());
        assert!(Packet::decode("42[1]").is_err());
        assert!(Packet::decode("45-[\"bin\"]").is_err());
    }

    #[test]
    fn encode_outgoing_packets() {
        insta::assert_snapshot!(Packet::event("playback:play", None).encode(), @r#"42["playback:play"]"#);
        insta::assert_snapshot!(
            Packet::event("playback:skip", Some(json!({ "distance": -1 }))).encode(),
            @r#"42["playback:skip",{"distance":-1}]"#
        );
        assert_eq!(Packet::connect().encode(), "40");
        assert_eq!(Packet::disconnect().encode(), "41");
        assert_eq!(Packet::Pong(None).encode(), "3");
        assert_eq!(Packet::Ping(Some("probe".into())).encode(), "2probe");
    }

    #[test]
    fn encode_event_keeps_namespace_and_id() {
        let packet = Packet::Message(SocketPacket::Event {
            namespace: "/admin".into(),
            id: Some(3),
            name: "hello".into(),
            args: vec![json!("world")],
        });
        assert_eq!(packet.encode(), r#"42/admin,3["hello","world"]"#);
        assert_eq!(Packet::decode(&packet.encode()).unwrap(), packet);
    }
}
