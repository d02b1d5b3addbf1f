// ── Push event payloads ──
//
// Names and payload shapes of the events the device pushes. `SocketEvent`
// ties a name to its payload type so `Channel::on::<E>()` can decode it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use cuelink_api::PushEvent;

pub const CONNECT: &str = "connect";
pub const DISCONNECT: &str = "disconnect";
pub const STATE: &str = "event:state";
pub const RESET: &str = "event:reset";
pub const ENTITY: &str = "event:entity";

/// Full replacement of a store's value (`event:state`, `event:reset`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Logical store name, e.g. `"DeviceState"`.
    pub name: String,
    pub state: Value,
}

wire_enum! {
    pub enum EntityEventType {
        Create = "create",
        Update = "update",
        Delete = "delete",
    }
}

/// One id or a batch of ids, as sent by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityIds {
    One(String),
    Many(Vec<String>),
    /// Any other id shape, e.g. a bare number.
    Other(Value),
}

impl EntityIds {
    /// The string ids; empty for [`EntityIds::Other`].
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
            Self::Other(_) => &[],
        }
    }
}

/// Create/update/delete against a list store (`event:entity`).
///
/// Receivers re-read the whole store; `entity` is informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEvent {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityEventType,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub id: Option<EntityIds>,
    #[serde(default)]
    pub entity: Option<Value>,
}

// ── Typed subscriptions ──────────────────────────────────────────────

/// A push event with a known name and payload type.
pub trait SocketEvent {
    const NAME: &'static str;
    type Payload: DeserializeOwned + Send + 'static;
}

/// The push channel came up (first connect or reconnect).
pub struct Connect;

/// The push channel went down.
pub struct Disconnect;

pub struct StateChanged;

pub struct StateReset;

pub struct EntityChanged;

impl SocketEvent for Connect {
    const NAME: &'static str = CONNECT;
    type Payload = ();
}

impl SocketEvent for Disconnect {
    const NAME: &'static str = DISCONNECT;
    type Payload = ();
}

impl SocketEvent for StateChanged {
    const NAME: &'static str = STATE;
    type Payload = StateUpdate;
}

impl SocketEvent for StateReset {
    const NAME: &'static str = RESET;
    type Payload = StateUpdate;
}

impl SocketEvent for EntityChanged {
    const NAME: &'static str = ENTITY;
    type Payload = EntityEvent;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_and_batched_entity_events() {
        let single: EntityEvent = serde_json::from_value(json!({
            "name": "MediaFile", "type": "create", "multi": false,
            "id": "m1", "entity": {"_id": "m1", "name": "a.mp4"}
        }))
        .unwrap();
        assert_eq!(single.kind, EntityEventType::Create);
        assert_eq!(single.id.as_ref().unwrap().as_slice(), ["m1".to_owned()]);

        let batch: EntityEvent = serde_json::from_value(json!({
            "name": "Playlist", "type": "delete", "multi": true, "id": ["p1", "p2"]
        }))
        .unwrap();
        assert!(batch.multi);
        assert_eq!(batch.id.unwrap().as_slice().len(), 2);
        assert!(batch.entity.is_none());
    }

    #[test]
    fn entity_event_without_payload_still_parses() {
        let bare: EntityEvent =
            serde_json::from_value(json!({"name": "TestPattern", "type": "update"})).unwrap();
        assert_eq!(bare.name, "TestPattern");
        assert!(bare.id.is_none());
    }

    #[test]
    fn unfamiliar_kinds_and_ids_still_parse() {
        let moved: EntityEvent = serde_json::from_value(json!({
            "name": "MediaFile", "type": "move", "id": 5
        }))
        .unwrap();
        assert_eq!(moved.kind, EntityEventType::Other("move".into()));
        assert_eq!(moved.kind.to_string(), "move");
        assert_eq!(moved.id, Some(EntityIds::Other(json!(5))));
        assert!(moved.id.unwrap().as_slice().is_empty());
    }
}
