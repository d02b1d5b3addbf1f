// cuelink-core: Live state mirror and playback control for cuelink
//
// This crate sits between the wire layer (`cuelink-api`) and consumers
// (CLI, scripts). It owns the connection lifecycle, keeps one typed store
// per device resource in sync with push events, and exposes playback
// commands.

#[macro_use]
pub mod model;

pub mod channel;
pub mod command;
pub mod error;
pub mod event;
pub mod player;
pub mod registry;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────
pub use channel::{Channel, ConnectionState};
pub use command::{Command, JumpOrigin, QueueMode};
pub use error::CoreError;
pub use event::{EntityEvent, EntityEventType, PushEvent, SocketEvent, StateUpdate};
pub use player::Player;
pub use registry::{RegisteredStore, StoreRegistry, Stores};
pub use store::{AnyStore, StateStream, Store, StoreDescriptor, StoreKind};

// Wire-level types consumers need to configure a session.
pub use cuelink_api::{ClientConfig, EngineIoVersion, ReconnectConfig, TransportConfig, UploadFile};

// ── Model re-exports ────────────────────────────────────────────
pub use model::{
    DeviceInfo, DeviceState, IoState, MediaFile, PlayState, Playlist, Settings, TestPattern,
};
