// cuelink-api: Async wire client for xPressCue-class cue players (REST + Socket.IO push)

pub mod error;
pub mod rest;
pub mod socketio;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use reqwest::Method;
pub use rest::{RestClient, UploadFile};
pub use socketio::EngineIoVersion;
pub use transport::{ClientConfig, TransportConfig};
pub use websocket::{
    CloseReason, PushEvent, PushSocket, ReconnectConfig, SocketEmitter, SocketMessage,
    SocketOptions,
};
