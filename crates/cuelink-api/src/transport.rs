// Endpoint and transport configuration shared by the REST client and the
// push socket.
//
// `ClientConfig` says *where* the device is; `TransportConfig` says *how*
// to talk to it. Both are plain values built by callers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::socketio::EngineIoVersion;
use crate::websocket::ReconnectConfig;

const USER_AGENT: &str = concat!("cuelink/", env!("CARGO_PKG_VERSION"));

/// Address of a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host name or IP address of the device.
    pub host: String,
    /// Port the device's web services are bound to (usually `80`).
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 80,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host formatted for use in a URL authority (IPv6 literals bracketed).
    fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `http://{host}:{port}` -- the push channel base.
    pub fn base_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("http://{}", self.authority()))?)
    }

    /// `http://{host}:{port}/api/` -- every store path is relative to this.
    pub fn api_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("http://{}/api/", self.authority()))?)
    }

    /// WebSocket URL for the Socket.IO endpoint.
    pub fn socket_url(&self, version: EngineIoVersion) -> Result<Url, Error> {
        Ok(Url::parse(&format!(
            "ws://{}/socket.io/?EIO={}&transport=websocket",
            self.authority(),
            version.query_value()
        ))?)
    }
}

/// Transport tuning shared by every connection a client makes.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Upper bound on the push channel handshake (WebSocket upgrade,
    /// Engine.IO open, namespace connect).
    pub handshake_timeout: Duration,
    /// Engine.IO protocol revision spoken by the device.
    pub engine_io: EngineIoVersion,
    /// Reconnection policy after an unsolicited drop.
    pub reconnect: ReconnectConfig,
    /// Override for the REST base URL. When `None`, the base is derived
    /// from the `ClientConfig` (`http://{host}:{port}/api/`).
    pub api_base: Option<Url>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(20),
            engine_io: EngineIoVersion::default(),
            reconnect: ReconnectConfig::default(),
            api_base: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?)
    }

    /// The REST base to use for a given device address.
    pub fn api_base_for(&self, client: &ClientConfig) -> Result<Url, Error> {
        match &self.api_base {
            Some(url) => Ok(url.clone()),
            None => client.api_url(),
        }
    }
}
