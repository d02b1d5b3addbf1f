// ── Core error types ──
//
// User-facing errors from cuelink-core. The `From<cuelink_api::Error>`
// impl folds wire-level failures (HTTP status, handshake, decoding) into
// a handful of variants callers can act on.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Unknown store: {name}")]
    StoreNotFound { name: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // ── Request errors ───────────────────────────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if the device answered).
        status: Option<u16>,
    },

    /// A value did not fit the shape a store declares.
    #[error("Invalid value for store {store}: {message}")]
    InvalidState { store: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cuelink_api::Error> for CoreError {
    fn from(err: cuelink_api::Error) -> Self {
        use cuelink_api::Error as Api;

        match err {
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid device address: {e}"),
            },
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::Http { status: 404, body } => CoreError::NotFound { resource: body },
            Api::Http { status, body } => CoreError::Api {
                message: format!("HTTP {status}: {body}"),
                status: Some(status),
            },
            Api::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            Api::WebSocketConnect(reason) | Api::Handshake(reason) => CoreError::ConnectionFailed {
                url: "push channel".into(),
                reason,
            },
            Api::ConnectRejected(reason) => CoreError::ConnectionFailed {
                url: "push channel".into(),
                reason: format!("rejected by device: {reason}"),
            },
            Api::Protocol(message) => CoreError::Internal(format!("protocol error: {message}")),
            Api::Io(e) => CoreError::Internal(e.to_string()),
        }
    }
}

impl CoreError {
    /// HTTP status code, if the error came from a device response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
