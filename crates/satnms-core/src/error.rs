// ── Core error types ──
//
// Domain errors from satnms-core. Callers never see HTTP statuses or raw
// NMS error codes: `from_api` interprets a transport error in the context of
// the operation that produced it, and the blanket `From` covers the rest.
// Convergence timeouts are not errors at all; waits return booleans.

use satnms_api::nms::codes;
use thiserror::Error;

use crate::model::Handle;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── NMS validation ───────────────────────────────────────────────
    /// The NMS refused to create an object. No index was consumed.
    #[error("NMS rejected creation of {kind} under {parent}: {message}")]
    CreationRejected {
        kind: String,
        parent: String,
        message: String,
    },

    /// The NMS refused a parameter change. The local record is unchanged.
    #[error("NMS rejected update of {handle}: {message}")]
    UpdateRejected { handle: String, message: String },

    /// The target is in a management mode that blocks NMS-originated writes.
    #[error("{target} is in controlled mode: {message}")]
    ControlledMode { target: String, message: String },

    #[error("Object not found: {handle}")]
    NotFound { handle: String },

    #[error("Snapshot not found: {name}")]
    SnapshotNotFound { name: String },

    // ── Device errors ────────────────────────────────────────────────
    /// Transport-level failure talking to a modem.
    #[error("Protocol error with {device}: {message}")]
    ProtocolError { device: String, message: String },

    /// The modem answered with an in-band failure sentinel.
    #[error("Device {device} rejected `{command}`: {reply}")]
    DeviceRejected {
        device: String,
        command: String,
        reply: String,
    },

    // ── Caller errors ────────────────────────────────────────────────
    /// The harness was asked for something it cannot do, such as a
    /// mode the hardware model doesn't support or a malformed handle.
    #[error("Invalid usage: {message}")]
    InvalidUsage { message: String },

    #[error("Unknown {family} value: {value}")]
    UnknownEnumValue { family: String, value: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// NMS envelope error code, if any.
        code: Option<i64>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn invalid_usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Returns `true` for failures that may succeed when retried unchanged.
    ///
    /// Validation rejections and caller errors never are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::ProtocolError { .. }
        )
    }

    /// Interpret a transport error in the context of the operation that
    /// produced it. NMS error codes only become domain errors here.
    pub(crate) fn from_api(err: satnms_api::Error, op: Operation<'_>) -> Self {
        match (err, op) {
            (satnms_api::Error::Nms { code, message }, op) => Self::from_nms(code, message, op),
            (other, Operation::Device { address }) => Self::from_device(address, other),
            (other, _) => Self::from(other),
        }
    }

    fn from_nms(code: i64, message: String, op: Operation<'_>) -> Self {
        match (code, op) {
            (codes::CONTROLLED_MODE, Operation::Create { parent, .. }) => Self::ControlledMode {
                target: parent.to_owned(),
                message,
            },
            (codes::CONTROLLED_MODE, Operation::Update { handle } | Operation::Read { handle }) => {
                Self::ControlledMode {
                    target: handle.to_string(),
                    message,
                }
            }
            (codes::SNAPSHOT_NOT_FOUND | codes::NOT_FOUND, Operation::Snapshot { name }) => {
                Self::SnapshotNotFound {
                    name: name.to_owned(),
                }
            }
            (codes::NOT_FOUND, Operation::Update { handle } | Operation::Read { handle }) => {
                Self::NotFound {
                    handle: handle.to_string(),
                }
            }
            (_, Operation::Create { parent, kind }) => Self::CreationRejected {
                kind: kind.to_owned(),
                parent: parent.to_owned(),
                message,
            },
            (_, Operation::Update { handle }) => Self::UpdateRejected {
                handle: handle.to_string(),
                message,
            },
            (code, _) => Self::Api {
                message,
                code: Some(code),
                status: None,
            },
        }
    }

    fn from_device(address: &str, err: satnms_api::Error) -> Self {
        match err {
            satnms_api::Error::DeviceReply {
                command, reply, ..
            } => Self::DeviceRejected {
                device: address.to_owned(),
                command,
                reply,
            },
            satnms_api::Error::Authentication { message } => Self::AuthenticationFailed {
                message: format!("{address}: {message}"),
            },
            other => Self::ProtocolError {
                device: address.to_owned(),
                message: other.to_string(),
            },
        }
    }
}

/// What the session was doing when a transport error occurred.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Operation<'a> {
    Create { parent: &'a str, kind: &'a str },
    Update { handle: &'a Handle },
    Read { handle: &'a Handle },
    Snapshot { name: &'a str },
    Device { address: &'a str },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<satnms_api::Error> for CoreError {
    fn from(err: satnms_api::Error) -> Self {
        match err {
            satnms_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            satnms_api::Error::Transport(ref e) => {
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
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            satnms_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            satnms_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            satnms_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            satnms_api::Error::Io { peer, source } => CoreError::ProtocolError {
                device: peer,
                message: source.to_string(),
            },
            satnms_api::Error::SessionClosed { peer } => CoreError::ProtocolError {
                device: peer,
                message: "session closed".into(),
            },
            satnms_api::Error::DeviceReply {
                peer,
                command,
                reply,
            } => CoreError::DeviceRejected {
                device: peer,
                command,
                reply,
            },
            satnms_api::Error::Nms { code, message } => CoreError::Api {
                message,
                code: Some(code),
                status: None,
            },
            satnms_api::Error::Http { status, message } => CoreError::Api {
                message,
                code: None,
                status: Some(status),
            },
            satnms_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
