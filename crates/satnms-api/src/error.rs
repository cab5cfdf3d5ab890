use thiserror::Error;

/// Top-level error type for the `satnms-api` crate.
///
/// Covers every failure mode across the three transports: the NMS JSON API,
/// the modem's HTTP form interface and the modem's Telnet CLI.
/// `satnms-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, session rejected, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request or read timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Socket-level failure on a Telnet session.
    #[error("I/O error on {peer}: {source}")]
    Io {
        peer: String,
        #[source]
        source: std::io::Error,
    },

    // ── NMS API ─────────────────────────────────────────────────────
    /// Non-zero `error_code` in the NMS response envelope.
    #[error("NMS error {code}: {message}")]
    Nms { code: i64, message: String },

    /// Non-success HTTP status without a parseable envelope.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── Device ──────────────────────────────────────────────────────
    /// The device answered, but the reply carries an in-band failure sentinel.
    #[error("Device {peer} rejected `{command}`: {reply}")]
    DeviceReply {
        peer: String,
        command: String,
        reply: String,
    },

    /// The Telnet session was already closed.
    #[error("Session to {peer} is closed")]
    SessionClosed { peer: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session must be re-established.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::Io { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            Self::Nms { code, .. } => *code == crate::nms::codes::NOT_FOUND,
            _ => false,
        }
    }

    /// The NMS envelope error code, if this error came from one.
    pub fn nms_code(&self) -> Option<i64> {
        match self {
            Self::Nms { code, .. } => Some(*code),
            _ => None,
        }
    }
}
