//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use satnms_config::ConfigError;
use satnms_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to NMS at {url}")]
    #[diagnostic(
        code(satnms::connection_failed),
        help(
            "Check that the NMS is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Could not talk to modem {device}")]
    #[diagnostic(
        code(satnms::device_unreachable),
        help(
            "Check the modem address and transport.\n\
             Reason: {reason}"
        )
    )]
    DeviceUnreachable { device: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(satnms::auth_failed),
        help(
            "Verify the NMS username and password.\n\
             Store a password with: satnms config set-password --profile <name>"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(satnms::no_credentials),
        help("Set SATNMS_PASSWORD, run `satnms config set-password`, or add `password` to the profile.")
    )]
    NoCredentials { profile: String },

    // ── NMS and modem answers ────────────────────────────────────────
    #[error("{what} '{identifier}' not found")]
    #[diagnostic(code(satnms::not_found))]
    NotFound { what: String, identifier: String },

    #[error("{message}")]
    #[diagnostic(
        code(satnms::rejected),
        help("The NMS validated the request and refused it. Nothing was changed.")
    )]
    Rejected { message: String },

    #[error("{target} is in controlled mode")]
    #[diagnostic(
        code(satnms::controlled_mode),
        help("Switch the object out of its management mode before writing to it.\n{message}")
    )]
    ControlledMode { target: String, message: String },

    #[error("Modem {device} rejected `{command}`")]
    #[diagnostic(code(satnms::device_rejected), help("Modem replied: {reply}"))]
    DeviceRejected {
        device: String,
        command: String,
        reply: String,
    },

    #[error("API error: {message}")]
    #[diagnostic(code(satnms::api_error))]
    ApiError { message: String },

    // ── Convergence ──────────────────────────────────────────────────
    #[error("{target} did not reach {condition} within {elapsed}")]
    #[diagnostic(
        code(satnms::not_converged),
        help("Increase the wait with --for, or check the object's faults.")
    )]
    NotConverged {
        target: String,
        condition: String,
        elapsed: String,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(satnms::timeout),
        help("Increase timeout with --timeout or check NMS responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(satnms::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(satnms::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No NMS configured")]
    #[diagnostic(
        code(satnms::no_config),
        help(
            "Pass --nms <URL> or create a profile.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(satnms::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(satnms::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(satnms::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::DeviceUnreachable { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } | Self::DeviceRejected { .. } => exit_code::REJECTED,
            Self::ControlledMode { .. } => exit_code::PERMISSION,
            Self::NotConverged { .. } | Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NoConfig { .. }
            | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound { handle } => Self::NotFound {
                what: "object".into(),
                identifier: handle,
            },

            CoreError::SnapshotNotFound { name } => Self::NotFound {
                what: "snapshot".into(),
                identifier: name,
            },

            err @ (CoreError::CreationRejected { .. } | CoreError::UpdateRejected { .. }) => {
                Self::Rejected {
                    message: err.to_string(),
                }
            }

            CoreError::ControlledMode { target, message } => {
                Self::ControlledMode { target, message }
            }

            CoreError::ProtocolError { device, message } => Self::DeviceUnreachable {
                device,
                reason: message,
            },

            CoreError::DeviceRejected {
                device,
                command,
                reply,
            } => Self::DeviceRejected {
                device,
                command,
                reply,
            },

            CoreError::InvalidUsage { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            err @ CoreError::UnknownEnumValue { .. } => Self::Validation {
                field: "value".into(),
                reason: err.to_string(),
            },

            CoreError::Api { message, .. } => Self::ApiError { message },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Io { path, source } => Self::Io(std::io::Error::new(
                source.kind(),
                format!("{path}: {source}"),
            )),

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownDevice { name, profile } => Self::NotFound {
                what: format!("device in profile {profile}"),
                identifier: name,
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}
