// ── Runtime session configuration ──
//
// These types describe how to reach the NMS and how patiently to poll it.
// They carry credential data but never touch disk: satnms-config builds a
// `SessionConfig` from a profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// NMS login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs). Default for lab NMS servers.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one NMS session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// NMS URL (e.g., `http://10.0.0.10`).
    pub url: Url,
    /// `None` for an NMS without authentication.
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Sleep between state/fault polls.
    pub poll_interval: Duration,
    /// Sleep between tick counter polls.
    pub tick_poll_interval: Duration,
    /// Upper bound for one tick to elapse before `wait_ticks` gives up.
    pub tick_timeout: Duration,
    /// Directory of the local snapshot store.
    pub snapshot_dir: PathBuf,
}

impl SessionConfig {
    /// Defaults for everything but the URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            tick_poll_interval: Duration::from_secs(1),
            tick_timeout: Duration::from_secs(30),
            snapshot_dir: PathBuf::from("snapshots"),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password,
        });
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self.tick_poll_interval = interval;
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }
}
