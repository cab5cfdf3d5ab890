//! Shared configuration for the satnms tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `satnms_core::SessionConfig` and device endpoints. The
//! CLI layers its flag overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use satnms_core::{
    DeviceEndpoint, DeviceModel, DeviceTransport, EnumFamily, SessionConfig, TlsVerification,
};

const KEYRING_SERVICE: &str = "satnms";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("device '{name}' not found in profile '{profile}'")]
    UnknownDevice { name: String, profile: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named NMS profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Per-request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval_ms() -> u64 {
    1000
}

/// A named NMS profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// NMS base URL (e.g., "http://10.0.0.10").
    pub nms: String,

    /// Login name. Without one the NMS is used unauthenticated.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Directory of local configuration snapshots.
    pub snapshot_dir: Option<PathBuf>,

    /// Override the state/fault/tick poll interval.
    pub poll_interval_ms: Option<u64>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Modems reachable from this profile, by name.
    #[serde(default)]
    pub devices: HashMap<String, DeviceProfile>,
}

/// One modem under test.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceProfile {
    /// Host, `host:port`, or base URL.
    pub address: String,

    /// Hardware model label, e.g. "UHP-200".
    pub model: String,

    #[serde(default)]
    pub transport: DeviceTransport,

    pub username: Option<String>,

    pub password: Option<String>,

    /// Environment variable name containing the device password.
    pub password_env: Option<String>,

    /// Per-command timeout, seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "satnms", "satnms").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("satnms");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file. A missing file yields the defaults.
///
/// `SATNMS_` variables override file values; nested keys use a double
/// underscore (`SATNMS_DEFAULTS__TIMEOUT=60`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SATNMS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the NMS password for a profile.
///
/// Order: `SATNMS_PASSWORD`, the profile's `password_env`, the system
/// keyring, then plaintext in the config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Env vars
    if let Ok(pw) = std::env::var("SATNMS_PASSWORD") {
        return Ok(SecretString::from(pw));
    }
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok(SecretString::from(pw));
        }
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store the NMS password of a profile in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

fn resolve_device_password(device: &DeviceProfile) -> Option<SecretString> {
    device
        .password_env
        .as_ref()
        .and_then(|name| std::env::var(name).ok())
        .or_else(|| device.password.clone())
        .map(SecretString::from)
}

// ── Translation to core types ───────────────────────────────────────

/// Build a `SessionConfig` from a profile, no CLI flag overrides.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let url: url::Url = profile.nms.parse().map_err(|_| ConfigError::Validation {
        field: "nms".into(),
        reason: format!("invalid URL: {}", profile.nms),
    })?;

    let mut config = SessionConfig::new(url);

    if let Some(ref username) = profile.username {
        let password = resolve_password(profile, profile_name)?;
        config = config.with_credentials(username.clone(), password);
    }

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::DangerAcceptInvalid // lab NMS servers are typically self-signed
    };

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    let poll = profile.poll_interval_ms.unwrap_or(defaults.poll_interval_ms);
    config = config.with_poll_interval(Duration::from_millis(poll.max(1)));

    if let Some(ref dir) = profile.snapshot_dir {
        config = config.with_snapshot_dir(dir.clone());
    }

    Ok(config)
}

/// Build the endpoint of a named device in a profile.
pub fn device_endpoint(
    profile: &Profile,
    profile_name: &str,
    device_name: &str,
) -> Result<DeviceEndpoint, ConfigError> {
    let device = profile
        .devices
        .get(device_name)
        .ok_or_else(|| ConfigError::UnknownDevice {
            name: device_name.into(),
            profile: profile_name.into(),
        })?;

    let model = DeviceModel::parse(&device.model).map_err(|e| ConfigError::Validation {
        field: format!("devices.{device_name}.model"),
        reason: e.to_string(),
    })?;

    let mut endpoint = DeviceEndpoint::new(device.address.clone(), model, device.transport);
    endpoint.username = device.username.clone();
    endpoint.password = resolve_device_password(device);
    if let Some(secs) = device.timeout {
        endpoint.timeout = Duration::from_secs(secs);
    }
    Ok(endpoint)
}
