//! CLI configuration: thin wrapper around `satnms_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--nms, --username, --timeout, ...) on top of the active profile.

use std::time::Duration;

use satnms_core::{DeviceEndpoint, DeviceModel, EnumFamily, SessionConfig};

use crate::cli::{DeviceTarget, GlobalOpts};
use crate::error::CliError;

pub use satnms_config::{Config, Profile, config_path, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the NMS `SessionConfig` from the config file, profile, and flags.
pub fn session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = load_config_or_default();
    let name = active_profile_name(global, &cfg);

    let base = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.nms.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let profile = apply_overrides(base, global);
    Ok(satnms_config::profile_to_session_config(
        &profile,
        &name,
        &cfg.defaults,
    )?)
}

/// Flags take priority over profile values.
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref nms) = global.nms {
        profile.nms.clone_from(nms);
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }
    if global.password.is_some() {
        profile.password.clone_from(&global.password);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    if global.poll_interval_ms.is_some() {
        profile.poll_interval_ms = global.poll_interval_ms;
    }
    if global.snapshot_dir.is_some() {
        profile.snapshot_dir.clone_from(&global.snapshot_dir);
    }
    profile
}

/// Resolve a modem from the profile's `devices` table or inline flags.
pub fn device_endpoint(
    global: &GlobalOpts,
    target: &DeviceTarget,
) -> Result<DeviceEndpoint, CliError> {
    let mut endpoint = if let Some(ref name) = target.name {
        let cfg = load_config_or_default();
        let profile_name = active_profile_name(global, &cfg);
        let profile =
            cfg.profiles
                .get(&profile_name)
                .ok_or_else(|| CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
                })?;
        satnms_config::device_endpoint(profile, &profile_name, name)?
    } else {
        let address = target.address.clone().ok_or_else(|| CliError::Validation {
            field: "device".into(),
            reason: "give a device name from the profile, or --address and --model".into(),
        })?;
        let raw_model = target.model.as_deref().unwrap_or_default();
        let model = DeviceModel::parse(raw_model)?;
        DeviceEndpoint::new(address, model, target.transport.into())
    };

    if let Some(secs) = global.timeout {
        endpoint.timeout = Duration::from_secs(secs);
    }
    Ok(endpoint)
}
