//! Config command handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.password.is_some() {
                    profile.password = Some(REDACTED.into());
                }
                for device in profile.devices.values_mut() {
                    if device.password.is_some() {
                        device.password = Some(REDACTED.into());
                    }
                }
            }

            let out = output::render_single(&global.output, &cfg, render_toml, render_toml)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let name = config::active_profile_name(global, &cfg);
            let password = match global.password {
                Some(ref pw) => pw.clone(),
                None => dialoguer::Password::new()
                    .with_prompt(format!("NMS password for profile '{name}'"))
                    .interact()
                    .map_err(|e| CliError::Io(std::io::Error::other(e)))?,
            };
            satnms_config::store_password(&name, &password)?;
            if !global.quiet {
                eprintln!("Password for profile '{name}' stored in the system keyring");
            }
            Ok(())
        }
    }
}

fn render_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_default()
}
