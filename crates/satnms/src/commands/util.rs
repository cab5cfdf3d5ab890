//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;

use satnms_core::{Handle, Params};

use crate::error::CliError;

/// Parse a `type:index` handle argument.
pub fn parse_handle(raw: &str) -> Result<Handle, CliError> {
    Ok(raw.parse::<Handle>()?)
}

/// Build a parameter map from an optional JSON file and `KEY=VALUE` pairs.
///
/// Pairs override file entries. A value that parses as JSON keeps its type
/// (`8`, `true`, `[1,2]`); anything else is sent as a string.
pub fn build_params(pairs: &[String], from_file: Option<&Path>) -> Result<Params, CliError> {
    let mut params = match from_file {
        Some(path) => match read_json_file(path)? {
            Value::Object(map) => map,
            _ => {
                return Err(CliError::Validation {
                    field: "from-file".into(),
                    reason: "expected a JSON object".into(),
                });
            }
        },
        None => Params::new(),
    };

    for pair in pairs {
        let (key, raw) = pair.split_once('=').ok_or_else(|| CliError::Validation {
            field: "param".into(),
            reason: format!("expected KEY=VALUE, got {pair:?}"),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::Validation {
                field: "param".into(),
                reason: format!("empty key in {pair:?}"),
            });
        }
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
        params.insert(key.to_owned(), value);
    }
    Ok(params)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Non-empty, non-comment lines of a text file.
pub fn read_script_file(path: &Path) -> Result<Vec<String>, CliError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

/// Render a JSON parameter value the way an operator types it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}
