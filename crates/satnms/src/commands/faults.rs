//! Fault bitmask command handlers.

use serde::Serialize;

use satnms_core::Faults;

use crate::cli::{FaultsArgs, FaultsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct FaultReport {
    bitmask: u32,
    faults: Vec<&'static str>,
}

impl From<Faults> for FaultReport {
    fn from(faults: Faults) -> Self {
        Self {
            bitmask: faults.bits(),
            faults: faults.names(),
        }
    }
}

pub fn handle(args: FaultsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (report, plain): (FaultReport, fn(&FaultReport) -> String) = match args.command {
        FaultsCommand::Decode { value } => (
            Faults::decode(parse_bitmask(&value)?).into(),
            |r| r.faults.join("\n"),
        ),
        FaultsCommand::Encode { names } => {
            let names: Vec<&str> = names
                .iter()
                .map(String::as_str)
                .filter(|n| !n.trim().is_empty())
                .collect();
            (Faults::from_names(&names)?.into(), |r| r.bitmask.to_string())
        }
    };

    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            let names = if r.faults.is_empty() {
                "none".to_owned()
            } else {
                r.faults.join(", ")
            };
            output::detail_lines([("bitmask", r.bitmask.to_string()), ("faults", names)])
        },
        plain,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Decimal, or hex with a `0x` prefix.
fn parse_bitmask(raw: &str) -> Result<u64, CliError> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|_| CliError::Validation {
        field: "bitmask".into(),
        reason: format!("expected a decimal or 0x-prefixed number, got {raw:?}"),
    })
}
