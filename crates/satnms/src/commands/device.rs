//! Direct modem command handlers.
//!
//! These bypass the NMS: the driver is picked from the endpoint's transport
//! and closed after each command.

use satnms_core::driver::{self, DeviceDriver};
use satnms_core::{
    AccessLevel, Carrier, CoreError, DeviceOverview, EnumFamily, PingRequest, StarStation,
};

use crate::cli::{DeviceArgs, DeviceCommand, DeviceTarget, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(args: DeviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DeviceCommand::State(target) => {
            let mut modem = open(global, &target).await?;
            let state = modem.get_state().await;
            finish(modem, state, global.quiet, |state| {
                output::render_single(
                    &global.output,
                    state.label(),
                    |s| s.to_owned(),
                    |s| s.to_owned(),
                )
            })
            .await
        }

        DeviceCommand::Overview(target) => {
            let mut modem = open(global, &target).await?;
            let overview = modem.get_overview().await;
            finish(modem, overview, global.quiet, |overview| {
                output::render_single(&global.output, &overview, overview_detail, |o| {
                    o.serial.clone().unwrap_or_default()
                })
            })
            .await
        }

        DeviceCommand::Reboot(target) => {
            let endpoint = config::device_endpoint(global, &target)?;
            let prompt = format!("Reboot modem {}?", endpoint.address);
            if !util::confirm(&prompt, "device reboot", global.yes)? {
                return Ok(());
            }
            let mut modem = driver::connect(&endpoint).await?;
            let result = modem.reboot().await;
            finish(modem, result, global.quiet, |()| {
                Ok(format!("Reboot requested for {}", endpoint.address))
            })
            .await
        }

        DeviceCommand::Ping {
            target,
            to,
            count,
            size,
        } => {
            let request = PingRequest { target: to, count, size };
            let mut modem = open(global, &target).await?;
            let report = modem.ping(&request).await;
            finish(modem, report, global.quiet, |report| {
                output::render_single(
                    &global.output,
                    &report,
                    |r| {
                        let rtt = r
                            .rtt_avg_ms
                            .map_or_else(|| "-".to_owned(), |ms| format!("{ms:.1} ms"));
                        output::detail_lines([
                            ("target", to.to_string()),
                            ("sent", r.sent.to_string()),
                            ("received", r.received.to_string()),
                            ("loss", format!("{:.0}%", r.loss_percent())),
                            ("rtt avg", rtt),
                        ])
                    },
                    |r| r.received.to_string(),
                )
            })
            .await
        }

        DeviceCommand::Star {
            target,
            rx_frequency,
            rx_symbol_rate,
            tx_frequency,
            tx_symbol_rate,
        } => {
            let station = StarStation {
                rx: Carrier::new(rx_frequency, rx_symbol_rate),
                tx: Carrier::new(tx_frequency, tx_symbol_rate),
            };
            let mut modem = open(global, &target).await?;
            let result = modem.star_station(&station).await;
            finish(modem, result, global.quiet, |()| {
                Ok("Star profile applied".to_owned())
            })
            .await
        }

        DeviceCommand::Access { target, level } => {
            let level = AccessLevel::parse(&level)?;
            let mut modem = open(global, &target).await?;
            let result = modem.set_nms_permission(level).await;
            finish(modem, result, global.quiet, |()| {
                Ok(format!("NMS access set to {}", level.label()))
            })
            .await
        }

        DeviceCommand::Script { target, from_file } => {
            let lines = util::read_script_file(&from_file)?;
            let mut modem = open(global, &target).await?;
            let result = modem.network_script(&lines).await;
            finish(modem, result, global.quiet, |()| {
                Ok(format!("Network script applied ({} lines)", lines.len()))
            })
            .await
        }
    }
}

async fn open(
    global: &GlobalOpts,
    target: &DeviceTarget,
) -> Result<Box<dyn DeviceDriver>, CliError> {
    let endpoint = config::device_endpoint(global, target)?;
    Ok(driver::connect(&endpoint).await?)
}

/// Close the driver, then report the operation's outcome.
///
/// The session is closed on both paths; a close failure is only logged.
async fn finish<T>(
    modem: Box<dyn DeviceDriver>,
    result: Result<T, CoreError>,
    quiet: bool,
    render: impl FnOnce(T) -> Result<String, CliError>,
) -> Result<(), CliError> {
    if let Err(e) = modem.close().await {
        tracing::debug!(error = %e, "closing modem session failed");
    }
    let out = render(result?)?;
    output::print_output(&out, quiet);
    Ok(())
}

fn overview_detail(o: &DeviceOverview) -> String {
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    let faults = if o.faults.is_empty() {
        "none".to_owned()
    } else {
        o.faults.names().join(", ")
    };
    output::detail_lines([
        ("model", or_dash(&o.model)),
        ("serial", or_dash(&o.serial)),
        ("software", or_dash(&o.software)),
        ("state", o.state.map_or_else(|| "-".into(), |s| s.label().to_owned())),
        ("faults", faults),
    ])
}
