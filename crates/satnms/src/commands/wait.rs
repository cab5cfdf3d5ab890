//! Convergence wait handlers.
//!
//! A wait that times out is an error (exit code 8) so scripts can chain
//! `satnms wait up ... && next-step`.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use satnms_core::{Convergence, EnumFamily, Faults, NmsSession, ObjectState};

use crate::cli::{GlobalOpts, WaitArgs, WaitCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct WaitReport {
    target: String,
    condition: String,
    reached: bool,
    elapsed_ms: u128,
    polls: Option<u32>,
}

pub async fn handle(
    session: &NmsSession,
    args: WaitArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let report = match args.command {
        WaitCommand::Up { handle, wait } => {
            let handle = util::parse_handle(&handle)?;
            let spinner = spinner(global, &format!("waiting for {handle} to be Up"));
            let outcome = session
                .poll_state(&handle, wait.within.into(), |s| s == Some(ObjectState::Up))
                .await;
            spinner.finish_and_clear();
            report(handle.to_string(), "Up".into(), outcome)
        }

        WaitCommand::State {
            handle,
            state,
            wait,
        } => {
            let handle = util::parse_handle(&handle)?;
            let state = ObjectState::parse(&state)?;
            let spinner = spinner(global, &format!("waiting for {handle} to be {}", state.label()));
            let outcome = session
                .poll_state(&handle, wait.within.into(), |s| s == Some(state))
                .await;
            spinner.finish_and_clear();
            report(handle.to_string(), state.label().into(), outcome)
        }

        WaitCommand::NotState {
            handle,
            state,
            wait,
        } => {
            let handle = util::parse_handle(&handle)?;
            let state = ObjectState::parse(&state)?;
            let spinner = spinner(global, &format!("waiting for {handle} to leave {}", state.label()));
            let outcome = session
                .poll_state(&handle, wait.within.into(), |s| s != Some(state))
                .await;
            spinner.finish_and_clear();
            report(handle.to_string(), format!("not {}", state.label()), outcome)
        }

        WaitCommand::Ticks { count } => {
            let spinner = spinner(global, &format!("waiting for {count} configuration cycles"));
            let started = Instant::now();
            let reached = session.wait_ticks(count).await?;
            spinner.finish_and_clear();
            WaitReport {
                target: "nms".into(),
                condition: format!("{count} ticks"),
                reached,
                elapsed_ms: started.elapsed().as_millis(),
                polls: None,
            }
        }

        WaitCommand::Faults {
            handle,
            faults,
            strict,
            wait,
        } => {
            let handle = util::parse_handle(&handle)?;
            let names: Vec<&str> = faults
                .iter()
                .map(String::as_str)
                .filter(|n| !n.trim().is_empty())
                .collect();
            let expected = Faults::from_names(&names)?;
            let condition = match (strict, expected.is_empty()) {
                (_, true) => "no faults".to_owned(),
                (true, false) => format!("exactly {expected}"),
                (false, false) => format!("at least {expected}"),
            };
            let spinner = spinner(global, &format!("waiting for {handle}: {condition}"));
            let outcome = session
                .poll_faults(&handle, expected, strict || expected.is_empty(), wait.within.into())
                .await;
            spinner.finish_and_clear();
            report(handle.to_string(), condition, outcome)
        }
    };

    if !report.reached {
        return Err(CliError::NotConverged {
            target: report.target,
            condition: report.condition,
            elapsed: humantime::format_duration(Duration::from_millis(
                u64::try_from(report.elapsed_ms).unwrap_or(u64::MAX),
            ))
            .to_string(),
        });
    }

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            format!(
                "{} {} is {} after {} ms",
                output::status_word(r.reached, "reached", "timed out", color),
                r.target,
                r.condition,
                r.elapsed_ms
            )
        },
        |r| r.target.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn report(target: String, condition: String, outcome: Convergence) -> WaitReport {
    WaitReport {
        target,
        condition,
        reached: outcome.is_reached(),
        elapsed_ms: outcome.elapsed().as_millis(),
        polls: Some(outcome.polls()),
    }
}

/// Spinner on stderr for interactive runs; hidden otherwise.
fn spinner(global: &GlobalOpts, message: &str) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
