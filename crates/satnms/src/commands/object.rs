//! Object command handlers.

use serde::Serialize;
use tabled::Tabled;

use satnms_core::{Handle, NmsSession, Params};

use crate::cli::{GlobalOpts, ObjectArgs, ObjectCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct CreatedObject {
    handle: String,
    parent: Option<String>,
}

#[derive(Tabled)]
struct ParamRow {
    #[tabled(rename = "Parameter")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(
    session: &NmsSession,
    args: ObjectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ObjectCommand::Create {
            kind,
            parent,
            params,
            from_file,
            index,
        } => {
            let parent = parent.as_deref().map(util::parse_handle).transpose()?;
            let params = util::build_params(&params, from_file.as_deref())?;
            if let Some(index) = index {
                session.repository().reserve_index(&kind, index);
            }

            let handle = session.create(parent.as_ref(), &kind, params).await?;
            let created = CreatedObject {
                handle: handle.to_string(),
                parent: parent.map(|p| p.to_string()),
            };
            let out = output::render_single(
                &global.output,
                &created,
                |c| format!("Created {}", c.handle),
                |c| c.handle.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ObjectCommand::Update {
            handle,
            params,
            from_file,
        } => {
            let handle = util::parse_handle(&handle)?;
            let changes = util::build_params(&params, from_file.as_deref())?;
            if changes.is_empty() {
                return Err(CliError::Validation {
                    field: "param".into(),
                    reason: "nothing to update".into(),
                });
            }
            session.update(&handle, changes).await?;
            if !global.quiet {
                eprintln!("Updated {handle}");
            }
            Ok(())
        }

        ObjectCommand::Get { handle, field } => {
            let handle = util::parse_handle(&handle)?;
            match field {
                Some(name) => get_field(session, &handle, &name, global).await,
                None => {
                    let params = session.refresh(&handle).await?;
                    print_params(&handle, &params, global)
                }
            }
        }
    }
}

async fn get_field(
    session: &NmsSession,
    handle: &Handle,
    name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let value = session
        .fetch(handle, name)
        .await?
        .ok_or_else(|| CliError::NotFound {
            what: format!("parameter of {handle}"),
            identifier: name.to_owned(),
        })?;
    let out = output::render_single(
        &global.output,
        &value,
        util::display_value,
        util::display_value,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_params(handle: &Handle, params: &Params, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        params,
        |p| {
            let rows: Vec<ParamRow> = p
                .iter()
                .map(|(name, value)| ParamRow {
                    name: name.clone(),
                    value: util::display_value(value),
                })
                .collect();
            format!("{handle}\n{}", output::render_table(&rows))
        },
        |p| {
            p.iter()
                .map(|(k, v)| format!("{k}={}", util::display_value(v)))
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
