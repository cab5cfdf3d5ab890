//! Snapshot command handlers.

use tabled::Tabled;

use satnms_core::{NmsSession, SessionConfig, SnapshotInfo, SnapshotManager};

use crate::cli::{GlobalOpts, SnapshotArgs, SnapshotCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

impl From<&SnapshotInfo> for SnapshotRow {
    fn from(s: &SnapshotInfo) -> Self {
        Self {
            name: s.name.clone(),
            size: format!("{} B", s.size),
            modified: s
                .modified
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }
}

pub async fn handle(
    session: &NmsSession,
    args: SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SnapshotCommand::Create { name, local } => {
            session.create_backup(&name, local).await?;
            if !global.quiet {
                eprintln!("Snapshot '{name}' saved ({})", store_name(local));
            }
            Ok(())
        }

        SnapshotCommand::Apply { name, local } => {
            let prompt = format!(
                "Replace the whole NMS configuration with snapshot '{name}' ({})?",
                store_name(local)
            );
            if !util::confirm(&prompt, "snapshot apply", global.yes)? {
                return Ok(());
            }
            session.apply_backup(&name, local).await?;
            if !global.quiet {
                eprintln!("Snapshot '{name}' applied");
            }
            Ok(())
        }

        // Routed to `list` before a session is opened
        SnapshotCommand::List => list(session.config(), global),
    }
}

/// List the local snapshot store without contacting the NMS.
pub fn list(config: &SessionConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshots = SnapshotManager::new(config.snapshot_dir.clone()).list_local()?;
    let out = output::render_list(
        &global.output,
        &snapshots,
        |s| SnapshotRow::from(s),
        |s| s.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn store_name(local: bool) -> &'static str {
    if local { "local" } else { "shared" }
}
