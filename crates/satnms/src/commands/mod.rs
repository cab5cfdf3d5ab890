//! Command dispatch: bridges CLI args -> core session -> output formatting.

pub mod config_cmd;
pub mod device;
pub mod enums;
pub mod faults;
pub mod object;
pub mod snapshot;
pub mod util;
pub mod wait;

use satnms_core::NmsSession;

use crate::cli::{Command, GlobalOpts, SnapshotArgs, SnapshotCommand};
use crate::config;
use crate::error::CliError;

/// Dispatch an NMS-bound command to the appropriate handler.
///
/// One session per invocation: log in, run the command, log out.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let session_config = config::session_config(global)?;

    // Listing the local store needs the resolved directory, not the NMS.
    if matches!(
        cmd,
        Command::Snapshot(SnapshotArgs {
            command: SnapshotCommand::List
        })
    ) {
        return snapshot::list(&session_config, global);
    }

    let session = NmsSession::connect(session_config).await?;
    let result = match cmd {
        Command::Object(args) => object::handle(&session, args, global).await,
        Command::Wait(args) => wait::handle(&session, args, global).await,
        Command::Snapshot(args) => snapshot::handle(&session, args, global).await,
        // Handled before dispatch
        Command::Enums(_)
        | Command::Faults(_)
        | Command::Device(_)
        | Command::Config(_)
        | Command::Completions(_) => unreachable!(),
    };
    session.disconnect().await;
    result
}
