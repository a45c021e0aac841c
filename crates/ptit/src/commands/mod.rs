//! Command dispatch: bridges CLI args -> core pages and orchestrators ->
//! output formatting.

pub mod config_cmd;
pub mod device_types;
pub mod devices;
pub mod history;
pub mod notifications;
pub mod report;
pub mod users;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Connection;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, conn: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Users(args) => users::handle(conn, args, global).await,
        Command::DeviceTypes(args) => device_types::handle(conn, args, global).await,
        Command::Devices(args) => devices::handle(conn, args, global).await,
        Command::History(args) => history::handle(conn, args, global).await,
        Command::Notifications(args) => notifications::handle(conn, args, global).await,
        Command::Report(args) => report::handle(conn, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
