//! Command dispatch: bridges CLI args -> engine -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to its handler.
///
/// Each handler builds and tears down its own engine; `watch` needs a
/// presenter attached at construction time.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(args, global).await,
        Command::List(args) => devices::list(args, global).await,
        Command::Show { device } => devices::show(&device, global).await,
        Command::Add(args) => devices::add(args, global).await,
        Command::Remove { device } => devices::remove(&device, global).await,
        Command::Mode { device, mode } => devices::mode(&device, mode, global).await,
        Command::Pump { device, state } => devices::pump(&device, state, global).await,
        Command::Send(args) => devices::send(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
