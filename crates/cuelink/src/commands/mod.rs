//! Command dispatch: bridges CLI args -> player operations -> output.

pub mod config_cmd;
pub mod device;
pub mod playback;
pub mod state;
pub mod util;

use cuelink_core::{Command as PlayerCommand, Player};

use crate::cli::{Command, OutputFormat};
use crate::error::CliError;

/// Settings shared by every device-bound handler.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub format: OutputFormat,
    pub quiet: bool,
    pub yes: bool,
}

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, player: &Player, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Get(args) => state::get(player, args, ctx).await,
        Command::Watch(args) => state::watch(player, args, ctx).await,

        Command::Play => playback::send(player, PlayerCommand::Play, ctx).await,
        Command::Pause => playback::send(player, PlayerCommand::Pause, ctx).await,
        Command::Stop => playback::send(player, PlayerCommand::Stop, ctx).await,
        Command::Toggle => playback::send(player, PlayerCommand::TogglePlayPause, ctx).await,
        Command::NextFrame => playback::send(player, PlayerCommand::NextFrame, ctx).await,
        Command::Take(args) => {
            let command = PlayerCommand::TakeNext {
                play: !args.without_play,
            };
            playback::send(player, command, ctx).await
        }
        Command::Next { id } => playback::send(player, PlayerCommand::SetNext { id }, ctx).await,
        Command::Jump(args) => {
            let command = PlayerCommand::Jump {
                milliseconds: args.milliseconds,
                from: args.from.into(),
            };
            playback::send(player, command, ctx).await
        }
        Command::Skip { distance } => {
            playback::send(player, PlayerCommand::Skip { distance }, ctx).await
        }
        Command::Goto { id } => playback::send(player, PlayerCommand::Goto { id }, ctx).await,
        Command::Load(args) => playback::load(player, args, ctx).await,
        Command::ClearQueue => playback::clear_queue(player, ctx).await,

        Command::Identify => device::identify(player, ctx).await,
        Command::Settings(args) => device::settings(player, args, ctx).await,
        Command::Upload(args) => device::upload(player, args, ctx).await,

        // handled before a device is resolved
        Command::Stores | Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "command does not need a device".into(),
        }),
    }
}
