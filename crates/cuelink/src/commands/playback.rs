//! Playback and queue commands.
//!
//! Playback commands go over the push channel, so they open it first and
//! close it again once the command has been written.

use cuelink_core::{Command as PlayerCommand, Player, QueueMode};

use crate::cli::LoadArgs;
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

pub async fn send(player: &Player, command: PlayerCommand, ctx: &Context) -> Result<(), CliError> {
    player.open().await?;
    player.send(&command);
    player.disconnect().await;

    output::print_output(&format!("sent {}", command.event_name()), ctx.quiet);
    Ok(())
}

pub async fn load(player: &Player, args: LoadArgs, ctx: &Context) -> Result<(), CliError> {
    let mode = if args.append {
        QueueMode::Append
    } else {
        QueueMode::Replace
    };
    player.load_playlist(&args.playlist, mode).await?;
    output::print_output(&format!("playlist {} queued ({mode})", args.playlist), ctx.quiet);
    Ok(())
}

pub async fn clear_queue(player: &Player, ctx: &Context) -> Result<(), CliError> {
    player.queue_clear().await?;
    output::print_output("queue cleared", ctx.quiet);
    Ok(())
}
