//! Device commands: identify, settings, media upload.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use cuelink_core::{Player, UploadFile};

use crate::cli::{SettingsArgs, SettingsCommand, UploadArgs};
use crate::commands::{Context, util};
use crate::error::CliError;
use crate::output;

pub async fn identify(player: &Player, ctx: &Context) -> Result<(), CliError> {
    player.identify().await?;
    output::print_output("identifying", ctx.quiet);
    Ok(())
}

pub async fn settings(player: &Player, args: SettingsArgs, ctx: &Context) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::Set { key, value } => {
            // the update is merged over the device's current settings
            player.state().refresh_store("Settings").await?;
            let answer = player.update_setting(&key, util::parse_json_arg(&value)).await?;
            print_answer(&answer, ctx)
        }
        SettingsCommand::FactoryReset => {
            if !util::confirm(
                "Restore factory settings on the player?",
                "settings factory-reset",
                ctx.yes,
            )? {
                return Ok(());
            }
            let answer = player.factory_reset().await?;
            print_answer(&answer, ctx)
        }
        SettingsCommand::Reboot => {
            if !util::confirm("Reboot the player?", "settings reboot", ctx.yes)? {
                return Ok(());
            }
            player.reboot().await?;
            output::print_output("rebooting", ctx.quiet);
            Ok(())
        }
    }
}

fn print_answer(answer: &Value, ctx: &Context) -> Result<(), CliError> {
    if answer.is_null() {
        return Ok(());
    }
    let out = output::render_value(ctx.format, answer)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

pub async fn upload(player: &Player, args: UploadArgs, ctx: &Context) -> Result<(), CliError> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let file = UploadFile::from_path(path)
            .await
            .map_err(|e| CliError::Validation {
                field: "files".into(),
                reason: format!("{}: {e}", path.display()),
            })?;
        files.push(file);
    }

    let spinner = if ctx.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("uploading {} file(s)", files.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = player.upload_media(files, args.folder.as_deref()).await;
    spinner.finish_and_clear();

    let created = result?;
    let value = serde_json::to_value(&created)?;
    let out = output::render_value(ctx.format, &value)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
