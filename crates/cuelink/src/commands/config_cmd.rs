//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::Input;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn save_config(cfg: &Config) -> Result<std::path::PathBuf, CliError> {
    Ok(config::save_config(cfg)?)
}

#[derive(Serialize)]
struct ProfileInfo<'a> {
    name: &'a str,
    host: &'a str,
    port: u16,
    default: bool,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match config::output_format(global, &cfg) {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Render(e.to_string()))?,
                format => output::render_value(format, &serde_json::to_value(&cfg)?)?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref();
            let infos: Vec<ProfileInfo<'_>> = cfg
                .profile_names()
                .into_iter()
                .filter_map(|name| {
                    cfg.profiles.get(name).map(|p| ProfileInfo {
                        name,
                        host: &p.host,
                        port: p.port,
                        default: default == Some(name),
                    })
                })
                .collect();

            let format = global.output.unwrap_or(OutputFormat::Table);
            let out = output::render_list(
                format,
                &infos,
                |p| ProfileRow {
                    marker: if p.default { "*" } else { "" },
                    name: p.name.to_owned(),
                    address: format!("{}:{}", p.host, p.port),
                },
                |p| p.name.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::print_output(&format!("default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { name } => init(name, global),
    }
}

/// Add (or replace) a profile. Non-interactive when `--host` is given.
fn init(name: Option<String>, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();

    let (name, host, port) = if let Some(ref host) = global.host {
        (
            name.unwrap_or_else(|| "default".into()),
            host.clone(),
            global.port.unwrap_or(80),
        )
    } else {
        if !std::io::stdin().is_terminal() {
            return Err(CliError::Validation {
                field: "host".into(),
                reason: "pass --host when not running interactively".into(),
            });
        }
        let name = match name {
            Some(name) => name,
            None => Input::new()
                .with_prompt("Profile name")
                .default("default".to_owned())
                .interact_text()
                .map_err(prompt_err)?,
        };
        let host: String = Input::new()
            .with_prompt("Player address")
            .interact_text()
            .map_err(prompt_err)?;
        let port: u16 = Input::new()
            .with_prompt("Port")
            .default(global.port.unwrap_or(80))
            .interact_text()
            .map_err(prompt_err)?;
        (name, host, port)
    };

    let mut profile = Profile::new(host, port);
    profile.timeout = global.timeout;
    // surface bad input now rather than on first use
    config::profile_to_connection(&profile, &cfg.defaults)?;

    if cfg.profiles.is_empty() || cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.clone());
    }
    cfg.profiles.insert(name.clone(), profile);
    let path = save_config(&cfg)?;

    output::print_output(
        &format!("profile '{name}' written to {}", path.display()),
        global.quiet,
    );
    Ok(())
}
