//! CLI configuration: thin wrapper around `cuelink_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --port, --timeout, --output).

use std::time::Duration;

use clap::ValueEnum;

use cuelink_core::{ClientConfig, TransportConfig};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use cuelink_config::{
    Config, Profile, config_path, load_config, load_config_or_default, profile_to_connection,
    save_config,
};

/// Everything needed to reach the device.
#[derive(Debug, Clone)]
pub struct Connection {
    pub address: ClientConfig,
    pub transport: TransportConfig,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Output format: flag (or `CUELINK_OUTPUT`) > config default > JSON.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&config.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Json)
}

/// Build the device address from the config file, profile and flags.
///
/// Flags take priority over the profile. Without a matching profile,
/// `--host` alone is enough.
pub fn resolve_connection(global: &GlobalOpts, config: &Config) -> Result<Connection, CliError> {
    let profile_name = active_profile_name(global, config);

    let profile = match (config.profiles.get(&profile_name), &global.host) {
        (Some(profile), _) => profile.clone(),
        (None, Some(host)) => Profile::new(host.clone(), 80),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let (mut address, mut transport) = profile_to_connection(&profile, &config.defaults)?;
    if let Some(ref host) = global.host {
        address.host.clone_from(host);
    }
    if let Some(port) = global.port {
        address.port = port;
    }
    if let Some(seconds) = global.timeout {
        transport.timeout = Duration::from_secs(seconds);
    }

    tracing::debug!(profile = %profile_name, host = %address.host, port = address.port, "resolved device");
    Ok(Connection { address, transport })
}

pub fn available_profiles(config: &Config) -> String {
    let names = config.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
