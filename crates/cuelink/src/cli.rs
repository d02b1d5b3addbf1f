//! Clap derive structures for the `cuelink` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use cuelink_core::JumpOrigin;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cuelink -- drive a networked media player from the shell
#[derive(Debug, Parser)]
#[command(
    name = "cuelink",
    version,
    about = "Control networked media players from the command line",
    long_about = "Inspect and control a media player over its REST API and \
        Socket.IO push channel.\n\n\
        Devices are addressed by profile (see `cuelink config init`) or \
        directly with --host/--port.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "CUELINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device host name or IP (overrides profile)
    #[arg(long, short = 'H', env = "CUELINK_HOST", global = true)]
    pub host: Option<String>,

    /// Device port (overrides profile)
    #[arg(long, short = 'P', env = "CUELINK_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format [default: from config, else json]
    #[arg(long, short = 'o', env = "CUELINK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CUELINK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text (scalars bare, one line per list item)
    Plain,
    /// Key/value table
    Table,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a store (refreshed from the device first)
    Get(GetArgs),

    /// Stream a store's value as it changes
    Watch(WatchArgs),

    /// List the available stores
    Stores,

    /// Start playback
    Play,

    /// Pause playback
    Pause,

    /// Stop playback
    Stop,

    /// Toggle between play and pause
    Toggle,

    /// Step one frame forward
    NextFrame,

    /// Start the item marked as next
    Take(TakeArgs),

    /// Mark a queue item as next
    Next {
        /// Queue item id
        id: String,
    },

    /// Move the playhead
    Jump(JumpArgs),

    /// Move the next marker through the queue (negative is up)
    Skip {
        #[arg(allow_negative_numbers = true)]
        distance: i64,
    },

    /// Play a queue item right away
    Goto {
        /// Queue item id
        id: String,
    },

    /// Put a playlist into the play queue
    Load(LoadArgs),

    /// Remove every item from the play queue
    ClearQueue,

    /// Blink the device's front panel
    Identify,

    /// Change or reset device settings
    Settings(SettingsArgs),

    /// Upload media files
    Upload(UploadArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Store access ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Store name (see `cuelink stores`)
    pub store: String,

    /// Dotted field path, e.g. `storageStats.free` or `0.name`
    pub field: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Store name (see `cuelink stores`)
    pub store: String,

    /// Dotted field path; only changes of this field are printed
    pub field: Option<String>,

    /// Exit after this many values
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Playback ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TakeArgs {
    /// Cue the item without starting it
    #[arg(long)]
    pub without_play: bool,
}

#[derive(Debug, Args)]
pub struct JumpArgs {
    /// Offset in milliseconds
    #[arg(allow_negative_numbers = true)]
    pub milliseconds: i64,

    /// Reference point of the offset
    #[arg(long, value_enum, default_value = "current")]
    pub from: JumpFrom,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum JumpFrom {
    Current,
    Start,
    End,
}

impl From<JumpFrom> for JumpOrigin {
    fn from(from: JumpFrom) -> Self {
        match from {
            JumpFrom::Current => Self::Current,
            JumpFrom::Start => Self::Start,
            JumpFrom::End => Self::End,
        }
    }
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Playlist id
    pub playlist: String,

    /// Add after the current queue instead of replacing it
    #[arg(long, short = 'a')]
    pub append: bool,
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Change one setting
    Set {
        /// Wire name of the setting, e.g. `masterVolume`
        key: String,

        /// New value as JSON (bare words are taken as strings)
        value: String,
    },

    /// Restore factory settings
    FactoryReset,

    /// Reboot the device
    Reboot,
}

// ── Media ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target folder id (library root when omitted)
    #[arg(long, short = 'f')]
    pub folder: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file
    Init {
        /// Profile name [default: prompt, or "default"]
        #[arg(long)]
        name: Option<String>,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
