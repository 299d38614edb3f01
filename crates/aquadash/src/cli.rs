//! Clap derive structures for the `aquadash` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aquadash -- watch and control water tanks from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "aquadash",
    version,
    about = "Monitor water tanks and control their pumps from the command line",
    long_about = "A terminal client for the aquadash tank dashboard.\n\n\
        Keeps a live WebSocket session with the dashboard server, renders\n\
        every device snapshot it pushes, and sends add/remove/mode/pump\n\
        commands back. The server is authoritative: results show up in the\n\
        next snapshot.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "AQUADASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// WebSocket endpoint, e.g. ws://localhost:8000/ws (overrides profile)
    #[arg(long, short = 'e', env = "AQUADASH_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Session id issued by the dashboard (overrides profile)
    #[arg(long, env = "AQUADASH_SESSION_ID", global = true, hide_env_values = true)]
    pub session_id: Option<String>,

    /// Output format [default: table, or `defaults.output` from config]
    #[arg(long, short = 'o', env = "AQUADASH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto, or `defaults.color`]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Seconds one-shot commands wait for the server [default: 10, or `defaults.timeout`]
    #[arg(long, env = "AQUADASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    pub fn output(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }

    pub fn color(&self) -> ColorMode {
        self.color.unwrap_or(ColorMode::Auto)
    }

    pub fn timeout(&self) -> u64 {
        self.timeout.unwrap_or(10)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one device id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream live device snapshots until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Print the current device set
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one device in detail
    Show {
        /// Device id
        device: String,
    },

    /// Register a new device
    Add(AddArgs),

    /// Remove a device (asks for confirmation)
    #[command(alias = "rm")]
    Remove {
        /// Device id
        device: String,
    },

    /// Switch a device between manual and automatic mode
    Mode {
        /// Device id
        device: String,

        /// Target mode
        mode: ModeArg,
    },

    /// Turn a device's pump on or off (manual mode only)
    Pump {
        /// Device id
        device: String,

        /// Desired pump state
        state: PumpArg,
    },

    /// Send a raw device command
    Send(SendArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Snapshot filters shared by `list` and `watch`.
#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// Only devices in this mode
    #[arg(long)]
    pub mode: Option<FilterMode>,

    /// Only devices whose pump is in this state
    #[arg(long)]
    pub pump: Option<PumpArg>,

    /// Only devices reporting an alert
    #[arg(long)]
    pub alerting: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Exit after this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Device id (unique, assigned by you)
    #[arg(long)]
    pub id: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Where the tank is installed
    #[arg(long, default_value = "")]
    pub location: String,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Device id
    pub device: String,

    /// Command name, e.g. setMode
    pub command: String,

    /// Command parameters as JSON
    #[arg(long, default_value = "null")]
    pub params: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Manual,
    Automatic,
    /// Opposite of the current mode
    Toggle,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FilterMode {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PumpArg {
    On,
    Off,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a value on the active profile
    Set {
        /// Config key: endpoint, session_id_env, reconnect_delay_ms, connect_timeout_secs
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a session id for the active profile in the system keyring
    SetSession,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
