//! Clap derive structures for the `aquadash` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aquadash -- watch water-network field devices from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "aquadash",
    version,
    about = "Watch polled water-network field devices from the command line",
    long_about = "Polls tanks, pumps, wells, and valves published in a realtime database.\n\n\
        Every document is fetched once per cadence no matter how many views\n\
        watch it; real-time mode switches every poll to the fast cadence.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "AQUADASH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AQUADASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides polling.timeout_secs)
    #[arg(
        long,
        env = "AQUADASH_TIMEOUT",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON (one update per line when watching)
    JsonCompact,
    /// Plain text, `field=value` per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// List configured sites
    #[command(alias = "ls")]
    Sites,

    /// Subscribe to a site (or one of its devices) and print every update
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Fetch a device document once, bypassing the cache
    Poll(PollArgs),

    /// Switch a binary control point on or off
    #[command(alias = "ctl")]
    Control(ControlArgs),

    /// Inspect the resolved configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Site identifier
    pub site: String,

    /// Watch one configured device instead of the aggregated site reading
    #[arg(long, short = 'd')]
    pub device: Option<String>,

    /// Switch to real-time mode after the first update
    #[arg(long, short = 'r')]
    pub real_time: bool,

    /// Exit after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Device document URL
    pub url: url::Url,

    /// Field to copy into `value`
    #[arg(long, short = 'f')]
    pub field: Option<String>,
}

#[derive(Debug, Args)]
pub struct ControlArgs {
    /// Site identifier
    pub site: String,

    /// Control name within the site
    pub control: String,

    /// Desired state
    pub state: SwitchState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the resolved configuration (file + environment) as TOML
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
