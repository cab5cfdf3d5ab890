//! Clap derive structures for the `satnms` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use satnms_core::DeviceTransport;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// satnms -- drive a satellite NMS and its UHP modems
#[derive(Debug, Parser)]
#[command(
    name = "satnms",
    version,
    about = "Configure a satellite NMS and UHP modems from the command line",
    long_about = "Create and update NMS objects, wait for them to converge, manage \
        configuration snapshots, and talk to UHP modems directly over HTTP or Telnet.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "SATNMS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// NMS URL (overrides profile)
    #[arg(long, short = 'n', env = "SATNMS_NMS", global = true)]
    pub nms: Option<String>,

    /// NMS username (overrides profile)
    #[arg(long, short = 'u', env = "SATNMS_USERNAME", global = true)]
    pub username: Option<String>,

    /// NMS password
    #[arg(long, env = "SATNMS_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SATNMS_OUTPUT",
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

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SATNMS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SATNMS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Convergence poll interval in milliseconds
    #[arg(long, env = "SATNMS_POLL_INTERVAL_MS", global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Local snapshot directory
    #[arg(long, env = "SATNMS_SNAPSHOT_DIR", global = true)]
    pub snapshot_dir: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
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
    /// Create, update and read NMS objects
    #[command(alias = "obj")]
    Object(ObjectArgs),

    /// Wait for objects or the NMS to converge
    Wait(WaitArgs),

    /// Save and restore full NMS configurations
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// Inspect and translate enumerated parameter values
    Enums(EnumsArgs),

    /// Decode and encode fault bitmasks
    Faults(FaultsArgs),

    /// Talk to a UHP modem directly
    #[command(alias = "dev")]
    Device(DeviceArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Objects ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ObjectArgs {
    #[command(subcommand)]
    pub command: ObjectCommand,
}

#[derive(Debug, Subcommand)]
pub enum ObjectCommand {
    /// Create an object and print its handle
    Create {
        /// Object type (e.g. network, teleport, controller, station)
        kind: String,

        /// Parent handle (`type:index`); top level when omitted
        #[arg(long)]
        parent: Option<String>,

        /// Parameter as KEY=VALUE; VALUE is parsed as JSON when possible
        #[arg(long = "param", short = 'P', value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Parameters from a JSON object file
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,

        /// First free index of this type on the NMS
        #[arg(long)]
        index: Option<u32>,
    },

    /// Write changed parameters of an object
    Update {
        /// Object handle (`type:index`)
        handle: String,

        #[arg(long = "param", short = 'P', value_name = "KEY=VALUE")]
        params: Vec<String>,

        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Read an object from the NMS
    Get {
        handle: String,

        /// Print a single parameter
        #[arg(long, short = 'f')]
        field: Option<String>,
    },
}

// ── Waits ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WaitArgs {
    #[command(subcommand)]
    pub command: WaitCommand,
}

/// How long a wait may take before it counts as not converged.
#[derive(Debug, Args)]
pub struct WaitFor {
    /// Maximum time to wait (e.g. 30s, 2m)
    #[arg(long = "for", value_name = "DURATION", default_value = "60s")]
    pub within: humantime::Duration,
}

#[derive(Debug, Subcommand)]
pub enum WaitCommand {
    /// Wait until an object is Up
    Up {
        handle: String,
        #[command(flatten)]
        wait: WaitFor,
    },

    /// Wait until an object reports a state
    State {
        handle: String,
        /// Object state label or code
        state: String,
        #[command(flatten)]
        wait: WaitFor,
    },

    /// Wait until an object leaves a state
    NotState {
        handle: String,
        state: String,
        #[command(flatten)]
        wait: WaitFor,
    },

    /// Wait for configuration cycles of the NMS
    Ticks {
        /// Number of cycles
        #[arg(default_value = "1")]
        count: u64,
    },

    /// Wait until an object's faults match
    Faults {
        handle: String,

        /// Expected fault names, comma separated; empty for none
        #[arg(value_delimiter = ',')]
        faults: Vec<String>,

        /// Require exactly these faults instead of at least these
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        wait: WaitFor,
    },
}

// ── Snapshots ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Capture the current configuration
    Create {
        name: String,

        /// Store in the local snapshot directory instead of on the NMS
        #[arg(long)]
        local: bool,
    },

    /// Replace the current configuration with a snapshot
    Apply {
        name: String,

        #[arg(long)]
        local: bool,
    },

    /// List local snapshots
    #[command(alias = "ls")]
    List,
}

// ── Enums ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EnumsArgs {
    #[command(subcommand)]
    pub command: EnumsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EnumsCommand {
    /// List families, or the members of one family
    #[command(alias = "ls")]
    List {
        family: Option<String>,

        /// Include deprecated members
        #[arg(long)]
        all: bool,
    },

    /// Translate a value between its code and its label
    Translate {
        family: String,
        value: String,

        #[arg(long, value_enum, default_value = "label")]
        to: TranslateTo,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TranslateTo {
    Label,
    Code,
}

// ── Faults ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FaultsArgs {
    #[command(subcommand)]
    pub command: FaultsCommand,
}

#[derive(Debug, Subcommand)]
pub enum FaultsCommand {
    /// Decode a bitmask (decimal or 0x-prefixed hex)
    Decode { value: String },

    /// Encode fault names into a bitmask
    Encode {
        #[arg(value_delimiter = ',')]
        names: Vec<String>,
    },
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

/// A modem named in the profile, or given inline.
#[derive(Debug, Args)]
pub struct DeviceTarget {
    /// Device name from the profile's `devices` table
    pub name: Option<String>,

    /// Modem address (`host` or `host:port`)
    #[arg(long, conflicts_with = "name", requires = "model")]
    pub address: Option<String>,

    /// Hardware model, e.g. UHP-200
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, value_enum, default_value = "http")]
    pub transport: TransportArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransportArg {
    Http,
    Telnet,
}

impl From<TransportArg> for DeviceTransport {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Http => Self::Http,
            TransportArg::Telnet => Self::Telnet,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Show the modem's operating state
    State(DeviceTarget),

    /// Show model, serial, software, state and faults
    Overview(DeviceTarget),

    /// Reboot the modem
    Reboot(DeviceTarget),

    /// Ping from the modem
    Ping {
        #[command(flatten)]
        target: DeviceTarget,

        /// Address to ping
        #[arg(long)]
        to: Ipv4Addr,

        #[arg(long, default_value = "5")]
        count: u32,

        #[arg(long, default_value = "64")]
        size: u16,
    },

    /// Configure the modem as a star remote
    Star {
        #[command(flatten)]
        target: DeviceTarget,

        /// Receive frequency in kHz
        #[arg(long)]
        rx_frequency: u64,

        /// Receive symbol rate in ksps
        #[arg(long)]
        rx_symbol_rate: u32,

        #[arg(long)]
        tx_frequency: u64,

        #[arg(long)]
        tx_symbol_rate: u32,
    },

    /// Set the NMS access level on the modem
    Access {
        #[command(flatten)]
        target: DeviceTarget,

        /// Access level label (e.g. full, read_only)
        level: String,
    },

    /// Replace and run the modem's network script
    Script {
        #[command(flatten)]
        target: DeviceTarget,

        /// File with one command per line
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration, secrets redacted
    Show,

    /// Print the config file path
    Path,

    /// Store the profile's NMS password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
