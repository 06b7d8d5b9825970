//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::util::parse_key_val;

/// Drive libguestfs tools and persistent guestfish sessions
#[derive(Parser)]
#[command(name = "guestshell")]
#[command(author, version, about = "Persistent guestfish sessions and libguestfs tools")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "GUESTSHELL_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run inner commands through one persistent guestfish session
    #[command(about = "Open a guestfish session and run inner commands in order")]
    Shell(ShellArgs),

    /// Run a supported libguestfs tool
    #[command(about = "Run a supported libguestfs tool with raw arguments")]
    Run {
        /// Tool name, e.g. virt-df
        tool: String,

        /// Arguments passed to the tool unchanged
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Fail when the tool exits with a non-zero status
        #[arg(long)]
        strict: bool,
    },

    /// Print a file from a disk image or domain
    #[command(about = "Print a guest file with virt-cat")]
    Cat {
        /// Disk image path or libvirt domain name
        target: String,

        /// Guest file path
        path: String,
    },

    /// List a guest directory
    #[command(about = "List a guest directory with virt-ls")]
    Ls {
        /// Disk image path or libvirt domain name
        target: String,

        /// Guest directory
        #[arg(default_value = "/")]
        path: String,

        /// libvirt connection URI
        #[arg(long)]
        uri: Option<String>,

        /// Long listing
        #[arg(short, long)]
        long: bool,

        /// Recurse into subdirectories
        #[arg(short = 'R', long)]
        recursive: bool,
    },

    /// Show filesystem usage
    #[command(about = "Show guest filesystem usage with virt-df")]
    Df {
        /// Disk image path or libvirt domain name
        target: String,
    },

    /// Report installed libguestfs tools
    #[command(about = "Detect installed libguestfs tools and their versions")]
    Detect {
        /// Output format
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completions")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options of the `shell` command
#[derive(Args)]
pub struct ShellArgs {
    /// Disk image to add (`-a`)
    #[arg(short = 'a', long, conflicts_with = "domain")]
    pub disk: Option<String>,

    /// libvirt domain to add (`-d`)
    #[arg(short = 'd', long)]
    pub domain: Option<String>,

    /// Open drives read-only
    #[arg(long)]
    pub ro: bool,

    /// Inspect the guest and mount its filesystems
    #[arg(short = 'i', long)]
    pub inspector: bool,

    /// libvirt connection URI
    #[arg(long)]
    pub uri: Option<String>,

    /// Mount specification, e.g. /dev/sda1:/
    #[arg(long)]
    pub mount: Option<String>,

    /// Use a `--listen` server instead of an interactive process
    #[arg(long)]
    pub remote: bool,

    /// Attach to an existing remote session id
    #[arg(long, value_name = "ID")]
    pub attach: Option<u32>,

    /// guestfish executable
    #[arg(long, value_name = "PATH")]
    pub guestfish: Option<String>,

    /// Per-command timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Stop at the first command that reports an error
    #[arg(long)]
    pub strict: bool,

    /// Extra environment for guestfish (KEY=value)
    #[arg(long = "env", value_parser = parse_key_val, value_name = "KEY=VALUE")]
    pub env: Vec<(String, String)>,

    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Inner commands; read from stdin when none are given
    pub commands: Vec<String>,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain output
    #[default]
    Text,
    /// One JSON document
    Json,
}
