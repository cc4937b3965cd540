//! CLI argument definitions using clap derive

use crate::config::Config;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// expiring-cache - cross-process expiring cache
///
/// Reads and writes TTL'd entries in named JSON maps that several processes
/// can share safely.
#[derive(Parser, Debug)]
#[command(name = "expiring-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "EXPIRING_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding map files
    #[arg(long, global = true, env = "EXPIRING_CACHE_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Directory holding lock files
    #[arg(long, global = true, env = "EXPIRING_CACHE_LOCK_DIR")]
    pub lock_dir: Option<PathBuf>,

    /// Maximum lock hold time in milliseconds
    #[arg(long, global = true)]
    pub hold_ms: Option<u64>,

    /// Maximum lock wait time in milliseconds
    #[arg(long, global = true)]
    pub wait_ms: Option<u64>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.storage_dir {
            config.storage.dir = dir.clone();
        }
        if let Some(dir) = &self.lock_dir {
            config.lock.dir = Some(dir.clone());
        }
        if let Some(ms) = self.hold_ms {
            config.lock.hold_ms = ms;
        }
        if let Some(ms) = self.wait_ms {
            config.lock.wait_ms = ms;
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a value
    Set(SetArgs),

    /// Print a live value
    Get(KeyArgs),

    /// Print whether a live value exists
    Has(KeyArgs),

    /// Remove a value
    Delete(KeyArgs),

    /// Print when a value expires
    Expires(ExpiresArgs),

    /// List live entries
    List(ListArgs),

    /// Remove every entry
    Clear(StoreArgs),

    /// Evict expired entries now
    Prune(StoreArgs),

    /// Delete a map's backing file
    Purge(StoreArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Selects the persistent map to operate on
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Storage name of the map
    #[arg(short, long, env = "EXPIRING_CACHE_NAME")]
    pub name: Option<String>,
}

/// Arguments for single-key commands
#[derive(Args, Debug)]
pub struct KeyArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Entry key
    pub key: String,
}

/// Arguments for the set command
#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Entry key
    pub key: String,

    /// Value (parsed as JSON, stored as a string otherwise)
    pub value: String,

    /// Time to live in milliseconds (default: from config)
    #[arg(long)]
    pub ttl_ms: Option<u64>,

    /// Never expire, ignoring any configured default
    #[arg(long, conflicts_with = "ttl_ms")]
    pub no_expiry: bool,
}

/// Arguments for the expires command
#[derive(Args, Debug)]
pub struct ExpiresArgs {
    #[command(flatten)]
    pub target: KeyArgs,

    /// Print the deadline as epoch milliseconds (`null` if it never expires)
    #[arg(long)]
    pub epoch_ms: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Keys only, one per line
    Plain,
}
