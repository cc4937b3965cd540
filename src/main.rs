//! expiring-cache CLI
//!
//! Entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use expiring_cache::cli::{commands, Cli, Commands};
use expiring_cache::config::{Config, ConfigManager};
use expiring_cache::error::CacheResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let mut config = config_manager.load()?;
    cli.apply_overrides(&mut config);

    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Set(args) => commands::entry::set(args, &config),
        Commands::Get(args) => commands::entry::get(args, &config),
        Commands::Has(args) => commands::entry::has(args, &config),
        Commands::Delete(args) => commands::entry::delete(args, &config),
        Commands::Expires(args) => commands::entry::expires(args, &config),
        Commands::List(args) => commands::list(args, &config),
        Commands::Clear(args) => commands::storage::clear(args, &config),
        Commands::Prune(args) => commands::storage::prune(args, &config),
        Commands::Purge(args) => commands::storage::purge(args, &config),
        Commands::Config(args) => commands::config(args, &config, &config_manager),
    }
}

/// 0 = warn, 1 = info, 2+ = debug; JSON lines when configured
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("expiring_cache=warn"),
        1 => EnvFilter::new("expiring_cache=info"),
        _ => EnvFilter::new("expiring_cache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
