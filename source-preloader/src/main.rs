//! Main entry point for the source-preloader CLI

mod cli;
mod commands;
mod settings;
mod utils;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set verbosity
    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    // Execute command
    match cli.command {
        Commands::Vpk { command } => commands::vpk::execute(command),
        Commands::Pcf { command } => commands::pcf::execute(command),
        Commands::Install(args) => commands::install::install(args),
        Commands::Restore(args) => commands::install::restore(args),
    }
}
