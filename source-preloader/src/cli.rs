//! Root CLI structure for source-preloader

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "source-preloader")]
#[command(about = "Install and remove particle-effect mods inside VPK archives", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// VPK archive operations
    Vpk {
        #[command(subcommand)]
        command: crate::commands::vpk::VpkCommands,
    },

    /// PCF particle file operations
    Pcf {
        #[command(subcommand)]
        command: crate::commands::pcf::PcfCommands,
    },

    /// Install replacement particle files into a game directory
    Install(crate::commands::install::InstallArgs),

    /// Revert a previous install from its backup set
    Restore(crate::commands::install::RestoreArgs),
}
