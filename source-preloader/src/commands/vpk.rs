//! VPK archive command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

use source_vpk::Vpk;

#[derive(Subcommand)]
pub enum VpkCommands {
    /// List files in a VPK archive
    List {
        /// Path to the VPK directory file
        archive: String,

        /// Show detailed information (size, checksum, backing chunk)
        #[arg(short, long)]
        long: bool,

        /// Filter files by glob pattern
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Extract files from a VPK archive
    Extract {
        /// Path to the VPK directory file
        archive: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: String,

        /// Specific files to extract (extracts all if not specified)
        files: Vec<String>,
    },

    /// Show information about a VPK archive
    Info {
        /// Path to the VPK directory file
        archive: String,
    },
}

pub fn execute(command: VpkCommands) -> Result<()> {
    match command {
        VpkCommands::List {
            archive,
            long,
            filter,
        } => list(&archive, long, filter.as_deref()),
        VpkCommands::Extract {
            archive,
            output,
            files,
        } => extract(&archive, &output, &files),
        VpkCommands::Info { archive } => info(&archive),
    }
}

fn list(archive: &str, long: bool, filter: Option<&str>) -> Result<()> {
    let vpk = Vpk::open(archive).with_context(|| format!("failed to open {archive}"))?;

    let paths = match filter {
        Some(pattern) => vpk.find(pattern)?,
        None => vpk.paths().map(String::from).collect(),
    };

    for path in &paths {
        if long {
            let entry = vpk.entry(path)?;
            let chunk = if entry.is_embedded() {
                "dir".to_string()
            } else {
                format!("{:03}", entry.archive_index)
            };
            println!(
                "{:>10}  {:08x}  {chunk:>4}  {path}",
                entry.total_length(),
                entry.crc
            );
        } else {
            println!("{path}");
        }
    }
    println!("{} files", paths.len());
    Ok(())
}

fn extract(archive: &str, output: &str, files: &[String]) -> Result<()> {
    let vpk = Vpk::open(archive).with_context(|| format!("failed to open {archive}"))?;

    let targets: Vec<String> = if files.is_empty() {
        vpk.paths().map(String::from).collect()
    } else {
        files.to_vec()
    };

    for path in &targets {
        let destination = Path::new(output).join(path);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        vpk.extract(path, &destination)
            .with_context(|| format!("failed to extract {path}"))?;
        println!("{path} -> {}", destination.display());
    }
    println!("{} files extracted", targets.len());
    Ok(())
}

fn info(archive: &str) -> Result<()> {
    let vpk = Vpk::open(archive).with_context(|| format!("failed to open {archive}"))?;

    let total_bytes: u64 = vpk
        .paths()
        .filter_map(|p| vpk.entry(p).ok())
        .map(|e| e.total_length())
        .sum();

    println!("Archive:  {}", vpk.path().display());
    println!("Version:  {}", vpk.version());
    println!("Entries:  {}", vpk.entry_count());
    println!("Content:  {total_bytes} bytes");
    Ok(())
}
