//! Install and restore command implementations
//!
//! The install command's replacement policy is deliberately simple: each
//! `.pcf` file in the mods directory replaces the archive entry with the
//! same file name, re-tagged to the target entry's format version. Anything
//! smarter (merging individual effects, conflict resolution) plugs in
//! through the same `ContentTransform` seam.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use preloader_core::{
    ContentTransform, InstallJob, OperationConfig, OperationHandle, Operations,
};
use source_pcf::Document;

use crate::settings::Settings;
use crate::utils::create_progress_bar;

/// Directory where pre-deploy baselines are preserved
const BACKUP_DIR: &str = "preloader-backup";

#[derive(Args)]
pub struct InstallArgs {
    /// Game directory containing the archive set (defaults to the last used)
    #[arg(long)]
    pub game_dir: Option<PathBuf>,

    /// Directory-file name of the target archive, relative to the game dir
    #[arg(long, default_value = "tf2_misc_dir.vpk")]
    pub archive: String,

    /// Directory of replacement .pcf files
    #[arg(long)]
    pub mods_dir: PathBuf,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Game directory containing the archive set (defaults to the last used)
    #[arg(long)]
    pub game_dir: Option<PathBuf>,
}

/// Replaces the target document with one decoded from a file on disk
struct ReplaceWithFile {
    source: PathBuf,
}

impl ContentTransform for ReplaceWithFile {
    fn apply_document(&mut self, original: Document) -> preloader_core::Result<Document> {
        let raw = fs::read(&self.source)?;
        let mut replacement = Document::decode(&raw)?;
        // Keep the slot owner's version tag so the engine parses the
        // patched entry the same way it parsed the original
        replacement.set_version(original.version());
        Ok(replacement)
    }
}

pub fn install(args: InstallArgs) -> Result<()> {
    let mut settings = Settings::load();
    let game_dir = resolve_game_dir(args.game_dir, &settings)?;
    settings.last_directory = game_dir.display().to_string();
    settings.save();

    let jobs = collect_jobs(&args.mods_dir)?;
    if jobs.is_empty() {
        bail!("no .pcf files found in {}", args.mods_dir.display());
    }
    println!(
        "Installing {} particle files into {}",
        jobs.len(),
        game_dir.join(&args.archive).display()
    );

    let config = OperationConfig {
        live_dir: game_dir,
        backup_dir: PathBuf::from(BACKUP_DIR),
        archive_name: args.archive,
    };
    let summary = drive("Installing", Operations::spawn_install(config, jobs))?;

    println!("Patched {} files", summary.patched);
    for (name, reason) in &summary.skipped {
        println!("Skipped {name}: {reason}");
    }
    Ok(())
}

pub fn restore(args: RestoreArgs) -> Result<()> {
    let settings = Settings::load();
    let game_dir = resolve_game_dir(args.game_dir, &settings)?;

    let config = OperationConfig {
        live_dir: game_dir,
        backup_dir: PathBuf::from(BACKUP_DIR),
        archive_name: String::new(),
    };
    let restored = drive("Restoring", Operations::spawn_restore(config))?;

    if restored == 0 {
        println!("Nothing to restore");
    } else {
        println!("Restored {restored} files");
    }
    Ok(())
}

/// Consume a worker's progress events on a bar, then return its outcome
fn drive<T>(label: &str, handle: OperationHandle<T>) -> Result<T> {
    let bar = create_progress_bar(100, label);
    for event in &handle.events {
        bar.set_position(u64::from(event.percent));
        bar.set_message(event.message);
    }
    let outcome = handle.wait();
    match &outcome {
        Ok(_) => bar.finish_with_message("done"),
        Err(_) => bar.abandon_with_message("failed"),
    }
    outcome.context("operation failed")
}

fn resolve_game_dir(explicit: Option<PathBuf>, settings: &Settings) -> Result<PathBuf> {
    let game_dir = match explicit {
        Some(dir) => dir,
        None if !settings.last_directory.is_empty() => PathBuf::from(&settings.last_directory),
        None => bail!("no game directory given and none remembered; pass --game-dir"),
    };
    if !game_dir.is_dir() {
        bail!("game directory {} does not exist", game_dir.display());
    }
    Ok(game_dir)
}

/// One install job per .pcf file in the mods directory
fn collect_jobs(mods_dir: &Path) -> Result<Vec<InstallJob>> {
    let mut jobs = Vec::new();
    for entry in fs::read_dir(mods_dir)
        .with_context(|| format!("failed to read mods directory {}", mods_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let is_pcf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pcf"));
        if !is_pcf {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        jobs.push(InstallJob {
            name: name.to_string(),
            transform: Box::new(ReplaceWithFile {
                source: path.clone(),
            }),
        });
    }
    jobs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(jobs)
}
