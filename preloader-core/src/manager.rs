//! Working-copy staging, atomic deployment, and restore
//!
//! Install operations never mutate the live game directory directly. The
//! [`BackupManager`] stages copies of the archive set in a scratch
//! directory, patches happen there, and `deploy` moves the finished files
//! into the live location with a temp-then-rename replace so the live
//! directory is never observed half-written. The pre-deploy bytes of every
//! replaced file are captured lazily - first touch only - into the backup
//! set and mirrored to a persistent backup directory, which is what
//! `restore` consumes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use source_vpk::BackupSet;
use tempfile::TempDir;

use crate::{Error, Result};

/// Stages, deploys, and reverts whole-file state for one archive set
#[derive(Debug)]
pub struct BackupManager {
    live_dir: PathBuf,
    backup_dir: PathBuf,
    staging: Option<TempDir>,
    backup: BackupSet,
}

impl BackupManager {
    /// Create a manager for a live directory and a persistent backup location
    pub fn new<L: Into<PathBuf>, B: Into<PathBuf>>(live_dir: L, backup_dir: B) -> Self {
        Self {
            live_dir: live_dir.into(),
            backup_dir: backup_dir.into(),
            staging: None,
            backup: BackupSet::new(),
        }
    }

    /// The live game directory this manager deploys into
    pub fn live_dir(&self) -> &Path {
        &self.live_dir
    }

    /// The working-copy directory, created on first use
    pub fn working_dir(&mut self) -> Result<&Path> {
        if self.staging.is_none() {
            let staging = tempfile::Builder::new()
                .prefix("preloader-staging-")
                .tempdir()?;
            self.staging = Some(staging);
        }
        match &self.staging {
            Some(staging) => Ok(staging.path()),
            None => Err(invalid_input("working copy unavailable")),
        }
    }

    /// Copy one live file into the working copy, returning its staged path
    pub fn stage(&mut self, relative: &str) -> Result<PathBuf> {
        let source = self.live_dir.join(relative);
        let dest = self.working_dir()?.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &dest)?;
        log::debug!("staged {relative}");
        Ok(dest)
    }

    /// Stage a VPK archive set: the directory file plus its numbered chunks
    ///
    /// Returns the staged path of the directory file.
    pub fn stage_archive_set(&mut self, dir_vpk_name: &str) -> Result<PathBuf> {
        let staged_dir_file = self.stage(dir_vpk_name)?;

        let relative = Path::new(dir_vpk_name);
        let file_name = relative
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid_input("archive name has no file name"))?;
        if let Some(prefix) = file_name.strip_suffix("_dir.vpk") {
            let rel_parent = relative.parent().unwrap_or_else(|| Path::new(""));
            let live_parent = self.live_dir.join(rel_parent);
            for entry in fs::read_dir(&live_parent)? {
                let entry = entry?;
                let sibling = entry.file_name();
                let Some(sibling) = sibling.to_str() else {
                    continue;
                };
                if is_chunk_name(sibling, prefix) {
                    let rel = rel_parent.join(sibling);
                    let rel = rel
                        .to_str()
                        .ok_or_else(|| invalid_input("chunk path is not valid UTF-8"))?
                        .to_string();
                    self.stage(&rel)?;
                }
            }
        }

        Ok(staged_dir_file)
    }

    /// Move every staged file into the live directory
    ///
    /// Each file is replaced atomically (temp-then-rename in the target
    /// directory). The pre-deploy live bytes are captured into the backup
    /// set before the first replacement of each path. Returns the number of
    /// deployed files; deploying an empty working copy is a no-op success.
    pub fn deploy(&mut self) -> Result<usize> {
        let Some(staging) = &self.staging else {
            return Ok(0);
        };
        let staging = staging.path().to_path_buf();

        let mut files = Vec::new();
        collect_files(&staging, &staging, &mut files)?;
        files.sort();

        let mut deployed = 0;
        for relative in files {
            let rel_str = relative_string(&relative)?;
            let live = self.live_dir.join(&relative);
            let staged = staging.join(&relative);

            if live.exists() && !self.has_baseline(&rel_str) {
                let bytes = fs::read(&live)?;
                self.write_backup_blob(&rel_str, &bytes)?;
                self.backup.record(rel_str.clone(), bytes);
            }

            if let Some(parent) = live.parent() {
                fs::create_dir_all(parent)?;
            }
            atomic_replace(&staged, &live)?;
            log::info!("deployed {rel_str}");
            deployed += 1;
        }
        Ok(deployed)
    }

    /// Write every preserved baseline back into the live directory
    ///
    /// Consumes both the in-memory backup set and any blobs persisted by an
    /// earlier operation, then clears them. Restoring with nothing recorded
    /// is a no-op success. On failure, not-yet-restored baselines are kept
    /// so a later call can retry.
    pub fn restore(&mut self) -> Result<usize> {
        let mut restored = 0;

        let mut pending = self.backup.drain_sorted().into_iter();
        while let Some((relative, bytes)) = pending.next() {
            if let Err(err) = self.restore_one(&relative, &bytes) {
                self.backup.record(relative, bytes);
                for (path, blob) in pending {
                    self.backup.record(path, blob);
                }
                return Err(err);
            }
            restored += 1;
        }

        if self.backup_dir.exists() {
            let mut blobs = Vec::new();
            collect_files(&self.backup_dir, &self.backup_dir, &mut blobs)?;
            blobs.sort();
            for relative in blobs {
                let rel_str = relative_string(&relative)?;
                let bytes = fs::read(self.backup_dir.join(&relative))?;
                self.restore_one(&rel_str, &bytes)?;
                restored += 1;
            }
        }

        Ok(restored)
    }

    /// Remove temporary/working state
    ///
    /// Best-effort: failures are logged, never escalated, so cleanup can
    /// run unconditionally at the end of every operation.
    pub fn cleanup(&mut self) {
        if let Some(staging) = self.staging.take() {
            if let Err(err) = staging.close() {
                log::warn!("cleanup: could not remove working copy: {err}");
            }
        }
        if self.backup_dir.exists() {
            prune_empty_dirs(&self.backup_dir);
        }
    }

    /// Whether a baseline for this path is already captured
    fn has_baseline(&self, relative: &str) -> bool {
        self.backup.contains(relative) || self.backup_dir.join(relative).exists()
    }

    fn write_backup_blob(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let dest = self.backup_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, bytes)?;
        Ok(())
    }

    fn restore_one(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let live = self.live_dir.join(relative);
        if let Some(parent) = live.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&live, bytes)?;
        log::info!("restored {relative}");

        let blob = self.backup_dir.join(relative);
        if blob.exists() {
            if let Err(err) = fs::remove_file(&blob) {
                log::warn!("could not remove backup blob {}: {err}", blob.display());
            }
        }
        Ok(())
    }
}

/// Replace `dest` with the contents of `source` via temp-then-rename
fn atomic_replace(source: &Path, dest: &Path) -> Result<()> {
    let staged = fs::read(source)?;
    atomic_write(dest, &staged)
}

/// Write `bytes` to `dest` via a temp file in the same directory
///
/// The temp file stays on the destination filesystem, so the final rename
/// is atomic; on rename failure the temp file is removed and `dest` is
/// untouched.
fn atomic_write(dest: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| invalid_input("destination has no file name"))?;
    let tmp = dest.with_file_name(format!(".{file_name}.deploy-tmp"));
    fs::write(&tmp, bytes)?;
    if let Err(err) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

/// Collect files under `dir`, as paths relative to `root`
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .map_err(|_| invalid_input("file escapes its root directory"))?;
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

/// Convert a relative path to a UTF-8 string
fn relative_string(relative: &Path) -> Result<String> {
    relative
        .to_str()
        .ok_or_else(|| invalid_input("path is not valid UTF-8"))
        .map(str::to_string)
}

/// Remove now-empty directories bottom-up; errors are ignored
fn prune_empty_dirs(dir: &Path) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                prune_empty_dirs(&entry.path());
            }
        }
    }
    let _ = fs::remove_dir(dir);
}

/// Matches `<prefix>_NNN.vpk` chunk file names
fn is_chunk_name(file_name: &str, prefix: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(prefix) else {
        return false;
    };
    let Some(digits) = rest.strip_prefix('_').and_then(|r| r.strip_suffix(".vpk")) else {
        return false;
    };
    !digits.is_empty() && digits != "dir" && digits.bytes().all(|b| b.is_ascii_digit())
}

fn invalid_input(msg: &str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::InvalidInput, msg))
}
