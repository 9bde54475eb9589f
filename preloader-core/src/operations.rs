//! Install and restore operations
//!
//! Each operation runs as one unit of work: stage the archive set, patch
//! every requested file in the working copy, deploy atomically, and clean
//! up on every exit path. The `spawn_` variants run the whole operation on
//! a single background thread so the caller stays responsive; the caller
//! is responsible for serializing operations against the same archive, and
//! there is no mid-operation cancellation.

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use source_vpk::Vpk;

use crate::manager::BackupManager;
use crate::processor::FileProcessor;
use crate::progress::{ProgressEvent, ProgressSender};
use crate::transform::ContentTransform;
use crate::{Error, Result};

/// Explicit configuration for one operation
///
/// Loaded once at the start of an operation and passed in; the engine never
/// reads process-wide state.
#[derive(Debug, Clone)]
pub struct OperationConfig {
    /// Live game directory holding the archive set
    pub live_dir: PathBuf,
    /// Persistent location for pre-deploy baselines
    pub backup_dir: PathBuf,
    /// Directory-file name of the archive set, relative to `live_dir`
    pub archive_name: String,
}

/// One file to patch during an install
pub struct InstallJob {
    /// Bare filename or full archive path of the target entry
    pub name: String,
    /// Content transform to apply
    pub transform: Box<dyn ContentTransform + Send>,
}

impl std::fmt::Debug for InstallJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallJob")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Outcome of an install operation
///
/// A file whose processing fails is skipped - logged and reported here -
/// without aborting the rest of the operation.
#[derive(Debug, Default)]
pub struct InstallSummary {
    /// Entries successfully patched into the archive
    pub patched: usize,
    /// Entries skipped, with the failure rendered as text
    pub skipped: Vec<(String, String)>,
}

/// Handle to an operation running on a background worker
#[derive(Debug)]
pub struct OperationHandle<T> {
    /// Ordered progress notifications from the worker
    pub events: Receiver<ProgressEvent>,
    handle: JoinHandle<Result<T>>,
}

impl<T> OperationHandle<T> {
    /// Block until the operation finishes and return its outcome
    pub fn wait(self) -> Result<T> {
        self.handle.join().map_err(|_| Error::WorkerPanicked)?
    }
}

/// Entry points for whole install/restore operations
#[derive(Debug)]
pub struct Operations {
    config: OperationConfig,
}

impl Operations {
    /// Create an operations front over an explicit configuration
    pub fn new(config: OperationConfig) -> Self {
        Self { config }
    }

    /// Run a full install synchronously
    ///
    /// Cleanup runs on every exit path; a cleanup failure is logged and
    /// never masks the operation's own result.
    pub fn install(
        &self,
        jobs: Vec<InstallJob>,
        progress: &ProgressSender,
    ) -> Result<InstallSummary> {
        let mut manager = BackupManager::new(&self.config.live_dir, &self.config.backup_dir);
        let result = self.install_with(&mut manager, jobs, progress);
        manager.cleanup();
        result
    }

    fn install_with(
        &self,
        manager: &mut BackupManager,
        jobs: Vec<InstallJob>,
        progress: &ProgressSender,
    ) -> Result<InstallSummary> {
        progress.report(5, "Preparing working copy");
        let working_archive = manager.stage_archive_set(&self.config.archive_name)?;

        let mut vpk = Vpk::open(&working_archive)?;
        let mut summary = InstallSummary::default();
        {
            let mut processor = FileProcessor::new(&mut vpk);
            let total = jobs.len().max(1);
            for (index, mut job) in jobs.into_iter().enumerate() {
                progress.report(
                    (10 + 60 * index / total) as u8,
                    format!("Patching {}", job.name),
                );
                match processor.process(&job.name, job.transform.as_mut(), false) {
                    Ok(()) => summary.patched += 1,
                    Err(err) => {
                        log::warn!("skipping {}: {err}", job.name);
                        summary.skipped.push((job.name, err.to_string()));
                    }
                }
            }
        }
        drop(vpk);

        progress.report(75, "Deploying to game directory");
        manager.deploy()?;

        progress.report(100, "Installation complete");
        Ok(summary)
    }

    /// Run a full restore synchronously, reverting every recorded baseline
    pub fn restore(&self, progress: &ProgressSender) -> Result<usize> {
        let mut manager = BackupManager::new(&self.config.live_dir, &self.config.backup_dir);
        let result = self.restore_with(&mut manager, progress);
        manager.cleanup();
        result
    }

    fn restore_with(
        &self,
        manager: &mut BackupManager,
        progress: &ProgressSender,
    ) -> Result<usize> {
        progress.report(10, "Restoring original files");
        let restored = manager.restore()?;
        progress.report(100, "Restore complete");
        Ok(restored)
    }

    /// Run an install on a background worker
    pub fn spawn_install(
        config: OperationConfig,
        jobs: Vec<InstallJob>,
    ) -> OperationHandle<InstallSummary> {
        let (sender, events) = ProgressSender::channel();
        let handle = thread::spawn(move || Operations::new(config).install(jobs, &sender));
        OperationHandle { events, handle }
    }

    /// Run a restore on a background worker
    pub fn spawn_restore(config: OperationConfig) -> OperationHandle<usize> {
        let (sender, events) = ProgressSender::channel();
        let handle = thread::spawn(move || Operations::new(config).restore(&sender));
        OperationHandle { events, handle }
    }
}
