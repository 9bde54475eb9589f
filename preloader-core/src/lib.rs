//! # preloader_core - Install/Restore Engine
//!
//! The engine behind installing and removing particle-effect mods inside a
//! game's packed VPK archives. It wires the [`source_pcf`] codec and the
//! [`source_vpk`] archive handler into a safe
//! decode -> transform -> re-encode -> patch-in-place pipeline with
//! backup/restore semantics, so a destructive operation on a user's game
//! installation can always be undone.
//!
//! ## Pipeline
//!
//! For each file, [`FileProcessor`] extracts the entry to a scratch file,
//! dispatches on its [`FileCategory`], applies the caller's
//! [`ContentTransform`], reconciles the re-encoded size against the entry's
//! slot (padding deterministically, never growing), and patches the result
//! back. [`BackupManager`] stages a working copy of the archive set,
//! deploys it atomically, and reverts on demand. [`Operations`] runs whole
//! installs/restores on a background worker that reports
//! [`ProgressEvent`]s.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod category;
pub mod error;
pub mod manager;
pub mod operations;
pub mod processor;
pub mod progress;
pub mod transform;

pub use category::FileCategory;
pub use error::{Error, Result};
pub use manager::BackupManager;
pub use operations::{
    InstallJob, InstallSummary, OperationConfig, OperationHandle, Operations,
};
pub use processor::{FileProcessor, PAD_BYTE};
pub use progress::{ProgressEvent, ProgressSender};
pub use transform::{ContentTransform, DocumentFn, IdentityTransform};
