//! File category dispatch
//!
//! Processing is dispatched over a closed set of categories keyed by file
//! extension: particle files get the structural decode/encode path,
//! recognized plain-text files are transformed as raw bytes, and everything
//! else is rejected up front.

use std::path::Path;

/// Plain-text extensions handled without structural decoding
const PLAIN_TEXT_EXTENSIONS: [&str; 3] = ["vmt", "txt", "res"];

/// Handling category for an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Binary DMX particle file, decoded and re-encoded structurally
    Particle,
    /// Recognized text/config file, transformed as raw bytes
    PlainText,
    /// Anything else; processing fails without touching the archive
    Unsupported,
}

impl FileCategory {
    /// Classify a path by its extension (case-insensitive)
    pub fn from_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("pcf") => FileCategory::Particle,
            Some(ext) if PLAIN_TEXT_EXTENSIONS.contains(&ext) => FileCategory::PlainText,
            _ => FileCategory::Unsupported,
        }
    }
}
