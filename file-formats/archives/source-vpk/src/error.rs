//! Error types for the VPK library

use std::io;
use thiserror::Error;

/// Result type alias for VPK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for VPK operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported VPK version
    #[error("Unsupported VPK version: {0}")]
    UnsupportedVersion(u32),

    /// Malformed directory tree or header
    #[error("Corrupt VPK directory: {0}")]
    CorruptDirectory(String),

    /// Entry not found in the archive index
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// Stored CRC does not match entry contents
    #[error("Checksum mismatch for {path}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Entry path
        path: String,
        /// CRC recorded in the directory
        expected: u32,
        /// CRC of the actual bytes
        actual: u32,
    },

    /// Replacement payload is larger than the slot it must occupy
    #[error(
        "Size constraint violated for {path}: replacement is {replacement} bytes, slot is {original}"
    )]
    SizeConstraintViolated {
        /// Entry path
        path: String,
        /// Original slot size in bytes
        original: u64,
        /// Replacement payload size in bytes
        replacement: u64,
    },

    /// Invalid glob pattern passed to find
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    /// Create a new CorruptDirectory error
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Error::CorruptDirectory(msg.into())
    }
}
