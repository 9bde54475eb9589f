//! Error types for install/restore operations

use std::io;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for install/restore operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Particle codec failure
    #[error("Particle format error: {0}")]
    Format(#[from] source_pcf::Error),

    /// Archive handler failure
    #[error("Archive error: {0}")]
    Archive(#[from] source_vpk::Error),

    /// File extension outside the handled categories
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Re-encoded payload larger than the slot it must occupy
    #[error("{name}: re-encoded payload is {encoded} bytes, slot is {slot}")]
    SizeConstraint {
        /// Archive entry being processed
        name: String,
        /// Slot size the entry occupies
        slot: u64,
        /// Size the transform produced
        encoded: u64,
    },

    /// Background worker terminated abnormally
    #[error("Operation worker panicked")]
    WorkerPanicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedFileType("scripts/soundscapes.vsc".to_string());
        assert_eq!(
            err.to_string(),
            "Unsupported file type: scripts/soundscapes.vsc"
        );

        let err = Error::SizeConstraint {
            name: "particles/foo.pcf".to_string(),
            slot: 1024,
            encoded: 1100,
        };
        assert!(err.to_string().contains("1100 bytes"));
    }

    #[test]
    fn test_wrapping() {
        let err: Error = source_pcf::Error::UnknownAttributeType(0x99).into();
        assert!(matches!(err, Error::Format(_)));

        let err: Error = source_vpk::Error::EntryNotFound("x".to_string()).into();
        assert!(matches!(err, Error::Archive(_)));
    }
}
