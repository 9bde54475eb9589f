//! Error types for the PCF codec

use std::io;
use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for PCF decode/encode operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Header line does not match any recognized DMX/PCF version
    #[error("Unsupported PCF version: {0:?}")]
    UnsupportedVersion(String),

    /// Truncated or structurally invalid binary stream
    #[error("Malformed PCF stream: {0}")]
    MalformedStream(String),

    /// Attribute type tag not in the recognized table
    #[error("Unknown attribute type: 0x{0:02X}")]
    UnknownAttributeType(u8),

    /// Element reference points outside the document
    #[error("Dangling element reference: index {index} out of range for {element_count} elements")]
    DanglingReference {
        /// The out-of-range index stored in the stream
        index: u32,
        /// Number of elements the document declares
        element_count: usize,
    },
}

impl Error {
    /// Create a new MalformedStream error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedStream(msg.into())
    }
}
