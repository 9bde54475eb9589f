//! Single-file processing pipeline
//!
//! [`FileProcessor::process`] drives one archive entry through
//! extract -> decode -> transform -> encode -> size-reconcile -> patch.
//! The scratch file lives in a [`tempfile::NamedTempFile`], so it is
//! removed on every exit path. If anything fails after extraction the
//! archive entry is left exactly as it was: either `patch` is never
//! reached, or `patch` itself rejects without mutating.

use std::cmp::Ordering;
use std::fs;

use source_pcf::Document;
use source_vpk::Vpk;

use crate::category::FileCategory;
use crate::transform::ContentTransform;
use crate::{Error, Result};

/// Deterministic filler byte used when padding a shrunk re-encoding
pub const PAD_BYTE: u8 = b' ';

/// Processes individual archive entries through the transform pipeline
#[derive(Debug)]
pub struct FileProcessor<'a> {
    vpk: &'a mut Vpk,
}

impl<'a> FileProcessor<'a> {
    /// Create a processor over an opened archive
    pub fn new(vpk: &'a mut Vpk) -> Self {
        Self { vpk }
    }

    /// Process one entry and patch the result back into the archive
    ///
    /// `name` may be a bare filename, which is resolved against the index.
    /// The transform method used is picked by the entry's file category.
    pub fn process(
        &mut self,
        name: &str,
        transform: &mut dyn ContentTransform,
        make_backup: bool,
    ) -> Result<()> {
        let path = self.vpk.resolve_name(name)?;
        let slot = self.vpk.entry(&path)?.total_length();

        // Scratch extraction; the temp file is cleaned up when this guard
        // drops, success or failure
        let scratch = tempfile::NamedTempFile::new()?;
        self.vpk.extract(&path, scratch.path())?;

        let new_data = match FileCategory::from_path(&path) {
            FileCategory::Particle => {
                let raw = fs::read(scratch.path())?;
                let document = Document::decode(&raw)?;
                let transformed = transform.apply_document(document)?;
                let mut encoded = transformed.encode()?;
                reconcile_size(&path, &mut encoded, slot)?;
                encoded
            }
            FileCategory::PlainText => {
                let raw = fs::read(scratch.path())?;
                transform.apply_bytes(raw)?
            }
            FileCategory::Unsupported => {
                return Err(Error::UnsupportedFileType(path));
            }
        };

        self.vpk.patch(&path, &new_data, make_backup)?;
        log::info!("processed {path}");
        Ok(())
    }
}

/// Bring a re-encoded particle stream to exactly `slot` bytes
///
/// Filler bytes are inserted immediately before the final byte of the
/// stream, so the format's terminal byte stays last. A larger encoding is
/// never truncated; the overage is logged and reported as a failure.
fn reconcile_size(path: &str, encoded: &mut Vec<u8>, slot: u64) -> Result<()> {
    let len = encoded.len() as u64;
    match len.cmp(&slot) {
        Ordering::Equal => Ok(()),
        Ordering::Less => {
            if encoded.is_empty() {
                return Err(Error::Format(source_pcf::Error::malformed(
                    "cannot pad an empty stream",
                )));
            }
            let padding = (slot - len) as usize;
            log::info!("{path}: padding re-encoded output with {padding} filler bytes");
            let insert_at = encoded.len() - 1;
            encoded.splice(insert_at..insert_at, std::iter::repeat(PAD_BYTE).take(padding));
            Ok(())
        }
        Ordering::Greater => {
            log::error!(
                "{path}: re-encoded output is {} bytes larger than its {slot}-byte slot",
                len - slot
            );
            Err(Error::SizeConstraint {
                name: path.to_string(),
                slot,
                encoded: len,
            })
        }
    }
}
