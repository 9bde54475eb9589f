//! The external transform seam
//!
//! The semantic content transform (which effects to merge, what to replace)
//! is policy owned by the caller. The engine only defines the contract:
//! one method per file category, both defaulting to identity, dispatched by
//! [`FileCategory`](crate::FileCategory).

use source_pcf::Document;

use crate::Result;

/// A content transform supplied by an external policy component
pub trait ContentTransform {
    /// Transform a decoded particle document
    fn apply_document(&mut self, document: Document) -> Result<Document> {
        Ok(document)
    }

    /// Transform a plain-text entry's raw bytes
    fn apply_bytes(&mut self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        Ok(bytes)
    }
}

/// Transform that leaves content untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl ContentTransform for IdentityTransform {}

/// Adapter turning a closure over documents into a [`ContentTransform`]
pub struct DocumentFn<F>(pub F);

impl<F> ContentTransform for DocumentFn<F>
where
    F: FnMut(Document) -> Result<Document>,
{
    fn apply_document(&mut self, document: Document) -> Result<Document> {
        (self.0)(document)
    }
}

impl<F> std::fmt::Debug for DocumentFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFn").finish_non_exhaustive()
    }
}
