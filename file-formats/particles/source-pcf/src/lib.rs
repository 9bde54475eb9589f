//! # source_pcf - PCF Particle File Codec
//!
//! A safe Rust decoder/encoder for the PCF particle-effect format used by
//! Source engine games. PCF is an encoding profile of the DMX family: a
//! versioned, typed, element/attribute binary graph format.
//!
//! ## Features
//!
//! - All six recognized DMX/PCF header versions (binary 2-5)
//! - Full 28-entry attribute type table (12 scalar kinds + 12 array kinds,
//!   element references and reference arrays)
//! - Arena-based element graph: references are indices, so self-references
//!   and cycles decode and re-encode without recursion
//! - Deterministic encoding - the same document always produces identical
//!   bytes, which downstream in-place archive patching depends on
//!
//! ## Examples
//!
//! ```
//! use source_pcf::{AttributeValue, Document, Element, PcfVersion};
//!
//! # fn main() -> Result<(), source_pcf::Error> {
//! let mut doc = Document::new(PcfVersion::Binary4Pcf2);
//! let mut system = Element::new("DmeParticleSystemDefinition", "explosion_core");
//! system.set_attribute("max_particles", AttributeValue::Integer(512));
//! let index = doc.push_element(system);
//!
//! let bytes = doc.encode()?;
//! let round_tripped = Document::decode(&bytes)?;
//! assert_eq!(round_tripped.element(index).unwrap().name(), "explosion_core");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod attribute;
pub mod document;
pub mod error;
mod io;
mod reader;
pub mod version;
mod writer;

pub use attribute::{AttributeType, AttributeValue, NULL_ELEMENT, Time};
pub use document::{Attribute, Document, Element};
pub use error::{Error, Result};
pub use version::PcfVersion;
