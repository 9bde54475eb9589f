//! # source_vpk - VPK Archive Library
//!
//! A safe Rust reader and in-place patcher for the VPK packed-asset format
//! used by Source engine games.
//!
//! ## Features
//!
//! - VPK versions 1 and 2
//! - Directory-tree indexing (per-entry CRC, preload length, backing chunk,
//!   offset, length)
//! - Glob-style path lookup with deterministic ordering
//! - Entry extraction with CRC verification
//! - In-place entry replacement under a strict non-growth invariant - no
//!   full-archive rewrite, untouched entries keep their exact bytes
//! - Entry-level backup capture and restore
//!
//! ## Examples
//!
//! ```no_run
//! use source_vpk::Vpk;
//!
//! # fn main() -> Result<(), source_vpk::Error> {
//! let mut archive = Vpk::open("tf2_misc_dir.vpk")?;
//!
//! for path in archive.find("particles/*.pcf")? {
//!     println!("{path}");
//! }
//!
//! let original = archive.read_file("particles/rockettrail.pcf")?;
//! archive.patch("particles/rockettrail.pcf", &original, true)?;
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

pub mod archive;
pub mod backup;
pub mod builder;
pub mod entry;
pub mod error;
pub mod path;

pub use archive::{VPK_SIGNATURE, Vpk};
pub use backup::BackupSet;
pub use builder::VpkBuilder;
pub use entry::{DIR_INDEX, VpkEntry};
pub use error::{Error, Result};
