//! Creating new VPK archives
//!
//! [`VpkBuilder`] writes a fresh version 1 archive with all data embedded
//! in the directory file. This is how custom content gets packed, and how
//! the test suite fabricates archives without game data fixtures.

use std::collections::BTreeMap;
use std::path::Path;

use crate::archive::{ENTRY_TERMINATOR, VPK_SIGNATURE};
use crate::entry::DIR_INDEX;
use crate::path::normalize_vpk_path;
use crate::{Error, Result};

/// Placeholder for an empty directory or extension level
const EMPTY_LEVEL: &str = " ";

/// Builder for a new single-file VPK archive
///
/// # Examples
///
/// ```no_run
/// use source_vpk::VpkBuilder;
///
/// # fn main() -> Result<(), source_vpk::Error> {
/// VpkBuilder::new()
///     .add_file_data(b"content".to_vec(), "particles/burning.pcf")
///     .add_file_data(b"\"VertexLitGeneric\" {}\n".to_vec(), "materials/drop.vmt")
///     .build("custom.vpk")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct VpkBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl VpkBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file from memory under the given archive path
    pub fn add_file_data<S: AsRef<str>>(mut self, data: Vec<u8>, path: S) -> Self {
        self.files.push((normalize_vpk_path(path.as_ref()), data));
        self
    }

    /// Write the archive to disk
    pub fn build<P: AsRef<Path>>(self, path: P) -> Result<()> {
        // Group by extension, then directory, then file name; BTreeMap
        // ordering makes the tree layout deterministic
        let mut grouped: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<u8>>>> =
            BTreeMap::new();
        for (file_path, data) in self.files {
            let (extension, directory, name) = split_path(&file_path)?;
            let slot = grouped
                .entry(extension)
                .or_default()
                .entry(directory)
                .or_default();
            if slot.insert(name, data).is_some() {
                return Err(Error::corrupt(format!("duplicate entry path {file_path}")));
            }
        }

        let mut tree = Vec::new();
        let mut data_section: Vec<u8> = Vec::new();
        for (extension, directories) in &grouped {
            write_cstring(&mut tree, extension);
            for (directory, files) in directories {
                write_cstring(&mut tree, directory);
                for (name, data) in files {
                    write_cstring(&mut tree, name);

                    let mut hasher = crc32fast::Hasher::new();
                    hasher.update(data);
                    tree.extend_from_slice(&hasher.finalize().to_le_bytes());
                    tree.extend_from_slice(&0u16.to_le_bytes()); // preload length
                    tree.extend_from_slice(&DIR_INDEX.to_le_bytes());
                    tree.extend_from_slice(&(data_section.len() as u32).to_le_bytes());
                    tree.extend_from_slice(&(data.len() as u32).to_le_bytes());
                    tree.extend_from_slice(&ENTRY_TERMINATOR.to_le_bytes());

                    data_section.extend_from_slice(data);
                }
                tree.push(0);
            }
            tree.push(0);
        }
        tree.push(0);

        let mut out = Vec::with_capacity(12 + tree.len() + data_section.len());
        out.extend_from_slice(&VPK_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(tree.len() as u32).to_le_bytes());
        out.extend_from_slice(&tree);
        out.extend_from_slice(&data_section);
        std::fs::write(path, out)?;
        Ok(())
    }
}

fn write_cstring(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

/// Split a logical path into its (extension, directory, name) tree levels
fn split_path(path: &str) -> Result<(String, String, String)> {
    if path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path.contains("//")
        || path.bytes().any(|b| b == 0)
    {
        return Err(Error::corrupt(format!("invalid entry path {path:?}")));
    }

    let (directory, base) = match path.rsplit_once('/') {
        Some((dir, base)) => (dir.to_string(), base),
        None => (EMPTY_LEVEL.to_string(), path),
    };
    let (name, extension) = match base.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => {
            (name.to_string(), ext.to_string())
        }
        _ => (base.to_string(), EMPTY_LEVEL.to_string()),
    };
    Ok((extension, directory, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(
            split_path("particles/fire.pcf").unwrap(),
            ("pcf".into(), "particles".into(), "fire".into())
        );
        assert_eq!(
            split_path("readme.txt").unwrap(),
            ("txt".into(), EMPTY_LEVEL.into(), "readme".into())
        );
        assert_eq!(
            split_path("makefile").unwrap(),
            (EMPTY_LEVEL.into(), EMPTY_LEVEL.into(), "makefile".into())
        );
        assert_eq!(
            split_path("a/b/c.d").unwrap(),
            ("d".into(), "a/b".into(), "c".into())
        );
    }

    #[test]
    fn test_split_path_rejects_invalid() {
        assert!(split_path("").is_err());
        assert!(split_path("/absolute.txt").is_err());
        assert!(split_path("trailing/").is_err());
        assert!(split_path("double//slash.txt").is_err());
    }
}
