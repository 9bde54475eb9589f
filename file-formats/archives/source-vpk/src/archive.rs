//! VPK archive handling
//!
//! This module provides the main [`Vpk`] type for reading VPK directory
//! files and replacing individual entries in place. It supports:
//! - VPK versions 1 and 2
//! - Directory-tree indexing with per-entry CRC verification
//! - Glob-style path lookup
//! - Exact-slot in-place patching with entry-level backups
//!
//! Patching never grows an entry and never rewrites untouched entries, so
//! every other entry's offset/length bookkeeping stays valid byte-for-byte.
//! Version 2 MD5 sections are not recomputed after a patch.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::backup::BackupSet;
use crate::entry::{DIR_INDEX, VpkEntry};
use crate::{Error, Result};

/// VPK directory file signature
pub const VPK_SIGNATURE: u32 = 0x55AA_1234;

/// Suffix that marks a directory file in a multi-chunk archive set
const DIR_SUFFIX: &str = "_dir.vpk";

/// Terminator closing every 18-byte directory entry
pub(crate) const ENTRY_TERMINATOR: u16 = 0xFFFF;

/// Placeholder string for an empty path or extension level in the tree
const EMPTY_LEVEL: &str = " ";

/// Helper trait for reading little-endian integers
trait ReadLittleEndian: Read {
    fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

impl<R: Read> ReadLittleEndian for R {}

/// Parsed VPK header fields the handler needs to keep around
#[derive(Debug, Clone, Copy)]
struct VpkHeader {
    version: u32,
    tree_size: u32,
    header_size: u64,
}

impl VpkHeader {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let signature = reader
            .read_u32_le()
            .map_err(|_| Error::corrupt("file too small for a VPK header"))?;
        if signature != VPK_SIGNATURE {
            return Err(Error::corrupt(format!(
                "bad signature 0x{signature:08X}, expected 0x{VPK_SIGNATURE:08X}"
            )));
        }

        let version = reader.read_u32_le()?;
        let tree_size = reader.read_u32_le()?;
        let header_size = match version {
            1 => 12,
            2 => {
                // File data, archive MD5, other MD5, and signature section
                // sizes; the handler leaves all of them untouched
                for _ in 0..4 {
                    reader.read_u32_le()?;
                }
                28
            }
            other => return Err(Error::UnsupportedVersion(other)),
        };

        Ok(Self {
            version,
            tree_size,
            header_size,
        })
    }

    /// Absolute offset of the embedded data section
    fn data_offset(&self) -> u64 {
        self.header_size + u64::from(self.tree_size)
    }
}

/// An opened VPK archive set
///
/// The index maps logical paths to [`VpkEntry`] descriptors and is rebuilt
/// from the directory after every successful patch rather than mutated
/// entry-by-entry.
#[derive(Debug)]
pub struct Vpk {
    dir_path: PathBuf,
    header: VpkHeader,
    entries: BTreeMap<String, VpkEntry>,
    backup: BackupSet,
}

impl Vpk {
    /// Open a VPK directory file and build its index
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dir_path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&dir_path)?);
        let header = VpkHeader::read(&mut reader)?;

        let mut tree = vec![0u8; header.tree_size as usize];
        reader
            .read_exact(&mut tree)
            .map_err(|_| Error::corrupt("directory tree shorter than header declares"))?;

        let mut entries = BTreeMap::new();
        for entry in parse_tree(&tree, header.header_size)? {
            let path = entry.path.clone();
            if entries.insert(path.clone(), entry).is_some() {
                return Err(Error::corrupt(format!("duplicate entry path {path}")));
            }
        }

        log::debug!(
            "opened {} (v{}, {} entries)",
            dir_path.display(),
            header.version,
            entries.len()
        );

        Ok(Self {
            dir_path,
            header,
            entries,
            backup: BackupSet::new(),
        })
    }

    /// Path of the directory file this archive was opened from
    pub fn path(&self) -> &Path {
        &self.dir_path
    }

    /// VPK format version (1 or 2)
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Number of indexed entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Indexed paths in lexicographic order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Look up an entry descriptor by its logical path
    pub fn entry(&self, path: &str) -> Result<&VpkEntry> {
        self.entries
            .get(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))
    }

    /// Paths matching a glob pattern, in lexicographic order
    ///
    /// The result is a finite snapshot of the index, not a live cursor.
    pub fn find(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = glob::Pattern::new(pattern)?;
        Ok(self
            .entries
            .keys()
            .filter(|path| pattern.matches(path))
            .cloned()
            .collect())
    }

    /// Resolve a bare filename to its full archive path
    ///
    /// A name containing a separator is taken as a full path and only
    /// checked for existence. A bare filename resolves to the first match
    /// in lexicographic order.
    pub fn resolve_name(&self, name: &str) -> Result<String> {
        if name.contains('/') {
            return self.entry(name).map(|e| e.path.clone());
        }
        let suffix = format!("/{name}");
        self.entries
            .keys()
            .find(|path| *path == name || path.ends_with(&suffix))
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))
    }

    /// Read an entry's full contents (preload + chunk data), verifying its CRC
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self.entry(path)?;
        let data = self.read_raw(entry)?;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data);
        let actual = hasher.finalize();
        if actual != entry.crc {
            return Err(Error::ChecksumMismatch {
                path: path.to_string(),
                expected: entry.crc,
                actual,
            });
        }
        Ok(data)
    }

    /// Copy an entry's bytes to a scratch location
    pub fn extract<P: AsRef<Path>>(&self, path: &str, destination: P) -> Result<()> {
        let data = self.read_file(path)?;
        std::fs::write(destination, data)?;
        Ok(())
    }

    /// Replace an entry's bytes in place
    ///
    /// The replacement must not exceed the entry's stored size
    /// ([`Error::SizeConstraintViolated`] otherwise, with the archive left
    /// unmodified). A strictly shorter replacement leaves the slot's
    /// remaining bytes in place; callers that need exact-length content are
    /// responsible for padding first. When `make_backup` is set, the
    /// original bytes are captured into the entry-level [`BackupSet`]
    /// before mutation. On success the entry's CRC is rewritten and the
    /// whole index is rebuilt from the directory.
    pub fn patch(&mut self, path: &str, new_bytes: &[u8], make_backup: bool) -> Result<()> {
        let entry = self.entry(path)?.clone();
        let slot = entry.total_length();
        if new_bytes.len() as u64 > slot {
            return Err(Error::SizeConstraintViolated {
                path: path.to_string(),
                original: slot,
                replacement: new_bytes.len() as u64,
            });
        }

        let original = self.read_raw(&entry)?;
        if make_backup {
            self.backup.record(path, original.clone());
        }

        // Slot contents after the write: the replacement, then whatever
        // tail of the original it does not cover
        let mut slot_bytes = new_bytes.to_vec();
        slot_bytes.extend_from_slice(&original[new_bytes.len()..]);
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&slot_bytes);
        let crc = hasher.finalize();

        let (preload_part, chunk_part) = slot_bytes.split_at(entry.preload_length as usize);

        let mut dir_file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.dir_path)?;
        if !preload_part.is_empty() {
            dir_file.seek(SeekFrom::Start(entry.preload_offset))?;
            dir_file.write_all(preload_part)?;
        }
        if !chunk_part.is_empty() {
            if entry.is_embedded() {
                dir_file.seek(SeekFrom::Start(
                    self.header.data_offset() + u64::from(entry.offset),
                ))?;
                dir_file.write_all(chunk_part)?;
            } else {
                let mut chunk_file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(self.chunk_path(entry.archive_index)?)?;
                chunk_file.seek(SeekFrom::Start(u64::from(entry.offset)))?;
                chunk_file.write_all(chunk_part)?;
            }
        }

        // Entry bookkeeping: the CRC is the first field of the 18-byte record
        dir_file.seek(SeekFrom::Start(entry.dir_entry_offset))?;
        dir_file.write_all(&crc.to_le_bytes())?;
        drop(dir_file);

        log::debug!(
            "patched {path}: {} of {slot} slot bytes replaced",
            new_bytes.len()
        );

        self.reload()
    }

    /// The entry-level backup set captured by patches with `make_backup`
    pub fn backup(&self) -> &BackupSet {
        &self.backup
    }

    /// Patch every backed-up entry back to its preserved bytes
    ///
    /// Clears the backup set on success and returns the number of restored
    /// entries; restoring with an empty set is a no-op success. On failure
    /// the unrestored entries are put back so a later call can retry.
    pub fn restore_backups(&mut self) -> Result<usize> {
        let pending = self.backup.drain_sorted();
        let count = pending.len();
        let mut pending = pending.into_iter();
        while let Some((path, bytes)) = pending.next() {
            if let Err(err) = self.patch(&path, &bytes, false) {
                self.backup.record(path, bytes);
                for (p, b) in pending {
                    self.backup.record(p, b);
                }
                return Err(err);
            }
        }
        Ok(count)
    }

    /// Raw slot contents without CRC verification
    fn read_raw(&self, entry: &VpkEntry) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(entry.total_length() as usize);

        if entry.preload_length > 0 {
            let mut dir_file = File::open(&self.dir_path)?;
            dir_file.seek(SeekFrom::Start(entry.preload_offset))?;
            let mut preload = vec![0u8; entry.preload_length as usize];
            dir_file.read_exact(&mut preload)?;
            data.extend_from_slice(&preload);
        }

        if entry.length > 0 {
            let mut chunk = vec![0u8; entry.length as usize];
            if entry.is_embedded() {
                let mut dir_file = File::open(&self.dir_path)?;
                dir_file.seek(SeekFrom::Start(
                    self.header.data_offset() + u64::from(entry.offset),
                ))?;
                dir_file.read_exact(&mut chunk).map_err(|_| {
                    Error::corrupt(format!("entry {} overruns embedded data", entry.path))
                })?;
            } else {
                let mut chunk_file = File::open(self.chunk_path(entry.archive_index)?)?;
                chunk_file.seek(SeekFrom::Start(u64::from(entry.offset)))?;
                chunk_file.read_exact(&mut chunk).map_err(|_| {
                    Error::corrupt(format!("entry {} overruns its chunk file", entry.path))
                })?;
            }
            data.extend_from_slice(&chunk);
        }

        Ok(data)
    }

    /// Path of a numbered chunk file belonging to this archive set
    fn chunk_path(&self, index: u16) -> Result<PathBuf> {
        let file_name = self
            .dir_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::corrupt("directory path has no file name"))?;
        let prefix = file_name.strip_suffix(DIR_SUFFIX).ok_or_else(|| {
            Error::corrupt(format!(
                "{file_name} references chunk {index} but is not a {DIR_SUFFIX} archive"
            ))
        })?;
        Ok(self
            .dir_path
            .with_file_name(format!("{prefix}_{index:03}.vpk")))
    }

    /// Rebuild the index from the directory file, keeping the backup set
    fn reload(&mut self) -> Result<()> {
        let reopened = Self::open(&self.dir_path)?;
        self.header = reopened.header;
        self.entries = reopened.entries;
        Ok(())
    }
}

/// Walk the extension/path/filename tree and collect entry descriptors
fn parse_tree(tree: &[u8], header_size: u64) -> Result<Vec<VpkEntry>> {
    let mut cursor = Cursor::new(tree);
    let mut entries = Vec::new();

    loop {
        let extension = read_cstring(&mut cursor)?;
        if extension.is_empty() {
            break;
        }
        loop {
            let directory = read_cstring(&mut cursor)?;
            if directory.is_empty() {
                break;
            }
            loop {
                let file_name = read_cstring(&mut cursor)?;
                if file_name.is_empty() {
                    break;
                }

                let dir_entry_offset = header_size + cursor.position();
                let crc = cursor.read_u32_le()?;
                let preload_length = cursor.read_u16_le()?;
                let archive_index = cursor.read_u16_le()?;
                let offset = cursor.read_u32_le()?;
                let length = cursor.read_u32_le()?;
                let terminator = cursor.read_u16_le()?;
                if terminator != ENTRY_TERMINATOR {
                    return Err(Error::corrupt(format!(
                        "entry record for {file_name}.{extension} not terminated"
                    )));
                }

                let preload_offset = header_size + cursor.position();
                let remaining = tree.len() as u64 - cursor.position();
                if u64::from(preload_length) > remaining {
                    return Err(Error::corrupt("preload data overruns directory tree"));
                }
                cursor.seek(SeekFrom::Current(i64::from(preload_length)))?;

                entries.push(VpkEntry {
                    path: join_path(&directory, &file_name, &extension),
                    crc,
                    preload_length,
                    archive_index,
                    offset,
                    length,
                    dir_entry_offset,
                    preload_offset,
                });
            }
        }
    }

    Ok(entries)
}

/// Read a NUL-terminated string from the directory tree
fn read_cstring(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let mut bytes = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        cursor
            .read_exact(&mut byte)
            .map_err(|_| Error::corrupt("unexpected end of directory tree"))?;
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    String::from_utf8(bytes).map_err(|_| Error::corrupt("invalid UTF-8 in directory tree"))
}

/// Assemble a logical path from its tree levels
///
/// A single space marks an empty directory or extension level.
fn join_path(directory: &str, file_name: &str, extension: &str) -> String {
    let base = if extension == EMPTY_LEVEL {
        file_name.to_string()
    } else {
        format!("{file_name}.{extension}")
    };
    if directory == EMPTY_LEVEL {
        base
    } else {
        format!("{directory}/{base}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_levels() {
        assert_eq!(join_path("particles", "fire", "pcf"), "particles/fire.pcf");
        assert_eq!(join_path(" ", "readme", "txt"), "readme.txt");
        assert_eq!(join_path(" ", "makefile", " "), "makefile");
        assert_eq!(join_path("scripts/items", "all", "txt"), "scripts/items/all.txt");
    }

    #[test]
    fn test_header_rejects_bad_signature() {
        let data = [0u8; 12];
        let result = VpkHeader::read(&mut Cursor::new(&data[..]));
        assert!(matches!(result, Err(Error::CorruptDirectory(_))));
    }

    #[test]
    fn test_header_rejects_unknown_version() {
        let mut data = Vec::new();
        data.extend_from_slice(&VPK_SIGNATURE.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        let result = VpkHeader::read(&mut Cursor::new(&data[..]));
        assert!(matches!(result, Err(Error::UnsupportedVersion(3))));
    }

    #[test]
    fn test_header_sizes() {
        let mut v1 = Vec::new();
        v1.extend_from_slice(&VPK_SIGNATURE.to_le_bytes());
        v1.extend_from_slice(&1u32.to_le_bytes());
        v1.extend_from_slice(&64u32.to_le_bytes());
        let header = VpkHeader::read(&mut Cursor::new(&v1[..])).unwrap();
        assert_eq!(header.header_size, 12);
        assert_eq!(header.data_offset(), 76);

        let mut v2 = Vec::new();
        v2.extend_from_slice(&VPK_SIGNATURE.to_le_bytes());
        v2.extend_from_slice(&2u32.to_le_bytes());
        v2.extend_from_slice(&64u32.to_le_bytes());
        v2.extend_from_slice(&[0u8; 16]);
        let header = VpkHeader::read(&mut Cursor::new(&v2[..])).unwrap();
        assert_eq!(header.header_size, 28);
        assert_eq!(header.data_offset(), 92);
    }

    #[test]
    fn test_truncated_tree_is_corrupt() {
        // An extension level that never terminates
        let tree = b"pcf";
        let result = parse_tree(tree, 12);
        assert!(matches!(result, Err(Error::CorruptDirectory(_))));
    }
}
