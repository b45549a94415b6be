//! Dictionary resource sets: zip archives and plain directories.
//!
//! Dictionaries ship as `{name}.aff` / `{name}.dic` pairs, either bundled
//! in a zip archive or laid out in a directory. Both are exposed through the
//! [`ResourceSet`] trait and paired by stem with [`pair_dictionaries`].
//!
//! # Zip Structure
//! ```text
//! ┌──────────────────────────┐
//! │ Local header + data  ... │ ← read_entry()
//! ├──────────────────────────┤
//! │ Central directory        │ ← parse_central_directory()
//! ├──────────────────────────┤
//! │ End of central directory │ ← find_end_of_central_directory()
//! └──────────────────────────┘
//! ```
//!
//! Stored and deflate entries are supported. Encrypted and zip64 archives are
//! rejected.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use log::{debug, info, trace, warn};

use crate::engine::types::error::{EngineError, Result};

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const CENTRAL_SIGNATURE: u32 = 0x0201_4b50;
const LOCAL_SIGNATURE: u32 = 0x0403_4b50;
const EOCD_LEN: usize = 22;
const LOCAL_HEADER_LEN: usize = 30;
const MAX_COMMENT_LEN: usize = 0xFFFF;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;
const FLAG_ENCRYPTED: u16 = 0x0001;

/// A named collection of raw resource files.
pub trait ResourceSet {
    /// Names of all files in the set, in a stable order.
    fn names(&self) -> Vec<String>;

    /// Reads the full contents of one file.
    fn read(&self, name: &str) -> Result<Vec<u8>>;
}

/// Central directory record of one archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    pub name: String,
    pub method: u16,
    pub flags: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
}

/// An in-memory zip archive.
#[derive(Debug)]
pub struct ZipArchive {
    data: Vec<u8>,
    entries: Vec<ZipEntry>,
}

impl ZipArchive {
    /// Reads and indexes the archive at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening dictionary archive: {}", path.display());
        Self::from_bytes(fs::read(path)?)
    }

    /// Indexes an archive held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let eocd = find_end_of_central_directory(&data)?;
        let entries = parse_central_directory(&data, eocd)?;
        debug!("Archive indexed: {} entries", entries.len());
        Ok(Self { data, entries })
    }

    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    fn entry(&self, name: &str) -> Result<&ZipEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| EngineError::Archive(format!("No such entry: {}", name)))
    }

    fn read_entry(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        if entry.flags & FLAG_ENCRYPTED != 0 {
            return Err(EngineError::Archive(format!("Entry {} is encrypted", entry.name)));
        }

        let offset = entry.local_header_offset as usize;
        let mut header = self
            .data
            .get(offset..offset + LOCAL_HEADER_LEN)
            .ok_or_else(|| EngineError::Archive(format!("Local header of {} out of bounds", entry.name)))?;
        if header.read_u32::<LittleEndian>()? != LOCAL_SIGNATURE {
            return Err(EngineError::Archive(format!("Bad local header signature for {}", entry.name)));
        }
        let mut header = &header[22..];
        let name_len = header.read_u16::<LittleEndian>()? as usize;
        let extra_len = header.read_u16::<LittleEndian>()? as usize;

        let start = offset + LOCAL_HEADER_LEN + name_len + extra_len;
        let end = start + entry.compressed_size as usize;
        let payload = self
            .data
            .get(start..end)
            .ok_or_else(|| EngineError::Archive(format!("Data of {} out of bounds", entry.name)))?;

        trace!(
            "Reading {}: method={}, {} -> {} bytes",
            entry.name,
            entry.method,
            entry.compressed_size,
            entry.uncompressed_size
        );
        let content = match entry.method {
            METHOD_STORED => payload.to_vec(),
            METHOD_DEFLATE => {
                let mut out = Vec::new();
                DeflateDecoder::new(payload).read_to_end(&mut out).map_err(|e| {
                    EngineError::Archive(format!("Inflating {} failed: {}", entry.name, e))
                })?;
                out
            }
            other => {
                return Err(EngineError::Archive(format!(
                    "Unsupported compression method {} for {}",
                    other, entry.name
                )))
            }
        };

        if content.len() as u64 != entry.uncompressed_size {
            return Err(EngineError::Archive(format!(
                "Size mismatch for {}: expected {} bytes, found {}",
                entry.name,
                entry.uncompressed_size,
                content.len()
            )));
        }
        let crc_actual = crc32fast::hash(&content);
        if crc_actual != entry.crc32 {
            return Err(EngineError::ChecksumMismatch { expected: entry.crc32, actual: crc_actual });
        }
        Ok(content)
    }
}

impl ResourceSet for ZipArchive {
    fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.name.ends_with('/'))
            .map(|e| e.name.clone())
            .collect()
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.read_entry(self.entry(name)?)
    }
}

/// Scans backwards for the end of central directory record.
fn find_end_of_central_directory(data: &[u8]) -> Result<usize> {
    if data.len() < EOCD_LEN {
        return Err(EngineError::Archive("File too short to be a zip archive".to_string()));
    }
    let last = data.len() - EOCD_LEN;
    let first = last.saturating_sub(MAX_COMMENT_LEN);
    (first..=last)
        .rev()
        .find(|&pos| data[pos..pos + 4] == EOCD_SIGNATURE.to_le_bytes())
        .ok_or_else(|| EngineError::Archive("End of central directory not found".to_string()))
}

fn parse_central_directory(data: &[u8], eocd: usize) -> Result<Vec<ZipEntry>> {
    let mut reader = &data[eocd + 4..];
    let _disk = reader.read_u16::<LittleEndian>()?;
    let _cd_disk = reader.read_u16::<LittleEndian>()?;
    let _entries_on_disk = reader.read_u16::<LittleEndian>()?;
    let total_entries = reader.read_u16::<LittleEndian>()?;
    let cd_size = reader.read_u32::<LittleEndian>()?;
    let cd_offset = reader.read_u32::<LittleEndian>()?;

    if total_entries == 0xFFFF || cd_offset == 0xFFFF_FFFF || cd_size == 0xFFFF_FFFF {
        return Err(EngineError::Archive("Zip64 archives are not supported".to_string()));
    }

    let start = cd_offset as usize;
    let end = start + cd_size as usize;
    let mut reader = data
        .get(start..end)
        .ok_or_else(|| EngineError::Archive("Central directory out of bounds".to_string()))?;

    let mut entries = Vec::with_capacity(total_entries as usize);
    for _ in 0..total_entries {
        if reader.read_u32::<LittleEndian>()? != CENTRAL_SIGNATURE {
            return Err(EngineError::Archive("Bad central directory signature".to_string()));
        }
        let _version_made = reader.read_u16::<LittleEndian>()?;
        let _version_needed = reader.read_u16::<LittleEndian>()?;
        let flags = reader.read_u16::<LittleEndian>()?;
        let method = reader.read_u16::<LittleEndian>()?;
        let _mtime = reader.read_u16::<LittleEndian>()?;
        let _mdate = reader.read_u16::<LittleEndian>()?;
        let crc32 = reader.read_u32::<LittleEndian>()?;
        let compressed_size = reader.read_u32::<LittleEndian>()?;
        let uncompressed_size = reader.read_u32::<LittleEndian>()?;
        let name_len = reader.read_u16::<LittleEndian>()? as usize;
        let extra_len = reader.read_u16::<LittleEndian>()? as usize;
        let comment_len = reader.read_u16::<LittleEndian>()? as usize;
        let _disk_start = reader.read_u16::<LittleEndian>()?;
        let _internal_attrs = reader.read_u16::<LittleEndian>()?;
        let _external_attrs = reader.read_u32::<LittleEndian>()?;
        let local_header_offset = reader.read_u32::<LittleEndian>()?;

        if reader.len() < name_len + extra_len + comment_len {
            return Err(EngineError::Archive("Truncated central directory entry".to_string()));
        }
        let name = String::from_utf8_lossy(&reader[..name_len]).into_owned();
        reader = &reader[name_len + extra_len + comment_len..];

        entries.push(ZipEntry {
            name,
            method,
            flags,
            crc32,
            compressed_size: compressed_size as u64,
            uncompressed_size: uncompressed_size as u64,
            local_header_offset: local_header_offset as u64,
        });
    }

    Ok(entries)
}

/// Dictionary files laid out in a directory (non-recursive).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
}

impl ResourceSet for DirectorySource {
    fn names(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(name))?)
    }
}

/// A matched `.aff`/`.dic` pair inside a resource set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPair {
    /// File stem without directories, used as the dictionary id.
    pub id: String,
    pub aff: String,
    pub dic: String,
}

/// Pairs `.aff` and `.dic` names sharing a stem, in stem order.
///
/// Stems missing either file are skipped with a warning.
pub fn pair_dictionaries(names: &[String]) -> Vec<DictionaryPair> {
    let mut stems: BTreeMap<&str, (Option<&String>, Option<&String>)> = BTreeMap::new();
    for name in names {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".aff") {
            stems.entry(&name[..name.len() - 4]).or_default().0 = Some(name);
        } else if lower.ends_with(".dic") {
            stems.entry(&name[..name.len() - 4]).or_default().1 = Some(name);
        }
    }

    let mut pairs = Vec::new();
    for (stem, files) in stems {
        match files {
            (Some(aff), Some(dic)) => {
                let id = stem.rsplit('/').next().unwrap_or(stem).to_string();
                pairs.push(DictionaryPair { id, aff: aff.clone(), dic: dic.clone() });
            }
            (Some(_), None) => warn!("Dictionary {} has no .dic file; skipped", stem),
            (None, Some(_)) => warn!("Dictionary {} has no .aff file; skipped", stem),
            (None, None) => {}
        }
    }
    pairs
}
