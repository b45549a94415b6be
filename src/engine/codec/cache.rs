//! Content-addressed on-disk cache for compiled tables and vocabularies.
//!
//! Entries live as flat files in one directory. The file name is the hex
//! SHA-256 of `salt || source bytes`, so a changed source or a bumped salt
//! simply addresses a different file; nothing is ever invalidated in place.
//!
//! # Entry Layout
//! ```text
//! [4 bytes] Magic "AHC1"
//! [4 bytes] Adler32 of the compressed payload (big-endian u32)
//! [8 bytes] Decompressed payload length (big-endian u64)
//! [N bytes] Zlib-compressed CBOR snapshot
//! ```
//!
//! Any entry that fails to read or validate is treated as a miss.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use adler2::adler32_slice;
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::{debug, trace, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::engine::types::error::{EngineError, Result};

/// Salt for compiled affix tables. Bump when `AffixTable` serialization changes.
pub const AFFIX_TABLE_SALT: &str = "affix-table/v2";

/// Salt for generated vocabularies. Bump when generation semantics change.
pub const VOCABULARY_SALT: &str = "vocabulary/v2";

const MAGIC: [u8; 4] = *b"AHC1";
const HEADER_LEN: usize = 16;

/// Hex digest naming one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives a key as `SHA-256(salt || parts[0] || parts[1] || ...)`.
    pub fn derive(salt: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        for part in parts {
            hasher.update(part);
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A flat directory of content-addressed snapshots.
///
/// A cache whose root cannot be used is disabled: `get` always misses and
/// `put` does nothing.
#[derive(Debug, Clone)]
pub struct ContentAddressedCache {
    root: Option<PathBuf>,
}

impl ContentAddressedCache {
    /// Opens the cache at `root`, creating the directory if needed.
    ///
    /// If a non-directory already occupies `root`, or the directory cannot be
    /// created, a warning is logged once and the cache is disabled.
    pub fn open(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        if root.exists() && !root.is_dir() {
            warn!(
                "Cache path {} is occupied by a file; caching disabled for this session",
                root.display()
            );
            return Self::disabled();
        }
        if let Err(e) = fs::create_dir_all(root) {
            warn!("Cannot create cache directory {}: {}; caching disabled", root.display(), e);
            return Self::disabled();
        }
        debug!("Cache opened at {}", root.display());
        Self { root: Some(root.to_path_buf()) }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { root: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Location of the entry for `key`, if the cache is enabled.
    pub fn entry_path(&self, key: &CacheKey) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(key.as_str()))
    }

    /// Fetches and decodes the entry for `key`.
    ///
    /// Missing, unreadable and corrupt entries all yield `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let path = self.entry_path(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!("Cache miss: {}", key);
                return None;
            }
            Err(e) => {
                warn!("Unreadable cache entry {}: {}", path.display(), e);
                return None;
            }
        };
        match decode_entry(&bytes) {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Corrupt cache entry {}: {}; recomputing", path.display(), e);
                None
            }
        }
    }

    /// Stores `value` under `key`, replacing any existing entry.
    ///
    /// The entry is written to a temporary sibling and renamed into place.
    pub fn put<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> {
        let Some(path) = self.entry_path(key) else {
            return Ok(());
        };
        let bytes = encode_entry(value)?;
        let tmp = path.with_extension(format!("tmp{}", std::process::id()));
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(EngineError::Cache(format!("Cannot write {}: {}", path.display(), e)));
        }
        debug!("Cache store: {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// Returns the cached value for `key`, or computes and stores it.
    ///
    /// A failed store is logged and the computed value is still returned.
    pub fn get_or_insert_with<T, F>(&self, key: &CacheKey, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = compute();
        if let Err(e) = self.put(key, &value) {
            warn!("{}", e);
        }
        value
    }
}

/// Serializes a value into the on-disk entry layout.
pub fn encode_entry<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = serde_cbor::to_vec(value)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload)?;
    let compressed = encoder.finish()?;

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(&MAGIC);
    out.write_u32::<BigEndian>(adler32_slice(&compressed))?;
    out.write_u64::<BigEndian>(payload.len() as u64)?;
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Validates and deserializes an on-disk entry.
pub fn decode_entry<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(EngineError::Cache(format!("Entry too short: {} bytes", bytes.len())));
    }
    if bytes[0..4] != MAGIC {
        return Err(EngineError::Cache("Bad entry magic".to_string()));
    }

    let checksum_expected = BigEndian::read_u32(&bytes[4..8]);
    let expected_len = BigEndian::read_u64(&bytes[8..16]);
    let compressed = &bytes[HEADER_LEN..];
    let checksum_actual = adler32_slice(compressed);
    trace!("Entry checksum: expected={:#010x}, actual={:#010x}", checksum_expected, checksum_actual);
    if checksum_actual != checksum_expected {
        return Err(EngineError::ChecksumMismatch {
            expected: checksum_expected,
            actual: checksum_actual,
        });
    }

    let mut payload = Vec::new();
    ZlibDecoder::new(compressed)
        .read_to_end(&mut payload)
        .map_err(|e| EngineError::Cache(format!("Decompression failed: {}", e)))?;
    if payload.len() as u64 != expected_len {
        return Err(EngineError::Cache(format!(
            "Payload size mismatch: expected {} bytes, found {}",
            expected_len,
            payload.len()
        )));
    }

    Ok(serde_cbor::from_slice(&payload)?)
}
