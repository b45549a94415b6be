//! Codec layer for persistence and resource containers.
//!
//! # Submodules
//!
//! - [`cache`][]: Content-addressed snapshot cache (SHA-256 keys, zlib + CBOR entries)
//! - [`archive`][]: Zip and directory resource sets holding `.aff`/`.dic` pairs

pub mod archive;
pub mod cache;
