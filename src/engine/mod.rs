//! Dictionary loading, vocabulary generation and cipher cracking.
//!
//! # Module Organization
//!
//! ```text
//! types/      error type and data model
//! format/     .aff / .dic parsing
//! codec/      snapshot cache and resource containers (zip, directory)
//! generator   affix expansion into word forms
//! registry    load pipeline, one entry per language
//! cipher      Caesar-family transforms
//! scorer      plaintext scoring against vocabularies
//! hack        brute-force search over cipher parameters
//! ```

pub mod cipher;
pub mod codec;
pub mod format;
pub mod generator;
pub mod hack;
pub mod registry;
pub mod scorer;
pub mod types;
mod utils;

pub use types::error::{EngineError, Result};
