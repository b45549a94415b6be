//! # affix-hack
//!
//! Expands Hunspell dictionaries (`.aff` + `.dic`) into full vocabularies and
//! uses them to brute-force Caesar-family ciphertexts.
//!
//! Compiled affix tables and generated vocabularies are kept in an on-disk
//! content-addressed cache, so a dictionary is only expanded once per
//! distinct input.
pub mod engine;

// Re-export the main types for convenience
pub use engine::{
    cipher::{Caesar, CipherTransform},
    codec::{
        archive::{DirectorySource, ResourceSet, ZipArchive},
        cache::ContentAddressedCache,
    },
    generator::{GeneratorOptions, WordGenerator},
    hack::{rank, HackDriver, HackOptions},
    registry::{LoadOptions, LoadedDictionary, Registry},
    scorer::{MatchDic, PlaintextScorer},
    types::models::{
        AffixTable,
        Algorithm,
        BaseWordEntry,
        Dictionary,
        HackCandidate,
        Method,
        ParseIssue,
    },
    EngineError,
    Result,
};
