//! The dictionary registry.
//!
//! A [`Registry`] is built once from a resource set and is read-only
//! afterwards. Loading a dictionary runs the whole pipeline:
//!
//! 1. Hash the raw `.aff` and `.dic` bytes.
//! 2. Fetch the compiled affix table from the cache, or compile it.
//! 3. Parse the word list against the table (combos resolved up front).
//! 4. Fetch the generated vocabulary from the cache, or generate it.
//!
//! The registry is an ordinary value: tests build isolated registries and
//! drop them, nothing is global.

use std::path::Path;

use log::{debug, info, warn};

use super::codec::archive::{pair_dictionaries, DirectorySource, ResourceSet, ZipArchive};
use super::codec::cache::{CacheKey, ContentAddressedCache, AFFIX_TABLE_SALT, VOCABULARY_SALT};
use super::format::affix::{self, CompiledAffixes};
use super::format::wordlist;
use super::generator::{GeneratorOptions, WordGenerator, DEFAULT_MAX_DEPTH};
use super::types::error::Result;
use super::types::models::{ContentHash, Dictionary};
use super::utils;

/// Options controlling how dictionaries are expanded at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Cap on nested rule applications per base word.
    pub max_depth: usize,
    /// Deduplicate the whole vocabulary of each dictionary.
    pub unique: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, unique: false }
    }
}

impl LoadOptions {
    pub fn generator(&self) -> GeneratorOptions {
        GeneratorOptions { max_depth: self.max_depth, unique: self.unique }
    }

    /// Vocabulary salt; generation options change the output, so they are
    /// part of the key.
    fn vocabulary_salt(&self) -> String {
        format!("{}:depth={}:unique={}", VOCABULARY_SALT, self.max_depth, self.unique)
    }
}

/// A dictionary together with its generated vocabulary.
#[derive(Debug, Clone)]
pub struct LoadedDictionary {
    pub dictionary: Dictionary,
    pub vocabulary: Vec<String>,
}

impl LoadedDictionary {
    pub fn id(&self) -> &str {
        &self.dictionary.id
    }
}

/// Read-only collection of loaded dictionaries, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    dictionaries: Vec<LoadedDictionary>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `.aff`/`.dic` pair found in `source`.
    ///
    /// A pair whose files cannot be read is skipped; the others still load.
    pub fn load<R: ResourceSet + ?Sized>(
        source: &R,
        cache: &ContentAddressedCache,
        options: LoadOptions,
    ) -> Self {
        let pairs = pair_dictionaries(&source.names());
        info!("Loading {} dictionaries", pairs.len());

        let mut registry = Self::new();
        for pair in pairs {
            let files = source.read(&pair.aff).and_then(|aff| Ok((aff, source.read(&pair.dic)?)));
            match files {
                Ok((aff, dic)) => {
                    registry.insert(load_dictionary(&pair.id, &aff, &dic, cache, options));
                }
                Err(e) => warn!("Skipping dictionary {}: {}", pair.id, e),
            }
        }

        info!("Registry ready: {} dictionaries", registry.len());
        registry
    }

    /// Loads dictionaries from a zip archive.
    pub fn from_archive(
        path: impl AsRef<Path>,
        cache: &ContentAddressedCache,
        options: LoadOptions,
    ) -> Result<Self> {
        let archive = ZipArchive::open(path)?;
        Ok(Self::load(&archive, cache, options))
    }

    /// Loads dictionaries from a directory.
    pub fn from_directory(
        path: impl AsRef<Path>,
        cache: &ContentAddressedCache,
        options: LoadOptions,
    ) -> Self {
        Self::load(&DirectorySource::new(path), cache, options)
    }

    /// Adds a dictionary, replacing any previous one with the same id.
    pub fn insert(&mut self, loaded: LoadedDictionary) {
        match self.dictionaries.iter_mut().find(|d| d.id() == loaded.id()) {
            Some(existing) => {
                warn!("Dictionary {} loaded twice; keeping the last one", loaded.id());
                *existing = loaded;
            }
            None => self.dictionaries.push(loaded),
        }
    }

    pub fn get(&self, id: &str) -> Option<&LoadedDictionary> {
        self.dictionaries.iter().find(|d| d.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedDictionary> {
        self.dictionaries.iter()
    }

    pub fn languages(&self) -> Vec<&str> {
        self.dictionaries.iter().map(LoadedDictionary::id).collect()
    }

    pub fn len(&self) -> usize {
        self.dictionaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }
}

/// Runs the load pipeline for one `.aff`/`.dic` pair.
///
/// Parse problems never fail the load; they end up in
/// [`Dictionary::issues`].
pub fn load_dictionary(
    id: &str,
    aff_bytes: &[u8],
    dic_bytes: &[u8],
    cache: &ContentAddressedCache,
    options: LoadOptions,
) -> LoadedDictionary {
    let aff_hash = ContentHash::of(aff_bytes);
    let dic_hash = ContentHash::of(dic_bytes);
    debug!("Loading dictionary {} (aff={}, dic={})", id, aff_hash, dic_hash);

    let encoding = utils::sniff_affix_encoding(aff_bytes);

    let table_key = CacheKey::derive(AFFIX_TABLE_SALT, &[aff_bytes]);
    let CompiledAffixes { table, issues: mut aff_issues } = cache
        .get_or_insert_with(&table_key, || affix::compile(&utils::decode_text(aff_bytes, encoding)));

    let parsed = wordlist::parse(&utils::decode_text(dic_bytes, encoding), &table);

    let vocabulary_key = CacheKey::derive(&options.vocabulary_salt(), &[&aff_hash.0, dic_bytes]);
    let vocabulary: Vec<String> = cache.get_or_insert_with(&vocabulary_key, || {
        let mut generator = WordGenerator::new(&table, &parsed.entries, options.generator());
        let words: Vec<String> = generator.by_ref().collect();
        if generator.skipped() > 0 {
            warn!(
                "Dictionary {}: {} base words exceeded the traversal depth",
                id,
                generator.skipped()
            );
        }
        words
    });

    aff_issues.extend(parsed.issues);
    info!(
        "Dictionary {} loaded: {} base words, {} generated words, {} issues",
        id,
        parsed.entries.len(),
        vocabulary.len(),
        aff_issues.len()
    );

    LoadedDictionary {
        dictionary: Dictionary {
            id: id.to_string(),
            table,
            base_words: parsed.entries,
            aff_hash,
            dic_hash,
            issues: aff_issues,
        },
        vocabulary,
    }
}
