//! Plaintext scoring against generated vocabularies.
//!
//! The hack driver treats scoring as an oracle behind [`PlaintextScorer`].
//! [`MatchDic`] is the bundled implementation: it canonicalizes a sample
//! (normalization, character mapping, charset filtering), splits it into
//! words, and reports the share of letters that belong to known words.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use log::debug;

use super::registry::Registry;
use super::types::error::{EngineError, Result};

/// Estimates how much a text sample looks like prose in a known language.
pub trait PlaintextScorer {
    /// Scores `sample` against every known language; each score is in `[0, 1]`.
    fn find_best_dic(&self, sample: &str) -> Result<BTreeMap<String, f64>>;

    /// Scores `sample` against one language, in `[0, 1]`.
    fn get_match_level(&self, language: &str, sample: &str) -> Result<f64>;
}

/// Text normalization applied before character mapping.
pub type NormalizeFn = fn(&str) -> String;

const LATIN_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz";

const LATIN_CHARMAP: &[(char, char)] = &[
    ('à', 'a'), ('á', 'a'), ('â', 'a'), ('ã', 'a'), ('ä', 'a'), ('å', 'a'),
    ('ç', 'c'),
    ('è', 'e'), ('é', 'e'), ('ê', 'e'), ('ë', 'e'),
    ('ì', 'i'), ('í', 'i'), ('î', 'i'), ('ï', 'i'),
    ('ñ', 'n'),
    ('ò', 'o'), ('ó', 'o'), ('ô', 'o'), ('õ', 'o'), ('ö', 'o'), ('ø', 'o'),
    ('ù', 'u'), ('ú', 'u'), ('û', 'u'), ('ü', 'u'),
    ('ý', 'y'), ('ÿ', 'y'),
];

fn lowercase(text: &str) -> String {
    text.to_lowercase()
}

/// Vocabulary-based scorer.
#[derive(Clone)]
pub struct MatchDic {
    charset: HashSet<char>,
    charmap: HashMap<char, char>,
    normalize: NormalizeFn,
    min_word_len: usize,
    vocabularies: BTreeMap<String, HashSet<String>>,
}

impl MatchDic {
    /// Creates an empty scorer.
    ///
    /// # Arguments
    /// * `charset` - Characters that can appear in words; anything else separates words
    /// * `charmap` - Replacements applied after `normalize` (e.g. accent folding)
    /// * `normalize` - Applied to samples and vocabulary words first
    /// * `min_word_len` - Shorter words are ignored when scoring
    pub fn init(charset: &str, charmap: &[(char, char)], normalize: NormalizeFn, min_word_len: usize) -> Self {
        Self {
            charset: charset.chars().collect(),
            charmap: charmap.iter().copied().collect(),
            normalize,
            min_word_len: min_word_len.max(1),
            vocabularies: BTreeMap::new(),
        }
    }

    /// Lowercase ASCII letters with accent folding and a minimum word length of 2.
    pub fn latin() -> Self {
        Self::init(LATIN_CHARSET, LATIN_CHARMAP, lowercase, 2)
    }

    /// Adds (or extends) the vocabulary of `language`.
    pub fn add_vocabulary<I, S>(&mut self, language: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = self.vocabularies.remove(language).unwrap_or_default();
        for word in words {
            let canonical = self.canonical(word.as_ref());
            let mut parts = canonical.split_whitespace();
            if let (Some(single), None) = (parts.next(), parts.next()) {
                vocabulary.insert(single.to_string());
            }
        }
        debug!("Vocabulary {}: {} distinct words", language, vocabulary.len());
        self.vocabularies.insert(language.to_string(), vocabulary);
    }

    /// Adds the vocabulary of every dictionary in `registry`.
    pub fn with_registry(mut self, registry: &Registry) -> Self {
        for loaded in registry.iter() {
            self.add_vocabulary(loaded.id(), &loaded.vocabulary);
        }
        self
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.vocabularies.keys().map(String::as_str)
    }

    /// Normalizes, maps and filters `text`; characters outside the charset
    /// become spaces.
    fn canonical(&self, text: &str) -> String {
        (self.normalize)(text)
            .chars()
            .map(|c| self.charmap.get(&c).copied().unwrap_or(c))
            .map(|c| if self.charset.contains(&c) { c } else { ' ' })
            .collect()
    }

    fn score(&self, vocabulary: &HashSet<String>, sample: &str) -> f64 {
        let canonical = self.canonical(sample);
        let mut total = 0usize;
        let mut known = 0usize;
        for word in canonical.split_whitespace() {
            let len = word.chars().count();
            if len < self.min_word_len {
                continue;
            }
            total += len;
            if vocabulary.contains(word) {
                known += len;
            }
        }
        if total == 0 {
            0.0
        } else {
            known as f64 / total as f64
        }
    }
}

impl fmt::Debug for MatchDic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MatchDic")
            .field("charset", &self.charset.len())
            .field("charmap", &self.charmap.len())
            .field("min_word_len", &self.min_word_len)
            .field("languages", &self.vocabularies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PlaintextScorer for MatchDic {
    fn find_best_dic(&self, sample: &str) -> Result<BTreeMap<String, f64>> {
        Ok(self
            .vocabularies
            .iter()
            .map(|(language, vocabulary)| (language.clone(), self.score(vocabulary, sample)))
            .collect())
    }

    fn get_match_level(&self, language: &str, sample: &str) -> Result<f64> {
        let vocabulary = self
            .vocabularies
            .get(language)
            .ok_or_else(|| EngineError::Score(format!("Unknown language: {}", language)))?;
        Ok(self.score(vocabulary, sample))
    }
}
