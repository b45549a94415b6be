//! Core data structures for the affix engine and the hack driver.
//!
//! This module defines the fundamental types used throughout the library:
//! - Compiled affix tables (classes, rules, combos)
//! - Base word entries and dictionaries
//! - Cipher parameters and hack candidates

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{EngineError, Result};
use crate::engine::format::condition::Condition;

/// How a packed flag string is split into individual class names.
///
/// - `Ascii`: one character per flag (also used for `FLAG UTF-8`)
/// - `Long`: two characters per flag (`FLAG long`)
/// - `Numeric`: comma-separated decimal numbers (`FLAG num`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagMode {
    #[default]
    Ascii,
    Long,
    Numeric,
}

impl FlagMode {
    /// Maps the argument of a `FLAG` directive to a mode.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "long" => Some(Self::Long),
            "num" => Some(Self::Numeric),
            "utf-8" | "ascii" => Some(Self::Ascii),
            _ => None,
        }
    }
}

/// Interned identifier of an affix class.
///
/// Ids are only handed out by the compiler for classes it has defined, so a
/// `ClassId` always refers to a valid entry of its [`AffixTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(u32);

impl ClassId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the class inside [`AffixTable::classes`].
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AffixKind {
    Prefix,
    Suffix,
}

impl fmt::Display for AffixKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AffixKind::Prefix => write!(f, "PFX"),
            AffixKind::Suffix => write!(f, "SFX"),
        }
    }
}

/// A legal combination of at most one prefix class and one suffix class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combo {
    pub prefix: Option<ClassId>,
    pub suffix: Option<ClassId>,
}

impl Combo {
    pub fn prefix(id: ClassId) -> Self {
        Self { prefix: Some(id), suffix: None }
    }

    pub fn suffix(id: ClassId) -> Self {
        Self { prefix: None, suffix: Some(id) }
    }

    pub fn cross(prefix: ClassId, suffix: ClassId) -> Self {
        Self { prefix: Some(prefix), suffix: Some(suffix) }
    }
}

/// A single strip/add rule of an affix class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixRule {
    /// Text removed from the word edge before `add` is appended. Empty for `0`.
    pub strip: String,
    /// Text added at the word edge. Empty for `0`.
    pub add: String,
    /// Raw continuation flags as written after `/`.
    pub continuation_flags: String,
    /// Continuation flags resolved into combos once every class is known.
    pub continuation: Vec<Combo>,
    pub condition: Option<Condition>,
}

impl AffixRule {
    /// Applies the rule to `word`, or returns `None` when it does not match.
    ///
    /// The word must carry `strip` at the relevant edge and satisfy the
    /// condition. Unless `full_strip` is set, stripping may not consume the
    /// whole word.
    pub fn apply(&self, word: &str, kind: AffixKind, full_strip: bool) -> Option<String> {
        if !full_strip && word.len() <= self.strip.len() && !self.strip.is_empty() {
            return None;
        }
        if let Some(condition) = &self.condition {
            if !condition.matches(word) {
                return None;
            }
        }
        match kind {
            AffixKind::Suffix => {
                let stem = word.strip_suffix(self.strip.as_str())?;
                Some(format!("{}{}", stem, self.add))
            }
            AffixKind::Prefix => {
                let stem = word.strip_prefix(self.strip.as_str())?;
                Some(format!("{}{}", self.add, stem))
            }
        }
    }
}

/// A named group of prefix or suffix rules (one `PFX`/`SFX` block).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixClass {
    pub id: ClassId,
    pub name: String,
    pub kind: AffixKind,
    pub cross_product: bool,
    /// Rule count announced by the class header.
    pub declared: usize,
    pub rules: Vec<AffixRule>,
}

/// Flags and options with a meaning beyond affix classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialFlags {
    /// `NEEDAFFIX` / `PSEUDOROOT`: the bare word is not a valid form.
    pub need_affix: Option<String>,
    /// `FORBIDDENWORD`: the entry is excluded from the vocabulary.
    pub forbidden: Option<String>,
    /// `FULLSTRIP`: rules may strip the entire word.
    pub full_strip: bool,
    /// Flags declared by compounding, casing and suggestion directives
    /// (`COMPOUNDFLAG`, `KEEPCASE`, `ONLYINCOMPOUND`, ...). They mark words
    /// but never name an affix class.
    pub reserved: BTreeSet<String>,
}

impl SpecialFlags {
    /// Whether `flag` is declared by a directive rather than a class header.
    pub fn is_special(&self, flag: &str) -> bool {
        self.need_affix.as_deref() == Some(flag)
            || self.forbidden.as_deref() == Some(flag)
            || self.reserved.contains(flag)
    }
}

/// The compiled form of an affix file.
///
/// This is the unit stored in the cache for an `.aff` source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffixTable {
    pub flag_mode: FlagMode,
    /// `AF` aliases; alias `n` is `aliases[n - 1]`.
    pub aliases: Vec<String>,
    pub classes: Vec<AffixClass>,
    pub names: BTreeMap<String, ClassId>,
    pub special: SpecialFlags,
    /// Label given by the `SET` directive, if any.
    pub encoding: Option<String>,
}

impl AffixTable {
    pub fn class(&self, id: ClassId) -> &AffixClass {
        &self.classes[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.names.get(name).copied()
    }

    /// Total number of rules over every class.
    pub fn rule_count(&self) -> usize {
        self.classes.iter().map(|c| c.rules.len()).sum()
    }
}

/// A word from the word list with its affix combinations resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseWordEntry {
    pub word: String,
    pub combos: Vec<Combo>,
    /// The bare word is only valid with an affix applied.
    pub need_affix: bool,
}

/// SHA-256 digest of a source file's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Aff,
    Dic,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceKind::Aff => write!(f, "aff"),
            SourceKind::Dic => write!(f, "dic"),
        }
    }
}

/// A soft parse error: recorded, logged, and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub source: SourceKind,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: {}", self.source, self.line, self.message)
    }
}

/// A parsed `.aff`/`.dic` pair.
#[derive(Debug, Clone)]
pub struct Dictionary {
    pub id: String,
    pub table: AffixTable,
    pub base_words: Vec<BaseWordEntry>,
    pub aff_hash: ContentHash,
    pub dic_hash: ContentHash,
    pub issues: Vec<ParseIssue>,
}

impl Dictionary {
    pub fn flag_mode(&self) -> FlagMode {
        self.table.flag_mode
    }
}

/// Caesar-family cipher variants explored by the hack driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    Basic,
    Progressive,
    Square,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Algorithm::Basic => write!(f, "BASIC"),
            Algorithm::Progressive => write!(f, "PROGRESSIVE"),
            Algorithm::Square => write!(f, "SQUARE"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "progressive" => Ok(Self::Progressive),
            "square" => Ok(Self::Square),
            _ => Err(EngineError::InvalidFormat(format!("Unknown algorithm: {}", s))),
        }
    }
}

/// Key progression used by [`Algorithm::Progressive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Geometric,
    Shift,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::Geometric => write!(f, "GEOMETRIC"),
            Method::Shift => write!(f, "SHIFT"),
        }
    }
}

/// One scored decryption attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct HackCandidate {
    pub algorithm: Algorithm,
    pub method: Option<Method>,
    pub key: i64,
    pub decrypted_text: String,
    pub language: Option<String>,
    pub average_score: f64,
}

impl fmt::Display for HackCandidate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let method = self.method.map(|m| format!("/{}", m)).unwrap_or_default();
        write!(
            f,
            "[{:.3}] {}{} key={} lang={} | {}",
            self.average_score,
            self.algorithm,
            method,
            self.key,
            self.language.as_deref().unwrap_or("?"),
            self.decrypted_text
        )
    }
}
