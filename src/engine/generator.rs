//! Vocabulary generation by affix expansion.
//!
//! [`WordGenerator`] walks the base word entries of a dictionary and yields
//! every word form the affix table derives from them, lazily and one base
//! word at a time.
//!
//! # Traversal
//!
//! Rules may carry continuation classes, which makes the rule set a graph.
//! Expansion uses an explicit stack of `(word, combos, depth)` items instead
//! of native recursion. A rule application deeper than
//! [`GeneratorOptions::max_depth`] aborts the expansion of that base word
//! only: its derived forms are dropped and the generator moves on.
//!
//! # Example
//! ```no_run
//! # use affix_hack::{GeneratorOptions, WordGenerator};
//! # fn demo(dictionary: &affix_hack::Dictionary) {
//! for word in WordGenerator::new(&dictionary.table, &dictionary.base_words, GeneratorOptions::default()) {
//!     println!("{}", word);
//! }
//! # }
//! ```

use std::collections::{HashSet, VecDeque};
use std::slice;

use log::{trace, warn};

use super::types::error::{EngineError, Result};
use super::types::models::{AffixKind, AffixTable, BaseWordEntry, Combo};

/// Default cap on nested rule applications per base word.
pub const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorOptions {
    /// Maximum number of nested rule applications for one base word.
    pub max_depth: usize,
    /// Suppress every word already emitted anywhere in the run.
    ///
    /// Keeps one set of all emitted words in memory.
    pub unique: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, unique: false }
    }
}

/// Lazy iterator over the vocabulary of a dictionary.
pub struct WordGenerator<'a> {
    table: &'a AffixTable,
    entries: slice::Iter<'a, BaseWordEntry>,
    options: GeneratorOptions,
    pending: VecDeque<String>,
    seen: Option<HashSet<String>>,
    skipped: usize,
}

impl<'a> WordGenerator<'a> {
    pub fn new(table: &'a AffixTable, entries: &'a [BaseWordEntry], options: GeneratorOptions) -> Self {
        Self {
            table,
            entries: entries.iter(),
            options,
            pending: VecDeque::new(),
            seen: options.unique.then(HashSet::new),
            skipped: 0,
        }
    }

    /// Number of base words whose expansion hit the depth cap so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn fill(&mut self, entry: &BaseWordEntry) {
        if !entry.need_affix {
            self.pending.push_back(entry.word.clone());
        }
        match expand_entry(self.table, entry, self.options.max_depth) {
            Ok(words) => {
                self.pending
                    .extend(words.into_iter().filter(|w| *w != entry.word));
            }
            Err(e) => {
                warn!("Skipping derived forms of '{}': {}", entry.word, e);
                self.skipped += 1;
            }
        }
    }
}

impl<'a> Iterator for WordGenerator<'a> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(word) = self.pending.pop_front() {
                if let Some(seen) = self.seen.as_mut() {
                    if !seen.insert(word.clone()) {
                        continue;
                    }
                }
                return Some(word);
            }

            let entry = self.entries.next()?;
            self.fill(entry);
        }
    }
}

enum Step<'t> {
    Emit(String),
    Expand { word: String, combos: &'t [Combo], depth: usize },
}

/// Expands one base word into its derived forms (the bare word excluded).
///
/// Words produced by a rule with continuation classes are preceded by their
/// own derived forms.
///
/// # Errors
/// Returns [`EngineError::TraversalDepthExceeded`] when a rule would apply
/// at a depth of `max_depth` or more.
pub fn expand_entry<'t>(
    table: &'t AffixTable,
    entry: &'t BaseWordEntry,
    max_depth: usize,
) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut stack = vec![Step::Expand { word: entry.word.clone(), combos: &entry.combos, depth: 0 }];

    while let Some(step) = stack.pop() {
        match step {
            Step::Emit(word) => out.push(word),
            Step::Expand { word, combos, depth } => {
                let derived = derive(table, &word, combos);
                if derived.is_empty() {
                    continue;
                }
                if depth >= max_depth {
                    return Err(EngineError::TraversalDepthExceeded { word: entry.word.clone(), depth });
                }
                trace!("'{}' at depth {}: {} derived forms", word, depth, derived.len());
                for Derived { form, continuations } in derived.into_iter().rev() {
                    stack.push(Step::Emit(form.clone()));
                    for combos in continuations.into_iter().rev().filter(|c| !c.is_empty()) {
                        stack.push(Step::Expand { word: form.clone(), combos, depth: depth + 1 });
                    }
                }
            }
        }
    }

    Ok(out)
}

/// A form produced by one combo, with the continuation combos of the
/// rules that produced it: the suffix rule's first, then the prefix rule's.
struct Derived<'t> {
    form: String,
    continuations: [&'t [Combo]; 2],
}

/// Applies every combo to `word` once.
fn derive<'t>(table: &'t AffixTable, word: &str, combos: &'t [Combo]) -> Vec<Derived<'t>> {
    let full_strip = table.special.full_strip;
    let mut derived = Vec::new();

    for combo in combos {
        match (combo.prefix, combo.suffix) {
            (Some(id), None) | (None, Some(id)) => {
                let class = table.class(id);
                for rule in &class.rules {
                    if let Some(form) = rule.apply(word, class.kind, full_strip) {
                        derived.push(Derived { form, continuations: [rule.continuation.as_slice(), &[]] });
                    }
                }
            }
            (Some(prefix), Some(suffix)) => {
                let prefixes = &table.class(prefix).rules;
                for suffix_rule in &table.class(suffix).rules {
                    let Some(suffixed) = suffix_rule.apply(word, AffixKind::Suffix, full_strip) else {
                        continue;
                    };
                    for prefix_rule in prefixes {
                        if let Some(form) = prefix_rule.apply(&suffixed, AffixKind::Prefix, full_strip) {
                            let continuations =
                                [suffix_rule.continuation.as_slice(), prefix_rule.continuation.as_slice()];
                            derived.push(Derived { form, continuations });
                        }
                    }
                }
            }
            (None, None) => {}
        }
    }

    derived
}
