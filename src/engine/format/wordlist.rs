//! Word list (`.dic`) parsing.
//!
//! # Format
//! ```text
//! 3               optional entry count (first line only)
//! walk/A          word with flags
//! and/or\/not     "\/" escapes a slash inside the word
//! love/A	po:verb  everything after a tab is morphology
//! ```
//!
//! Blank lines and lines starting with a tab are skipped. Flags are decoded
//! against the compiled [`AffixTable`] and turned into combos up front, so
//! generation never looks a class up by name.

use std::collections::HashSet;

use log::{debug, info, trace, warn};

use crate::engine::format::flags;
use crate::engine::types::error::EngineError;
use crate::engine::types::models::{AffixTable, BaseWordEntry, ParseIssue, SourceKind};

/// Result of parsing a word list.
#[derive(Debug, Clone, Default)]
pub struct ParsedWordList {
    pub entries: Vec<BaseWordEntry>,
    pub issues: Vec<ParseIssue>,
    /// Entry count announced on the first line, if present.
    pub declared: Option<usize>,
}

/// Parses the decoded text of a word list against a compiled affix table.
pub fn parse(text: &str, table: &AffixTable) -> ParsedWordList {
    info!("Parsing word list");
    let mut parsed = ParsedWordList::default();
    let mut reported_flags: HashSet<String> = HashSet::new();
    let mut forbidden = 0usize;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let raw_line = if idx == 0 { raw_line.trim_start_matches('\u{feff}') } else { raw_line };
        if raw_line.starts_with('\t') || raw_line.trim().is_empty() {
            continue;
        }
        let line = raw_line.trim();

        if idx == 0 {
            if let Ok(count) = line.parse::<usize>() {
                parsed.declared = Some(count);
                continue;
            }
        }

        let (word, raw_flags) = split_entry(strip_morphology(line));
        if word.is_empty() {
            issue(&mut parsed.issues, line_no, "Entry without a word".to_string());
            continue;
        }

        let names = match raw_flags.as_deref().map(|f| flags::decode_flags(f, table)) {
            None => Vec::new(),
            Some(Ok(names)) => names,
            Some(Err(e)) => {
                issue(&mut parsed.issues, line_no, format!("{}: {}", word, e));
                Vec::new()
            }
        };

        if flags::has_flag(&names, table.special.forbidden.as_ref()) {
            trace!("Skipping forbidden word '{}'", word);
            forbidden += 1;
            continue;
        }
        let need_affix = flags::has_flag(&names, table.special.need_affix.as_ref());

        let (combos, unknown) = flags::resolve_combos(table, &names);
        for flag in unknown {
            if table.special.is_special(&flag) {
                continue;
            }
            if reported_flags.insert(flag.clone()) {
                let message = format!("Word '{}': {}", word, EngineError::UnknownClass(flag));
                issue(&mut parsed.issues, line_no, message);
            }
        }

        parsed.entries.push(BaseWordEntry { word, combos, need_affix });
    }

    if let Some(declared) = parsed.declared {
        if declared != parsed.entries.len() + forbidden {
            debug!(
                "Word list declares {} entries, parsed {}",
                declared,
                parsed.entries.len() + forbidden
            );
        }
    }
    info!(
        "Word list parsed: {} entries ({} forbidden skipped), {} issues",
        parsed.entries.len(),
        forbidden,
        parsed.issues.len()
    );
    parsed
}

fn issue(issues: &mut Vec<ParseIssue>, line: usize, message: String) {
    warn!("Word list line {}: {}", line, message);
    issues.push(ParseIssue { source: SourceKind::Dic, line, message });
}

/// Drops morphological fields: everything after a tab, and any trailing
/// space-separated `xx:value` fields.
fn strip_morphology(line: &str) -> &str {
    let line = line.split('\t').next().unwrap_or(line).trim_end();
    let mut end = line.len();
    let mut search_from = 0;
    while let Some(pos) = line[search_from..].find(' ') {
        let at = search_from + pos;
        if is_morph_field(line[at..].trim_start()) {
            end = at;
            break;
        }
        search_from = at + 1;
    }
    line[..end].trim_end()
}

fn is_morph_field(field: &str) -> bool {
    let bytes = field.as_bytes();
    bytes.len() > 3 && bytes[0].is_ascii_lowercase() && bytes[1].is_ascii_lowercase() && bytes[2] == b':'
}

/// Splits `word/flags` at the first unescaped slash, unescaping `\/`.
fn split_entry(entry: &str) -> (String, Option<String>) {
    let mut word = String::with_capacity(entry.len());
    let mut chars = entry.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '/'))) => {
                word.push('/');
                chars.next();
            }
            '/' => {
                let flags = &entry[i + 1..];
                return (word, Some(flags.to_string()).filter(|f| !f.is_empty()));
            }
            _ => word.push(c),
        }
    }

    (word, None)
}
