//! Flag string decoding and combo resolution.
//!
//! Dictionary entries and rule continuations carry packed flag strings.
//! Depending on the `FLAG` directive these are split per character, per
//! character pair, or on commas. When the affix file declares `AF` aliases,
//! a purely numeric flag string is an alias reference instead.

use crate::engine::types::error::{EngineError, Result};
use crate::engine::types::models::{AffixKind, AffixTable, ClassId, Combo, FlagMode};

/// Splits a packed flag string into individual flag names.
pub fn split_flags(raw: &str, mode: FlagMode) -> Vec<String> {
    match mode {
        FlagMode::Ascii => raw.chars().map(String::from).collect(),
        FlagMode::Long => {
            let chars: Vec<char> = raw.chars().collect();
            chars.chunks(2).map(|pair| pair.iter().collect()).collect()
        }
        FlagMode::Numeric => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    }
}

/// Expands an alias reference, or returns the input when it is not one.
///
/// # Errors
/// Returns an error for a numeric reference outside the alias table.
pub fn expand_alias<'a>(raw: &'a str, aliases: &'a [String]) -> Result<&'a str> {
    if aliases.is_empty() || raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(raw);
    }
    let index: usize = raw
        .parse()
        .map_err(|_| EngineError::InvalidFormat(format!("Invalid alias reference: {}", raw)))?;
    index
        .checked_sub(1)
        .and_then(|i| aliases.get(i))
        .map(String::as_str)
        .ok_or_else(|| {
            EngineError::InvalidFormat(format!(
                "Alias {} out of range (table has {} entries)",
                index,
                aliases.len()
            ))
        })
}

/// Decodes a raw flag string into flag names, honoring aliases.
pub fn decode_flags(raw: &str, table: &AffixTable) -> Result<Vec<String>> {
    let expanded = expand_alias(raw, &table.aliases)?;
    Ok(split_flags(expanded, table.flag_mode))
}

/// Resolves flag names into the legal prefix/suffix combos.
///
/// Every prefix class and every suffix class is legal on its own; a prefix
/// and a suffix class may be paired only when both allow cross products.
///
/// Returns the combos and the flag names that name no affix class.
pub fn resolve_combos(table: &AffixTable, flags: &[String]) -> (Vec<Combo>, Vec<String>) {
    let mut prefixes: Vec<ClassId> = Vec::new();
    let mut suffixes: Vec<ClassId> = Vec::new();
    let mut unknown = Vec::new();

    for flag in flags {
        match table.lookup(flag) {
            Some(id) => {
                let bucket = match table.class(id).kind {
                    AffixKind::Prefix => &mut prefixes,
                    AffixKind::Suffix => &mut suffixes,
                };
                if !bucket.contains(&id) {
                    bucket.push(id);
                }
            }
            None => unknown.push(flag.clone()),
        }
    }

    let mut combos: Vec<Combo> = prefixes.iter().map(|&p| Combo::prefix(p)).collect();
    combos.extend(suffixes.iter().map(|&s| Combo::suffix(s)));
    for &p in &prefixes {
        if !table.class(p).cross_product {
            continue;
        }
        for &s in &suffixes {
            if table.class(s).cross_product {
                combos.push(Combo::cross(p, s));
            }
        }
    }

    (combos, unknown)
}

/// Returns true when `flags` contains the special flag `special`.
pub fn has_flag(flags: &[String], special: Option<&String>) -> bool {
    special.map_or(false, |s| flags.iter().any(|f| f == s))
}
