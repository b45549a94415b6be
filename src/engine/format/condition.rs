//! Affix rule conditions.
//!
//! A condition is a small pattern over the edge characters of a word:
//! literal characters, `.` for any character, and bracket classes
//! (`[aeiou]`, `[^aeiou]`). Every character inside a bracket class is
//! literal, so historical conditions such as `[-a]` keep their hyphen.
//!
//! Conditions are compiled into anchored `regex` matchers: suffix
//! conditions are anchored at the end of the word, prefix conditions at the
//! start.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::types::error::{EngineError, Result};
use crate::engine::types::models::AffixKind;

/// A compiled, anchored rule condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "ConditionSource", try_from = "ConditionSource")]
pub struct Condition {
    source: String,
    kind: AffixKind,
    matcher: Regex,
}

/// Serialized form of a [`Condition`]; the matcher is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConditionSource {
    source: String,
    kind: AffixKind,
}

impl Condition {
    /// Compiles a condition for a prefix or suffix rule.
    ///
    /// Returns `Ok(None)` for the match-everything conditions `.` and the
    /// empty string.
    pub fn compile(source: &str, kind: AffixKind) -> Result<Option<Self>> {
        if source.is_empty() || source == "." {
            return Ok(None);
        }
        let body = translate(source)?;
        let anchored = match kind {
            AffixKind::Suffix => format!("(?:{})$", body),
            AffixKind::Prefix => format!("^(?:{})", body),
        };
        let matcher = Regex::new(&anchored).map_err(|e| {
            EngineError::InvalidFormat(format!("Condition '{}' does not compile: {}", source, e))
        })?;
        Ok(Some(Self { source: source.to_string(), kind, matcher }))
    }

    pub fn matches(&self, word: &str) -> bool {
        self.matcher.is_match(word)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.kind == other.kind
    }
}

impl From<Condition> for ConditionSource {
    fn from(condition: Condition) -> Self {
        Self { source: condition.source, kind: condition.kind }
    }
}

impl TryFrom<ConditionSource> for Condition {
    type Error = EngineError;
    fn try_from(value: ConditionSource) -> Result<Self> {
        Condition::compile(&value.source, value.kind)?.ok_or_else(|| {
            EngineError::InvalidFormat("Empty condition in serialized table".to_string())
        })
    }
}

/// Translates condition syntax into an (unanchored) regex body.
fn translate(source: &str) -> Result<String> {
    let mut out = String::with_capacity(source.len() * 2);
    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => out.push('.'),
            '[' => {
                let mut negated = false;
                let mut members = String::new();
                let mut closed = false;
                let mut first = true;
                for m in chars.by_ref() {
                    if m == ']' {
                        closed = true;
                        break;
                    }
                    if first && m == '^' {
                        negated = true;
                        first = false;
                        continue;
                    }
                    first = false;
                    members.push_str(&regex::escape(m.encode_utf8(&mut [0u8; 4])));
                }
                if !closed {
                    return Err(EngineError::InvalidFormat(format!(
                        "Unterminated bracket class in condition '{}'",
                        source
                    )));
                }
                if members.is_empty() {
                    return Err(EngineError::InvalidFormat(format!(
                        "Empty bracket class in condition '{}'",
                        source
                    )));
                }
                out.push('[');
                if negated {
                    out.push('^');
                }
                out.push_str(&members);
                out.push(']');
            }
            ']' => {
                return Err(EngineError::InvalidFormat(format!(
                    "Unmatched ']' in condition '{}'",
                    source
                )));
            }
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }

    Ok(out)
}
