//! Affix file (`.aff`) compilation.
//!
//! Turns the line-oriented Hunspell affix format into an [`AffixTable`].
//!
//! # Recognized directives
//! ```text
//! FLAG long|num|UTF-8         flag encoding
//! AF <count>                  alias table header
//! AF <flags>                  alias entry (1-based)
//! SET <encoding>              text encoding of .aff and .dic
//! PFX|SFX <id> <Y|N> <count>  class header
//! PFX|SFX <id> <strip> <add>[/<flags>] [<condition>] [morphology...]
//! NEEDAFFIX|PSEUDOROOT <flag>
//! FORBIDDENWORD <flag>
//! FULLSTRIP
//! KEEPCASE|COMPOUNDFLAG|... <flag>  word markers, never classes
//! ```
//!
//! Malformed lines never abort compilation: they are recorded as
//! [`ParseIssue`]s and the rest of the file is still compiled.

use std::collections::HashMap;

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::engine::format::condition::Condition;
use crate::engine::format::flags;
use crate::engine::types::error::EngineError;
use crate::engine::types::models::{
    AffixClass, AffixKind, AffixRule, AffixTable, ClassId, FlagMode, ParseIssue, SourceKind,
};

/// Directives that are valid Hunspell but irrelevant to word generation.
const IGNORED_DIRECTIVES: &[&str] = &[
    "TRY", "KEY", "REP", "MAP", "PHONE", "BREAK", "ICONV", "OCONV", "WORDCHARS", "IGNORE",
    "LANG", "NAME", "HOME", "VERSION", "COMPLEXPREFIXES", "MAXNGRAMSUGS", "MAXCPDSUGS",
    "MAXDIFF", "ONLYMAXDIFF", "NOSPLITSUGS", "SUGSWITHDOTS", "CHECKSHARPS", "FORBIDWARN", "AM",
    "SFX_MORPH", "CHECKCOMPOUNDDUP", "CHECKCOMPOUNDREP", "CHECKCOMPOUNDCASE",
    "CHECKCOMPOUNDTRIPLE", "SIMPLIFIEDTRIPLE", "CHECKCOMPOUNDPATTERN", "COMPOUNDRULE",
    "COMPOUNDMIN", "COMPOUNDWORDMAX", "COMPOUNDSYLLABLE", "SYLLABLENUM",
];

/// Directives whose single argument is a flag that marks words without
/// naming an affix class.
const FLAG_DIRECTIVES: &[&str] = &[
    "KEEPCASE", "CIRCUMFIX", "ONLYINCOMPOUND", "NOSUGGEST", "SUBSTANDARD", "LEMMA_PRESENT",
    "WARN", "FORCEUCASE", "COMPOUNDFLAG", "COMPOUNDBEGIN", "COMPOUNDLAST", "COMPOUNDMIDDLE",
    "COMPOUNDEND", "COMPOUNDPERMITFLAG", "COMPOUNDFORBIDFLAG", "COMPOUNDROOT",
];

/// Result of compiling an affix file.
///
/// This is the snapshot stored in the cache, so a warm load reports the same
/// issues as the cold compile did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledAffixes {
    pub table: AffixTable,
    pub issues: Vec<ParseIssue>,
}

/// Compiles the decoded text of an affix file.
pub fn compile(text: &str) -> CompiledAffixes {
    info!("Compiling affix rules");
    let mut compiler = Compiler::default();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        compiler.line(idx + 1, line);
    }

    compiler.check_rule_counts();
    compiler.resolve_continuations();

    let CompiledAffixes { table, issues } = compiler.finish();
    info!(
        "Affix rules compiled: {} classes, {} rules, {} aliases, {} issues",
        table.classes.len(),
        table.rule_count(),
        table.aliases.len(),
        issues.len()
    );
    CompiledAffixes { table, issues }
}

#[derive(Default)]
struct Compiler {
    table: AffixTable,
    issues: Vec<ParseIssue>,
    /// Rules still expected for each open class.
    remaining: HashMap<ClassId, usize>,
    /// Line of each class header, for count mismatch reports.
    header_lines: HashMap<ClassId, usize>,
    alias_count: Option<usize>,
    /// Source line of each rule, by class and rule index.
    rule_lines: HashMap<(ClassId, usize), usize>,
}

impl Compiler {
    fn finish(self) -> CompiledAffixes {
        CompiledAffixes { table: self.table, issues: self.issues }
    }

    fn issue(&mut self, line: usize, message: String) {
        warn!("Affix file line {}: {}", line, message);
        self.issues.push(ParseIssue { source: SourceKind::Aff, line, message });
    }

    fn line(&mut self, line_no: usize, line: &str) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let directive = tokens[0];

        match directive {
            "FLAG" => match tokens.get(1).and_then(|label| FlagMode::from_label(label)) {
                Some(mode) => {
                    debug!("Flag mode: {:?}", mode);
                    self.table.flag_mode = mode;
                }
                None => self.issue(line_no, format!("Unsupported FLAG value: {:?}", tokens.get(1))),
            },
            "AF" => self.alias(line_no, &tokens),
            "SET" => match tokens.get(1) {
                Some(label) => self.table.encoding = Some(label.to_string()),
                None => self.issue(line_no, "SET without encoding".to_string()),
            },
            "NEEDAFFIX" | "PSEUDOROOT" => match tokens.get(1) {
                Some(flag) => self.table.special.need_affix = Some(flag.to_string()),
                None => self.issue(line_no, format!("{} without flag", directive)),
            },
            "FORBIDDENWORD" => match tokens.get(1) {
                Some(flag) => self.table.special.forbidden = Some(flag.to_string()),
                None => self.issue(line_no, "FORBIDDENWORD without flag".to_string()),
            },
            "FULLSTRIP" => self.table.special.full_strip = true,
            _ if FLAG_DIRECTIVES.contains(&directive) => match tokens.get(1) {
                Some(flag) => {
                    trace!("{} flag {}", directive, flag);
                    self.table.special.reserved.insert(flag.to_string());
                }
                None => self.issue(line_no, format!("{} without flag", directive)),
            },
            "PFX" => self.affix_line(line_no, AffixKind::Prefix, &tokens),
            "SFX" => self.affix_line(line_no, AffixKind::Suffix, &tokens),
            _ if IGNORED_DIRECTIVES.contains(&directive) => {
                trace!("Skipping directive {} on line {}", directive, line_no);
            }
            _ => self.issue(line_no, format!("Unknown directive: {}", directive)),
        }
    }

    fn alias(&mut self, line_no: usize, tokens: &[&str]) {
        let Some(value) = tokens.get(1) else {
            self.issue(line_no, "AF without value".to_string());
            return;
        };
        if self.alias_count.is_none() && self.table.aliases.is_empty() {
            if let Ok(count) = value.parse::<usize>() {
                self.alias_count = Some(count);
                return;
            }
        }
        self.table.aliases.push(value.to_string());
    }

    fn affix_line(&mut self, line_no: usize, kind: AffixKind, tokens: &[&str]) {
        let Some(name) = tokens.get(1) else {
            self.issue(line_no, format!("{} without class id", kind));
            return;
        };

        match self.table.lookup(name) {
            Some(id) if self.remaining.get(&id).copied().unwrap_or(0) > 0 => {
                self.rule(line_no, id, kind, tokens)
            }
            Some(id) if is_header(tokens) => self.reopen(line_no, id, kind, tokens),
            Some(_) => self.issue(
                line_no,
                format!("Rule for class {} exceeds its declared count", name),
            ),
            None if is_header(tokens) => self.open(line_no, name, kind, tokens),
            None => self.issue(line_no, format!("Rule for undefined class {}", name)),
        }
    }

    fn open(&mut self, line_no: usize, name: &str, kind: AffixKind, tokens: &[&str]) {
        let Some((cross_product, count)) = self.parse_header(line_no, tokens) else {
            return;
        };
        let id = ClassId::new(self.table.classes.len());
        trace!("Opening {} class {} (cross={}, rules={})", kind, name, cross_product, count);
        self.table.classes.push(AffixClass {
            id,
            name: name.to_string(),
            kind,
            cross_product,
            declared: count,
            rules: Vec::new(),
        });
        self.table.names.insert(name.to_string(), id);
        self.remaining.insert(id, count);
        self.header_lines.insert(id, line_no);
    }

    /// A second header for an existing class appends to it.
    fn reopen(&mut self, line_no: usize, id: ClassId, kind: AffixKind, tokens: &[&str]) {
        if self.table.class(id).kind != kind {
            let message = format!("Class {} redeclared as {}", self.table.class(id).name, kind);
            self.issue(line_no, message);
            return;
        }
        let Some((_, count)) = self.parse_header(line_no, tokens) else {
            return;
        };
        self.table.classes[id.index()].declared += count;
        self.remaining.insert(id, count);
    }

    fn parse_header(&mut self, line_no: usize, tokens: &[&str]) -> Option<(bool, usize)> {
        let cross_product = match tokens[2] {
            "Y" => true,
            "N" => false,
            other => {
                self.issue(line_no, format!("Invalid cross product marker: {}", other));
                return None;
            }
        };
        match tokens[3].parse::<usize>() {
            Ok(count) => Some((cross_product, count)),
            Err(_) => {
                self.issue(line_no, format!("Invalid rule count: {}", tokens[3]));
                None
            }
        }
    }

    fn rule(&mut self, line_no: usize, id: ClassId, kind: AffixKind, tokens: &[&str]) {
        if let Some(left) = self.remaining.get_mut(&id) {
            *left -= 1;
        }
        let class = self.table.class(id);
        if class.kind != kind {
            let message = format!("{} rule for {} class {}", kind, class.kind, class.name);
            self.issue(line_no, message);
            return;
        }
        if tokens.len() < 4 {
            self.issue(line_no, format!("Incomplete rule: expected strip and add, got {} fields", tokens.len()));
            return;
        }

        let strip = zero_as_empty(tokens[2]);
        let (add, continuation_flags) = match tokens[3].split_once('/') {
            Some((add, flags)) => (zero_as_empty(add), flags.to_string()),
            None => (zero_as_empty(tokens[3]), String::new()),
        };
        let condition = match Condition::compile(tokens.get(4).copied().unwrap_or("."), kind) {
            Ok(condition) => condition,
            Err(e) => {
                self.issue(line_no, e.to_string());
                return;
            }
        };

        let rules = &mut self.table.classes[id.index()].rules;
        self.rule_lines.insert((id, rules.len()), line_no);
        rules.push(AffixRule {
            strip,
            add,
            continuation_flags,
            continuation: Vec::new(),
            condition,
        });
    }

    fn check_rule_counts(&mut self) {
        let mut short = Vec::new();
        for class in &self.table.classes {
            let left = self.remaining.get(&class.id).copied().unwrap_or(0);
            if left > 0 {
                let line = self.header_lines.get(&class.id).copied().unwrap_or(0);
                short.push((line, class.name.clone(), class.declared, class.declared - left));
            }
        }
        for (line, name, declared, found) in short {
            self.issue(line, format!("Class {} declares {} rules but has {}", name, declared, found));
        }
        if let Some(count) = self.alias_count {
            if count != self.table.aliases.len() {
                debug!("AF declares {} aliases, found {}", count, self.table.aliases.len());
            }
        }
    }

    /// Resolves every rule's continuation flags into combos.
    ///
    /// Runs once all classes are known so forward references resolve.
    fn resolve_continuations(&mut self) {
        let mut resolved = Vec::new();
        let mut problems = Vec::new();

        for (ci, class) in self.table.classes.iter().enumerate() {
            for (ri, rule) in class.rules.iter().enumerate() {
                if rule.continuation_flags.is_empty() {
                    continue;
                }
                let line = self.rule_lines.get(&(class.id, ri)).copied().unwrap_or(0);
                let names = match flags::decode_flags(&rule.continuation_flags, &self.table) {
                    Ok(names) => names,
                    Err(e) => {
                        problems.push((line, format!("Class {}: {}", class.name, e)));
                        continue;
                    }
                };
                let (combos, unknown) = flags::resolve_combos(&self.table, &names);
                for flag in unknown {
                    if !self.table.special.is_special(&flag) {
                        let e = EngineError::UnknownClass(flag);
                        problems.push((line, format!("Class {} continuation: {}", class.name, e)));
                    }
                }
                resolved.push((ci, ri, combos));
            }
        }

        for (ci, ri, combos) in resolved {
            self.table.classes[ci].rules[ri].continuation = combos;
        }
        for (line, message) in problems {
            self.issue(line, message);
        }
    }
}

/// `PFX A Y 3` style header: a marker followed by a numeric count and
/// nothing else but an optional comment.
fn is_header(tokens: &[&str]) -> bool {
    tokens.len() >= 4
        && tokens[2].chars().count() == 1
        && tokens[3].bytes().all(|b| b.is_ascii_digit())
        && tokens.get(4).map_or(true, |t| t.starts_with('#'))
}

fn zero_as_empty(token: &str) -> String {
    if token == "0" {
        String::new()
    } else {
        token.to_string()
    }
}
