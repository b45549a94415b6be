//! Source format parsing layer for Hunspell dictionaries.
//!
//! This module turns raw affix and word-list text into the compiled
//! structures consumed by the [`WordGenerator`](crate::engine::generator::WordGenerator).
//!
//! # Module Organization
//!
//! - [`affix`]: Compiles `.aff` directives into an affix table
//! - [`condition`]: Compiles rule conditions into anchored matchers
//! - [`flags`]: Splits flag strings and resolves prefix/suffix combos
//! - [`wordlist`]: Parses `.dic` entries into base word entries
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────┐   affix::compile()    ┌─────────────┐
//! │  .aff text  │ ────────────────────▶ │ AffixTable  │
//! └─────────────┘                       └──────┬──────┘
//! ┌─────────────┐   wordlist::parse()          │
//! │  .dic text  │ ─────────────────────────────┴──▶ Vec<BaseWordEntry>
//! └─────────────┘
//! ```

pub mod affix;
pub mod condition;
pub mod flags;
pub mod wordlist;
