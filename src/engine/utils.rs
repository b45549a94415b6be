//! Text decoding utilities for dictionary sources.

use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};

/// Maps a Hunspell `SET` label to an encoding, defaulting to UTF-8.
///
/// Besides WHATWG labels this accepts the `microsoft-cpNNNN` spelling used
/// by some older dictionaries.
pub fn parse_encoding(label: &str) -> &'static Encoding {
    let label = label.trim();
    let normalized = match label.to_ascii_lowercase().strip_prefix("microsoft-cp") {
        Some(page) => format!("windows-{}", page),
        None => label.to_string(),
    };
    Encoding::for_label(normalized.as_bytes()).unwrap_or_else(|| {
        warn!("Unknown encoding label '{}', falling back to UTF-8", label);
        UTF_8
    })
}

/// Finds the `SET` directive in raw affix bytes.
///
/// The directive is plain ASCII, so it can be located before the rest of the
/// file is decoded.
pub fn sniff_affix_encoding(aff_bytes: &[u8]) -> &'static Encoding {
    for line in aff_bytes.split(|&b| b == b'\n') {
        let line = line.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(line);
        if let Some(rest) = line.strip_prefix(b"SET") {
            if rest.first().map_or(false, |b| b.is_ascii_whitespace()) {
                let label = String::from_utf8_lossy(rest);
                let encoding = parse_encoding(&label);
                debug!("Affix SET directive: {}", encoding.name());
                return encoding;
            }
        }
    }
    UTF_8
}

/// Decodes source bytes, replacing malformed sequences.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("Malformed {} sequences replaced while decoding", used.name());
    }
    text.into_owned()
}
