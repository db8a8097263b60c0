use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 5] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Normalize the text of one extracted line.
///
/// NFC normalization, ligature expansion, replacement character removal and
/// whitespace collapsing. The result is trimmed and may be empty.
pub fn clean_line_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.nfc() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expanded)) => result.push_str(expanded),
            None if c == '\u{FFFD}' || c == '\0' => {}
            None => result.push(c),
        }
    }

    static RE_WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re_whitespace = RE_WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_whitespace.replace_all(result.trim(), " ").into_owned()
}
