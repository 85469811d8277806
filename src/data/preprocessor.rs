// ============================================================
// Layer 4 — Dialect Preprocessor
// ============================================================
// Canonicalises Swiss German chat messages before they reach
// the n-gram model.
//
// Chat Mundart is written however people feel like writing it:
//   - "nid", "noed" and "ned" all mean "not"
//   - "müehsam" shows up as "muehsam", "muesam", "müeeehsam"
//   - links, @handles, #tags and numbers carry no wording
//
// If we don't fold these together, every spelling variant
// becomes its own token and the n-gram counts get spread thin.
//
// Cleaning steps (applied in order):
//   1. Trim, lowercase, map invisible / control characters to spaces
//   2. Replace URLs, @users and #hashtags with placeholders
//   3. Replace digit runs with <NUM>
//   4. Squash 3+ repeated characters to 2 ("heyyyy" → "heyy")
//   5. Apostrophes → space
//   6. Fold umlauts (ä → ae, ö → oe, ü → ue, ß → ss)
//   7. '-' and '/' → space
//   8. Apply the dialect spelling map word by word
//   9. Drop everything that is not a word char or '<' / '>'
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

use std::collections::HashMap;

use crate::domain::token::{
    HASHTAG_PLACEHOLDER, NUMBER_PLACEHOLDER, URL_PLACEHOLDER, USER_PLACEHOLDER,
};
use crate::domain::traits::TextNormalizer;

/// Spelling variants folded onto one canonical form.
/// Keys are already umlaut-folded because step 6 runs first.
const DEFAULT_DIALECT_MAP: &[(&str, &str)] = &[
    // negation / "only"
    ("nid", "ned"),
    ("noed", "ned"),
    ("numae", "nume"),
    ("numeno", "nume no"),
    // forms of "to be"
    ("bin", "bi"),
    ("bini", "bi"),
    ("ischno", "isch no"),
    ("sisch", "s isch"),
    // forms of "can"
    ("cha", "chan"),
    ("chani", "chan i"),
    ("chamer", "chan mer"),
    ("channsch", "chasch"),
    // come / go
    ("chunt", "chunnt"),
    ("chuntsch", "chunsch"),
    ("gang", "go"),
    ("geh", "go"),
    // expressions
    ("imfall", "im fall"),
    // adjectives
    ("huereguet", "huere guet"),
    ("hueregael", "huere geil"),
    ("muesam", "muehsam"),
];

const URL_PREFIXES: &[&str] = &["https://", "http://", "www."];

pub struct DialectPreprocessor {
    dialect_map: HashMap<String, String>,
}

impl DialectPreprocessor {
    /// Create a preprocessor with the built-in dialect map
    pub fn new() -> Self {
        let dialect_map = DEFAULT_DIALECT_MAP
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self { dialect_map }
    }

    /// Add or override dialect map entries (e.g. from config).
    /// Keys are lowercased so they match the normalised text.
    pub fn with_extra_entries<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (from, to) in entries {
            self.dialect_map
                .insert(from.into().to_lowercase(), to.into());
        }
        self
    }

    pub fn dialect_map_len(&self) -> usize {
        self.dialect_map.len()
    }

    /// Run the full cleaning pipeline on one message.
    pub fn clean(&self, text: &str) -> String {

        // ── Step 1: Lowercase and neutralise invisible characters ────────────
        let step1: String = text
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();

        // ── Step 2: URLs, @users, #hashtags ──────────────────────────────────
        // None of these ever span whitespace, so work token by token.
        let step2 = step1
            .split_whitespace()
            .map(|tok| {
                let tok = replace_url(tok);
                let tok = replace_tagged(&tok, '@', USER_PLACEHOLDER);
                replace_tagged(&tok, '#', HASHTAG_PLACEHOLDER)
            })
            .collect::<Vec<_>>()
            .join(" ");

        // ── Step 3: Digit runs → <NUM> ───────────────────────────────────────
        let mut step3 = String::with_capacity(step2.len());
        let mut in_digits = false;
        for c in step2.chars() {
            if c.is_ascii_digit() {
                if !in_digits {
                    step3.push_str(NUMBER_PLACEHOLDER);
                }
                in_digits = true;
            } else {
                step3.push(c);
                in_digits = false;
            }
        }

        // ── Step 4: Squash character runs longer than two ────────────────────
        let mut step4 = String::with_capacity(step3.len());
        let mut last: Option<char> = None;
        let mut run = 0usize;
        for c in step3.chars() {
            if Some(c) == last {
                run += 1;
            } else {
                last = Some(c);
                run = 1;
            }
            if run <= 2 {
                step4.push(c);
            }
        }

        // ── Steps 5-7: Apostrophes, umlauts, separators ──────────────────────
        let mut step7 = String::with_capacity(step4.len() + 8);
        for c in step4.chars() {
            match c {
                '\u{2019}' | '\u{00B4}' | '`' | '\'' => step7.push(' '),
                'ä' => step7.push_str("ae"),
                'ö' => step7.push_str("oe"),
                'ü' => step7.push_str("ue"),
                'ß' => step7.push_str("ss"),
                '-' | '/' => step7.push(' '),
                c => step7.push(c),
            }
        }

        // ── Step 8: Dialect spelling map ─────────────────────────────────────
        let step8 = step7
            .split_whitespace()
            .map(|w| self.dialect_map.get(w).map(String::as_str).unwrap_or(w))
            .collect::<Vec<_>>()
            .join(" ");

        // ── Step 9: Keep only word characters and placeholder brackets ───────
        let step9: String = step8
            .chars()
            .map(|c| if is_word_char(c) || c == '<' || c == '>' { c } else { ' ' })
            .collect();

        step9.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for DialectPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer for DialectPreprocessor {
    fn normalize(&self, raw: &str) -> String {
        self.clean(raw)
    }

    fn tokenize(&self, canonical: &str) -> Vec<String> {
        canonical.split_whitespace().map(str::to_string).collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace everything from a URL prefix to the end of the token.
fn replace_url(tok: &str) -> String {
    let start = URL_PREFIXES.iter().filter_map(|p| tok.find(p)).min();
    match start {
        Some(i) => format!("{}{}", &tok[..i], URL_PLACEHOLDER),
        None => tok.to_string(),
    }
}

/// Replace every `marker` followed by one or more word chars.
/// A bare marker (e.g. a lone "#") is left alone.
fn replace_tagged(tok: &str, marker: char, placeholder: &str) -> String {
    let chars: Vec<char> = tok.chars().collect();
    let mut out = String::with_capacity(tok.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == marker && i + 1 < chars.len() && is_word_char(chars[i + 1]) {
            out.push_str(placeholder);
            i += 1;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_collapses_spaces() {
        let p = DialectPreprocessor::new();
        assert_eq!(p.clean("  Hoi   DU  "), "hoi du");
    }

    #[test]
    fn test_placeholders() {
        let p = DialectPreprocessor::new();
        assert_eq!(
            p.clean("lueg mal https://example.ch @anna #mundart"),
            "lueg mal <URL> <USER> <HASHTAG>"
        );
    }

    #[test]
    fn test_numbers_become_placeholder() {
        let p = DialectPreprocessor::new();
        assert_eq!(p.clean("am 12. mai um 8"), "am <NUM> mai um <NUM>");
    }

    #[test]
    fn test_squashes_repeated_letters() {
        let p = DialectPreprocessor::new();
        assert_eq!(p.clean("heyyyyy"), "heyy");
    }

    #[test]
    fn test_folds_umlauts_and_apostrophes() {
        let p = DialectPreprocessor::new();
        assert_eq!(p.clean("s'isch müesam"), "s isch muehsam");
        // ü → ue keeps the following "eh"
        assert_eq!(p.clean("müehsam"), "mueehsam");
    }

    #[test]
    fn test_applies_dialect_map_after_umlaut_folding() {
        let p = DialectPreprocessor::new();
        // "nöd" → "noed" (umlaut) → "ned" (dialect map)
        assert_eq!(p.clean("das cha nöd sii"), "das chan ned sii");
    }

    #[test]
    fn test_strips_punctuation_but_keeps_placeholders() {
        let p = DialectPreprocessor::new();
        assert_eq!(p.clean("wie gohts dir?!"), "wie gohts dir");
        assert_eq!(p.clean("(#tag)"), "<HASHTAG>");
    }

    #[test]
    fn test_extra_entries_override_map() {
        let p = DialectPreprocessor::new().with_extra_entries([("Gopf", "gopfertami")]);
        assert_eq!(p.clean("gopf"), "gopfertami");
    }

    #[test]
    fn test_tokens_splits_on_whitespace() {
        let p = DialectPreprocessor::new();
        assert_eq!(p.tokens("I ha kei Bock"), vec!["i", "ha", "kei", "bock"]);
    }

    #[test]
    fn test_empty_string() {
        let p = DialectPreprocessor::new();
        assert_eq!(p.clean(""), "");
        assert!(p.tokens("  ?! ").is_empty());
    }
}
