// ============================================================
// Layer 3 — Tokens
// ============================================================
// A token is a normalised word or a placeholder marker.
//
// Sentences fed to the n-gram model are wrapped in explicit
// boundary markers so that "first word" and "last word"
// statistics exist:
//
//   "i ha kei bock"  →  <s> i ha kei bock </s>
//
// The normaliser replaces URLs, user handles, hashtags and
// numbers with bracketed placeholders (<URL>, <NUM>, ...).
// None of these markers are useful as a next-word suggestion,
// and neither is one-letter noise, so `is_good_token` rejects
// them.

/// Marker prepended to every corpus sentence
pub const SENTENCE_START: &str = "<s>";

/// Marker appended to every corpus sentence
pub const SENTENCE_END: &str = "</s>";

/// Placeholders emitted by the dialect preprocessor
pub const URL_PLACEHOLDER: &str = "<URL>";
pub const USER_PLACEHOLDER: &str = "<USER>";
pub const HASHTAG_PLACEHOLDER: &str = "<HASHTAG>";
pub const NUMBER_PLACEHOLDER: &str = "<NUM>";

/// Minimum length (in chars) of a suggestable token
pub const MIN_SUGGESTION_CHARS: usize = 2;

/// Returns true if `token` may be shown as a next-word suggestion.
///
/// Rejects the sentence markers, any `<...>` placeholder and
/// tokens shorter than two characters.
pub fn is_good_token(token: &str) -> bool {
    if token == SENTENCE_START || token == SENTENCE_END {
        return false;
    }
    if token.starts_with('<') && token.ends_with('>') {
        return false;
    }
    token.chars().count() >= MIN_SUGGESTION_CHARS
}

/// Wrap a token sequence in sentence boundary markers.
pub fn wrap_sentence(tokens: &[String]) -> Vec<String> {
    let mut wrapped = Vec::with_capacity(tokens.len() + 2);
    wrapped.push(SENTENCE_START.to_string());
    wrapped.extend(tokens.iter().cloned());
    wrapped.push(SENTENCE_END.to_string());
    wrapped
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_are_not_good_tokens() {
        assert!(!is_good_token(SENTENCE_START));
        assert!(!is_good_token(SENTENCE_END));
        assert!(!is_good_token(URL_PLACEHOLDER));
        assert!(!is_good_token("<anything>"));
    }

    #[test]
    fn test_short_tokens_are_rejected() {
        assert!(!is_good_token("i"));
        assert!(!is_good_token(""));
        assert!(is_good_token("ha"));
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // "ä" is two bytes but one char
        assert!(!is_good_token("ä"));
        assert!(is_good_token("äh"));
    }

    #[test]
    fn test_wrap_sentence_adds_both_markers() {
        let toks: Vec<String> = vec!["hoi".into(), "du".into()];
        assert_eq!(wrap_sentence(&toks), vec!["<s>", "hoi", "du", "</s>"]);
    }
}
