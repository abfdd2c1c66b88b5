//! Post tokenization.
//!
//! Turns the text of one post into candidate hashtags and words. Pure: the
//! same input always yields the same output.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{
    MAX_WORD_CHARS_EXCLUSIVE, MIN_HASHTAG_CHARS_EXCLUSIVE, MIN_WORD_CHARS_EXCLUSIVE,
};
use crate::models::ExtractedTerm;

fn hashtag_regex() -> &'static Regex {
    static HASHTAG: OnceLock<Regex> = OnceLock::new();
    // \w is Unicode-aware, so accented Latin letters stay inside the tag.
    HASHTAG.get_or_init(|| Regex::new(r"#\w+").expect("hashtag pattern is valid"))
}

/// Extract terms from a post written in `target_language`.
///
/// Posts that do not declare the target language yield nothing. Hashtags come
/// first, in the order they appear, followed by the de-duplicated words.
pub fn extract_terms<S: AsRef<str>>(
    text: &str,
    languages: &[S],
    target_language: &str,
) -> Vec<ExtractedTerm> {
    if !languages.iter().any(|lang| lang.as_ref() == target_language) {
        return Vec::new();
    }

    let text = text.trim();
    let mut terms = extract_hashtags(text);
    terms.extend(extract_words(text));
    terms
}

/// Hashtags keep their original casing.
pub fn extract_hashtags(text: &str) -> Vec<ExtractedTerm> {
    hashtag_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|tag| tag.chars().count() > MIN_HASHTAG_CHARS_EXCLUSIVE)
        .map(ExtractedTerm::hashtag)
        .collect()
}

/// Words are split on single spaces, de-duplicated case-sensitively, then
/// lower-cased. "Festa festa" therefore yields "festa" twice.
pub fn extract_words(text: &str) -> Vec<ExtractedTerm> {
    let mut seen = HashSet::new();

    text.split(' ')
        .filter(|token| !token.starts_with('#'))
        .filter(|token| {
            let len = token.chars().count();
            len > MIN_WORD_CHARS_EXCLUSIVE && len < MAX_WORD_CHARS_EXCLUSIVE
        })
        .filter(|token| seen.insert(*token))
        .map(|token| ExtractedTerm::word(token.to_lowercase()))
        .collect()
}
