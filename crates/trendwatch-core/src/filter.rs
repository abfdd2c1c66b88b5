//! Blacklist checks against the cached settings.

use crate::models::{ExtractedTerm, Settings};

/// Whether a term is rejected by the blacklist.
///
/// Both rules compare case-insensitively: an exact hit in `blacklistTrends`,
/// or any non-empty `blacklistWords` entry appearing inside the term.
pub fn is_blacklisted(term: &str, settings: &Settings) -> bool {
    let term = term.to_lowercase();

    if settings
        .blacklist_trends
        .iter()
        .any(|trend| trend.to_lowercase() == term)
    {
        return true;
    }

    settings
        .blacklist_words
        .iter()
        .filter(|word| !word.is_empty())
        .any(|word| term.contains(&word.to_lowercase()))
}

/// Split a batch into accepted terms and the number rejected. Each term is
/// judged on its own; a rejection never stops the rest of the batch.
pub fn filter_terms(
    terms: Vec<ExtractedTerm>,
    settings: &Settings,
) -> (Vec<ExtractedTerm>, usize) {
    let total = terms.len();
    let accepted: Vec<ExtractedTerm> = terms
        .into_iter()
        .filter(|term| !is_blacklisted(&term.text, settings))
        .collect();
    let rejected = total - accepted.len();
    (accepted, rejected)
}

pub fn is_blocked_author(author: Option<&str>, settings: &Settings) -> bool {
    author.is_some_and(|author| settings.blacklist_users.contains(author))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            blacklist_trends: ["#Spam".to_string(), "bolsonaro".to_string()].into(),
            blacklist_words: ["porn".to_string(), String::new()].into(),
            blacklist_users: ["did:plc:bot".to_string()].into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_trend_match_is_case_insensitive() {
        let settings = settings();
        assert!(is_blacklisted("#spam", &settings));
        assert!(is_blacklisted("#SPAM", &settings));
        assert!(is_blacklisted("Bolsonaro", &settings));
        assert!(!is_blacklisted("#spammer", &settings));
    }

    #[test]
    fn test_substring_word_match() {
        let settings = settings();
        assert!(is_blacklisted("#PornStar", &settings));
        assert!(is_blacklisted("videoporn", &settings));
        assert!(!is_blacklisted("praia", &settings));
    }

    #[test]
    fn test_empty_blacklist_word_matches_nothing() {
        let settings = settings();
        assert!(!is_blacklisted("carnaval", &settings));
    }

    #[test]
    fn test_rejection_does_not_stop_siblings() {
        let settings = settings();
        let terms = vec![
            ExtractedTerm::hashtag("#spam"),
            ExtractedTerm::hashtag("#carnaval"),
            ExtractedTerm::word("porno"),
            ExtractedTerm::word("praia"),
        ];
        let (accepted, rejected) = filter_terms(terms, &settings);
        assert_eq!(rejected, 2);
        assert_eq!(
            accepted,
            vec![ExtractedTerm::hashtag("#carnaval"), ExtractedTerm::word("praia")]
        );
    }

    #[test]
    fn test_blocked_author() {
        let settings = settings();
        assert!(is_blocked_author(Some("did:plc:bot"), &settings));
        assert!(!is_blocked_author(Some("did:plc:human"), &settings));
        assert!(!is_blocked_author(None, &settings));
    }
}
