use std::collections::BTreeSet;

use serde::Deserialize;

use crate::constants::POST_RECORD_TYPE;

/// A decoded post as delivered by the ingestion source.
///
/// Only records whose `$type` is [`POST_RECORD_TYPE`] carry text worth
/// tokenizing; everything else on the stream is ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct PostEvent {
    #[serde(rename = "$type")]
    pub record_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub langs: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl PostEvent {
    pub fn is_post(&self) -> bool {
        self.record_type == POST_RECORD_TYPE
    }

    pub fn language_set(&self) -> BTreeSet<String> {
        self.langs.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_event() {
        let json = r#"{"$type":"app.bsky.feed.post","text":"bom dia","langs":["pt"],"author":"did:plc:abc"}"#;
        let post: PostEvent = serde_json::from_str(json).unwrap();
        assert!(post.is_post());
        assert_eq!(post.text, "bom dia");
        assert_eq!(post.langs, vec!["pt".to_string()]);
        assert_eq!(post.author.as_deref(), Some("did:plc:abc"));
    }

    #[test]
    fn test_parse_minimal_non_post() {
        let json = r#"{"$type":"app.bsky.feed.like"}"#;
        let post: PostEvent = serde_json::from_str(json).unwrap();
        assert!(!post.is_post());
        assert!(post.text.is_empty());
        assert!(post.langs.is_empty());
        assert!(post.author.is_none());
    }
}
