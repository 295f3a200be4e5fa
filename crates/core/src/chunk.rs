//! Retrieval units and ranked search results

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A retrievable document fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,

    /// Entities mentioned by this chunk
    #[serde(default)]
    pub entity_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_vector: Option<Vec<f32>>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            title: String::new(),
            url: String::new(),
            entity_ids: Vec::new(),
            content_vector: None,
        }
    }

    /// Builder: set title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: set url
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Builder: set mentioned entities
    pub fn with_entities<I, S>(mut self, entity_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_ids = entity_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Whether any mentioned entity is in `entity_ids`
    pub fn mentions_any(&self, entity_ids: &BTreeSet<String>) -> bool {
        self.entity_ids.iter().any(|id| entity_ids.contains(id))
    }

    /// Project into a ranked result
    pub fn to_result(&self, score: f64) -> SearchResult {
        SearchResult {
            chunk_id: self.id.clone(),
            content: self.content.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            score,
        }
    }
}

/// A ranked retrieval hit. Position in a result list is its retrieval rank
/// and becomes its citation number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(alias = "id")]
    pub chunk_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_any() {
        let chunk = Chunk::new("c1", "Billing depends on ledger").with_entities(["svc-a", "svc-b"]);
        let wanted: BTreeSet<String> = ["svc-b".to_string()].into_iter().collect();
        let other: BTreeSet<String> = ["svc-z".to_string()].into_iter().collect();

        assert!(chunk.mentions_any(&wanted));
        assert!(!chunk.mentions_any(&other));
        assert!(!chunk.mentions_any(&BTreeSet::new()));
    }

    #[test]
    fn test_search_result_accepts_index_id_key() {
        let json = r#"{"id":"c9","content":"text","title":"T","url":"http://x","score":1.5}"#;
        let result: SearchResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.chunk_id, "c9");
        assert_eq!(result.score, 1.5);
    }
}
