//! Relation types - edges between entities

use serde::{Deserialize, Serialize};

/// A relationship between two entities in the knowledge graph
///
/// Stored with a direction, but traversed as an undirected edge: both
/// endpoints are explored regardless of which side an entity sits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Unique identifier
    #[serde(default)]
    pub id: String,

    /// The "from" entity
    pub source_entity_id: String,

    /// The "to" entity
    pub target_entity_id: String,

    /// Kind of relationship (depends_on, owned_by, ...)
    #[serde(default)]
    pub relation_type: String,

    /// Chunks that substantiate this relationship
    #[serde(default)]
    pub evidence_chunk_ids: Vec<String>,
}

impl Relation {
    /// Create a new relation
    pub fn new(
        id: impl Into<String>,
        source_entity_id: impl Into<String>,
        target_entity_id: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_entity_id: source_entity_id.into(),
            target_entity_id: target_entity_id.into(),
            relation_type: relation_type.into(),
            evidence_chunk_ids: Vec::new(),
        }
    }

    /// Builder: attach an evidence chunk
    pub fn with_evidence(mut self, chunk_id: impl Into<String>) -> Self {
        self.evidence_chunk_ids.push(chunk_id.into());
        self
    }

    /// Both endpoints, source first
    pub fn endpoints(&self) -> [&str; 2] {
        [&self.source_entity_id, &self.target_entity_id]
    }

    /// Whether `entity_id` is either endpoint
    pub fn touches(&self, entity_id: &str) -> bool {
        self.source_entity_id == entity_id || self.target_entity_id == entity_id
    }

    /// Key used to deduplicate relations touched from both ends.
    /// Falls back to the endpoint pair when the store omits an id.
    pub fn key(&self) -> String {
        if self.id.is_empty() {
            format!(
                "{}|{}|{}",
                self.source_entity_id, self.relation_type, self.target_entity_id
            )
        } else {
            self.id.clone()
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let relation_type = if self.relation_type.is_empty() {
            "related_to"
        } else {
            &self.relation_type
        };
        write!(
            f,
            "{} -[{}]-> {}",
            self.source_entity_id, relation_type, self.target_entity_id
        )
    }
}
