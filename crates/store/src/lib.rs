//! Knowledge store collaborators for the GraphRAG orchestrator
//!
//! Defines the contracts the pipeline consumes (entity lookup, relation
//! adjacency, filtered hybrid search) and two implementations of them:
//! a fixture-backed in-memory knowledge base and an HTTP client for a
//! REST knowledge service.

pub mod error;
pub mod http;
pub mod memory;

pub use error::{Result, StoreError};
pub use http::HttpKnowledgeClient;
pub use memory::{Fixture, KnowledgeBase};

use async_trait::async_trait;
use graphrag_core::{Entity, EntityFilter, Relation, SearchResult};

/// Resolves entities by name
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Ids of entities whose display name occurs in `query`, case-insensitively
    async fn find_by_name_substring(&self, query: &str) -> Result<Vec<String>>;

    /// A single entity by id
    async fn entity(&self, id: &str) -> Result<Option<Entity>>;
}

/// Adjacency over the relation graph
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// All relations where `entity_id` is either endpoint
    async fn neighbors_of(&self, entity_id: &str) -> Result<Vec<Relation>>;
}

/// Ranked hybrid retrieval over chunks
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Up to `top_k` hits in descending score order. `None` searches the
    /// whole corpus.
    async fn search(
        &self,
        query: &str,
        filter: Option<&EntityFilter>,
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}
