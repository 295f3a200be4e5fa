//! In-memory knowledge base loaded from a JSON fixture

use crate::{EntityStore, GraphStore, Result, SearchIndex};
use async_trait::async_trait;
use graphrag_core::{Chunk, Entity, EntityFilter, Relation, SearchResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

/// On-disk fixture layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
}

/// Read-only knowledge base implementing every store contract
///
/// Search scores chunks by query-term overlap (title terms count double) and
/// is meant for local runs and tests, not for ranking quality.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entities: Vec<Entity>,
    relations: Vec<Relation>,
    chunks: Vec<Chunk>,
    adjacency: HashMap<String, Vec<usize>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut kb = Self::new();
        for entity in fixture.entities {
            kb = kb.with_entity(entity);
        }
        for relation in fixture.relations {
            kb = kb.with_relation(relation);
        }
        for chunk in fixture.chunks {
            kb = kb.with_chunk(chunk);
        }
        kb
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    /// Load a fixture file
    #[instrument]
    pub async fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let kb = Self::from_json(&content)?;
        info!(
            "Loaded knowledge base: {} entities, {} relations, {} chunks",
            kb.entities.len(),
            kb.relations.len(),
            kb.chunks.len()
        );
        Ok(kb)
    }

    /// Builder: add an entity
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Builder: add a relation, indexed under both endpoints
    pub fn with_relation(mut self, relation: Relation) -> Self {
        let idx = self.relations.len();
        self.adjacency
            .entry(relation.source_entity_id.clone())
            .or_default()
            .push(idx);
        if relation.target_entity_id != relation.source_entity_id {
            self.adjacency
                .entry(relation.target_entity_id.clone())
                .or_default()
                .push(idx);
        }
        self.relations.push(relation);
        self
    }

    /// Builder: add a chunk
    pub fn with_chunk(mut self, chunk: Chunk) -> Self {
        self.chunks.push(chunk);
        self
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn query_terms(query: &str) -> Vec<String> {
        query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|term| term.chars().count() > 1)
            .map(str::to_lowercase)
            .collect()
    }

    fn lexical_score(terms: &[String], chunk: &Chunk) -> f64 {
        let title = chunk.title.to_lowercase();
        let content = chunk.content.to_lowercase();
        terms
            .iter()
            .map(|term| {
                let in_title = title.matches(term.as_str()).count() as f64;
                let in_content = content.matches(term.as_str()).count() as f64;
                in_title * 2.0 + in_content
            })
            .sum()
    }
}

#[async_trait]
impl EntityStore for KnowledgeBase {
    async fn find_by_name_substring(&self, query: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = self
            .entities
            .iter()
            .filter(|entity| entity.is_named_in(query))
            .map(|entity| entity.id.clone())
            .collect();
        debug!("Matched {} entities by name", ids.len());
        Ok(ids)
    }

    async fn entity(&self, id: &str) -> Result<Option<Entity>> {
        Ok(self.entities.iter().find(|entity| entity.id == id).cloned())
    }
}

#[async_trait]
impl GraphStore for KnowledgeBase {
    async fn neighbors_of(&self, entity_id: &str) -> Result<Vec<Relation>> {
        let relations = self
            .adjacency
            .get(entity_id)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&idx| self.relations[idx].clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(relations)
    }
}

#[async_trait]
impl SearchIndex for KnowledgeBase {
    async fn search(
        &self,
        query: &str,
        filter: Option<&EntityFilter>,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let terms = Self::query_terms(query);

        let mut results: Vec<SearchResult> = self
            .chunks
            .iter()
            .filter(|chunk| filter.map_or(true, |f| f.matches(&chunk.entity_ids)))
            .filter_map(|chunk| {
                let score = Self::lexical_score(&terms, chunk);
                (score > 0.0).then(|| chunk.to_result(score))
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        Ok(results)
    }
}
