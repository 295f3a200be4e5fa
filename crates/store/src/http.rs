//! HTTP client for a REST knowledge service
//!
//! Routes:
//! - `GET  /entities/match?q=<query>` -> `[{"id": ...}]`
//! - `GET  /entities/{id}` -> entity, 404 when unknown
//! - `GET  /entities/{id}/relations` -> relations touching the entity
//! - `POST /search` `{query, filter, top}` -> `{"value": [hit]}` or `[hit]`
//! - `GET  /health`

use crate::{EntityStore, GraphStore, Result, SearchIndex, StoreError};
use async_trait::async_trait;
use graphrag_core::{Entity, EntityFilter, Relation, SearchResult};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_KNOWLEDGE_URL: &str = "http://localhost:8090";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn timeout_from_env() -> Duration {
    let secs = std::env::var("KNOWLEDGE_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

#[derive(Clone)]
pub struct HttpKnowledgeClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpKnowledgeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Client configured from `KNOWLEDGE_URL` / `KNOWLEDGE_TIMEOUT_SECS`
    pub fn default_local() -> Self {
        Self::new(env_or_default("KNOWLEDGE_URL", DEFAULT_KNOWLEDGE_URL))
            .with_timeout(timeout_from_env())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        Ok(response.status().is_success())
    }

    /// `{base}/entities/{id}[/suffix]` with the id percent-encoded
    fn entity_url(&self, id: &str, suffix: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty().push("entities").push(id);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| StoreError::Malformed(format!("{} ({})", e, body)))
    }
}

#[async_trait]
impl EntityStore for HttpKnowledgeClient {
    #[instrument(skip(self))]
    async fn find_by_name_substring(&self, query: &str) -> Result<Vec<String>> {
        let url = format!("{}/entities/match", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .timeout(self.timeout)
            .send()
            .await?;

        let matches: Vec<EntityRef> = Self::read_json(response).await?;
        debug!("Knowledge service matched {} entities", matches.len());
        Ok(matches.into_iter().map(EntityRef::into_id).collect())
    }

    #[instrument(skip(self))]
    async fn entity(&self, id: &str) -> Result<Option<Entity>> {
        let url = self.entity_url(id, None)?;
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read_json(response).await.map(Some)
    }
}

#[async_trait]
impl GraphStore for HttpKnowledgeClient {
    #[instrument(skip(self))]
    async fn neighbors_of(&self, entity_id: &str) -> Result<Vec<Relation>> {
        let url = self.entity_url(entity_id, Some("relations"))?;
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl SearchIndex for HttpKnowledgeClient {
    #[instrument(skip(self, filter))]
    async fn search(
        &self,
        query: &str,
        filter: Option<&EntityFilter>,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);
        let request = SearchRequest {
            query,
            filter: filter.map(ToString::to_string),
            top: top_k,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let hits = match Self::read_json::<SearchResponse>(response).await? {
            SearchResponse::Wrapped { value } => value,
            SearchResponse::Bare(hits) => hits,
        };
        Ok(hits)
    }
}

// ==========================================
// REQUEST/RESPONSE TYPES
// ==========================================

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    filter: Option<String>,
    top: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Wrapped { value: Vec<SearchResult> },
    Bare(Vec<SearchResult>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntityRef {
    Object { id: String },
    Id(String),
}

impl EntityRef {
    fn into_id(self) -> String {
        match self {
            EntityRef::Object { id } => id,
            EntityRef::Id(id) => id,
        }
    }
}
