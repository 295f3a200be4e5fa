//! Retriever - entity-filtered hybrid retrieval

use crate::cancel::or_cancelled;
use crate::Result;
use graphrag_core::{EntityFilter, SearchResult, StageOutcome};
use graphrag_store::SearchIndex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Restricts search to chunks mentioning the expanded entities; ranking
/// belongs to the index.
pub struct Retriever {
    index: Arc<dyn SearchIndex>,
}

impl Retriever {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Top `top_k` chunks for `query`, best first. An empty entity set
    /// searches the whole corpus. Index failures degrade to no chunks.
    #[instrument(skip(self, entity_ids, cancel), fields(entities = entity_ids.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        entity_ids: &BTreeSet<String>,
        top_k: usize,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<Vec<SearchResult>>> {
        let filter = EntityFilter::for_entities(entity_ids);

        match or_cancelled(cancel, self.index.search(query, filter.as_ref(), top_k)).await? {
            Ok(mut results) => {
                results.sort_by(|a, b| b.score.total_cmp(&a.score));
                results.truncate(top_k);
                info!(
                    "Retrieved {} chunks for query with {} entity filters",
                    results.len(),
                    entity_ids.len()
                );
                Ok(StageOutcome::Completed(results))
            }
            Err(e) => {
                warn!("Retrieval failed, continuing without chunks: {}", e);
                Ok(StageOutcome::degraded(Vec::new(), e.to_string()))
            }
        }
    }
}
