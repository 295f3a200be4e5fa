//! Entity Linker - resolves a free-text query to seed entities

use crate::cancel::or_cancelled;
use crate::Result;
use graphrag_core::StageOutcome;
use graphrag_store::EntityStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Matches entity display names inside the query text
pub struct EntityLinker {
    store: Arc<dyn EntityStore>,
}

impl EntityLinker {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Deduplicated ids of entities named in `query`. A failing lookup
    /// degrades to no seeds; only cancellation is an error.
    #[instrument(skip(self, cancel))]
    pub async fn link(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<BTreeSet<String>>> {
        match or_cancelled(cancel, self.store.find_by_name_substring(query)).await? {
            Ok(ids) => {
                let linked: BTreeSet<String> = ids.into_iter().collect();
                info!("Linked {} entities from query", linked.len());
                Ok(StageOutcome::Completed(linked))
            }
            Err(e) => {
                warn!("Entity linking failed, continuing without seeds: {}", e);
                Ok(StageOutcome::degraded(BTreeSet::new(), e.to_string()))
            }
        }
    }
}
