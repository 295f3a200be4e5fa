//! Graph Expander - bounded multi-hop expansion over the relation graph
//!
//! Breadth-first from the seed entities, one hop per round:
//! every relation touching a frontier entity contributes its evidence chunks,
//! and any endpoint not yet visited joins the next frontier. Relations are
//! undirected for traversal. The walk stops after `max_hops` rounds or as
//! soon as a round discovers nothing new.
//!
//! Expansion is all-or-nothing: if any relation query fails, the partial
//! traversal is discarded and the result degrades to the seeds alone.

use crate::cancel::or_cancelled;
use crate::{AgentError, Result};
use graphrag_core::{GraphExpansionResult, Relation, StageOutcome};
use graphrag_store::GraphStore;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub struct GraphExpander {
    graph: Arc<dyn GraphStore>,
}

impl GraphExpander {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Expand `seeds` by up to `max_hops` relationship hops.
    ///
    /// Zero hops or an empty seed set return the seeds unchanged without
    /// querying the graph. Relation-query failures degrade to the seeds;
    /// cancellation and crashed query tasks are returned as errors.
    #[instrument(skip(self, seeds, cancel), fields(seeds = seeds.len()))]
    pub async fn expand(
        &self,
        seeds: &BTreeSet<String>,
        max_hops: usize,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<GraphExpansionResult>> {
        if max_hops == 0 || seeds.is_empty() {
            return Ok(StageOutcome::Completed(GraphExpansionResult::seeds_only(seeds)));
        }

        match self.traverse(seeds, max_hops, cancel).await {
            Ok(result) => {
                info!(
                    "Expanded {} entities to {} entities with {} evidence chunks",
                    seeds.len(),
                    result.expanded_entity_ids.len(),
                    result.evidence_chunk_ids.len()
                );
                Ok(StageOutcome::Completed(result))
            }
            Err(AgentError::Store(e)) => {
                warn!("Graph expansion failed, falling back to seed entities: {}", e);
                Ok(StageOutcome::degraded(
                    GraphExpansionResult::seeds_only(seeds),
                    e.to_string(),
                ))
            }
            Err(e) => Err(e),
        }
    }

    async fn traverse(
        &self,
        seeds: &BTreeSet<String>,
        max_hops: usize,
        cancel: &CancellationToken,
    ) -> Result<GraphExpansionResult> {
        let mut visited = seeds.clone();
        let mut evidence = BTreeSet::new();
        let mut relations = BTreeMap::new();
        let mut frontier: Vec<String> = seeds.iter().cloned().collect();

        for hop in 0..max_hops {
            if frontier.is_empty() {
                debug!("Frontier exhausted after {} hops", hop);
                break;
            }

            let neighborhoods = self.fetch_frontier(&frontier, cancel).await?;

            let mut next_frontier = Vec::new();
            for relation in neighborhoods.into_iter().flatten() {
                // Evidence accrues for every touched relation, even when
                // both endpoints were already visited.
                evidence.extend(relation.evidence_chunk_ids.iter().cloned());

                for endpoint in relation.endpoints() {
                    if visited.insert(endpoint.to_string()) {
                        next_frontier.push(endpoint.to_string());
                    }
                }
                relations.entry(relation.key()).or_insert(relation);
            }

            debug!(
                hop,
                frontier = frontier.len(),
                discovered = next_frontier.len(),
                "Expanded hop"
            );
            frontier = next_frontier;
        }

        Ok(GraphExpansionResult {
            expanded_entity_ids: visited,
            evidence_chunk_ids: evidence,
            relations,
        })
    }

    /// Query every frontier entity concurrently. Results come back in
    /// frontier order so merging is deterministic. The first failure wins;
    /// returning early drops the set, which aborts the remaining queries.
    async fn fetch_frontier(
        &self,
        frontier: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<Relation>>> {
        let mut tasks = JoinSet::new();
        for (idx, entity_id) in frontier.iter().enumerate() {
            let graph = Arc::clone(&self.graph);
            let entity_id = entity_id.clone();
            tasks.spawn(async move { (idx, graph.neighbors_of(&entity_id).await) });
        }

        let mut neighborhoods = vec![Vec::new(); frontier.len()];
        while let Some(joined) = or_cancelled(cancel, tasks.join_next()).await? {
            let (idx, relations) = joined
                .map_err(|e| AgentError::Internal(format!("relation query task failed: {}", e)))?;
            neighborhoods[idx] = relations?;
        }

        Ok(neighborhoods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use graphrag_store::StoreError;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Graph fake with call counting and per-entity failure injection
    #[derive(Default)]
    struct ScriptedGraph {
        relations: Vec<Relation>,
        failing: HashSet<String>,
        hanging: HashSet<String>,
        calls: AtomicUsize,
        queried: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedGraph {
        fn edge(mut self, source: &str, target: &str, evidence: &[&str]) -> Self {
            let id = format!("{}-{}", source, target);
            let mut relation = Relation::new(id, source, target, "related_to");
            for chunk in evidence {
                relation = relation.with_evidence(*chunk);
            }
            self.relations.push(relation);
            self
        }

        fn failing_on(mut self, entity_id: &str) -> Self {
            self.failing.insert(entity_id.to_string());
            self
        }

        fn hanging_on(mut self, entity_id: &str) -> Self {
            self.hanging.insert(entity_id.to_string());
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GraphStore for ScriptedGraph {
        async fn neighbors_of(&self, entity_id: &str) -> graphrag_store::Result<Vec<Relation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queried.lock().unwrap().push(entity_id.to_string());
            if self.hanging.contains(entity_id) {
                std::future::pending::<()>().await;
            }
            if self.failing.contains(entity_id) {
                return Err(StoreError::Status {
                    status: 503,
                    body: "relations unavailable".into(),
                });
            }
            Ok(self
                .relations
                .iter()
                .filter(|relation| relation.touches(entity_id))
                .cloned()
                .collect())
        }
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn chain() -> ScriptedGraph {
        ScriptedGraph::default()
            .edge("A", "B", &["e1"])
            .edge("B", "C", &["e2"])
    }

    async fn run(graph: Arc<ScriptedGraph>, seeds: &[&str], hops: usize) -> StageOutcome<GraphExpansionResult> {
        GraphExpander::new(graph)
            .expand(&ids(seeds), hops, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_one_hop() {
        let outcome = run(Arc::new(chain()), &["A"], 1).await;

        assert!(!outcome.is_degraded());
        let result = outcome.into_value();
        assert_eq!(result.expanded_entity_ids, ids(&["A", "B"]));
        assert_eq!(result.evidence_chunk_ids, ids(&["e1"]));
    }

    #[tokio::test]
    async fn test_two_hops() {
        let result = run(Arc::new(chain()), &["A"], 2).await.into_value();

        assert_eq!(result.expanded_entity_ids, ids(&["A", "B", "C"]));
        assert_eq!(result.evidence_chunk_ids, ids(&["e1", "e2"]));
        assert_eq!(result.relations.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_hops_issues_no_queries() {
        let graph = Arc::new(chain());
        let result = run(graph.clone(), &["A", "B"], 0).await.into_value();

        assert_eq!(result.expanded_entity_ids, ids(&["A", "B"]));
        assert!(result.evidence_chunk_ids.is_empty());
        assert_eq!(graph.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_seeds() {
        let graph = Arc::new(chain());
        let result = run(graph.clone(), &[], 3).await.into_value();

        assert!(result.expanded_entity_ids.is_empty());
        assert!(result.evidence_chunk_ids.is_empty());
        assert_eq!(graph.calls(), 0);
    }

    #[tokio::test]
    async fn test_relations_traversed_in_both_directions() {
        // Seed is only ever the target
        let graph = ScriptedGraph::default().edge("X", "A", &["e9"]);
        let result = run(Arc::new(graph), &["A"], 1).await.into_value();

        assert_eq!(result.expanded_entity_ids, ids(&["A", "X"]));
        assert_eq!(result.evidence_chunk_ids, ids(&["e9"]));
    }

    #[tokio::test]
    async fn test_evidence_collected_when_endpoints_already_visited() {
        let graph = ScriptedGraph::default()
            .edge("A", "B", &["e1"])
            .edge("A", "C", &["e2"])
            .edge("B", "C", &["e3"]);
        let graph = Arc::new(graph);

        let one = run(graph.clone(), &["A"], 1).await.into_value();
        assert_eq!(one.expanded_entity_ids, ids(&["A", "B", "C"]));
        assert_eq!(one.evidence_chunk_ids, ids(&["e1", "e2"]));

        // Hop 2 discovers no entity but still touches B-C
        let two = run(graph, &["A"], 2).await.into_value();
        assert_eq!(two.expanded_entity_ids, ids(&["A", "B", "C"]));
        assert_eq!(two.evidence_chunk_ids, ids(&["e1", "e2", "e3"]));
    }

    #[tokio::test]
    async fn test_no_duplicates_when_reachable_many_ways() {
        let graph = ScriptedGraph::default()
            .edge("A", "D", &[])
            .edge("B", "D", &[])
            .edge("C", "D", &[]);
        let result = run(Arc::new(graph), &["A", "B", "C"], 2).await.into_value();

        assert_eq!(result.expanded_entity_ids.len(), 4);
    }

    #[tokio::test]
    async fn test_monotonic_in_hops() {
        let graph = Arc::new(
            ScriptedGraph::default()
                .edge("A", "B", &["e1"])
                .edge("B", "C", &["e2"])
                .edge("C", "D", &["e3"])
                .edge("A", "E", &["e4"])
                .edge("E", "F", &[]),
        );

        let mut previous = run(graph.clone(), &["A"], 0).await.into_value();
        for hops in 1..5 {
            let current = run(graph.clone(), &["A"], hops).await.into_value();
            assert!(previous.expanded_entity_ids.is_subset(&current.expanded_entity_ids));
            assert!(current.expanded_entity_ids.contains("A"));
            previous = current;
        }
        assert_eq!(previous.expanded_entity_ids.len(), 6);
    }

    #[tokio::test]
    async fn test_stops_once_frontier_is_exhausted() {
        let graph = Arc::new(chain());
        let result = run(graph.clone(), &["A"], 10).await.into_value();

        assert_eq!(result.expanded_entity_ids, ids(&["A", "B", "C"]));
        // A, then B, then C; the round from C finds nothing new
        assert_eq!(graph.calls(), 3);
        assert_eq!(*graph.queried.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_failure_on_later_hop_degrades_to_seeds() {
        let graph = Arc::new(chain().failing_on("B"));
        let outcome = run(graph, &["A"], 2).await;

        assert!(outcome.is_degraded());
        assert!(outcome.reason().unwrap().contains("503"));
        let result = outcome.into_value();
        assert_eq!(result.expanded_entity_ids, ids(&["A"]));
        assert!(result.evidence_chunk_ids.is_empty());
        assert!(result.relations.is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_sibling_query_degrades() {
        let graph = Arc::new(chain().failing_on("C"));
        let outcome = run(graph, &["A", "C"], 1).await;

        assert!(outcome.is_degraded());
        assert_eq!(outcome.into_value().expanded_entity_ids, ids(&["A", "C"]));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_expansion() {
        let graph = Arc::new(chain().hanging_on("A"));
        let expander = GraphExpander::new(graph);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = expander.expand(&ids(&["A"]), 2, &cancel).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_share_state() {
        let graph = Arc::new(chain());
        let expander = Arc::new(GraphExpander::new(graph));

        let mut handles = Vec::new();
        for (seed, hops) in [("A", 1usize), ("C", 1), ("A", 2)] {
            let expander = Arc::clone(&expander);
            handles.push(tokio::spawn(async move {
                expander
                    .expand(&ids(&[seed]), hops, &CancellationToken::new())
                    .await
                    .unwrap()
                    .into_value()
                    .expanded_entity_ids
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        let expected: HashMap<usize, BTreeSet<String>> = [
            (0, ids(&["A", "B"])),
            (1, ids(&["B", "C"])),
            (2, ids(&["A", "B", "C"])),
        ]
        .into_iter()
        .collect();
        for (idx, result) in results.into_iter().enumerate() {
            assert_eq!(result, expected[&idx]);
        }
    }
}
