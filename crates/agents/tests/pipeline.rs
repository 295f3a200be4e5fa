//! End-to-end pipeline tests over the in-memory knowledge base

mod common;

use common::{load_knowledge, CannedModel};
use graphrag_agents::{
    AgentError, CancellationToken, EntityLookupParams, ExpandParams, Orchestrator, PipelineConfig,
};
use graphrag_core::{search_filter, AskRequest, PipelineStage};
use graphrag_store::{KnowledgeBase, StoreError};
use std::collections::BTreeSet;
use std::sync::Arc;

async fn orchestrator(model: Arc<CannedModel>) -> Orchestrator {
    Orchestrator::from_knowledge(Arc::new(load_knowledge().await), model)
}

#[tokio::test]
async fn test_ask_links_expands_and_cites() {
    let model = Arc::new(CannedModel::answering("Payments Team owns it [3]."));
    let orchestrator = orchestrator(model.clone()).await;

    let request = AskRequest::new("Who owns the Checkout Service?")
        .with_user("u1")
        .with_conversation("conv-1")
        .with_context("tenant-1", "en-US");
    let run = orchestrator
        .run(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!run.is_degraded());
    let trace = run.response.trace.clone().unwrap();
    assert_eq!(trace.linked_entities, vec!["svc-checkout"]);

    // two hops: checkout -> payments -> everything attached to payments
    let expanded: BTreeSet<String> = trace.expanded_entity_ids.iter().cloned().collect();
    assert_eq!(expanded.len(), 5);
    assert_eq!(trace.search_filter, search_filter(&expanded));

    let cited: Vec<&str> = run
        .response
        .citations
        .iter()
        .map(|c| c.chunk_id.as_str())
        .collect();
    assert!(!cited.is_empty());
    assert!(!cited.contains(&"chunk-onboarding"));
    assert_eq!(run.response.answer, "Payments Team owns it [3].");
    assert_eq!(model.prompt_count(), 1);
}

#[tokio::test]
async fn test_unlinked_query_searches_whole_corpus() {
    let orchestrator = orchestrator(Arc::new(CannedModel::answering("Ask for access [1]."))).await;

    let response = orchestrator
        .ask(
            &AskRequest::new("How do I request wiki access?"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let trace = response.trace.unwrap();
    assert!(trace.linked_entities.is_empty());
    assert!(trace.expanded_entity_ids.is_empty());
    assert_eq!(trace.search_filter, "");
    assert_eq!(response.citations[0].chunk_id, "chunk-onboarding");
}

#[tokio::test]
async fn test_unavailable_model_returns_apology() {
    let orchestrator = orchestrator(Arc::new(CannedModel::unavailable())).await;

    let run = orchestrator
        .run(
            &AskRequest::new("What does the Checkout Service depend on?"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(run.degraded_at(PipelineStage::Generating));
    assert!(run.response.citations.is_empty());
    assert!(run.response.answer.starts_with("I apologize"));
    assert!(run.response.trace.is_some());
}

#[tokio::test]
async fn test_concurrent_requests_are_isolated() {
    let model = Arc::new(CannedModel::answering("ok [1]"));
    let orchestrator = Arc::new(
        orchestrator(model)
            .await
            .with_config(PipelineConfig::default().with_max_hops(1)),
    );

    let checkout = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .ask(
                    &AskRequest::new("Is the Checkout Service healthy?"),
                    &CancellationToken::new(),
                )
                .await
        })
    };
    let refund = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .ask(
                    &AskRequest::new("How does the Refund Process work?"),
                    &CancellationToken::new(),
                )
                .await
        })
    };

    let checkout = checkout.await.unwrap().unwrap().trace.unwrap();
    let refund = refund.await.unwrap().unwrap().trace.unwrap();

    assert_eq!(checkout.expanded_entity_ids, vec!["svc-checkout", "svc-payments"]);
    assert_eq!(refund.expanded_entity_ids, vec!["proc-refund", "svc-payments"]);
}

#[tokio::test]
async fn test_expand_from_hub_entity() {
    let orchestrator = orchestrator(Arc::new(CannedModel::answering("unused"))).await;

    let outcome = orchestrator
        .expand(&ExpandParams::new("svc-payments"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!outcome.is_degraded());
    let result = outcome.into_value();
    assert_eq!(result.expanded_entity_ids.len(), 5);
    assert_eq!(result.evidence_chunk_ids.len(), 4);
    assert_eq!(result.relations.len(), 4);
}

#[tokio::test]
async fn test_entity_lookup_and_missing_entity() {
    let orchestrator = orchestrator(Arc::new(CannedModel::answering("unused"))).await;
    let cancel = CancellationToken::new();

    let ledger = orchestrator
        .entity(&EntityLookupParams::new("db-ledger"), &cancel)
        .await
        .unwrap();
    assert_eq!(ledger.entity_type, "database");

    let missing = orchestrator
        .entity(&EntityLookupParams::new("svc-unknown"), &cancel)
        .await;
    assert!(matches!(missing, Err(AgentError::NotFound(_))));
}

#[tokio::test]
async fn test_missing_fixture_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = KnowledgeBase::load(dir.path().join("absent.json")).await;

    assert!(matches!(result, Err(StoreError::Io(_))));
}
