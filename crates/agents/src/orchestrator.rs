//! Orchestrator - runs the pipeline stages in order and assembles the response

use crate::{
    AgentError, AnswerGenerator, ChatModel, EntityLinker, EntityLookupParams, ExpandParams,
    GraphExpander, PipelineConfig, Result, Retriever,
};
use graphrag_core::{
    AskRequest, AskResponse, Entity, GraphContext, GraphExpansionResult, PipelineStage,
    StageOutcome, Trace,
};
use graphrag_store::{EntityStore, GraphStore, SearchIndex};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// A stage that fell back to its safe default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub stage: PipelineStage,
    pub reason: String,
}

/// Completed response plus the soft failures met along the way
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub response: AskResponse,
    pub degradations: Vec<Degradation>,
}

impl PipelineRun {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub fn degraded_at(&self, stage: PipelineStage) -> bool {
        self.degradations.iter().any(|d| d.stage == stage)
    }
}

/// Per-request progress. Lives on the request's stack, never on the
/// orchestrator.
#[derive(Debug)]
struct RunState {
    stage: PipelineStage,
    degradations: Vec<Degradation>,
}

impl RunState {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Idle,
            degradations: Vec::new(),
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        debug_assert_eq!(self.stage.next(), Some(stage));
        debug!("Pipeline {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn accept<T>(&mut self, outcome: StageOutcome<T>) -> T {
        if let Some(reason) = outcome.reason() {
            self.degradations.push(Degradation {
                stage: self.stage,
                reason: reason.to_string(),
            });
        }
        outcome.into_value()
    }
}

/// Shared, stateless composition of the pipeline stages
///
/// Holds only collaborator handles and configuration, so one instance can
/// serve any number of concurrent requests.
pub struct Orchestrator {
    entities: Arc<dyn EntityStore>,
    linker: EntityLinker,
    expander: GraphExpander,
    retriever: Retriever,
    generator: AnswerGenerator,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        graph: Arc<dyn GraphStore>,
        index: Arc<dyn SearchIndex>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            linker: EntityLinker::new(entities.clone()),
            entities,
            expander: GraphExpander::new(graph),
            retriever: Retriever::new(index),
            generator: AnswerGenerator::new(model),
            config: PipelineConfig::default(),
        }
    }

    /// Wire every store contract to a single backend
    pub fn from_knowledge<K>(knowledge: Arc<K>, model: Arc<dyn ChatModel>) -> Self
    where
        K: EntityStore + GraphStore + SearchIndex + 'static,
    {
        Self::new(knowledge.clone(), knowledge.clone(), knowledge, model)
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer a question, returning the response only
    pub async fn ask(&self, request: &AskRequest, cancel: &CancellationToken) -> Result<AskResponse> {
        Ok(self.run(request, cancel).await?.response)
    }

    /// Run link, expand, retrieve and generate for one request.
    ///
    /// Soft failures never abort the run; they are listed in
    /// [`PipelineRun::degradations`]. Errors are validation failures,
    /// cancellation, or internal faults.
    #[instrument(skip(self, request, cancel), fields(conversation = %request.conversation_id))]
    pub async fn run(&self, request: &AskRequest, cancel: &CancellationToken) -> Result<PipelineRun> {
        let query = request.validate()?;
        let mut state = RunState::new();

        state.enter(PipelineStage::Linking);
        let linked = state.accept(self.linker.link(query, cancel).await?);

        state.enter(PipelineStage::Expanding);
        let expansion = state.accept(
            self.expander
                .expand(&linked, self.config.max_hops, cancel)
                .await?,
        );

        state.enter(PipelineStage::Retrieving);
        let chunks = state.accept(
            self.retriever
                .retrieve(query, &expansion.expanded_entity_ids, self.config.top_k, cancel)
                .await?,
        );

        state.enter(PipelineStage::Generating);
        let graph_context = self
            .config
            .include_graph_context
            .then(|| GraphContext::from_expansion(&expansion));
        let answer = state.accept(
            self.generator
                .generate(query, &chunks, graph_context.as_ref(), cancel)
                .await?,
        );

        state.enter(PipelineStage::Completed);
        let response = AskResponse {
            answer: answer.answer,
            citations: answer.citations,
            trace: Some(Trace::new(&linked, &expansion.expanded_entity_ids)),
        };

        info!(
            "Answered with {} citations ({} degraded stages)",
            response.citations.len(),
            state.degradations.len()
        );

        Ok(PipelineRun {
            response,
            degradations: state.degradations,
        })
    }

    /// Entity ids named in `query`
    pub async fn link(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<BTreeSet<String>>> {
        let query = AskRequest::new(query).validate()?.to_string();
        self.linker.link(&query, cancel).await
    }

    /// Expand the graph around a single entity
    #[instrument(skip(self, cancel))]
    pub async fn expand(
        &self,
        params: &ExpandParams,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<GraphExpansionResult>> {
        let entity_id = params.validate()?;
        let seeds = BTreeSet::from([entity_id.to_string()]);
        self.expander.expand(&seeds, params.hops, cancel).await
    }

    /// Look up one entity. Unlike the pipeline stages, a failing store or a
    /// missing entity is an error here.
    #[instrument(skip(self, cancel))]
    pub async fn entity(
        &self,
        params: &EntityLookupParams,
        cancel: &CancellationToken,
    ) -> Result<Entity> {
        let entity_id = params.validate()?;
        crate::cancel::or_cancelled(cancel, self.entities.entity(entity_id))
            .await??
            .ok_or_else(|| AgentError::NotFound(format!("entity '{}'", entity_id)))
    }
}
