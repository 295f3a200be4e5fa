//! Answer Generator - grounded answer synthesis with citations

use crate::cancel::or_cancelled;
use crate::{ChatModel, Result};
use graphrag_core::{AnswerResult, GraphContext, SearchResult, StageOutcome};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

pub const SYSTEM_PROMPT: &str = "You are an expert assistant that answers questions based on the provided context.
Use the context below to answer the user's question accurately and concisely.
Always cite your sources using [1], [2], etc. format matching the context numbering.
If the context doesn't contain enough information to answer the question, say so.";

/// Returned whenever no answer could be generated
pub const FALLBACK_ANSWER: &str =
    "I apologize, but I encountered an error while generating the answer.";

pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Fixed apology with no citations
    pub fn fallback() -> AnswerResult {
        AnswerResult {
            answer: FALLBACK_ANSWER.to_string(),
            citations: Vec::new(),
        }
    }

    /// Answer `query` from `chunks`, citing every chunk in order.
    ///
    /// Without chunks there is nothing to ground an answer in, so the model
    /// is not called. Model failures degrade to [`Self::fallback`].
    #[instrument(skip(self, chunks, graph_context, cancel), fields(chunks = chunks.len()))]
    pub async fn generate(
        &self,
        query: &str,
        chunks: &[SearchResult],
        graph_context: Option<&GraphContext>,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome<AnswerResult>> {
        if chunks.is_empty() {
            warn!("No context chunks retrieved, skipping generation");
            return Ok(StageOutcome::degraded(
                Self::fallback(),
                "no context chunks retrieved",
            ));
        }

        let user_prompt = build_user_prompt(query, chunks, graph_context);

        match or_cancelled(cancel, self.model.complete_chat(SYSTEM_PROMPT, &user_prompt)).await? {
            Ok(answer) => {
                let result = AnswerResult::cite_all(answer, chunks);
                info!("Generated answer with {} citations", result.citations.len());
                Ok(StageOutcome::Completed(result))
            }
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                Ok(StageOutcome::degraded(Self::fallback(), e.to_string()))
            }
        }
    }
}

/// Numbered context block; position `n` is cited as `[n]`
pub fn build_context(chunks: &[SearchResult]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(idx, chunk)| {
            format!(
                "[{}] {}\n{}\nSource: {}",
                idx + 1,
                chunk.title,
                chunk.content,
                chunk.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_user_prompt(
    query: &str,
    chunks: &[SearchResult],
    graph_context: Option<&GraphContext>,
) -> String {
    let graph_info = match graph_context {
        Some(graph) if !graph.is_empty() => format!(
            "\n\nRelated Entities: {}\nRelationships: {}",
            graph.entity_list.join(", "),
            graph.relationship_list.join(", ")
        ),
        _ => String::new(),
    };

    format!(
        "Context:\n{}{}\n\nQuestion: {}\n\nPlease provide a comprehensive answer with citations.",
        build_context(chunks),
        graph_info,
        query
    )
}
