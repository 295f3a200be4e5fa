//! Core domain types for the GraphRAG orchestrator
//!
//! This crate defines the per-request data model shared by the pipeline:
//! entities and relations read from the knowledge graph, retrieved chunks,
//! expansion and answer results, the ask request/response schema and the
//! trace that snapshots intermediate pipeline state.

pub mod answer;
pub mod chunk;
pub mod entity;
pub mod error;
pub mod expansion;
pub mod filter;
pub mod relation;
pub mod request;
pub mod stage;

pub use answer::{AnswerResult, Citation};
pub use chunk::{Chunk, SearchResult};
pub use entity::Entity;
pub use error::{CoreError, Result};
pub use expansion::{GraphContext, GraphExpansionResult};
pub use filter::{search_filter, EntityFilter};
pub use relation::Relation;
pub use request::{AskRequest, AskResponse, RequestContext, Trace, UserInfo};
pub use stage::{PipelineStage, StageOutcome};
