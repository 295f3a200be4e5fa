//! Question-answering pipeline for GraphRAG
//!
//! This crate contains the pipeline stages and their composition:
//! - EntityLinker: resolves a query to seed entity ids
//! - GraphExpander: bounded multi-hop expansion with evidence collection
//! - Retriever: entity-filtered hybrid retrieval
//! - AnswerGenerator: grounded answer synthesis with citations
//! - Orchestrator: runs the stages in order and assembles the trace

pub mod cancel;
pub mod config;
pub mod error;
pub mod expander;
pub mod generator;
pub mod linker;
pub mod llm;
pub mod orchestrator;
pub mod params;
pub mod retriever;

pub use config::PipelineConfig;
pub use error::{AgentError, LlmError, Result};
pub use expander::GraphExpander;
pub use generator::AnswerGenerator;
pub use linker::EntityLinker;
pub use llm::{ChatClient, ChatModel, ChatProvider};
pub use orchestrator::{Degradation, Orchestrator, PipelineRun};
pub use params::{EntityLookupParams, ExpandParams, QueryParams};
pub use retriever::Retriever;

pub use tokio_util::sync::CancellationToken;
