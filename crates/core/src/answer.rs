//! Generated answers and their citations

use crate::SearchResult;
use serde::{Deserialize, Serialize};

/// Source reference for a retrieved chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub chunk_id: String,
}

impl From<&SearchResult> for Citation {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            chunk_id: result.chunk_id.clone(),
        }
    }
}

/// Answer text plus one citation per retrieved chunk, in retrieval order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub citations: Vec<Citation>,
}

impl AnswerResult {
    /// Cite every chunk in order, whether or not the answer text uses it
    pub fn cite_all(answer: impl Into<String>, chunks: &[SearchResult]) -> Self {
        Self {
            answer: answer.into(),
            citations: chunks.iter().map(Citation::from).collect(),
        }
    }
}
