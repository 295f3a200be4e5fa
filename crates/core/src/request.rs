//! Ask request/response schema exposed to transport adapters

use crate::{search_filter, Citation, CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub tenant_id: String,
    pub locale: String,
}

/// A question addressed to the knowledge base
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub user: UserInfo,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub context: RequestContext,
}

impl AskRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user.id = user_id.into();
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn with_context(mut self, tenant_id: impl Into<String>, locale: impl Into<String>) -> Self {
        self.context = RequestContext {
            tenant_id: tenant_id.into(),
            locale: locale.into(),
        };
        self
    }

    /// Reject requests that cannot enter the pipeline; returns the trimmed query
    pub fn validate(&self) -> Result<&str> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(CoreError::Validation("query must not be empty".into()));
        }
        Ok(query)
    }
}

/// Diagnostic snapshot of intermediate pipeline state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub linked_entities: Vec<String>,
    pub expanded_entity_ids: Vec<String>,
    pub search_filter: String,
}

impl Trace {
    /// Built once per request; `search_filter` is rendered from the expanded
    /// set exactly as the retriever rendered it.
    pub fn new(linked: &BTreeSet<String>, expanded: &BTreeSet<String>) -> Self {
        Self {
            linked_entities: linked.iter().cloned().collect(),
            expanded_entity_ids: expanded.iter().cloned().collect(),
            search_filter: search_filter(expanded),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Trace>,
}

impl AskResponse {
    /// Strip diagnostics before returning to end users
    pub fn without_trace(mut self) -> Self {
        self.trace = None;
        self
    }
}
