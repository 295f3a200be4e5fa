//! Typed parameters for the standalone lookup and expansion operations

use graphrag_core::{AskRequest, CoreError};
use serde::Deserialize;

pub const DEFAULT_HOPS: usize = 1;
pub const MAX_HOPS: usize = 3;

const DEFAULT_USER_ID: &str = "mcp-user";

fn default_hops() -> usize {
    DEFAULT_HOPS
}

fn require_entity_id(entity_id: &str) -> Result<&str, CoreError> {
    let entity_id = entity_id.trim();
    if entity_id.is_empty() {
        return Err(CoreError::Validation("entity_id must not be empty".into()));
    }
    Ok(entity_id)
}

/// Expand the graph around one entity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpandParams {
    pub entity_id: String,
    #[serde(default = "default_hops")]
    pub hops: usize,
}

impl ExpandParams {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            hops: DEFAULT_HOPS,
        }
    }

    pub fn with_hops(mut self, hops: usize) -> Self {
        self.hops = hops;
        self
    }

    /// Returns the trimmed entity id
    pub fn validate(&self) -> Result<&str, CoreError> {
        let entity_id = require_entity_id(&self.entity_id)?;
        if !(1..=MAX_HOPS).contains(&self.hops) {
            return Err(CoreError::Validation(format!(
                "hops must be between 1 and {}, got {}",
                MAX_HOPS, self.hops
            )));
        }
        Ok(entity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityLookupParams {
    pub entity_id: String,
}

impl EntityLookupParams {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
        }
    }

    pub fn validate(&self) -> Result<&str, CoreError> {
        require_entity_id(&self.entity_id)
    }
}

/// Tool-style query arguments with optional caller identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryParams {
    pub query: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl QueryParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user_id: None,
            conversation_id: None,
        }
    }

    /// Fill in the default user and a fresh conversation id
    pub fn into_request(self) -> AskRequest {
        let user_id = self.user_id.unwrap_or_else(|| DEFAULT_USER_ID.to_string());
        let conversation_id = self
            .conversation_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        AskRequest::new(self.query)
            .with_user(user_id)
            .with_conversation(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_defaults_to_one_hop() {
        let params: ExpandParams = serde_json::from_str(r#"{"entity_id": "svc-a"}"#).unwrap();
        assert_eq!(params.hops, 1);
        assert_eq!(params.validate().unwrap(), "svc-a");
    }

    #[test]
    fn test_expand_hops_bounds() {
        assert!(ExpandParams::new("svc-a").with_hops(0).validate().is_err());
        assert!(ExpandParams::new("svc-a").with_hops(3).validate().is_ok());
        assert!(matches!(
            ExpandParams::new("svc-a").with_hops(4).validate(),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_entity_id_rejected() {
        assert!(ExpandParams::new("  ").validate().is_err());
        assert!(EntityLookupParams::new("").validate().is_err());
        assert_eq!(EntityLookupParams::new(" svc-a ").validate().unwrap(), "svc-a");
    }

    #[test]
    fn test_query_params_defaults() {
        let request = QueryParams::new("who owns billing?").into_request();

        assert_eq!(request.user.id, "mcp-user");
        assert!(uuid::Uuid::parse_str(&request.conversation_id).is_ok());
        assert_eq!(request.query, "who owns billing?");
    }

    #[test]
    fn test_query_params_keep_caller_identity() {
        let params: QueryParams = serde_json::from_str(
            r#"{"query": "q", "user_id": "alice", "conversation_id": "conv-9"}"#,
        )
        .unwrap();
        let request = params.into_request();

        assert_eq!(request.user.id, "alice");
        assert_eq!(request.conversation_id, "conv-9");
    }
}
