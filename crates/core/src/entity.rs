//! Entity types - services, teams, processes and other graph nodes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named node in the knowledge graph
///
/// Identity is `id`; everything else is descriptive. Entities are owned by the
/// graph store and only ever read by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Unique identifier
    pub id: String,

    /// Display name, used for linking free-text queries
    pub name: String,

    /// Classification (service, team, process, ...)
    #[serde(rename = "type", default)]
    pub entity_type: String,

    /// Alternative names
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Additional metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Entity {
    /// Create a new entity
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type: entity_type.into(),
            aliases: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Canonicalize a name for matching
    pub fn canonicalize(name: &str) -> String {
        name.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether this entity's display name appears inside `query`,
    /// ignoring case and runs of whitespace.
    pub fn is_named_in(&self, query: &str) -> bool {
        let name = Self::canonicalize(&self.name);
        !name.is_empty() && Self::canonicalize(query).contains(&name)
    }

    /// Builder: add an alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Builder: add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
