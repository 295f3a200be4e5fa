//! Graph expansion results

use crate::Relation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of a bounded multi-hop expansion
///
/// Sets are kept sorted so anything derived from them (filters, traces) is
/// independent of discovery order. `expanded_entity_ids` always contains the
/// seeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExpansionResult {
    pub expanded_entity_ids: BTreeSet<String>,
    pub evidence_chunk_ids: BTreeSet<String>,

    /// Relations touched during traversal, keyed by [`Relation::key`]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Relation>,
}

impl GraphExpansionResult {
    /// The seed set with no evidence, used for zero hops and as the
    /// degrade-to-seed fallback.
    pub fn seeds_only(seeds: &BTreeSet<String>) -> Self {
        Self {
            expanded_entity_ids: seeds.clone(),
            ..Default::default()
        }
    }

    /// Entities reached beyond the seeds
    pub fn discovered<'a>(&'a self, seeds: &'a BTreeSet<String>) -> impl Iterator<Item = &'a String> {
        self.expanded_entity_ids.difference(seeds)
    }
}

/// Textual graph summary appended to the answer prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphContext {
    pub entity_list: Vec<String>,
    pub relationship_list: Vec<String>,
}

impl GraphContext {
    pub fn from_expansion(expansion: &GraphExpansionResult) -> Self {
        Self {
            entity_list: expansion.expanded_entity_ids.iter().cloned().collect(),
            relationship_list: expansion.relations.values().map(ToString::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entity_list.is_empty() && self.relationship_list.is_empty()
    }
}
