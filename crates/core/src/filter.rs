//! Entity filter predicate for filtered retrieval
//!
//! The retriever applies this filter and the trace reports it, so both go
//! through [`EntityFilter::for_entities`] and render through `Display`.

use std::collections::BTreeSet;
use std::fmt;

/// "Any chunk whose entity-id list intersects this set"
///
/// Renders as an OData collection filter,
/// `entityIds/any(e: e eq 'a' or e eq 'b')`, with ids in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFilter {
    entity_ids: BTreeSet<String>,
}

impl EntityFilter {
    /// Build the filter for an entity set; `None` means "search everything".
    pub fn for_entities(entity_ids: &BTreeSet<String>) -> Option<Self> {
        if entity_ids.is_empty() {
            return None;
        }
        Some(Self {
            entity_ids: entity_ids.clone(),
        })
    }

    pub fn entity_ids(&self) -> &BTreeSet<String> {
        &self.entity_ids
    }

    /// Evaluate the predicate against a chunk's entity list
    pub fn matches(&self, chunk_entity_ids: &[String]) -> bool {
        chunk_entity_ids.iter().any(|id| self.entity_ids.contains(id))
    }
}

impl fmt::Display for EntityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("entityIds/any(e: ")?;
        for (idx, id) in self.entity_ids.iter().enumerate() {
            if idx > 0 {
                f.write_str(" or ")?;
            }
            // OData escapes a quote inside a string literal by doubling it
            write!(f, "e eq '{}'", id.replace('\'', "''"))?;
        }
        f.write_str(")")
    }
}

/// Filter string as reported in the trace; empty when unfiltered.
pub fn search_filter(entity_ids: &BTreeSet<String>) -> String {
    EntityFilter::for_entities(entity_ids)
        .map(|filter| filter.to_string())
        .unwrap_or_default()
}
