//! Pipeline tuning, overridable from the environment

const DEFAULT_MAX_HOPS: usize = 2;
const DEFAULT_TOP_K: usize = 5;
const DEFAULT_GRAPH_CONTEXT: bool = false;

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|value| {
            let value = value.trim().to_ascii_lowercase();
            matches!(value.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Relationship hops explored from the linked entities
    pub max_hops: usize,
    /// Chunks retrieved and cited per answer
    pub top_k: usize,
    /// Append expanded entities and relations to the answer prompt
    pub include_graph_context: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            top_k: DEFAULT_TOP_K,
            include_graph_context: DEFAULT_GRAPH_CONTEXT,
        }
    }
}

impl PipelineConfig {
    /// Read `GRAPHRAG_MAX_HOPS`, `GRAPHRAG_TOP_K` and `GRAPHRAG_GRAPH_CONTEXT`,
    /// keeping defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            max_hops: env_usize("GRAPHRAG_MAX_HOPS", DEFAULT_MAX_HOPS),
            top_k: env_usize("GRAPHRAG_TOP_K", DEFAULT_TOP_K),
            include_graph_context: env_flag("GRAPHRAG_GRAPH_CONTEXT", DEFAULT_GRAPH_CONTEXT),
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_graph_context(mut self, enabled: bool) -> Self {
        self.include_graph_context = enabled;
        self
    }
}
