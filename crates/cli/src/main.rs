//! GraphRAG CLI
//!
//! A command-line interface for asking questions against a GraphRAG
//! knowledge base.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use graphrag_agents::{
    CancellationToken, ChatClient, ChatModel, EntityLookupParams, ExpandParams, Orchestrator,
    PipelineConfig, PipelineRun,
};
use graphrag_core::{AskRequest, Entity, GraphExpansionResult, StageOutcome};
use graphrag_store::{HttpKnowledgeClient, KnowledgeBase};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// GraphRAG - graph-expanded retrieval with cited answers
#[derive(Parser)]
#[command(name = "graphrag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serve the knowledge base from a JSON fixture instead of KNOWLEDGE_URL
    #[arg(short, long, global = true)]
    fixture: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question
    Ask {
        /// The question
        query: String,

        /// User identifier
        #[arg(short, long, default_value = "cli-user")]
        user: String,

        /// Conversation identifier (defaults to a fresh UUID)
        #[arg(short, long)]
        conversation: Option<String>,

        /// Tenant identifier
        #[arg(long, default_value = "")]
        tenant: String,

        /// Locale
        #[arg(long, default_value = "en-US")]
        locale: String,

        /// Relationship hops to expand (overrides GRAPHRAG_MAX_HOPS)
        #[arg(long)]
        max_hops: Option<usize>,

        /// Chunks to retrieve (overrides GRAPHRAG_TOP_K)
        #[arg(long)]
        top_k: Option<usize>,

        /// Include related entities and relationships in the prompt
        #[arg(long)]
        graph_context: bool,

        /// Omit the trace from the output
        #[arg(long)]
        no_trace: bool,
    },

    /// Show which entities a query links to
    Link {
        /// Free-text query
        query: String,
    },

    /// Look up an entity by ID
    Entity {
        /// Entity ID (e.g., svc-checkout)
        entity_id: String,
    },

    /// Expand the graph around an entity
    Expand {
        /// Starting entity ID
        entity_id: String,

        /// Relationship hops (1-3)
        #[arg(long, default_value = "1")]
        hops: usize,
    },

    /// Check the knowledge service and chat model
    Health,
}

/// Where entities, relations and chunks come from
enum Knowledge {
    Fixture { path: PathBuf, kb: Arc<KnowledgeBase> },
    Remote(Arc<HttpKnowledgeClient>),
}

impl Knowledge {
    async fn open(fixture: Option<&Path>) -> Result<Self> {
        match fixture {
            Some(path) => {
                let kb = KnowledgeBase::load(path)
                    .await
                    .with_context(|| format!("Failed to load fixture: {}", path.display()))?;
                Ok(Self::Fixture {
                    path: path.to_path_buf(),
                    kb: Arc::new(kb),
                })
            }
            None => {
                let client = HttpKnowledgeClient::default_local();
                info!("Using knowledge service at: {}", client.base_url());
                Ok(Self::Remote(Arc::new(client)))
            }
        }
    }

    fn orchestrator(&self, model: Arc<dyn ChatModel>) -> Orchestrator {
        match self {
            Self::Fixture { kb, .. } => Orchestrator::from_knowledge(kb.clone(), model),
            Self::Remote(client) => Orchestrator::from_knowledge(client.clone(), model),
        }
    }

    async fn health(&self) -> ComponentHealth {
        match self {
            Self::Fixture { path, kb } => ComponentHealth {
                name: "knowledge",
                target: path.display().to_string(),
                healthy: true,
                detail: Some(format!(
                    "{} entities, {} relations, {} chunks",
                    kb.entity_count(),
                    kb.relation_count(),
                    kb.chunk_count()
                )),
            },
            Self::Remote(client) => {
                let (healthy, detail) = probe(client.health().await);
                ComponentHealth {
                    name: "knowledge",
                    target: client.base_url().to_string(),
                    healthy,
                    detail,
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ComponentHealth {
    name: &'static str,
    target: String,
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    timestamp: DateTime<Utc>,
    components: Vec<ComponentHealth>,
}

impl HealthReport {
    fn new(components: Vec<ComponentHealth>) -> Self {
        let status = if components.iter().all(|c| c.healthy) {
            "healthy"
        } else {
            "degraded"
        };
        Self {
            status,
            timestamp: Utc::now(),
            components,
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn probe<E: std::fmt::Display>(result: std::result::Result<bool, E>) -> (bool, Option<String>) {
    match result {
        Ok(true) => (true, None),
        Ok(false) => (false, Some("unhealthy response".to_string())),
        Err(e) => (false, Some(e.to_string())),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(false);

    // RUST_LOG wins over --verbose when set
    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = builder.with_env_filter(EnvFilter::from_default_env()).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let level = if verbose { Level::DEBUG } else { Level::INFO };
        let subscriber = builder.with_max_level(level).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Cancel in-flight work on Ctrl+C
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            token.cancel();
        }
    });
    cancel
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let knowledge = Knowledge::open(cli.fixture.as_deref()).await?;
    let chat = Arc::new(ChatClient::default_local());
    let cancel = cancel_on_ctrl_c();

    match cli.command {
        Commands::Ask {
            query,
            user,
            conversation,
            tenant,
            locale,
            max_hops,
            top_k,
            graph_context,
            no_trace,
        } => {
            let mut config = PipelineConfig::from_env();
            if let Some(max_hops) = max_hops {
                config = config.with_max_hops(max_hops);
            }
            if let Some(top_k) = top_k {
                config = config.with_top_k(top_k);
            }
            if graph_context {
                config = config.with_graph_context(true);
            }

            let conversation = conversation.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let request = AskRequest::new(query)
                .with_user(user)
                .with_conversation(conversation)
                .with_context(tenant, locale);

            let orchestrator = knowledge.orchestrator(chat).with_config(config);
            let run = orchestrator.run(&request, &cancel).await?;
            cmd_ask(run, cli.json, no_trace)?;
        }
        Commands::Link { query } => {
            let orchestrator = knowledge.orchestrator(chat);
            let outcome = orchestrator.link(&query, &cancel).await?;
            cmd_link(outcome, cli.json)?;
        }
        Commands::Entity { entity_id } => {
            let orchestrator = knowledge.orchestrator(chat);
            let entity = orchestrator
                .entity(&EntityLookupParams::new(entity_id), &cancel)
                .await?;
            cmd_entity(entity, cli.json)?;
        }
        Commands::Expand { entity_id, hops } => {
            let orchestrator = knowledge.orchestrator(chat);
            let params = ExpandParams::new(entity_id).with_hops(hops);
            let outcome = orchestrator.expand(&params, &cancel).await?;
            cmd_expand(&params, outcome, cli.json)?;
        }
        Commands::Health => {
            cmd_health(&knowledge, &chat, cli.json).await?;
        }
    }

    Ok(())
}

fn cmd_ask(run: PipelineRun, json: bool, no_trace: bool) -> Result<()> {
    let response = if no_trace {
        run.response.without_trace()
    } else {
        run.response
    };

    if json {
        return print_json(&response);
    }

    println!("{}", response.answer);

    if !response.citations.is_empty() {
        println!("\nSources:");
        for (i, citation) in response.citations.iter().enumerate() {
            println!("  [{}] {} ({})", i + 1, citation.title, citation.url);
        }
    }

    if let Some(trace) = &response.trace {
        println!("\nTrace:");
        println!("  • Linked entities: {}", trace.linked_entities.join(", "));
        println!("  • Expanded entities: {}", trace.expanded_entity_ids.join(", "));
        if !trace.search_filter.is_empty() {
            println!("  • Search filter: {}", trace.search_filter);
        }
    }

    for degradation in &run.degradations {
        eprintln!("! {} degraded: {}", degradation.stage, degradation.reason);
    }

    Ok(())
}

fn cmd_link(outcome: StageOutcome<BTreeSet<String>>, json: bool) -> Result<()> {
    if let Some(reason) = outcome.reason() {
        eprintln!("! linking degraded: {}", reason);
    }
    let linked = outcome.into_value();

    if json {
        return print_json(&linked);
    }

    if linked.is_empty() {
        println!("No entities linked.");
        return Ok(());
    }

    println!("Linked entities ({}):", linked.len());
    for id in linked {
        println!("  • {}", id);
    }
    Ok(())
}

fn cmd_entity(entity: Entity, json: bool) -> Result<()> {
    if json {
        return print_json(&entity);
    }

    println!("Entity: {} ({})", entity.name, entity.id);
    println!(
        "Type: {}",
        if entity.entity_type.is_empty() { "(none)" } else { entity.entity_type.as_str() }
    );
    if !entity.aliases.is_empty() {
        println!("Aliases: {}", entity.aliases.join(", "));
    }
    for (key, value) in &entity.metadata {
        println!("  • {}: {}", key, value);
    }
    Ok(())
}

fn cmd_expand(
    params: &ExpandParams,
    outcome: StageOutcome<GraphExpansionResult>,
    json: bool,
) -> Result<()> {
    if let Some(reason) = outcome.reason() {
        eprintln!("! expansion degraded to the starting entity: {}", reason);
    }
    let result = outcome.into_value();

    if json {
        return print_json(&result);
    }

    println!(
        "Expanded {} by {} hop(s) to {} entities:",
        params.entity_id,
        params.hops,
        result.expanded_entity_ids.len()
    );
    for id in &result.expanded_entity_ids {
        println!("  • {}", id);
    }

    if !result.relations.is_empty() {
        println!("Relationships ({}):", result.relations.len());
        for relation in result.relations.values() {
            println!("  • {}", relation);
        }
    }

    if !result.evidence_chunk_ids.is_empty() {
        println!("Evidence chunks ({}):", result.evidence_chunk_ids.len());
        for chunk_id in &result.evidence_chunk_ids {
            println!("  • {}", chunk_id);
        }
    }
    Ok(())
}

async fn cmd_health(knowledge: &Knowledge, chat: &ChatClient, json: bool) -> Result<()> {
    let (healthy, detail) = probe(chat.health().await);
    let llm = ComponentHealth {
        name: "llm",
        target: format!("{} ({})", chat.base_url(), chat.model()),
        healthy,
        detail,
    };
    let report = HealthReport::new(vec![knowledge.health().await, llm]);

    if json {
        print_json(&report)?;
    } else {
        println!("Status: {} at {}", report.status, report.timestamp.to_rfc3339());
        for component in &report.components {
            let mark = if component.healthy { "✓" } else { "✗" };
            print!("  {} {}: {}", mark, component.name, component.target);
            match &component.detail {
                Some(detail) => println!(" ({})", detail),
                None => println!(),
            }
        }
    }

    if !report.is_healthy() {
        anyhow::bail!("One or more services are unavailable");
    }
    Ok(())
}
