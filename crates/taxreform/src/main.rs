//! taxreform - batch taxonomic name resolution

use clap::Parser;
use gnames_api::GnamesClient;
use otol_api::OtolClient;
use std::sync::Arc;
use taxreform::config::{Cli, Command, ParserKind, ResolverArgs};
use taxreform::parser::{CanonicalParser, GnParser, NameParser};
use taxreform::server::{start_server, ServerState, SharedState};
use taxreform::services::TaxonomyService;
use taxreform::{BatchRunner, GnamesService, Orchestrator, OtolService, ResolveError, Result};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("taxreform=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    let cli = Cli::parse();
    match cli.command {
        Command::Batch(args) => {
            let orchestrator = build_orchestrator(&args.resolver).await?;
            let runner = BatchRunner::new(
                orchestrator,
                &args.resolver.context,
                args.resolver.taxon_filter(),
            )
            .with_genus_search(args.genus_search);

            let summary = runner.run(&args.input, &args.output).await?;
            info!(
                total = summary.total,
                matched = summary.matched,
                unmatched = summary.unmatched,
                "Search finished"
            );
        }
        Command::Serve(args) => {
            info!("Port: {}", args.port);
            let orchestrator = build_orchestrator(&args.resolver).await?;
            let state: SharedState = Arc::new(ServerState::new(
                orchestrator,
                &args.resolver.context,
                args.resolver.taxon_filter(),
            ));

            start_server(state, args.port)
                .await
                .map_err(|e| ResolveError::Config(format!("Server error: {}", e)))?;
        }
    }

    Ok(())
}

async fn build_orchestrator(args: &ResolverArgs) -> Result<Arc<Orchestrator>> {
    let policy = args.retry_policy();
    info!(
        context = %args.context,
        retry_wait_secs = policy.wait.as_secs(),
        max_attempts = ?policy.max_attempts,
        "Configuring name services"
    );

    let otol = match &args.otol_api_url {
        Some(url) => OtolClient::with_base_url(url),
        None => OtolClient::new(),
    };
    let gnames = match &args.gnames_api_url {
        Some(url) => GnamesClient::with_base_url(url),
        None => GnamesClient::new(),
    };

    let taxonomy: Arc<dyn TaxonomyService> = Arc::new(OtolService::new(otol, policy.clone()));
    let fuzzy = Arc::new(GnamesService::new(gnames, policy));
    let parser: Arc<dyn NameParser> = match args.parser {
        ParserKind::Gnparser => Arc::new(GnParser::new(&args.gnparser)),
        ParserKind::Builtin => Arc::new(CanonicalParser),
    };

    // Stamped on every output record
    let source_version = taxonomy.source_version().await?;
    match &source_version {
        Some(version) => info!("OTT taxonomy version: {}", version),
        None => warn!("Could not read OTT taxonomy version"),
    }

    let orchestrator = Orchestrator::new(fuzzy, taxonomy, parser, source_version)
        .with_unverified_lineage(args.accept_unverified_lineage);
    Ok(Arc::new(orchestrator))
}
