//! # Legal Retrieval Server Main Driver
//!
//! ## Purpose
//! Entry point for the retrieval server. Loads configuration, builds the
//! corpus snapshot once at startup, wires the two external capabilities and
//! starts the web server.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Load the four source corpora into the immutable snapshot
//! 4. Build the query pipeline with the HTTP capabilities
//! 5. Start the API server
//! 6. Handle shutdown signals gracefully
//!
//! Startup must complete before any query is served: the snapshot records
//! which sources loaded, and queries read that status instead of any
//! process-wide mutable state.

use clap::{Arg, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use juris_retrieval::{
    api::ApiServer,
    config::Config,
    embedding::HttpEmbedder,
    errors::{Result, RetrievalError},
    index::CorpusSnapshot,
    pipeline::QueryPipeline,
    synthesis::HttpGenerator,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("juris-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Multi-source French legal retrieval engine with citation-grounded synthesis")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("check-health")
                .long("check-health")
                .help("Validate configuration and data paths, then exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").expect("has default");
    let mut config = Config::from_file(config_path)?;

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);
    init_logging(&config)?;

    info!("Starting legal retrieval server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    if matches.get_flag("check-health") {
        return run_health_checks(&config);
    }

    // Cold start: build the immutable corpus snapshot before serving queries
    let data_dir = config.data.data_dir.clone();
    let snapshot = tokio::task::spawn_blocking(move || CorpusSnapshot::load(&data_dir))
        .await
        .map_err(|e| RetrievalError::Internal {
            message: format!("corpus loading task failed: {}", e),
        })?;
    let snapshot = Arc::new(snapshot);

    let status = snapshot.status();
    info!(?status, "corpus loading complete");
    if !(status.articles && status.jurisprudence && status.circulaires && status.reponses) {
        warn!("one or more sources are unavailable; queries will degrade gracefully");
    }

    let embed_token = Config::resolve_token(&config.embedding.token_env);
    if embed_token.is_empty() {
        warn!(
            "environment variable {} is not set; embedding calls will fail",
            config.embedding.token_env
        );
    }
    let generate_token = Config::resolve_token(&config.generation.token_env);

    let embedder = Arc::new(HttpEmbedder::new(&config.embedding, embed_token)?);
    let generator = Arc::new(HttpGenerator::new(&config.generation, generate_token)?);
    let pipeline = Arc::new(QueryPipeline::new(snapshot.clone(), embedder, generator));

    let app_state = AppState {
        config: config.clone(),
        snapshot,
        pipeline,
    };

    let server = ApiServer::new(app_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Legal retrieval server started on {}:{}",
        config.server.host, config.server.port
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    info!("Legal retrieval server shut down");
    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let log_level: tracing::Level =
        config
            .logging
            .level
            .parse()
            .map_err(|_| RetrievalError::Config {
                message: format!("Invalid log level: {}", config.logging.level),
            })?;
    let filter = tracing_subscriber::filter::LevelFilter::from_level(log_level);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json()
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_filter(filter),
            )
            .init();
    }

    info!("Logging initialized with level: {}", config.logging.level);
    Ok(())
}

/// Validate configuration and data paths, for deploy-time checks
fn run_health_checks(config: &Config) -> Result<()> {
    info!("Running health checks...");
    info!("✓ Configuration is valid");

    if !config.data.data_dir.exists() {
        return Err(RetrievalError::ValidationFailed {
            field: "data.data_dir".to_string(),
            reason: format!("Data directory not found: {:?}", config.data.data_dir),
        });
    }
    info!("✓ Data directory exists");

    for source in juris_retrieval::SourceType::ALL {
        let path = config.data.data_dir.join(format!("{}.jsonl", source.key()));
        if path.exists() {
            info!("✓ Source file present: {}", source.key());
        } else {
            warn!("✗ Source file missing: {} (will degrade)", source.key());
        }
    }

    info!("All health checks passed!");
    Ok(())
}
