// doccache-chat - Browser chat over a Gemini context-cached document
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use doccache_chat::cache::{CacheInitializer, CacheSettings, DocumentReference, PollPolicy};
use doccache_chat::chat::SessionRegistry;
use doccache_chat::cli::Args;
use doccache_chat::config::AppConfig;
use doccache_chat::gemini::{GeminiBackend, GeminiClient};
use doccache_chat::query::QueryForwarder;
use doccache_chat::server::create_router;
use doccache_chat::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting doccache-chat v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;

    // Phase 3: Build the Gemini client with the configured key
    let client = GeminiClient::new(&config.gemini)?
        .with_sanitized_logs(config.logging.sanitize_tokens);
    let backend: Arc<dyn GeminiBackend> = Arc::new(client);

    // Phase 4: Wire cache initialization, query forwarding and sessions
    let document = DocumentReference::from(&config);
    if !document.path.exists() {
        warn!(
            "Document {} not found; every session will fail to initialize",
            document.path.display()
        );
    }
    info!(
        "Serving {} ({}) with model {}",
        document.display_name,
        document.path.display(),
        config.cache.model
    );

    let initializer = Arc::new(CacheInitializer::new(
        backend.clone(),
        CacheSettings::from(&config),
        PollPolicy::from(&config),
    ));
    let forwarder = Arc::new(QueryForwarder::new(backend));
    let sessions = SessionRegistry::new(initializer, forwarder, document);

    // Phase 5: Build and start HTTP server
    let app = create_router(sessions)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
