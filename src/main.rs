use search_aggregator::{
    api::{build_router, AppState},
    config::Config,
    search::{create_store, IndexLifecycleManager, SearchService},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with a reloadable filter so /log-level can change
    // verbosity at runtime
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "search_aggregator=info,tower_http=info".into());
    let (filter, reload_handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; the topology has no sensible fallback
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    tracing::info!("Starting Search Aggregator v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Categories configured: {:?}",
        config.topology.public_names()
    );

    // Initialize storage backend
    tracing::info!("Storage backend: {:?}", config.store.backend);
    let store = create_store(&config.store);
    let topology = Arc::new(config.topology.clone());

    // Reconcile search index definitions before accepting traffic. A failed
    // upsert means queries would run against missing indexes, so it is fatal.
    let lifecycle = IndexLifecycleManager::new(store.clone(), topology.clone());
    if let Err(e) = lifecycle.upsert_all().await {
        tracing::error!("Search index reconciliation failed: {}", e);
        return Err(e.into());
    }
    tracing::info!("✅ Search indexes reconciled");

    // Build the search service
    let service = Arc::new(SearchService::new(store, topology));
    tracing::info!("✅ Search service initialized");

    // Create application state for the HTTP API
    let app_state = AppState::new(service).with_reload(reload_handle);
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/healthcheck", http_addr);
    tracing::info!("   Search API: http://{}/v1/query", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
