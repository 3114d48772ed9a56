//! SchemaFlow Catalog service
//!
//! Serves the comparison engine and the node schema cache over HTTP.

use schemaflow_catalog::config::Settings;
use schemaflow_catalog::nodes::DomainConfig;
use schemaflow_catalog::routes::create_router;
use schemaflow_catalog::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting SchemaFlow Catalog...");

    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    let domain = DomainConfig::load(&settings.domain_config)?;
    info!(
        "🗂️  Domain loaded: database {}, {} nodes",
        domain.default_database,
        domain.nodes.len()
    );

    let state = Arc::new(AppState::new(domain));
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   GET  /health                               - Health check");
    info!("   POST /api/compare                          - Compare two catalogs");
    info!("   POST /api/catalogs                         - Cache an extracted catalog");
    info!("   GET  /api/catalogs                         - List cached catalogs");
    info!("   GET  /api/nodes                            - List configured nodes");
    info!("   GET  /api/nodes/{{id}}/schema                - Cached schema for a node");
    info!("   GET  /api/nodes/{{source}}/mapping/{{target}}  - Name mapping between nodes");
    info!("");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,schemaflow_catalog=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
