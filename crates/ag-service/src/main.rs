use ag_service::auth::LoginSessions;
use ag_service::config::Config;
use ag_service::observability::metrics::init_metrics_recorder;
use ag_service::repositories::UserDirectory;
use ag_service::routes::{self, AppState};
use ag_service::services::{AccessGateway, HttpMediaBackend, MediaBackend, SessionRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ag_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Access Gateway");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    // Initialize metrics recorder before anything records
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    // Wire up the media backend client, the registry, and the gateway
    let backend: Arc<dyn MediaBackend> = Arc::new(HttpMediaBackend::new(
        config.media_backend_url.clone(),
        config.media_backend_secret.clone(),
    ));
    let registry = Arc::new(SessionRegistry::new(backend));
    let directory = Arc::new(UserDirectory::seeded());
    let gateway = Arc::new(AccessGateway::new(directory.clone(), registry));

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    // Create application state
    let state = Arc::new(AppState {
        config,
        directory,
        logins: Arc::new(LoginSessions::new()),
        gateway,
    });

    // Build application routes
    let app = routes::build_routes(state, metrics_handle);

    // Parse bind address
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Access Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
