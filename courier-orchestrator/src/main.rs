use courier_orchestrator::config::Config;
use courier_orchestrator::queue::QueueRegistry;
use courier_orchestrator::state::{AppState, DispatchSettings};
use courier_orchestrator::storage::FileSystemStorage;
use courier_orchestrator::{api, db};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Courier Orchestrator...");

    let config = Config::from_env();
    config.validate().expect("Invalid configuration");

    tracing::info!("Connecting to database...");

    // Create database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Database connection pool created");

    // Run migrations
    db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!(
        "Queues at {}, blobs at {}",
        config.queues_folder.display(),
        config.blob_folder.display()
    );

    let state = AppState::new(
        pool,
        QueueRegistry::new(&config.queues_folder),
        FileSystemStorage::new(&config.blob_folder),
        DispatchSettings::from(&config),
    );
    let shutdown = state.shutdown.clone();

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down, releasing pending long-polls");
            shutdown.cancel();
        })
        .await
        .expect("Failed to start server");
}
