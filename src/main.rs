use keyhole::{
    build_router,
    config::{
        session::{create_store, signing_key, SessionConfig},
        AppConfig,
    },
    db,
    repositories::SqliteUserRepository,
    AppState,
};

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyhole=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    if !config.download_path.is_file() {
        tracing::warn!(
            path = %config.download_path.display(),
            "Download file does not exist; /download will return 404"
        );
    }

    // Database connection
    let pool = db::create_pool(&config.database_url)
        .await
        .context("failed to open database")?;

    // Run migrations
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    // Session store
    let session_store = create_store(pool.clone())
        .await
        .context("failed to prepare session store")?;
    let session_layer = SessionConfig::from_config(&config)
        .create_layer(session_store, signing_key(&config.session_secret));

    let addr = SocketAddr::from((config.host, config.port));

    // Create app state
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let app_state = AppState::new(user_repository, config);

    let app = build_router(app_state, session_layer);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
