//! # Cluster Membership API Server
//!
//! ```bash
//! cargo run -p cluster-api
//! ```
//!
//! Reads its settings from the environment (see `.env.example`), applies
//! pending migrations, then serves until Ctrl-C.

use cluster_api::{
    app::{build_router, AppState},
    config::Config,
};
use cluster_shared::{
    db::{migrations::run_migrations, pool},
    notify::Notifier,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cluster_api=debug,cluster_shared=info,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Cluster Membership API v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig::from_url(
        config.database.url.clone(),
        config.database.max_connections,
    ))
    .await?;
    run_migrations(&db).await?;

    let notifier = Notifier::from_config(&config.mail)?;
    tracing::info!(
        mailer = notifier.mailer_name(),
        organization = notifier.templates().organization(),
        "Mailer ready"
    );

    let address = config.bind_address();
    let app = build_router(AppState::new(db.clone(), config, notifier));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}
