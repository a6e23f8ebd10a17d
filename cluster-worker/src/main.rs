//! # Cluster Membership Worker
//!
//! Sends renewal reminders on a fixed interval, sharing the sweep with the
//! admin-triggered endpoint.
//!
//! ```bash
//! cargo run -p cluster-worker
//! ```

use cluster_shared::{db::pool, notify::Notifier};
use cluster_worker::{config::WorkerConfig, scheduler::ReminderScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "cluster_worker=debug,cluster_shared=info".into()),
    );
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        "Cluster Membership Worker v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig::from_url(
        config.database_url.clone(),
        config.max_connections,
    ))
    .await?;
    let notifier = Notifier::from_config(&config.mail)?;

    let scheduler = ReminderScheduler::new(db.clone(), notifier, config.reminder_interval);

    let shutdown = scheduler.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });

    scheduler.run().await;

    pool::close_pool(db).await;
    tracing::info!("Worker stopped");

    Ok(())
}
