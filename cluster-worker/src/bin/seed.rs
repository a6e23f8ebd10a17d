//! # Cluster Seed
//!
//! Loads development accounts, companies and memberships. Existing
//! accounts are left as they are.
//!
//! ```bash
//! cargo run -p cluster-worker --bin cluster-seed
//! ```

use cluster_shared::db::{migrations::run_migrations, pool};
use cluster_worker::seed;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cluster_worker=debug,cluster_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

    let db = pool::create_pool(pool::DatabaseConfig::from_url(database_url, 2)).await?;
    run_migrations(&db).await?;

    let result = seed::seed(&db).await;
    pool::close_pool(db).await;

    let summary = result?;
    tracing::info!(
        created = summary.users_created,
        skipped = summary.users_skipped,
        "Seeding complete"
    );

    Ok(())
}
