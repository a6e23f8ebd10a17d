/// Database-backed tests for the reminder scheduler
///
/// Require DATABASE_URL; skipped without it.
///
/// Run with: cargo test -p cluster-worker -- --test-threads=1

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use cluster_shared::db::migrations::run_migrations;
use cluster_shared::db::pool::{create_pool, DatabaseConfig};
use cluster_shared::models::company::{Company, CompanySector, ContactInfo, CreateCompany, SocialMedia};
use cluster_shared::models::membership::{Membership, NewMembership};
use cluster_shared::models::user::{CreateUser, User, UserRole};
use cluster_shared::notify::{Notifier, RecordingMailer, Templates};
use cluster_worker::scheduler::ReminderScheduler;
use sqlx::PgPool;

/// Sweeps stamp every due membership, so tests that sweep run one at a time
static SWEEP_LOCK: Mutex<()> = Mutex::new(());

fn sweep_lock() -> MutexGuard<'static, ()> {
    SWEEP_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = create_pool(DatabaseConfig::from_url(url, 2))
        .await
        .expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    Some(pool)
}

/// An approved membership renewing in about two weeks
async fn due_membership(pool: &PgPool) -> (User, Company) {
    let user = User::create(
        pool,
        CreateUser {
            email: format!("worker-{}@test.cluster.mx", uuid::Uuid::new_v4().simple()),
            password_hash: "unused".to_string(),
            first_name: "Marta".to_string(),
            last_name: "Gil".to_string(),
            role: UserRole::Member,
        },
    )
    .await
    .unwrap();

    let company = Company::create(
        pool,
        user.id,
        CreateCompany {
            company_name: "Panadería Norte".to_string(),
            logo: None,
            sector: CompanySector::Procesados,
            description: "Pan artesanal".to_string(),
            contact_info: ContactInfo {
                address: "Calle 5".to_string(),
                phone: "555-0199".to_string(),
                email: "hola@panaderia.mx".to_string(),
                website: None,
            },
            social_media: SocialMedia::default(),
        },
    )
    .await
    .unwrap();

    let applied = Membership::apply(
        pool,
        NewMembership {
            user_id: user.id,
            company_id: company.id,
            membership_level: "Premium".to_string(),
            start_date: Some(Utc::now() - chrono::Duration::days(350)),
        },
    )
    .await
    .unwrap();
    Membership::approve(pool, applied.id).await.unwrap();

    (user, company)
}

async fn cleanup(pool: &PgPool, user: &User) {
    sqlx::query("DELETE FROM memberships WHERE user_id = $1")
        .bind(user.id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await
        .ok();
}

#[tokio::test]
async fn test_run_once_sends_and_counts_failures() {
    let Some(pool) = test_pool().await else { return };
    let _guard = sweep_lock();
    let (delivered, company) = due_membership(&pool).await;
    let (bounced, _) = due_membership(&pool).await;

    let mailer = RecordingMailer::new();
    mailer.fail_for(bounced.email.clone()).await;
    let notifier = Notifier::new(Arc::new(mailer.clone()), Templates::new("Cluster"));
    let scheduler = ReminderScheduler::new(pool.clone(), notifier, Duration::from_secs(3600));

    let summary = scheduler.run_once().await.unwrap();
    assert!(summary.total_memberships >= 2);
    assert!(summary.failed() >= 1);

    let received = mailer.sent_to(&delivered.email).await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].subject, "Membership renewal reminder");
    assert!(received[0].html.contains(&company.company_name));
    assert!(mailer.sent_to(&bounced.email).await.is_empty());

    cleanup(&pool, &delivered).await;
    cleanup(&pool, &bounced).await;
}

#[tokio::test]
async fn test_run_sweeps_then_stops_on_cancel() {
    let Some(pool) = test_pool().await else { return };
    let _guard = sweep_lock();
    let (user, _) = due_membership(&pool).await;

    let mailer = RecordingMailer::new();
    let notifier = Notifier::new(Arc::new(mailer.clone()), Templates::new("Cluster"));
    let scheduler = Arc::new(ReminderScheduler::new(
        pool.clone(),
        notifier,
        Duration::from_secs(3600),
    ));

    let shutdown = scheduler.shutdown_token();
    let runner = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };

    // The first tick fires immediately
    for _ in 0..50 {
        if !mailer.sent_to(&user.email).await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(mailer.sent_to(&user.email).await.len(), 1);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("scheduler should stop")
        .unwrap();

    cleanup(&pool, &user).await;
}

#[tokio::test]
async fn test_run_once_reminds_each_member_once_per_term() {
    let Some(pool) = test_pool().await else { return };
    let _guard = sweep_lock();
    let (user, _) = due_membership(&pool).await;

    let mailer = RecordingMailer::new();
    let notifier = Notifier::new(Arc::new(mailer.clone()), Templates::new("Cluster"));
    let scheduler = ReminderScheduler::new(pool.clone(), notifier, Duration::from_secs(3600));

    scheduler.run_once().await.unwrap();
    scheduler.run_once().await.unwrap();
    assert_eq!(mailer.sent_to(&user.email).await.len(), 1);

    cleanup(&pool, &user).await;
}
