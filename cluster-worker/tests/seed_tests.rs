/// Database-backed tests for the development seed
///
/// Require DATABASE_URL; skipped without it. Seed accounts are left in
/// place since a second run reuses them.

use cluster_shared::db::migrations::run_migrations;
use cluster_shared::db::pool::{create_pool, DatabaseConfig};
use cluster_shared::models::company::Company;
use cluster_shared::models::membership::{Membership, MembershipStatus, PaymentStatus};
use cluster_shared::models::user::{User, UserRole};
use cluster_worker::seed::{seed, ACCOUNTS};

#[tokio::test]
async fn test_seed_is_idempotent() {
    let Ok(url) = std::env::var("DATABASE_URL") else { return };
    let pool = create_pool(DatabaseConfig::from_url(url, 2))
        .await
        .expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");

    seed(&pool).await.unwrap();

    for account in &ACCOUNTS {
        let user = User::find_by_email(&pool, account.email)
            .await
            .unwrap()
            .expect("seed account");
        assert_eq!(user.role, account.role);

        if user.role == UserRole::Member {
            let company = Company::find_by_owner(&pool, user.id)
                .await
                .unwrap()
                .expect("seed company");
            assert!(company.is_published);

            let current = Membership::current_for_user(&pool, user.id)
                .await
                .unwrap()
                .expect("seed membership");
            assert_eq!(current.membership.status, MembershipStatus::Active);
            assert_eq!(current.membership.payment_status, PaymentStatus::Paid);
            assert!(!current.membership.payment_history.is_empty());
        }
    }

    let again = seed(&pool).await.unwrap();
    assert_eq!(again.users_created, 0);
    assert_eq!(again.users_skipped, ACCOUNTS.len());
    assert_eq!(again.memberships_created, 0);
}
