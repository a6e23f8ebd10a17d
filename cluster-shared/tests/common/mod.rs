/// Shared helpers for database integration tests
///
/// Tests need a PostgreSQL database named by DATABASE_URL. When the variable
/// is unset, [`test_pool`] returns `None` and the calling test returns early.
///
/// Run with: cargo test -p cluster-shared -- --test-threads=1

use cluster_shared::auth::password::hash_password;
use cluster_shared::db::migrations::{ensure_database_exists, run_migrations};
use cluster_shared::db::pool::{create_pool, DatabaseConfig};
use cluster_shared::models::company::{Company, CompanySector, ContactInfo, CreateCompany, SocialMedia};
use cluster_shared::models::user::{CreateUser, User, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

/// Connects and migrates, or `None` without DATABASE_URL
pub async fn test_pool() -> Option<PgPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping database test");
            return None;
        }
    };

    ensure_database_exists(&url)
        .await
        .expect("Failed to create test database");

    let pool = create_pool(DatabaseConfig::from_url(url, 5))
        .await
        .expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    Some(pool)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@test.cluster.mx", prefix, Uuid::new_v4().simple())
}

pub async fn create_user(pool: &PgPool, role: UserRole) -> User {
    User::create(
        pool,
        CreateUser {
            email: unique_email("user"),
            password_hash: hash_password("secret123").expect("hash"),
            first_name: "Ana".to_string(),
            last_name: "López".to_string(),
            role,
        },
    )
    .await
    .expect("Failed to create user")
}

pub fn company_input(name: &str) -> CreateCompany {
    CreateCompany {
        company_name: name.to_string(),
        logo: None,
        sector: CompanySector::Frescos,
        description: "Productos regionales".to_string(),
        contact_info: ContactInfo {
            address: "Av. Central 100".to_string(),
            phone: "555-0100".to_string(),
            email: "contacto@empresa.mx".to_string(),
            website: None,
        },
        social_media: SocialMedia::default(),
    }
}

pub async fn create_company(pool: &PgPool, owner_id: Uuid) -> Company {
    Company::create(pool, owner_id, company_input("Empresa de Prueba"))
        .await
        .expect("Failed to create company")
}

/// Removes a user with their memberships and company
pub async fn cleanup_user(pool: &PgPool, user_id: Uuid) {
    sqlx::query("DELETE FROM memberships WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .ok();
}
