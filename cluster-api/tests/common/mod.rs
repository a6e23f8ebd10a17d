/// Shared infrastructure for API integration tests
///
/// Tests drive the full router against a real PostgreSQL database named
/// by DATABASE_URL, with a recording mailer in place of a transport. When
/// DATABASE_URL is unset, [`TestContext::new`] returns `None` and the test
/// returns early.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cluster_api::app::{build_router, AppState};
use cluster_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use cluster_shared::db::migrations::run_migrations;
use cluster_shared::notify::{EmailMessage, MailConfig, Notifier, RecordingMailer, Templates};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::Service as _;
use uuid::Uuid;

pub const PASSWORD: &str = "secret123";
pub const ORGANIZATION: &str = "Cluster Alimentos";

pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub mailer: RecordingMailer,
    users: std::sync::Mutex<Vec<Uuid>>,
}

/// A registered account and its token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

fn test_config(url: String) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".into(),
            port: 0,
            production: false,
            cors_origins: vec!["*".into()],
        },
        database: DatabaseConfig {
            url,
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-bytes".into(),
            expiration_hours: 1,
        },
        mail: MailConfig::default(),
    }
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("DATABASE_URL not set, skipping API integration test");
                return None;
            }
        };

        let db = PgPool::connect(&url).await.expect("Failed to connect to test database");
        run_migrations(&db).await.expect("Failed to run migrations");

        let mailer = RecordingMailer::new();
        let notifier = Notifier::new(Arc::new(mailer.clone()), Templates::new(ORGANIZATION));
        let app = build_router(AppState::new(db.clone(), test_config(url), notifier));

        Some(Self {
            db,
            app,
            mailer,
            users: std::sync::Mutex::new(Vec::new()),
        })
    }

    /// Sends a request and returns the status with the JSON body
    /// (`Value::Null` when the body is empty or not JSON)
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(bearer) = bearer {
            builder = builder.header("authorization", bearer);
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Registers an account through the API
    pub async fn register(&self, role: &str) -> TestUser {
        let email = format!("{}-{}@test.cluster.mx", role, Uuid::new_v4().simple());
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "firstName": "Ana",
                    "lastName": "López",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
        self.users.lock().unwrap().push(id);

        TestUser {
            id,
            email,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a company owned by `user` and returns its id
    pub async fn create_company(&self, user: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .request(
                "POST",
                "/api/companies",
                Some(&user.bearer()),
                Some(company_body(name)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create company failed: {}", body);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn emails_to(&self, address: &str) -> Vec<EmailMessage> {
        self.mailer.sent_to(address).await
    }

    /// Deletes every account this context registered, memberships first
    /// since they pin their company
    pub async fn cleanup(&self) {
        let ids = self.users.lock().unwrap().clone();
        for id in ids {
            sqlx::query("DELETE FROM memberships WHERE user_id = $1")
                .bind(id)
                .execute(&self.db)
                .await
                .ok();
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await
                .ok();
        }
    }
}

pub fn company_body(name: &str) -> Value {
    json!({
        "companyName": name,
        "sector": "Frescos",
        "description": "Productos regionales de temporada",
        "contactInfo": {
            "address": "Av. Central 100",
            "phone": "555-0100",
            "email": "contacto@empresa.mx"
        }
    })
}

/// Pulls the reset token out of a password-reset email
pub fn reset_token_from(message: &EmailMessage) -> String {
    let start = message.html.find("<p><strong>").expect("token paragraph") + "<p><strong>".len();
    let end = message.html[start..].find("</strong>").expect("token end") + start;
    message.html[start..end].to_string()
}
