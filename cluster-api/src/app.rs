/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use cluster_api::{app::{build_router, AppState}, config::Config};
/// use cluster_shared::notify::Notifier;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let notifier = Notifier::from_config(&config.mail)?;
/// let app = build_router(AppState::new(pool, config, notifier));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Extension, Router,
};
use cluster_shared::{
    auth::{
        authorization::require_admin,
        middleware::{bearer_token, verify_token, AuthContext},
    },
    notify::Notifier,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, notifier: Notifier) -> Self {
        Self {
            db,
            config: Arc::new(config),
            notifier,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn jwt_expiration_hours(&self) -> i64 {
        self.config.jwt.expiration_hours
    }
}

/// Builds the complete router
///
/// ```text
/// /health                                   public
/// /api/auth/{register,login}                public
/// /api/auth/{forgot,reset}-password         public
/// /api/auth/me, /api/auth/profile           authenticated
/// /api/companies[/:id[/publish]]            authenticated, owner or admin
/// /api/memberships/{apply,me}               authenticated
/// /api/memberships/...                      admin
/// /api/admin/...                            admin
/// ```
///
/// Middleware, outermost first: security headers, CORS, tracing, then the
/// bearer-token layer and the admin gate on the routes that need them.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    let private_auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/profile", put(routes::auth::update_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let company_routes = Router::new()
        .route(
            "/",
            post(routes::companies::create_company).get(routes::companies::list_companies),
        )
        .route(
            "/:id",
            get(routes::companies::get_company)
                .put(routes::companies::update_company)
                .delete(routes::companies::delete_company),
        )
        .route("/:id/publish", put(routes::companies::toggle_publish))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let member_membership_routes = Router::new()
        .route("/apply", post(routes::memberships::apply))
        .route("/me", get(routes::memberships::current_membership));

    let admin_membership_routes = Router::new()
        .route("/", get(routes::memberships::list_memberships))
        .route("/pending", get(routes::memberships::list_pending))
        .route(
            "/send-renewal-reminders",
            post(routes::memberships::send_renewal_reminders),
        )
        .route("/:id/approve", put(routes::memberships::approve))
        .route("/:id/reject", put(routes::memberships::reject))
        .route("/:id/renew", put(routes::memberships::renew))
        .route("/:id/status", put(routes::memberships::update_status))
        .route(
            "/:id/payment-status",
            put(routes::memberships::update_payment_status),
        )
        .route("/:id/payment", post(routes::memberships::record_payment))
        .route_layer(middleware::from_fn(admin_layer));

    let membership_routes = member_membership_routes
        .merge(admin_membership_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let admin_routes = Router::new()
        .route("/stats", get(routes::admin::stats))
        .route("/users", get(routes::admin::list_users))
        .route("/users/:id/status", put(routes::admin::update_user_status))
        .route("/users/:id/role", put(routes::admin::change_user_role))
        .route_layer(middleware::from_fn(admin_layer))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(private_auth_routes))
        .nest("/companies", company_routes)
        .nest("/memberships", membership_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Resolves the bearer token to an [`AuthContext`] request extension
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let auth = verify_token(&state.db, token, state.jwt_secret()).await?;

    tracing::debug!(user_id = %auth.user_id, role = %auth.role, "Authenticated request");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Lets only admins through; runs after [`jwt_auth_layer`]
async fn admin_layer(
    Extension(auth): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_admin(&auth)?;
    Ok(next.run(req).await)
}
