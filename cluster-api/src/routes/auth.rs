/// Authentication and profile endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register and get a token
/// - `POST /api/auth/login` - Exchange credentials for a token
/// - `POST /api/auth/forgot-password` - Email a reset token
/// - `POST /api/auth/reset-password` - Set a new password with a reset token
/// - `GET /api/auth/me` - Caller's profile
/// - `PUT /api/auth/profile` - Update the caller's name or email

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use cluster_shared::{
    auth::{jwt, middleware::AuthContext, password, reset_token},
    models::{
        company::not_blank,
        user::{normalize_email, CreateUser, UpdateUser, User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

/// Same message for unknown email, wrong password and inactive account
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Sent whether or not the address belongs to an account
pub const RESET_REQUESTED: &str = "If the email exists, you will receive password reset instructions";

pub const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "First name is required"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Last name is required"))]
    pub last_name: String,

    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token plus public profile, returned by register and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub token: String,
}

impl AuthResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            token,
        }
    }
}

/// Allow-listed profile patch
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    #[validate(custom(function = "not_blank", message = "First name cannot be empty"))]
    pub first_name: Option<String>,

    #[validate(custom(function = "not_blank", message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

fn issue(state: &AppState, user: &User) -> ApiResult<String> {
    Ok(jwt::issue_token(
        user.id,
        user.role,
        state.jwt_secret(),
        state.jwt_expiration_hours(),
    )?)
}

/// Registers a new account
///
/// The welcome email is part of the request: the account is committed
/// first, then a delivery failure answers 500.
///
/// # Errors
///
/// - `400`: validation failed, or the email is already registered
/// - `500`: welcome email could not be sent
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let email = normalize_email(&req.email);
    if User::email_in_use(&state.db, &email, None).await? {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            role: req.role.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    let welcome = state.notifier.templates().welcome(&user.email, &user.first_name);
    state.notifier.deliver(welcome).await?;

    let token = issue(&state, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))))
}

/// Exchanges credentials for a token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? || !user.is_active {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue(&state, &user)?;
    Ok(Json(AuthResponse::new(user, token)))
}

/// Public profile of the caller
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates the caller's names or email
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let email = req.email.as_deref().map(normalize_email);
    if let Some(email) = &email {
        if User::email_in_use(&state.db, email, Some(auth.user_id)).await? {
            return Err(ApiError::Conflict("Email is already in use".to_string()));
        }
    }

    let user = User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            email,
            first_name: req.first_name.map(|s| s.trim().to_string()),
            last_name: req.last_name.map(|s| s.trim().to_string()),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Emails a reset token when the address belongs to an account
///
/// The answer is identical either way. A failed send is logged only.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()?;

    if let Some(user) = User::find_by_email(&state.db, &req.email).await? {
        let (token, token_hash) = reset_token::generate_reset_token();
        let expires_at = Utc::now() + reset_token::reset_token_ttl();
        User::set_reset_token(&state.db, user.id, &token_hash, expires_at).await?;

        let message = state
            .notifier
            .templates()
            .password_reset(&user.email, &user.first_name, &token);
        state.notifier.notify(message).await;
    }

    Ok(Json(json!({ "message": RESET_REQUESTED })))
}

/// Sets a new password if the reset token matches and hasn't expired
///
/// The confirmation email is delivered strictly, after the new password
/// is stored.
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::invalid_field("token", INVALID_RESET_TOKEN))?;

    if !user.reset_token_valid(&req.token, Utc::now()) {
        tracing::debug!(user_id = %user.id, "Reset token rejected");
        return Err(ApiError::invalid_field("token", INVALID_RESET_TOKEN));
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = User::set_password(&state.db, user.id, &password_hash)
        .await?
        .ok_or_else(|| ApiError::invalid_field("token", INVALID_RESET_TOKEN))?;

    tracing::info!(user_id = %user.id, "Password reset");

    let confirmation = state
        .notifier
        .templates()
        .password_changed(&user.email, &user.first_name);
    state.notifier.deliver(confirmation).await?;

    Ok(Json(json!({ "message": "Password reset successfully" })))
}
