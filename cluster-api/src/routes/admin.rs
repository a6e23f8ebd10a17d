/// Admin endpoints: dashboard counts and account management
///
/// Mounted behind the admin gate, so every handler here can assume the
/// caller is an administrator.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use cluster_shared::{
    auth::middleware::AuthContext,
    models::{
        stats::AdminStats,
        user::{User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UserRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct RoleChangeResponse {
    pub message: String,
    pub user: RoleSummary,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// `GET /api/admin/stats`
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<AdminStats>> {
    Ok(Json(AdminStats::collect(&state.db, Utc::now()).await?))
}

/// `GET /api/admin/users?role=`
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(User::list(&state.db, query.role).await?))
}

/// `PUT /api/admin/users/:id/status`
///
/// Deactivated accounts can no longer log in, and their existing tokens
/// stop being accepted.
pub async fn update_user_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UserStatusRequest>,
) -> ApiResult<Json<UserStatusResponse>> {
    let is_active = req
        .is_active
        .ok_or_else(|| ApiError::invalid_field("isActive", "isActive must be a boolean"))?;

    let user = User::set_active(&state.db, id, is_active)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %id, admin_id = %auth.user_id, is_active, "User status changed");

    Ok(Json(UserStatusResponse {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        role: user.role,
        is_active: user.is_active,
    }))
}

/// `PUT /api/admin/users/:id/role`
pub async fn change_user_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UserRoleRequest>,
) -> ApiResult<Json<RoleChangeResponse>> {
    let user = User::set_role(&state.db, id, req.role)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %id, admin_id = %auth.user_id, role = %user.role, "User role changed");

    Ok(Json(RoleChangeResponse {
        message: "User role updated successfully".to_string(),
        user: RoleSummary {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
        },
    }))
}
