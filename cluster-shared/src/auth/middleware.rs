/// Bearer-token authentication for Axum
///
/// Verifies the `Authorization: Bearer <token>` header, reloads the
/// referenced user, and produces an [`AuthContext`] describing the caller.
/// The context is inserted into request extensions by the API's auth layer
/// and then passed explicitly into every protected operation.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use cluster_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}", auth.first_name)
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::{User, UserRole};

/// Message returned for every rejected credential
pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Identity of the authenticated caller
///
/// Built from the stored user record, not from token claims, so role
/// changes and deactivation take effect on the next request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email at request time
    pub email: String,

    /// First name, used in notifications
    pub first_name: String,

    /// Current role
    pub role: UserRole,
}

impl AuthContext {
    /// Creates a context from a loaded user
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            role: user.role,
        }
    }

    /// Whether the caller is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the caller owns a resource
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}

/// Error type for authentication
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Token validation failed
    InvalidToken(String),

    /// Token is valid but the user no longer exists or is disabled
    UnknownUser,

    /// Database error
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials | AuthError::UnknownUser => {
                (StatusCode::UNAUTHORIZED, NOT_AUTHORIZED.to_string())
            }
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            ),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Extracts the bearer token from request headers
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use cluster_shared::auth::middleware::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
/// assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingCredentials)
}

/// Verifies a token and resolves the caller
///
/// Fails with `InvalidToken` for a bad signature, issuer or expiry, and
/// with `UnknownUser` when the subject is gone or deactivated.
pub async fn verify_token(
    pool: &PgPool,
    token: &str,
    secret: &str,
) -> Result<AuthContext, AuthError> {
    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid token".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Database error: {}", e)))?
        .ok_or(AuthError::UnknownUser)?;

    if !user.is_active {
        tracing::debug!(user_id = %user.id, "Rejected token for inactive user");
        return Err(AuthError::UnknownUser);
    }

    Ok(AuthContext::from_user(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn context(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: "juan.perez@empresa1.com".to_string(),
            first_name: "Juan".to_string(),
            role,
        }
    }

    #[test]
    fn test_auth_context_roles() {
        assert!(context(UserRole::Admin).is_admin());
        assert!(!context(UserRole::Member).is_admin());
    }

    #[test]
    fn test_auth_context_owns() {
        let ctx = context(UserRole::Member);
        assert!(ctx.owns(ctx.user_id));
        assert!(!ctx.owns(Uuid::new_v4()));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingCredentials)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingCredentials)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingCredentials)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(bearer_token(&headers).unwrap(), "tok");
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken("Token expired".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::DatabaseError("down".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
