/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`; the error side renders as either
/// `{"message": "..."}` or, for validation failures,
/// `{"errors": [{"field": "...", "message": "..."}]}`.
///
/// Conflicts (duplicate email, second company, second live membership)
/// answer 400 like other client errors.
///
/// # Example
///
/// ```
/// use cluster_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Company not found".into()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cluster_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError},
    lifecycle::LifecycleError,
    models::{company::{MEMBERSHIP_COMPANY_CONSTRAINT, OWNER_UNIQUE_CONSTRAINT}, membership::{MembershipError, LIVE_MEMBERSHIP_CONSTRAINT}},
    notify::MailError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{ValidationErrors, ValidationErrorsKind};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message sent for every 500
pub const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Sent when deleting a company that memberships still reference
pub const COMPANY_IN_USE_MESSAGE: &str = "Cannot delete a company with membership records";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Uniqueness conflict, reported as 400
    Conflict(String),

    /// Field-level validation failures (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); the detail is logged, never sent
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorsBody {
    pub errors: Vec<ValidationErrorDetail>,
}

impl ApiError {
    /// A single-field validation failure
    pub fn invalid_field(field: &str, message: &str) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Conflict(_) | ApiError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            ApiError::ValidationError(errors) => {
                return (status, Json(ErrorsBody { errors })).into_response();
            }
            ApiError::InternalError(detail) => {
                tracing::error!(error = %detail, "Internal error");
                INTERNAL_MESSAGE.to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg,
        };

        (status, Json(MessageBody { message })).into_response()
    }
}

/// Flattens validator output, nested structs as `parent.child`
///
/// Field names are reported as they appear on the wire (camelCase).
pub fn validation_details(errors: &ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details = Vec::new();
    collect_validation(errors, "", &mut details);
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

fn collect_validation(
    errors: &ValidationErrors,
    prefix: &str,
    out: &mut Vec<ValidationErrorDetail>,
) {
    for (field, kind) in errors.errors() {
        let field = camel_case(field);
        let path = if prefix.is_empty() {
            field
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", path));
                    out.push(ValidationErrorDetail::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_validation(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::ValidationError(validation_details(&errors))
    }
}

/// Malformed or mistyped JSON bodies, including unknown keys in patches
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Unique violations become conflicts, a missing row becomes 404 and a
/// company still referenced by memberships becomes 400
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.constraint() {
                Some(OWNER_UNIQUE_CONSTRAINT) => {
                    ApiError::Conflict("You already have a registered company".to_string())
                }
                Some(MEMBERSHIP_COMPANY_CONSTRAINT) => ApiError::BadRequest(
                    COMPANY_IN_USE_MESSAGE.to_string(),
                ),
                Some(LIVE_MEMBERSHIP_CONSTRAINT) => {
                    ApiError::Conflict(LifecycleError::LiveMembershipExists.to_string())
                }
                Some(constraint) if constraint.contains("email") => {
                    ApiError::Conflict("User already exists".to_string())
                }
                Some(constraint) if db_err.is_unique_violation() => {
                    ApiError::Conflict(format!("Duplicate value violates {}", constraint))
                }
                _ => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::UnknownUser => {
                ApiError::Unauthorized(cluster_shared::auth::middleware::NOT_AUTHORIZED.to_string())
            }
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::DatabaseError(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::InsufficientRole { actual } => ApiError::Forbidden(format!(
                "Role {} is not authorized to access this route",
                actual
            )),
            AuthzError::NotAuthorized => {
                ApiError::Forbidden("You do not have permission to access this resource".to_string())
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::CreateError(_) => ApiError::InternalError(err.to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::InternalError(format!("Email delivery failed: {}", err))
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::LiveMembershipExists => ApiError::Conflict(err.to_string()),
            LifecycleError::InvalidAmount => ApiError::invalid_field("amount", &err.to_string()),
            LifecycleError::DateOutOfRange => ApiError::invalid_field("startDate", &err.to_string()),
            LifecycleError::CompanyRequired
            | LifecycleError::AlreadyActive
            | LifecycleError::NotPending => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::NotFound => ApiError::NotFound("Membership not found".to_string()),
            MembershipError::Lifecycle(e) => e.into(),
            MembershipError::Database(e) => e.into(),
        }
    }
}
