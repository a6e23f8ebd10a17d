/// Authorization helpers and permission checks
///
/// # Permission Model
///
/// 1. **Role gate**: admin-only operations call [`authorize`] with the
///    allowed roles.
/// 2. **Ownership**: company mutations are allowed for the owner or an
///    admin ([`require_owner_or_admin`]).
/// 3. **Visibility**: unpublished companies are readable only by their
///    owner or an admin ([`can_view_company`]).
///
/// # Example
///
/// ```
/// use cluster_shared::auth::authorization::authorize;
/// use cluster_shared::auth::middleware::AuthContext;
/// use cluster_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let admin = AuthContext {
///     user_id: Uuid::new_v4(),
///     email: "admin@example.com".into(),
///     first_name: "Admin".into(),
///     role: UserRole::Admin,
/// };
/// assert!(authorize(&admin, &[UserRole::Admin]).is_ok());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::company::Company;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller's role is not in the allowed set
    #[error("Insufficient permissions: role {actual} is not allowed")]
    InsufficientRole { actual: UserRole },

    /// Caller neither owns the resource nor is an admin
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Requires the caller's role to be one of `allowed`
pub fn authorize(auth: &AuthContext, allowed: &[UserRole]) -> Result<(), AuthzError> {
    if !allowed.contains(&auth.role) {
        tracing::debug!(user_id = %auth.user_id, role = %auth.role, "Role not allowed");
        return Err(AuthzError::InsufficientRole { actual: auth.role });
    }

    Ok(())
}

/// Requires the caller to be an admin
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    authorize(auth, &[UserRole::Admin])
}

/// Requires the caller to own the resource or be an admin
pub fn require_owner_or_admin(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.is_admin() || auth.owns(owner_id) {
        return Ok(());
    }

    Err(AuthzError::NotAuthorized)
}

/// Whether the caller may read a company profile
pub fn can_view_company(auth: &AuthContext, company: &Company) -> bool {
    company.is_published || auth.is_admin() || auth.owns(company.owner_id)
}
