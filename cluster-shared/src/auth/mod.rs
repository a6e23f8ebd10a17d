/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: JWT token generation and validation
/// - [`reset_token`]: Password-reset token generation and hashing
/// - [`middleware`]: Bearer token verification and the caller context
/// - [`authorization`]: Role, ownership and visibility checks
///
/// # Example
///
/// ```no_run
/// use cluster_shared::auth::password::{hash_password, verify_password};
/// use cluster_shared::auth::jwt::{create_token, Claims};
/// use cluster_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), UserRole::Member);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset_token;
