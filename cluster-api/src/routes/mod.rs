/// API route handlers, one module per resource
///
/// - `health`: liveness probe
/// - `auth`: registration, login, password reset and profile
/// - `companies`: company directory
/// - `memberships`: membership ledger and renewal reminders
/// - `admin`: dashboard stats and account management

pub mod admin;
pub mod auth;
pub mod companies;
pub mod health;
pub mod memberships;
