/// Database models and their queries
///
/// # Models
///
/// - `user`: accounts, roles and password-reset state
/// - `company`: company profiles, one per user
/// - `membership`: the membership ledger and payment history
/// - `stats`: aggregate counts for the admin dashboard

pub mod company;
pub mod membership;
pub mod stats;
pub mod user;
