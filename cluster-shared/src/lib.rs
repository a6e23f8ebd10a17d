//! # Cluster Shared Library
//!
//! Types, persistence and business rules used by both the Cluster API server
//! and the reminder worker.
//!
//! ## Module Organization
//!
//! - `auth`: passwords, JWTs, reset tokens and request authorization
//! - `db`: connection pool and embedded migrations
//! - `lifecycle`: membership state rules and renewal date math
//! - `models`: users, companies, memberships and admin stats
//! - `notify`: email transports and templates
//! - `reminders`: the renewal reminder sweep

pub mod auth;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod reminders;

/// Current version of the Cluster shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
