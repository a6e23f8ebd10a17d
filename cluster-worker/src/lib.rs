//! # Cluster Membership Worker Library
//!
//! Background jobs that run outside the request path.
//!
//! ## Modules
//!
//! - `config`: Environment configuration
//! - `scheduler`: Periodic renewal-reminder sweep
//! - `seed`: Development data loader behind the `cluster-seed` binary

pub mod config;
pub mod scheduler;
pub mod seed;
