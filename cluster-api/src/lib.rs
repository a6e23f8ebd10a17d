//! # Cluster Membership API Server Library
//!
//! HTTP surface for the membership backend: accounts, company profiles,
//! the membership ledger and the admin dashboard.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Environment configuration
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: JSON extractor with API-shaped rejections
//! - `middleware`: Security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
