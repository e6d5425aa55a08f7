//! SmartConvert CRM backend library.
//!
//! Lead ingestion, querying and analytics for a sales-lead management
//! backend: CSV uploads scored by an external prediction service, a
//! filtered/sorted/paginated lead listing with accurate totals, dashboard
//! aggregations, and per-user sales profiles behind bearer-token auth.
//!
//! # Modules
//!
//! - `analytics`: dashboard aggregation and bucketing rules.
//! - `auth`: registration, login, session tokens, the `CurrentUser` extractor.
//! - `config`: environment configuration.
//! - `db`: connection pool and schema bootstrap.
//! - `errors`: error handling types.
//! - `handlers`: HTTP request handlers.
//! - `ingest`: CSV parsing and ingestion.
//! - `models`: core data models and API shapes.
//! - `profile`: profile and recent-activity summarization.
//! - `repository`: lead data access.
//! - `scoring`: prediction service client.

pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod profile;
pub mod repository;
pub mod scoring;
