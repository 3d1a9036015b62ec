//! # Review Relay Library
//!
//! Ingestion and republication pipeline for third-party review-scraping
//! data: callback-driven ingestion, normalization and deduplication, and
//! batched republication to the analytics sink and spreadsheet exporter.

pub mod auth;
pub mod config;
pub mod db;
pub mod dedupe;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod provider;
pub mod repositories;
pub mod resilience;
pub mod server;
pub mod sinks;
pub mod sweep;
pub mod telemetry;
pub use migration;
