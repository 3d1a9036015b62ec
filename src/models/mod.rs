//! SeaORM entity models for the Review Relay service.

pub mod product_mapping;
pub mod product_review;
pub mod schedule;
