//! Database migrations for the Review Relay service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_07_01_000001_create_schedules;
mod m2025_07_01_000002_create_product_mappings;
mod m2025_07_01_000003_create_product_reviews;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_07_01_000001_create_schedules::Migration),
            Box::new(m2025_07_01_000002_create_product_mappings::Migration),
            Box::new(m2025_07_01_000003_create_product_reviews::Migration),
        ]
    }
}
