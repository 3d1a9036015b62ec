//! Shared helpers for integration tests.

#![allow(dead_code)]

use chrono::Utc;
use review_relay::config::{AnalyticsConfig, AppConfig, ProviderConfig, RetryConfig};
use review_relay::migration::{Migrator, MigratorTrait};
use review_relay::models::{product_mapping, product_review, schedule};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

/// In-memory SQLite database with the full schema applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

/// Test configuration pointing every collaborator at `base_url`, with
/// zero backoff so retries do not slow the tests down.
pub fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        provider: ProviderConfig {
            schedules_endpoint: format!("{base_url}/schedules"),
            profiles_endpoint: format!("{base_url}/profiles"),
            access_token: "test-token".to_string(),
        },
        analytics: AnalyticsConfig {
            base_url: base_url.to_string(),
            username: "uploader".to_string(),
            password: "secret".to_string(),
            source_name: "Review Relay".to_string(),
        },
        sheet_exporter_url: format!("{base_url}/sheets"),
        notify_webhook_url: format!("{base_url}/notify"),
        retry: RetryConfig {
            max_retries: 1,
            max_backoff_seconds: 0,
            timeout_seconds: 5,
        },
        ..AppConfig::default()
    }
}

pub async fn insert_product_mapping(
    db: &DatabaseConnection,
    product_id: &str,
    brand: &str,
    format: &str,
) -> product_mapping::Model {
    product_mapping::ActiveModel {
        product_id: Set(product_id.to_string()),
        brand: Set(brand.to_string()),
        format: Set(format.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .expect("insert product mapping")
}

pub async fn insert_schedule(
    db: &DatabaseConnection,
    schedule_id: i64,
    url: &str,
) -> schedule::Model {
    schedule::ActiveModel {
        schedule_id: Set(schedule_id),
        url: Set(url.to_string()),
        disabled: Set(false),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .expect("insert schedule")
}

/// Stages a minimal review row directly, bypassing normalization.
pub async fn insert_review(
    db: &DatabaseConnection,
    review_uuid: &str,
    text: &str,
    author: &str,
) -> product_review::Model {
    product_review::ActiveModel {
        id: Set(Uuid::new_v4()),
        review_uuid: Set(review_uuid.to_string()),
        scraper_review_id: Set(None),
        source_review_id: Set(None),
        product_id: Set("SKU-1".to_string()),
        brand: Set("Acme".to_string()),
        format: Set("500ml".to_string()),
        job_id: Set(42),
        source_name: Set("shop".to_string()),
        source_url: Set("https://shop.example.com/p/1".to_string()),
        author_name: Set(author.to_string()),
        date: Set(chrono::NaiveDate::from_ymd_opt(2024, 5, 1)),
        rating_value: Set(Some(4.0)),
        review_text: Set(text.to_string()),
        review_url: Set(String::new()),
        location: Set(None),
        review_title: Set(String::new()),
        verified_order: Set(None),
        reviewer_title: Set(None),
        language_code: Set(None),
        profile_picture: Set(None),
        meta_data: Set(None),
        review_source: Set("shop".to_string()),
        response: Set(None),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .expect("insert review")
}
