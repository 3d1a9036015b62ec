//! ProductReview entity model
//!
//! Canonical normalized review records staged between callback ingestion and
//! the republication sweep. Rows are deleted after a successful push.

use chrono::NaiveDate;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A normalized review persisted by the callback pipeline.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product_reviews")]
pub struct Model {
    /// Local row identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Provider-side review UUID; primary dedup key when non-empty
    pub review_uuid: String,

    /// Provider-internal numeric review id
    pub scraper_review_id: Option<i64>,

    /// Review id at the original review source
    pub source_review_id: Option<String>,

    /// Catalog product the reviewed item maps to
    pub product_id: String,

    /// Brand from the product mapping, or the unmapped sentinel
    pub brand: String,

    /// Format from the product mapping, or the unmapped sentinel
    pub format: String,

    /// Provider job this review arrived in
    pub job_id: i64,

    pub source_name: String,

    pub source_url: String,

    pub author_name: String,

    /// Date the review was written at the source
    pub date: Option<NaiveDate>,

    pub rating_value: Option<f64>,

    pub review_text: String,

    pub review_url: String,

    pub location: Option<String>,

    pub review_title: String,

    pub verified_order: Option<bool>,

    pub reviewer_title: Option<String>,

    pub language_code: Option<String>,

    pub profile_picture: Option<String>,

    /// Unstructured extras passed through from the provider
    #[sea_orm(column_type = "JsonBinary")]
    pub meta_data: Option<JsonValue>,

    /// Site the review was scraped from (e.g. a retailer domain)
    pub review_source: String,

    /// Raw provider review payload, kept for replay and debugging
    #[sea_orm(column_type = "JsonBinary")]
    pub response: Option<JsonValue>,

    /// Timestamp when the row was staged locally
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
