//! Schedule entity model
//!
//! Mirrors a recurring scrape schedule registered with the external provider.
//! The primary key is the provider-assigned schedule id.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// A provider-side scrape schedule tracked locally for URL lookups.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    /// Provider-assigned schedule identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub schedule_id: i64,

    /// Target URL the provider scrapes on this schedule
    pub url: String,

    /// Set when the provider reports the URL as invalid
    pub disabled: bool,

    /// Timestamp when the schedule was registered locally
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
