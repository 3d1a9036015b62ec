//! ProductMapping entity model
//!
//! Maps a catalog product id to its brand and format metadata. Normalization
//! enriches incoming reviews with these fields when a mapping exists.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product_mappings")]
pub struct Model {
    /// Catalog product identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: String,

    pub brand: String,

    pub format: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
