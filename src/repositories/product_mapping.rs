//! # ProductMapping Repository
//!
//! Repository operations for the product_mappings table.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::error::RelayError;
use crate::models::product_mapping::{ActiveModel, Entity, Model};

pub struct ProductMappingRepository {
    db: DatabaseConnection,
}

impl ProductMappingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn insert(
        &self,
        product_id: &str,
        brand: &str,
        format: &str,
    ) -> Result<Model, RelayError> {
        let mapping = ActiveModel {
            product_id: Set(product_id.to_string()),
            brand: Set(brand.to_string()),
            format: Set(format.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = mapping.insert(&self.db).await?;

        tracing::info!(product_id = %result.product_id, "Product mapping created");

        Ok(result)
    }

    pub async fn find_by_product_id(&self, product_id: &str) -> Result<Option<Model>, RelayError> {
        Ok(Entity::find_by_id(product_id).one(&self.db).await?)
    }

    pub async fn exists(&self, product_id: &str) -> Result<bool, RelayError> {
        Ok(self.find_by_product_id(product_id).await?.is_some())
    }
}
