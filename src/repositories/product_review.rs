//! # ProductReview Repository
//!
//! Repository operations for the product_reviews staging table. Reviews are
//! inserted by the callback pipeline, snapshotted by the sweep, and deleted
//! once they have been republished.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::error::RelayError;
use crate::models::product_review::{ActiveModel, Column, Entity, Model};

/// Batch size for multi-row inserts, kept well under backend placeholder limits.
const INSERT_CHUNK_SIZE: usize = 200;

pub struct ProductReviewRepository {
    db: DatabaseConnection,
}

impl ProductReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stages a batch of normalized reviews. Returns the number inserted.
    pub async fn insert_many(&self, reviews: Vec<Model>) -> Result<usize, RelayError> {
        if reviews.is_empty() {
            return Ok(0);
        }

        let total = reviews.len();

        for chunk in reviews.chunks(INSERT_CHUNK_SIZE) {
            let active: Vec<ActiveModel> =
                chunk.iter().cloned().map(ActiveModel::from).collect();
            Entity::insert_many(active).exec(&self.db).await?;
        }

        tracing::info!(count = total, "Staged product reviews");

        Ok(total)
    }

    /// Snapshot of every staged review, in insertion order.
    pub async fn all(&self) -> Result<Vec<Model>, RelayError> {
        Ok(Entity::find().all(&self.db).await?)
    }

    pub async fn count(&self) -> Result<u64, RelayError> {
        use sea_orm::PaginatorTrait;
        Ok(Entity::find().count(&self.db).await?)
    }

    /// Removes rows that have been republished. Returns the number deleted.
    pub async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64, RelayError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0;
        for chunk in ids.chunks(INSERT_CHUNK_SIZE) {
            let result = Entity::delete_many()
                .filter(Column::Id.is_in(chunk.iter().copied()))
                .exec(&self.db)
                .await?;
            deleted += result.rows_affected;
        }

        tracing::info!(count = deleted, "Deleted republished reviews");

        Ok(deleted)
    }
}
