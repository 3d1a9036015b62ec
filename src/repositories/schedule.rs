//! # Schedule Repository
//!
//! Repository operations for the schedules table. Schedules are registered
//! when a scrape schedule is created with the provider and disabled when the
//! provider reports their URL as invalid.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::error::RelayError;
use crate::models::schedule::{ActiveModel, Column, Entity, Model};

pub struct ScheduleRepository {
    db: DatabaseConnection,
}

impl ScheduleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a schedule locally under the provider-assigned id.
    pub async fn insert(&self, schedule_id: i64, url: &str) -> Result<Model, RelayError> {
        let schedule = ActiveModel {
            schedule_id: Set(schedule_id),
            url: Set(url.to_string()),
            disabled: Set(false),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = schedule.insert(&self.db).await?;

        tracing::info!(
            schedule_id = result.schedule_id,
            url = %result.url,
            "Schedule registered"
        );

        Ok(result)
    }

    pub async fn find_by_id(&self, schedule_id: i64) -> Result<Option<Model>, RelayError> {
        Ok(Entity::find_by_id(schedule_id).one(&self.db).await?)
    }

    /// Finds every schedule tracking the given URL, disabled ones included.
    pub async fn find_by_url(&self, url: &str) -> Result<Vec<Model>, RelayError> {
        Ok(Entity::find()
            .filter(Column::Url.eq(url))
            .all(&self.db)
            .await?)
    }

    pub async fn exists_by_url(&self, url: &str) -> Result<bool, RelayError> {
        let found = Entity::find()
            .filter(Column::Url.eq(url))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    /// Marks a schedule disabled after the provider flagged its URL invalid.
    pub async fn mark_disabled(&self, schedule_id: i64) -> Result<(), RelayError> {
        let Some(schedule) = Entity::find_by_id(schedule_id).one(&self.db).await? else {
            return Err(RelayError::NotFound(format!(
                "schedule {} not found",
                schedule_id
            )));
        };

        let mut active: ActiveModel = schedule.into();
        active.disabled = Set(true);
        active.update(&self.db).await?;

        tracing::info!(schedule_id, "Schedule disabled");

        Ok(())
    }

    pub async fn delete_by_id(&self, schedule_id: i64) -> Result<(), RelayError> {
        let result = Entity::delete_by_id(schedule_id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(RelayError::NotFound(format!(
                "schedule {} not found",
                schedule_id
            )));
        }
        Ok(())
    }
}
