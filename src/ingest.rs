//! Callback-driven ingestion of completed scrape jobs.
//!
//! The provider announces job completion through a callback. The processor
//! pulls the job's reviews, normalizes them against the product mapping, and
//! stages them for the republication sweep. Non-complete statuses produce an
//! operator notification; an invalid URL additionally disables the schedules
//! that track it. Callbacks are acknowledged regardless: any failure here is
//! reported through the notifier, never back to the provider.

use sea_orm::DatabaseConnection;

use crate::error::RelayError;
use crate::normalize::normalize_job_reviews;
use crate::provider::types::JobStatus;
use crate::provider::ProviderClient;
use crate::repositories::{ProductMappingRepository, ProductReviewRepository, ScheduleRepository};
use crate::sinks::Notifier;

#[derive(Clone)]
pub struct CallbackProcessor {
    provider: ProviderClient,
    notifier: Notifier,
    db: DatabaseConnection,
}

impl CallbackProcessor {
    pub fn new(provider: ProviderClient, notifier: Notifier, db: DatabaseConnection) -> Self {
        Self {
            provider,
            notifier,
            db,
        }
    }

    /// Handles one job callback. Errors are reported to the notifier and
    /// swallowed so the provider always receives an acknowledgement.
    pub async fn process(&self, job_id: i64, status: JobStatus) {
        metrics::counter!("job_callbacks_total", "status" => status.to_string()).increment(1);

        if let Err(e) = self.process_inner(job_id, status).await {
            tracing::error!(job_id, %status, error = %e, "Callback processing failed");
            self.notifier
                .send(&format!(
                    "Unable to retrieve reviews from job {}.\nERROR: {}",
                    job_id, e
                ))
                .await;
        }
    }

    async fn process_inner(&self, job_id: i64, status: JobStatus) -> Result<(), RelayError> {
        match status {
            JobStatus::Complete => self.ingest_completed_job(job_id).await,
            JobStatus::InvalidUrl => self.handle_invalid_url(job_id).await,
            other => self.notify_job_status(job_id, other).await,
        }
    }

    /// Pulls, normalizes and stages the reviews of a completed job.
    async fn ingest_completed_job(&self, job_id: i64) -> Result<(), RelayError> {
        let payload = self.provider.fetch_job_reviews(job_id).await?;

        let mapping = match payload.unique_id.as_deref() {
            Some(product_id) => {
                ProductMappingRepository::new(self.db.clone())
                    .find_by_product_id(product_id)
                    .await?
            }
            None => None,
        };

        if mapping.is_none() {
            tracing::warn!(
                job_id,
                product_id = payload.unique_id.as_deref().unwrap_or(""),
                "No product mapping, staging reviews with sentinel brand/format"
            );
        }

        let normalized = normalize_job_reviews(&payload, mapping.as_ref());
        let staged = ProductReviewRepository::new(self.db.clone())
            .insert_many(normalized)
            .await?;

        metrics::counter!("reviews_staged_total").increment(staged as u64);
        tracing::info!(job_id, staged, "Completed job ingested");

        Ok(())
    }

    /// Disables every schedule tracking a URL the provider reported invalid.
    /// Each schedule is handled in isolation so one failure does not leave
    /// the others active.
    async fn handle_invalid_url(&self, job_id: i64) -> Result<(), RelayError> {
        let info = self.provider.job_info(job_id).await?;

        self.notifier
            .send(&format!(
                "Job ID: {}\nStatus: {}\nURL: {}",
                job_id,
                JobStatus::InvalidUrl,
                info.url
            ))
            .await;

        let schedules = ScheduleRepository::new(self.db.clone())
            .find_by_url(&info.url)
            .await?;

        for schedule in schedules.into_iter().filter(|s| !s.disabled) {
            if let Err(e) = self.disable_schedule(schedule.schedule_id).await {
                tracing::error!(
                    schedule_id = schedule.schedule_id,
                    url = %info.url,
                    error = %e,
                    "Failed to disable schedule"
                );
                self.notifier
                    .send(&format!(
                        "Unable to disable schedule {} for URL {}.\nERROR: {}",
                        schedule.schedule_id, info.url, e
                    ))
                    .await;
            }
        }

        Ok(())
    }

    async fn disable_schedule(&self, schedule_id: i64) -> Result<(), RelayError> {
        self.provider.disable_schedule(schedule_id).await?;
        ScheduleRepository::new(self.db.clone())
            .mark_disabled(schedule_id)
            .await?;
        tracing::info!(schedule_id, "Schedule disabled after invalid URL report");
        Ok(())
    }

    /// Notifies the operator about a job that ended in a non-complete status.
    async fn notify_job_status(&self, job_id: i64, status: JobStatus) -> Result<(), RelayError> {
        let info = self.provider.job_info(job_id).await?;

        self.notifier
            .send(&format!(
                "Job ID: {}\nStatus: {}\nURL: {}",
                job_id, status, info.url
            ))
            .await;

        Ok(())
    }

    /// Reports jobs stuck in maintenance, if any. Run periodically by the
    /// sweep's maintenance loop.
    pub async fn check_for_maintenance_jobs(&self) -> Result<usize, RelayError> {
        let jobs = self.provider.list_jobs(JobStatus::Maintenance).await?;

        if jobs.is_empty() {
            tracing::debug!("No jobs in maintenance status");
            return Ok(0);
        }

        let ids: Vec<String> = jobs.iter().map(|j| j.job_id.to_string()).collect();
        self.notifier
            .send(&format!(
                "{} jobs in maintenance status:\n{}",
                jobs.len(),
                ids.join("\n")
            ))
            .await;

        Ok(jobs.len())
    }
}
