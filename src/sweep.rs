//! Background sweep loops: periodic republication of staged reviews and the
//! maintenance-status check.
//!
//! The push cycle snapshots the staging table, deduplicates it, uploads the
//! result to the analytics sink, exports the same set as a spreadsheet, and
//! only then deletes the snapshotted rows. A failed cycle keeps the rows in
//! place, so delivery is at-least-once and the next cycle retries.

use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AnalyticsConfig;
use crate::dedupe::dedupe_reviews;
use crate::error::RelayError;
use crate::ingest::CallbackProcessor;
use crate::repositories::ProductReviewRepository;
use crate::resilience::RetryPolicy;
use crate::sinks::{AnalyticsUploader, Notifier, SheetExporter};

/// Counters for one push cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct PushSummary {
    pub snapshot: usize,
    pub deduped: usize,
    pub uploaded: usize,
    pub skipped: usize,
    pub deleted: u64,
}

#[derive(Clone)]
pub struct Sweeper {
    db: DatabaseConnection,
    http: reqwest::Client,
    analytics: AnalyticsConfig,
    sheet: SheetExporter,
    notifier: Notifier,
    processor: CallbackProcessor,
    policy: RetryPolicy,
    push_interval: Duration,
    maintenance_interval: Duration,
}

impl Sweeper {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: DatabaseConnection,
        http: reqwest::Client,
        analytics: AnalyticsConfig,
        sheet: SheetExporter,
        notifier: Notifier,
        processor: CallbackProcessor,
        policy: RetryPolicy,
        push_interval: Duration,
        maintenance_interval: Duration,
    ) -> Self {
        Self {
            db,
            http,
            analytics,
            sheet,
            notifier,
            processor,
            policy,
            push_interval,
            maintenance_interval,
        }
    }

    /// Runs push cycles until cancelled. The first cycle runs immediately to
    /// drain any backlog left over from a previous run.
    pub async fn run_push_loop(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.push_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Push loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.push_cycle().await {
                        Ok(summary) => {
                            tracing::info!(
                                snapshot = summary.snapshot,
                                deduped = summary.deduped,
                                uploaded = summary.uploaded,
                                skipped = summary.skipped,
                                deleted = summary.deleted,
                                "Push cycle finished"
                            );
                        }
                        Err(e) => {
                            metrics::counter!("push_cycle_failures_total").increment(1);
                            tracing::error!(error = %e, "Push cycle failed, staged reviews retained");
                            self.notifier
                                .send(&format!("Review push cycle failed.\nERROR: {}", e))
                                .await;
                        }
                    }
                }
            }
        }
    }

    /// Runs maintenance-status checks until cancelled.
    pub async fn run_maintenance_loop(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.maintenance_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Maintenance loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.processor.check_for_maintenance_jobs().await {
                        tracing::error!(error = %e, "Maintenance check failed");
                    }
                }
            }
        }
    }

    /// One republication cycle. Rows are deleted only after both sinks
    /// accepted the snapshot; on any failure the rows stay for the next run.
    pub async fn push_cycle(&self) -> Result<PushSummary, RelayError> {
        let repo = ProductReviewRepository::new(self.db.clone());

        let snapshot = repo.all().await?;
        if snapshot.is_empty() {
            tracing::debug!("Nothing staged, skipping push cycle");
            return Ok(PushSummary::default());
        }

        // Duplicates are deleted with the rest of the snapshot once the
        // deduplicated set is delivered.
        let snapshot_ids: Vec<Uuid> = snapshot.iter().map(|r| r.id).collect();
        let snapshot_len = snapshot.len();
        let deduped = dedupe_reviews(snapshot);

        let uploader =
            AnalyticsUploader::connect(self.http.clone(), &self.analytics, self.policy.clone())
                .await?;
        let stats = uploader.upload(&deduped).await?;

        let sheet_name = Utc::now().date_naive().to_string();
        self.sheet.export(&sheet_name, &deduped).await?;

        let deleted = repo.delete_by_ids(&snapshot_ids).await?;

        metrics::counter!("reviews_uploaded_total").increment(stats.uploaded as u64);

        Ok(PushSummary {
            snapshot: snapshot_len,
            deduped: deduped.len(),
            uploaded: stats.uploaded,
            skipped: stats.skipped,
            deleted,
        })
    }
}
