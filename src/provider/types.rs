//! Wire types for the external review-scraping provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Crawl status reported by the provider for a scrape job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Complete,
    Pending,
    InvalidUrl,
    Maintenance,
    Failed,
    /// Any status string this service does not recognize.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobStatus::Complete => "complete",
            JobStatus::Pending => "pending",
            JobStatus::InvalidUrl => "invalid_url",
            JobStatus::Maintenance => "maintenance",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Recurrence for a provider-side scrape schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for ScheduleFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ScheduleFrequency::Daily => "daily",
            ScheduleFrequency::Weekly => "weekly",
            ScheduleFrequency::Monthly => "monthly",
        };
        f.write_str(label)
    }
}

/// Job metadata returned by the provider's info endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JobInfo {
    pub job_id: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub crawl_status: Option<JobStatus>,
}

/// One entry of the provider's job listing.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSummary {
    pub job_id: i64,
    #[serde(default)]
    pub crawl_status: Option<JobStatus>,
}

/// First-page review payload for a completed job, with `reviews` holding the
/// concatenation of every page after pagination.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJobPayload {
    pub job_id: i64,
    /// Provider-side product identifier supplied when the scrape was set up.
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Raw review objects; kept as JSON so the original payload can be
    /// persisted alongside the normalized record.
    #[serde(default)]
    pub reviews: Vec<Value>,
}

/// One review as the provider sends it. Field names follow the provider's
/// wire format; serde renames map them onto the canonical vocabulary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub review_uuid: Option<String>,
    #[serde(rename = "id", default)]
    pub scraper_review_id: Option<i64>,
    #[serde(rename = "unique_id", default)]
    pub source_review_id: Option<String>,
    #[serde(rename = "name", default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rating_value: Option<f64>,
    #[serde(default)]
    pub review_text: Option<String>,
    #[serde(rename = "url", default)]
    pub review_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "title", default)]
    pub review_title: Option<String>,
    #[serde(default)]
    pub verified_order: Option<bool>,
    #[serde(default)]
    pub reviewer_title: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub meta_data: Option<Value>,
    /// Per-review source overrides; fall back to the job-level values.
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Per-review catalog overrides; win over the job-level product id and
    /// the mapping's brand/format.
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}
