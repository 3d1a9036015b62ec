//! HTTP client for the external review-scraping provider.
//!
//! Every call goes through the shared [`RetryPolicy`], so transient transport
//! failures and non-2xx responses are retried with backoff while a stuck
//! attempt is cut off by the per-attempt timeout.

use reqwest::Method;
use serde_json::{Value, json};

use crate::config::ProviderConfig;
use crate::error::RelayError;
use crate::provider::paginator::{PagedEndpoint, Paginator};
use crate::provider::types::{JobInfo, JobStatus, JobSummary, RawJobPayload, ScheduleFrequency};
use crate::resilience::RetryPolicy;

/// Header carrying the provider access token.
const ACCESS_TOKEN_HEADER: &str = "x-access-token";

#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
    policy: RetryPolicy,
}

impl ProviderClient {
    pub fn new(http: reqwest::Client, config: ProviderConfig, policy: RetryPolicy) -> Self {
        Self {
            http,
            config,
            policy,
        }
    }

    /// Fetches job metadata, primarily to recover the scraped URL for
    /// notifications and schedule lookups.
    pub async fn job_info(&self, job_id: i64) -> Result<JobInfo, RelayError> {
        let op = "provider.job_info";
        let url = self.config.info_endpoint();
        let query = [("job_id", job_id.to_string())];

        let payload = self.request_json(op, Method::GET, &url, &query, None).await?;

        serde_json::from_value(payload)
            .map_err(|e| RelayError::MalformedPayload(format!("job info: {e}")))
    }

    /// Fetches every review of a completed job, following pagination, and
    /// returns the first page's job metadata with the full review list.
    pub async fn fetch_job_reviews(&self, job_id: i64) -> Result<RawJobPayload, RelayError> {
        let op = "provider.reviews";
        let url = self.config.reviews_endpoint();

        let merged = Paginator::new(PagedEndpoint::Reviews)
            .fetch_all(|page, per_page| {
                let query = [
                    ("job_id", job_id.to_string()),
                    ("page", page.to_string()),
                    ("per_page", per_page.to_string()),
                ];
                let url = url.clone();
                async move {
                    self.request_json(op, Method::GET, &url, &query, None).await
                }
            })
            .await?;

        serde_json::from_value(merged)
            .map_err(|e| RelayError::MalformedPayload(format!("job reviews: {e}")))
    }

    /// Lists jobs currently in the given crawl status, following pagination.
    pub async fn list_jobs(&self, status: JobStatus) -> Result<Vec<JobSummary>, RelayError> {
        let op = "provider.jobs";
        let url = self.config.jobs_endpoint();

        let merged = Paginator::new(PagedEndpoint::Jobs)
            .fetch_all(|page, per_page| {
                let query = [
                    ("crawl_status", status.to_string()),
                    ("page", page.to_string()),
                    ("per_page", per_page.to_string()),
                ];
                let url = url.clone();
                async move {
                    self.request_json(op, Method::GET, &url, &query, None).await
                }
            })
            .await?;

        let jobs = merged
            .get("jobs")
            .cloned()
            .unwrap_or(Value::Array(vec![]));

        serde_json::from_value(jobs)
            .map_err(|e| RelayError::MalformedPayload(format!("job listing: {e}")))
    }

    /// Registers a recurring scrape with the provider and returns the
    /// provider-assigned schedule id.
    pub async fn create_schedule(
        &self,
        url: &str,
        frequency: ScheduleFrequency,
    ) -> Result<i64, RelayError> {
        let op = "provider.create_schedule";
        let endpoint = self.config.schedules_endpoint.clone();
        let body = json!({
            "url": url,
            "frequency": frequency,
        });

        let payload = self
            .request_json(op, Method::POST, &endpoint, &[], Some(&body))
            .await?;

        payload
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                RelayError::MalformedPayload("schedule creation response is missing `id`".into())
            })
    }

    /// Flags a schedule as disabled at the provider without deleting it, so
    /// the crawl history stays available.
    pub async fn disable_schedule(&self, schedule_id: i64) -> Result<(), RelayError> {
        let op = "provider.disable_schedule";
        let endpoint = format!("{}/{schedule_id}", self.config.schedules_endpoint);
        let query = [("disabled", "true".to_string())];

        self.request_json(op, Method::PATCH, &endpoint, &query, None)
            .await?;

        Ok(())
    }

    /// Removes a schedule at the provider.
    pub async fn delete_schedule(&self, schedule_id: i64) -> Result<(), RelayError> {
        let op = "provider.delete_schedule";
        let endpoint = format!("{}/{schedule_id}", self.config.schedules_endpoint);

        self.request_json(op, Method::DELETE, &endpoint, &[], None)
            .await?;

        Ok(())
    }

    /// One retried JSON request against the provider.
    async fn request_json(
        &self,
        op: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, RelayError> {
        self.policy
            .call(op, || self.request_json_once(op, method.clone(), url, query, body))
            .await
            .map_err(RelayError::from)
    }

    async fn request_json_once(
        &self,
        op: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, RelayError> {
        let mut request = self
            .http
            .request(method, url)
            .header(ACCESS_TOKEN_HEADER, &self.config.access_token)
            .query(query);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| RelayError::Transport {
            op: op.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamStatus {
                op: op.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|source| RelayError::Transport {
            op: op.to_string(),
            source,
        })
    }
}
