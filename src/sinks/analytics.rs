//! Batched upload of deduplicated reviews to the analytics sink.
//!
//! The uploader logs in with password credentials, resolves the configured
//! content source to its id, shapes each review into an upload item, and
//! pushes items in fixed-size batches. A failed batch aborts the push so the
//! sweep keeps the staged rows for the next cycle.

use serde_json::{Value, json};

use crate::config::AnalyticsConfig;
use crate::error::RelayError;
use crate::models::product_review::Model;
use crate::resilience::RetryPolicy;

/// Items per upload request.
pub const UPLOAD_BATCH_SIZE: usize = 1000;

/// Long-text limit: contents at or above this are cut down.
const MAX_CONTENT_CHARS: usize = 16000;
const TRUNCATED_CONTENT_CHARS: usize = 15990;

/// Short-text limit for titles and author names.
const MAX_SHORT_CHARS: usize = 199;
const TRUNCATED_SHORT_CHARS: usize = 190;

/// Custom (non-primary) fields carried on every upload item, as pairs of
/// upload key and canonical field. Empty values are left out of the item.
pub const CUSTOM_FIELD_MAP: &[(&str, &str)] = &[
    ("brand", "brand"),
    ("uuid", "review_uuid"),
    ("format", "format"),
    ("product_id", "product_id"),
    ("rating", "rating_value"),
    ("domain", "review_source"),
    ("review_id", "source_review_id"),
];

/// Counters for one push.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadStats {
    pub uploaded: usize,
    /// Reviews dropped because no usable content could be derived.
    pub skipped: usize,
}

pub struct AnalyticsUploader {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    source_id: i64,
    policy: RetryPolicy,
}

impl AnalyticsUploader {
    /// Logs in and resolves the configured content source, returning an
    /// uploader bound to that source.
    pub async fn connect(
        http: reqwest::Client,
        config: &AnalyticsConfig,
        policy: RetryPolicy,
    ) -> Result<Self, RelayError> {
        let access_token = login(&http, config, &policy).await?;
        let source_id = resolve_source(&http, config, &policy, &access_token).await?;

        tracing::info!(source = %config.source_name, source_id, "Analytics sink connected");

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            access_token,
            source_id,
            policy,
        })
    }

    /// Pushes the snapshot in batches. Fails fast on the first batch error,
    /// leaving the remainder unsent.
    pub async fn upload(&self, reviews: &[Model]) -> Result<UploadStats, RelayError> {
        let mut stats = UploadStats::default();
        let items: Vec<Value> = reviews
            .iter()
            .filter_map(|review| {
                let item = upload_item(review);
                if item.is_none() {
                    stats.skipped += 1;
                }
                item
            })
            .collect();

        for batch in items.chunks(UPLOAD_BATCH_SIZE) {
            self.push_batch(batch).await?;
            stats.uploaded += batch.len();
            tracing::info!(
                batch = batch.len(),
                uploaded = stats.uploaded,
                "Uploaded analytics batch"
            );
        }

        Ok(stats)
    }

    async fn push_batch(&self, batch: &[Value]) -> Result<(), RelayError> {
        let op = "analytics.push_batch";
        let url = format!("{}/content/upload", self.base_url);
        let body = json!({
            "contentSource": self.source_id,
            "items": batch,
        });
        let url = &url;
        let body = &body;

        self.policy
            .call(op, || async move {
                let response = self
                    .http
                    .post(url)
                    .bearer_auth(&self.access_token)
                    .json(body)
                    .send()
                    .await
                    .map_err(|source| RelayError::Transport {
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

                Ok(())
            })
            .await
            .map_err(RelayError::from)
    }
}

async fn login(
    http: &reqwest::Client,
    config: &AnalyticsConfig,
    policy: &RetryPolicy,
) -> Result<String, RelayError> {
    let op = "analytics.login";
    let url = format!("{}/oauth/token", config.base_url);
    let url = &url;

    let payload = policy
        .call(op, || async move {
            let response = http
                .post(url)
                .form(&[
                    ("username", config.username.as_str()),
                    ("password", config.password.as_str()),
                    ("grant_type", "api-password"),
                ])
                .send()
                .await
                .map_err(|source| RelayError::Transport {
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

            response
                .json::<Value>()
                .await
                .map_err(|source| RelayError::Transport {
                    op: op.to_string(),
                    source,
                })
        })
        .await
        .map_err(RelayError::from)?;

    payload
        .get("access_token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            RelayError::MalformedPayload("login response is missing `access_token`".into())
        })
}

async fn resolve_source(
    http: &reqwest::Client,
    config: &AnalyticsConfig,
    policy: &RetryPolicy,
    access_token: &str,
) -> Result<i64, RelayError> {
    let op = "analytics.list_sources";
    let url = format!("{}/content/sources/list", config.base_url);
    let url = &url;

    let payload = policy
        .call(op, || async move {
            let response = http
                .get(url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|source| RelayError::Transport {
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

            response
                .json::<Value>()
                .await
                .map_err(|source| RelayError::Transport {
                    op: op.to_string(),
                    source,
                })
        })
        .await
        .map_err(RelayError::from)?;

    let sources = payload
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RelayError::MalformedPayload("source listing is missing `results`".into())
        })?;

    sources
        .iter()
        .find(|source| source.get("name").and_then(Value::as_str) == Some(&config.source_name))
        .and_then(|source| source.get("id").and_then(Value::as_i64))
        .ok_or_else(|| {
            RelayError::NotFound(format!(
                "content source `{}` not found at analytics sink",
                config.source_name
            ))
        })
}

/// Shapes one review into an upload item, or `None` when no usable content
/// can be derived.
pub fn upload_item(review: &Model) -> Option<Value> {
    let contents = derive_contents(review)?;

    let date = review
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| review.created_at.date_naive().to_string());

    let url = if !review.review_url.is_empty() {
        review.review_url.clone()
    } else {
        review.source_url.clone()
    };

    let mut custom = serde_json::Map::new();
    for (upload_key, field) in CUSTOM_FIELD_MAP {
        if let Some(value) = custom_field_value(review, field) {
            custom.insert((*upload_key).to_string(), value);
        }
    }

    let mut item = json!({
        "date": date,
        "contents": truncate_chars(&contents, MAX_CONTENT_CHARS, TRUNCATED_CONTENT_CHARS),
        "author": review.author_name.clone(),
        "title": truncate_chars(&review.review_title, MAX_SHORT_CHARS, TRUNCATED_SHORT_CHARS),
        "url": url,
    });

    if !review.review_uuid.is_empty() {
        item["guid"] = Value::String(review.review_uuid.clone());
    }
    if let Some(code) = review.language_code.as_deref().filter(|c| !c.is_empty()) {
        item["language"] = Value::String(code.to_string());
    }
    if !custom.is_empty() {
        item["custom"] = Value::Object(custom);
    }

    Some(item)
}

/// Content fallback chain: review text, then title, then the rating rendered
/// as text. Whitespace-only text counts as absent. A review with none of
/// those cannot be uploaded.
fn derive_contents(review: &Model) -> Option<String> {
    let text = review.review_text.trim();
    if !text.is_empty() {
        return Some(text.to_string());
    }
    let title = review.review_title.trim();
    if !title.is_empty() {
        return Some(title.to_string());
    }
    review.rating_value.map(|rating| rating.to_string())
}

fn custom_field_value(review: &Model, field: &str) -> Option<Value> {
    let text = match field {
        "brand" => Some(review.brand.clone()),
        "review_uuid" => Some(review.review_uuid.clone()),
        "format" => Some(review.format.clone()),
        "product_id" => Some(review.product_id.clone()),
        "rating_value" => review.rating_value.map(|r| r.to_string()),
        "review_source" => Some(review.review_source.clone()),
        "source_review_id" => review.source_review_id.clone(),
        _ => None,
    };

    text.filter(|t| !t.is_empty()).map(Value::String)
}

/// Cuts `value` to `keep` characters when it reaches `limit` characters.
/// Operates on characters, never splitting a code point.
fn truncate_chars(value: &str, limit: usize, keep: usize) -> String {
    if value.chars().count() >= limit {
        value.chars().take(keep).collect()
    } else {
        value.to_string()
    }
}
