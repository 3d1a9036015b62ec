//! Normalization of raw provider reviews into canonical records.
//!
//! Each review is reshaped onto the canonical vocabulary, enriched with
//! brand/format metadata when a product mapping exists, and stamped with the
//! unmapped sentinel when it does not. The original provider payload is kept
//! verbatim in the `response` column.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{product_mapping, product_review};
use crate::provider::types::{RawJobPayload, RawReview};

/// Sentinel brand/format for products without a catalog mapping.
pub const SKU_NOT_LISTED: &str = "SKU_NOT_LISTED";

/// Normalizes every review of a job payload. Reviews that do not deserialize
/// are logged and skipped rather than failing the batch.
pub fn normalize_job_reviews(
    payload: &RawJobPayload,
    mapping: Option<&product_mapping::Model>,
) -> Vec<product_review::Model> {
    let product_id = payload
        .unique_id
        .clone()
        .unwrap_or_else(|| SKU_NOT_LISTED.to_string());
    let (brand, format) = match mapping {
        Some(mapping) => (mapping.brand.clone(), mapping.format.clone()),
        None => (SKU_NOT_LISTED.to_string(), SKU_NOT_LISTED.to_string()),
    };

    let mut normalized = Vec::with_capacity(payload.reviews.len());

    for raw_value in &payload.reviews {
        let raw: RawReview = match serde_json::from_value(raw_value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(job_id = payload.job_id, error = %e, "Skipping malformed review");
                continue;
            }
        };

        normalized.push(normalize_review(payload, &product_id, &brand, &format, raw, raw_value));
    }

    normalized
}

fn normalize_review(
    payload: &RawJobPayload,
    product_id: &str,
    brand: &str,
    format: &str,
    raw: RawReview,
    raw_value: &Value,
) -> product_review::Model {
    let source_name = raw
        .source_name
        .or_else(|| payload.source_name.clone())
        .unwrap_or_default();
    let source_url = raw
        .source_url
        .or_else(|| payload.source_url.clone())
        .unwrap_or_default();

    product_review::Model {
        id: Uuid::new_v4(),
        review_uuid: raw.review_uuid.unwrap_or_default(),
        scraper_review_id: raw.scraper_review_id,
        source_review_id: raw.source_review_id,
        product_id: raw.product_id.unwrap_or_else(|| product_id.to_string()),
        brand: raw.brand.unwrap_or_else(|| brand.to_string()),
        format: raw.format.unwrap_or_else(|| format.to_string()),
        job_id: payload.job_id,
        review_source: source_name.clone(),
        source_name,
        source_url,
        author_name: raw.author_name.unwrap_or_default(),
        date: raw.date.as_deref().and_then(parse_review_date),
        rating_value: raw.rating_value,
        review_text: raw.review_text.unwrap_or_default(),
        review_url: raw.review_url.unwrap_or_default(),
        location: raw.location,
        review_title: raw.review_title.unwrap_or_default(),
        verified_order: raw.verified_order,
        reviewer_title: raw.reviewer_title,
        language_code: raw.language_code,
        profile_picture: raw.profile_picture,
        meta_data: raw.meta_data,
        response: Some(raw_value.clone()),
        created_at: Utc::now().fixed_offset(),
    }
}

/// Parses the provider's date formats: plain dates, dates with a time
/// component, and RFC 3339 timestamps. Anything else becomes `None`.
pub fn parse_review_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(reviews: Vec<Value>) -> RawJobPayload {
        serde_json::from_value(json!({
            "job_id": 42,
            "unique_id": "SKU-1",
            "source_name": "example-shop",
            "source_url": "https://shop.example.com/p/1",
            "reviews": reviews,
        }))
        .unwrap()
    }

    fn mapping() -> product_mapping::Model {
        product_mapping::Model {
            product_id: "SKU-1".to_string(),
            brand: "Acme".to_string(),
            format: "500ml".to_string(),
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn mapping_enriches_brand_and_format() {
        let payload = payload(vec![json!({"review_uuid": "u-1", "review_text": "ok"})]);

        let normalized = normalize_job_reviews(&payload, Some(&mapping()));

        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].brand, "Acme");
        assert_eq!(normalized[0].format, "500ml");
        assert_eq!(normalized[0].product_id, "SKU-1");
        assert_eq!(normalized[0].job_id, 42);
    }

    #[test]
    fn missing_mapping_uses_sentinel() {
        let payload = payload(vec![json!({"review_uuid": "u-1"})]);

        let normalized = normalize_job_reviews(&payload, None);

        assert_eq!(normalized[0].brand, SKU_NOT_LISTED);
        assert_eq!(normalized[0].format, SKU_NOT_LISTED);
    }

    #[test]
    fn provider_fields_are_renamed() {
        let payload = payload(vec![json!({
            "id": 991,
            "unique_id": "src-991",
            "name": "Ada",
            "url": "https://reviews.example.com/991",
            "title": "Great product",
        })]);

        let normalized = normalize_job_reviews(&payload, None);
        let review = &normalized[0];

        assert_eq!(review.scraper_review_id, Some(991));
        assert_eq!(review.source_review_id.as_deref(), Some("src-991"));
        assert_eq!(review.author_name, "Ada");
        assert_eq!(review.review_url, "https://reviews.example.com/991");
        assert_eq!(review.review_title, "Great product");
    }

    #[test]
    fn job_level_source_is_the_fallback() {
        let payload = payload(vec![
            json!({"source_name": "other-shop", "source_url": "https://other.example.com"}),
            json!({}),
        ]);

        let normalized = normalize_job_reviews(&payload, None);

        assert_eq!(normalized[0].source_name, "other-shop");
        assert_eq!(normalized[0].review_source, "other-shop");
        assert_eq!(normalized[1].source_name, "example-shop");
        assert_eq!(normalized[1].source_url, "https://shop.example.com/p/1");
    }

    #[test]
    fn review_level_catalog_fields_win_over_the_mapping() {
        let payload = payload(vec![
            json!({"brand": "Rival", "format": "1l", "product_id": "SKU-9"}),
            json!({}),
        ]);

        let normalized = normalize_job_reviews(&payload, Some(&mapping()));

        assert_eq!(normalized[0].brand, "Rival");
        assert_eq!(normalized[0].format, "1l");
        assert_eq!(normalized[0].product_id, "SKU-9");
        assert_eq!(normalized[1].brand, "Acme");
        assert_eq!(normalized[1].product_id, "SKU-1");
    }

    #[test]
    fn original_payload_is_preserved() {
        let raw = json!({"review_uuid": "u-1", "quirky_extra": true});
        let payload = payload(vec![raw.clone()]);

        let normalized = normalize_job_reviews(&payload, None);

        assert_eq!(normalized[0].response, Some(raw));
    }

    #[test]
    fn malformed_review_is_skipped() {
        let payload = payload(vec![
            json!({"review_uuid": "u-1"}),
            json!({"id": "not-a-number"}),
        ]);

        let normalized = normalize_job_reviews(&payload, None);

        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].review_uuid, "u-1");
    }

    #[test]
    fn date_formats_are_parsed() {
        assert_eq!(
            parse_review_date("2024-05-01"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(
            parse_review_date("2024-05-01 13:45:00"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(
            parse_review_date("2024-05-01T13:45:00+02:00"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(parse_review_date("yesterday"), None);
    }
}
