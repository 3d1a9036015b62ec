//! Spreadsheet export of the deduplicated review snapshot.
//!
//! Each republication cycle posts the full snapshot to the sheet exporter
//! collaborator as a named tabular document, one row per review.

use serde_json::{Value, json};

use crate::error::RelayError;
use crate::models::product_review::Model;
use crate::resilience::RetryPolicy;

/// Column order of the exported sheet; also its header row.
pub const SHEET_COLUMNS: &[&str] = &[
    "review_uuid",
    "product_id",
    "brand",
    "format",
    "job_id",
    "source_name",
    "author_name",
    "date",
    "rating_value",
    "review_title",
    "review_text",
    "review_url",
    "review_source",
    "meta_data",
];

#[derive(Clone)]
pub struct SheetExporter {
    http: reqwest::Client,
    endpoint: String,
    policy: RetryPolicy,
}

impl SheetExporter {
    pub fn new(http: reqwest::Client, endpoint: String, policy: RetryPolicy) -> Self {
        Self {
            http,
            endpoint,
            policy,
        }
    }

    /// Exports the snapshot as a sheet named `name` (the cycle date). The
    /// first row of the cell grid is the header.
    pub async fn export(&self, name: &str, reviews: &[Model]) -> Result<(), RelayError> {
        let op = "sheet.export";
        let header: Vec<String> = SHEET_COLUMNS.iter().map(|c| c.to_string()).collect();
        let cells: Vec<Vec<String>> = std::iter::once(header)
            .chain(reviews.iter().map(row_for))
            .collect();
        let body = json!({
            "name": name,
            "cells": cells,
        });
        let body = &body;

        self.policy
            .call(op, || self.export_once(op, body))
            .await
            .map_err(RelayError::from)?;

        tracing::info!(name, rows = reviews.len(), "Sheet exported");

        Ok(())
    }

    async fn export_once(&self, op: &str, body: &Value) -> Result<(), RelayError> {
        let response = self
            .http
            .post(&self.endpoint)
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
    }
}

fn row_for(review: &Model) -> Vec<String> {
    vec![
        review.review_uuid.clone(),
        review.product_id.clone(),
        review.brand.clone(),
        review.format.clone(),
        review.job_id.to_string(),
        review.source_name.clone(),
        review.author_name.clone(),
        review.date.map(|d| d.to_string()).unwrap_or_default(),
        review
            .rating_value
            .map(|r| r.to_string())
            .unwrap_or_default(),
        review.review_title.clone(),
        review.review_text.clone(),
        review.review_url.clone(),
        review.review_source.clone(),
        review
            .meta_data
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    #[test]
    fn row_matches_column_order() {
        let review = Model {
            id: Uuid::new_v4(),
            review_uuid: "u-1".to_string(),
            scraper_review_id: None,
            source_review_id: None,
            product_id: "SKU-1".to_string(),
            brand: "Acme".to_string(),
            format: "500ml".to_string(),
            job_id: 42,
            source_name: "shop".to_string(),
            source_url: String::new(),
            author_name: "Ada".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            rating_value: Some(4.5),
            review_text: "great".to_string(),
            review_url: "https://reviews.example.com/1".to_string(),
            location: None,
            review_title: "Great".to_string(),
            verified_order: None,
            reviewer_title: None,
            language_code: None,
            profile_picture: None,
            meta_data: Some(serde_json::json!({"likes": 3})),
            review_source: "shop".to_string(),
            response: None,
            created_at: Utc::now().fixed_offset(),
        };

        let row = row_for(&review);

        assert_eq!(row.len(), SHEET_COLUMNS.len());
        assert_eq!(row[0], "u-1");
        assert_eq!(row[4], "42");
        assert_eq!(row[7], "2024-05-01");
        assert_eq!(row[8], "4.5");
        assert_eq!(row[13], r#"{"likes":3}"#);
    }

    #[test]
    fn absent_date_and_rating_become_empty_cells() {
        let review = Model {
            id: Uuid::new_v4(),
            review_uuid: String::new(),
            scraper_review_id: None,
            source_review_id: None,
            product_id: "SKU-1".to_string(),
            brand: "Acme".to_string(),
            format: "500ml".to_string(),
            job_id: 1,
            source_name: String::new(),
            source_url: String::new(),
            author_name: String::new(),
            date: None,
            rating_value: None,
            review_text: String::new(),
            review_url: String::new(),
            location: None,
            review_title: String::new(),
            verified_order: None,
            reviewer_title: None,
            language_code: None,
            profile_picture: None,
            meta_data: None,
            review_source: String::new(),
            response: None,
            created_at: Utc::now().fixed_offset(),
        };

        let row = row_for(&review);

        assert_eq!(row[7], "");
        assert_eq!(row[8], "");
    }
}
