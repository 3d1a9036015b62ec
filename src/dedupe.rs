//! Deduplication of staged reviews before republication.
//!
//! Two passes, both keeping the first occurrence and preserving order:
//! first on the provider review UUID (when present), then on review content
//! to catch the same review arriving under different provider ids.

use std::collections::HashSet;

use crate::models::product_review::Model;

/// Removes duplicate reviews from a snapshot of the staging table.
pub fn dedupe_reviews(reviews: Vec<Model>) -> Vec<Model> {
    let by_content = content_pass(uuid_pass(reviews));

    by_content
}

/// Keeps the first review per non-empty provider UUID. Reviews without a
/// UUID cannot be matched here and are left for the content pass.
fn uuid_pass(reviews: Vec<Model>) -> Vec<Model> {
    let mut seen = HashSet::new();
    reviews
        .into_iter()
        .filter(|review| {
            if review.review_uuid.is_empty() {
                return true;
            }
            seen.insert(review.review_uuid.clone())
        })
        .collect()
}

/// Keeps the first review per (date, text, author, source) tuple. The date
/// participates in its ISO-8601 form so absent dates compare equal.
fn content_pass(reviews: Vec<Model>) -> Vec<Model> {
    let mut seen = HashSet::new();
    reviews
        .into_iter()
        .filter(|review| {
            let key = (
                review.date.map(|d| d.to_string()).unwrap_or_default(),
                review.review_text.clone(),
                review.author_name.clone(),
                review.review_source.clone(),
            );
            seen.insert(key)
        })
        .collect()
}
