//! Product mapping endpoints.
//!
//! Mappings are submitted in bulk. Items whose product id is already mapped
//! are reported back without failing the rest of the batch.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, validation_error};
use crate::repositories::ProductMappingRepository;
use crate::server::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductMappingItem {
    pub product_id: String,
    pub brand: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductMappingBatchResponse {
    /// Product ids inserted by this request
    pub created: Vec<String>,
    /// Product ids that already had a mapping and were left untouched
    pub already_existing: Vec<String>,
}

/// Registers brand/format metadata for products
#[utoipa::path(
    post,
    path = "/product_mapping",
    request_body = Vec<ProductMappingItem>,
    responses(
        (status = 201, description = "All mappings created", body = ProductMappingBatchResponse),
        (status = 207, description = "Some product ids were already mapped", body = ProductMappingBatchResponse),
        (status = 400, description = "Missing fields or empty batch")
    ),
    tag = "products"
)]
pub async fn create_product_mappings(
    State(state): State<AppState>,
    Json(items): Json<Vec<ProductMappingItem>>,
) -> Result<(StatusCode, Json<ProductMappingBatchResponse>), ApiError> {
    if items.is_empty() {
        return Err(validation_error(
            "Invalid product mapping batch",
            serde_json::json!({ "items": "Must not be empty" }),
        ));
    }

    let mut field_errors = serde_json::Map::new();
    for (index, item) in items.iter().enumerate() {
        for (field, value) in [
            ("product_id", &item.product_id),
            ("brand", &item.brand),
            ("format", &item.format),
        ] {
            if value.trim().is_empty() {
                field_errors.insert(format!("items[{index}].{field}"), "Must not be empty".into());
            }
        }
    }
    if !field_errors.is_empty() {
        return Err(validation_error(
            "Invalid product mapping batch",
            serde_json::Value::Object(field_errors),
        ));
    }

    let repo = ProductMappingRepository::new(state.db.clone());
    let mut created = Vec::new();
    let mut already_existing = Vec::new();

    for item in &items {
        if repo.exists(&item.product_id).await? {
            already_existing.push(item.product_id.clone());
            continue;
        }

        repo.insert(&item.product_id, &item.brand, &item.format)
            .await?;
        created.push(item.product_id.clone());
    }

    let status = if already_existing.is_empty() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };

    Ok((
        status,
        Json(ProductMappingBatchResponse {
            created,
            already_existing,
        }),
    ))
}
