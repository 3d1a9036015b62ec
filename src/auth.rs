//! # Authentication
//!
//! API-key authentication for the admin endpoints. The configured secret is a
//! salted SHA-256 digest of the key, so the key itself never appears in
//! configuration; comparison is constant-time.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized, validation_error};
use crate::server::AppState;

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Middleware validating the API key header on protected routes.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = extract_api_key(request.headers(), &config)?;
    validate_api_key(&config, key)?;

    Ok(next.run(request).await)
}

fn extract_api_key<'h>(headers: &'h HeaderMap, config: &AppConfig) -> Result<&'h str, ApiError> {
    let header_name = config.security.api_key_header.as_str();

    headers
        .get(header_name)
        .ok_or_else(|| {
            validation_error(
                "authentication is required",
                serde_json::json!({ header_name: "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "authentication is required",
                serde_json::json!({ header_name: "Header must be valid UTF-8" }),
            )
        })
}

/// Checks `sha256(salt || key)` against the configured digest in constant time.
fn validate_api_key(config: &AppConfig, key: &str) -> Result<(), ApiError> {
    let salt = hex::decode(&config.security.api_key_salt)
        .map_err(|_| unauthorized(Some("Invalid API key")))?;
    let expected = hex::decode(&config.security.api_key_hash)
        .map_err(|_| unauthorized(Some("Invalid API key")))?;

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    if ConstantTimeEq::ct_eq(digest.as_slice(), expected.as_slice()).into() {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid API key")))
    }
}
