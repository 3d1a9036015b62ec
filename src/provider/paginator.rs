//! Pagination over the provider's counted list endpoints.
//!
//! The provider reports the total item count on every page but under a
//! different field name per endpoint, and returns at most `per_page` items
//! per request. The paginator reads the count from the first page, derives
//! the exact number of pages, and fetches each remaining page exactly once.

use std::future::Future;

use serde_json::Value;

use crate::error::RelayError;

/// Items requested per page.
pub const PER_PAGE: u64 = 500;

/// The provider's paginated endpoints and their payload field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagedEndpoint {
    Jobs,
    Reviews,
}

impl PagedEndpoint {
    /// Field carrying the total item count.
    pub fn count_field(self) -> &'static str {
        match self {
            PagedEndpoint::Jobs => "total",
            PagedEndpoint::Reviews => "result_count",
        }
    }

    /// Field carrying the page's item array.
    pub fn items_field(self) -> &'static str {
        match self {
            PagedEndpoint::Jobs => "jobs",
            PagedEndpoint::Reviews => "reviews",
        }
    }
}

pub struct Paginator {
    endpoint: PagedEndpoint,
    per_page: u64,
}

impl Paginator {
    pub fn new(endpoint: PagedEndpoint) -> Self {
        Self {
            endpoint,
            per_page: PER_PAGE,
        }
    }

    #[cfg(test)]
    fn with_per_page(endpoint: PagedEndpoint, per_page: u64) -> Self {
        Self { endpoint, per_page }
    }

    /// Fetches every page and returns the first page's payload with its item
    /// array replaced by the concatenation of all pages' items.
    ///
    /// `fetch_page` receives a 1-based page number and the page size.
    pub async fn fetch_all<F, Fut>(&self, mut fetch_page: F) -> Result<Value, RelayError>
    where
        F: FnMut(u64, u64) -> Fut,
        Fut: Future<Output = Result<Value, RelayError>>,
    {
        let mut first = fetch_page(1, self.per_page).await?;

        let total = first
            .get(self.endpoint.count_field())
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                RelayError::MalformedPayload(format!(
                    "paginated response is missing `{}`",
                    self.endpoint.count_field()
                ))
            })?;

        let mut items = self.take_items(&mut first)?;

        // An empty collection still comes back as one (empty) page.
        let total_pages = total.div_ceil(self.per_page).max(1);

        for page in 2..=total_pages {
            let mut payload = fetch_page(page, self.per_page).await?;
            items.extend(self.take_items(&mut payload)?);
        }

        first[self.endpoint.items_field()] = Value::Array(items);
        Ok(first)
    }

    fn take_items(&self, payload: &mut Value) -> Result<Vec<Value>, RelayError> {
        match payload.get_mut(self.endpoint.items_field()) {
            Some(Value::Array(items)) => Ok(std::mem::take(items)),
            _ => Err(RelayError::MalformedPayload(format!(
                "paginated response is missing `{}`",
                self.endpoint.items_field()
            ))),
        }
    }
}
