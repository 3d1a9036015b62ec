//! Integration with the external review-scraping provider: wire types,
//! counted pagination, and the retried HTTP client.

pub mod client;
pub mod paginator;
pub mod types;

pub use client::ProviderClient;
pub use paginator::{PagedEndpoint, Paginator, PER_PAGE};
pub use types::{JobInfo, JobStatus, JobSummary, RawJobPayload, RawReview, ScheduleFrequency};
