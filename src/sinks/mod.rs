//! Outbound sinks: the analytics upload target, the spreadsheet exporter,
//! and the operational notification webhook.

pub mod analytics;
pub mod notify;
pub mod sheet;

pub use analytics::{AnalyticsUploader, UploadStats};
pub use notify::Notifier;
pub use sheet::SheetExporter;
