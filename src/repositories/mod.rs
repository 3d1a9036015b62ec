//! Repository layer wrapping SeaORM operations per table.

pub mod product_mapping;
pub mod product_review;
pub mod schedule;

pub use product_mapping::ProductMappingRepository;
pub use product_review::ProductReviewRepository;
pub use schedule::ScheduleRepository;
