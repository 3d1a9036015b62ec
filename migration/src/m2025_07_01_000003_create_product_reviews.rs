//! Migration to create the product_reviews table.
//!
//! Product reviews are the canonical persisted records produced by the
//! callback ingestion pipeline and consumed by the republication sweep.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductReviews::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::ReviewUuid)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::ScraperReviewId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(ProductReviews::SourceReviewId).text().null())
                    .col(ColumnDef::new(ProductReviews::ProductId).text().not_null())
                    .col(
                        ColumnDef::new(ProductReviews::Brand)
                            .text()
                            .not_null()
                            .default("SKU_NOT_LISTED"),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::Format)
                            .text()
                            .not_null()
                            .default("SKU_NOT_LISTED"),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::JobId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::SourceName)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::SourceUrl)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::AuthorName)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(ProductReviews::Date).date().null())
                    .col(ColumnDef::new(ProductReviews::RatingValue).double().null())
                    .col(
                        ColumnDef::new(ProductReviews::ReviewText)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::ReviewUrl)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(ProductReviews::Location).text().null())
                    .col(
                        ColumnDef::new(ProductReviews::ReviewTitle)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(ProductReviews::VerifiedOrder).boolean().null())
                    .col(ColumnDef::new(ProductReviews::ReviewerTitle).text().null())
                    .col(ColumnDef::new(ProductReviews::LanguageCode).text().null())
                    .col(ColumnDef::new(ProductReviews::ProfilePicture).text().null())
                    .col(ColumnDef::new(ProductReviews::MetaData).json_binary().null())
                    .col(
                        ColumnDef::new(ProductReviews::ReviewSource)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(ProductReviews::Response).json_binary().null())
                    .col(
                        ColumnDef::new(ProductReviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The sweep deduplicates on review_uuid before republication.
        manager
            .create_index(
                Index::create()
                    .name("idx_product_reviews_review_uuid")
                    .table(ProductReviews::Table)
                    .col(ProductReviews::ReviewUuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_reviews_job_id")
                    .table(ProductReviews::Table)
                    .col(ProductReviews::JobId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_product_reviews_review_uuid")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_product_reviews_job_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ProductReviews::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductReviews {
    Table,
    Id,
    ReviewUuid,
    ScraperReviewId,
    SourceReviewId,
    ProductId,
    Brand,
    Format,
    JobId,
    SourceName,
    SourceUrl,
    AuthorName,
    Date,
    RatingValue,
    ReviewText,
    ReviewUrl,
    Location,
    ReviewTitle,
    VerifiedOrder,
    ReviewerTitle,
    LanguageCode,
    ProfilePicture,
    MetaData,
    ReviewSource,
    Response,
    CreatedAt,
}
