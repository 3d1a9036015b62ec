//! Migration to create the product_mappings table.
//!
//! A product mapping carries the brand/format metadata used to enrich
//! normalized reviews. Mappings are immutable and unique per product id.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductMappings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductMappings::ProductId)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductMappings::Brand).text().not_null())
                    .col(ColumnDef::new(ProductMappings::Format).text().not_null())
                    .col(
                        ColumnDef::new(ProductMappings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductMappings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductMappings {
    Table,
    ProductId,
    Brand,
    Format,
    CreatedAt,
}
