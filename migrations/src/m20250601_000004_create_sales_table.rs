use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create sales table
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Sales::SaleNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sales::CustomerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Sales::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Sales::PaymentStatus)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Sales::PaymentMethod).string().null())
                    .col(
                        ColumnDef::new(Sales::TotalAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Sales::DiscountAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Sales::TaxAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Sales::NetAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Sales::Notes).text().null())
                    .col(ColumnDef::new(Sales::SaleDate).date_time().not_null())
                    .col(ColumnDef::new(Sales::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Sales::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_customer_id")
                            .from(Sales::Table, Sales::CustomerId)
                            .to(
                                super::m20250601_000002_create_customers_table::Customers::Table,
                                super::m20250601_000002_create_customers_table::Customers::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop sales table
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Sales {
    Table,
    Id,
    SaleNumber,
    CustomerId,
    Status,
    PaymentStatus,
    PaymentMethod,
    TotalAmount,
    DiscountAmount,
    TaxAmount,
    NetAmount,
    Notes,
    SaleDate,
    CreatedAt,
    UpdatedAt,
}
