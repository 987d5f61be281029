use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create purchases table
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Purchases::PurchaseNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Purchases::SupplierId).uuid().not_null())
                    .col(
                        ColumnDef::new(Purchases::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Purchases::PaymentStatus)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Purchases::PaymentMethod).string().null())
                    .col(
                        ColumnDef::new(Purchases::TotalAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::DiscountAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::TaxAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::NetAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Purchases::Notes).text().null())
                    .col(
                        ColumnDef::new(Purchases::PurchaseDate)
                            .date_time()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Purchases::ReceivedDate).date_time().null())
                    .col(ColumnDef::new(Purchases::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Purchases::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_supplier_id")
                            .from(Purchases::Table, Purchases::SupplierId)
                            .to(
                                super::m20250601_000003_create_suppliers_table::Suppliers::Table,
                                super::m20250601_000003_create_suppliers_table::Suppliers::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop purchases table
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Purchases {
    Table,
    Id,
    PurchaseNumber,
    SupplierId,
    Status,
    PaymentStatus,
    PaymentMethod,
    TotalAmount,
    DiscountAmount,
    TaxAmount,
    NetAmount,
    Notes,
    PurchaseDate,
    ReceivedDate,
    CreatedAt,
    UpdatedAt,
}
