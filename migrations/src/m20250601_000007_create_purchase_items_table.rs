use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create purchase_items table
        manager
            .create_table(
                Table::create()
                    .table(PurchaseItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseItems::PurchaseId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseItems::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(PurchaseItems::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::UnitPrice)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::Discount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::TotalPrice)
                            .decimal()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_items_purchase_id")
                            .from(PurchaseItems::Table, PurchaseItems::PurchaseId)
                            .to(
                                super::m20250601_000006_create_purchases_table::Purchases::Table,
                                super::m20250601_000006_create_purchases_table::Purchases::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_items_product_id")
                            .from(PurchaseItems::Table, PurchaseItems::ProductId)
                            .to(
                                super::m20250601_000001_create_products_table::Products::Table,
                                super::m20250601_000001_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop purchase_items table
        manager
            .drop_table(Table::drop().table(PurchaseItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PurchaseItems {
    Table,
    Id,
    PurchaseId,
    ProductId,
    Quantity,
    UnitPrice,
    Discount,
    TotalPrice,
}
