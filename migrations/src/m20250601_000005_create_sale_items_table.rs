use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create sale_items table
        manager
            .create_table(
                Table::create()
                    .table(SaleItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SaleItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                    .col(ColumnDef::new(SaleItems::ProductId).uuid().not_null())
                    .col(ColumnDef::new(SaleItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(SaleItems::UnitPrice).decimal().not_null())
                    .col(
                        ColumnDef::new(SaleItems::Discount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(SaleItems::TotalPrice).decimal().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_sale_id")
                            .from(SaleItems::Table, SaleItems::SaleId)
                            .to(
                                super::m20250601_000004_create_sales_table::Sales::Table,
                                super::m20250601_000004_create_sales_table::Sales::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_product_id")
                            .from(SaleItems::Table, SaleItems::ProductId)
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
        // Drop sale_items table
        manager
            .drop_table(Table::drop().table(SaleItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SaleItems {
    Table,
    Id,
    SaleId,
    ProductId,
    Quantity,
    UnitPrice,
    Discount,
    TotalPrice,
}
