use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================
        // SALES TABLE INDEXES
        // ============================================

        // Composite index for customer sales filtered by status
        manager
            .create_index(
                Index::create()
                    .name("idx_sales_customer_status")
                    .table(Sales::Table)
                    .col(Sales::CustomerId)
                    .col(Sales::Status)
                    .to_owned(),
            )
            .await?;

        // Index for recent sales and report range scans
        manager
            .create_index(
                Index::create()
                    .name("idx_sales_sale_date")
                    .table(Sales::Table)
                    .col((Sales::SaleDate, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // ============================================
        // SALE_ITEMS TABLE INDEXES
        // ============================================

        // Foreign key index for item loads per sale
        manager
            .create_index(
                Index::create()
                    .name("idx_sale_items_sale_id")
                    .table(SaleItems::Table)
                    .col(SaleItems::SaleId)
                    .to_owned(),
            )
            .await?;

        // Index for product lookup in sale items
        manager
            .create_index(
                Index::create()
                    .name("idx_sale_items_product_id")
                    .table(SaleItems::Table)
                    .col(SaleItems::ProductId)
                    .to_owned(),
            )
            .await?;

        // ============================================
        // PURCHASES TABLE INDEXES
        // ============================================

        // Composite index for supplier purchases filtered by status
        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_supplier_status")
                    .table(Purchases::Table)
                    .col(Purchases::SupplierId)
                    .col(Purchases::Status)
                    .to_owned(),
            )
            .await?;

        // Index for recent purchases and report range scans
        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_purchase_date")
                    .table(Purchases::Table)
                    .col((Purchases::PurchaseDate, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // ============================================
        // PURCHASE_ITEMS TABLE INDEXES
        // ============================================

        // Foreign key index for item loads per purchase
        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_items_purchase_id")
                    .table(PurchaseItems::Table)
                    .col(PurchaseItems::PurchaseId)
                    .to_owned(),
            )
            .await?;

        // Index for product lookup in purchase items
        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_items_product_id")
                    .table(PurchaseItems::Table)
                    .col(PurchaseItems::ProductId)
                    .to_owned(),
            )
            .await?;

        // ============================================
        // PRODUCTS TABLE INDEXES
        // ============================================

        // Index for category filters and rollups
        manager
            .create_index(
                Index::create()
                    .name("idx_products_category")
                    .table(Products::Table)
                    .col(Products::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop all indexes in reverse order

        // Products
        manager
            .drop_index(Index::drop().name("idx_products_category").to_owned())
            .await?;

        // Purchase items
        manager
            .drop_index(
                Index::drop()
                    .name("idx_purchase_items_product_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_purchase_items_purchase_id")
                    .to_owned(),
            )
            .await?;

        // Purchases
        manager
            .drop_index(Index::drop().name("idx_purchases_purchase_date").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_purchases_supplier_status")
                    .to_owned(),
            )
            .await?;

        // Sale items
        manager
            .drop_index(Index::drop().name("idx_sale_items_product_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sale_items_sale_id").to_owned())
            .await?;

        // Sales
        manager
            .drop_index(Index::drop().name("idx_sales_sale_date").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sales_customer_status").to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Category,
}

#[derive(DeriveIden)]
enum Sales {
    Table,
    CustomerId,
    Status,
    SaleDate,
}

#[derive(DeriveIden)]
enum SaleItems {
    Table,
    SaleId,
    ProductId,
}

#[derive(DeriveIden)]
enum Purchases {
    Table,
    SupplierId,
    Status,
    PurchaseDate,
}

#[derive(DeriveIden)]
enum PurchaseItems {
    Table,
    PurchaseId,
    ProductId,
}
