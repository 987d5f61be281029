pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_products_table;
mod m20250601_000002_create_customers_table;
mod m20250601_000003_create_suppliers_table;
mod m20250601_000004_create_sales_table;
mod m20250601_000005_create_sale_items_table;
mod m20250601_000006_create_purchases_table;
mod m20250601_000007_create_purchase_items_table;
mod m20250601_000008_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_products_table::Migration),
            Box::new(m20250601_000002_create_customers_table::Migration),
            Box::new(m20250601_000003_create_suppliers_table::Migration),
            Box::new(m20250601_000004_create_sales_table::Migration),
            Box::new(m20250601_000005_create_sale_items_table::Migration),
            Box::new(m20250601_000006_create_purchases_table::Migration),
            Box::new(m20250601_000007_create_purchase_items_table::Migration),
            Box::new(m20250601_000008_add_lookup_indexes::Migration),
        ]
    }
}
