pub mod customers;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod suppliers;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub sales: Arc<crate::services::sales::SaleService>,
    pub purchases: Arc<crate::services::purchasing::PurchaseService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub products: Arc<crate::services::products::ProductService>,
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub suppliers: Arc<crate::services::suppliers::SupplierService>,
    pub reports: Arc<crate::services::reporting::ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        let sales = Arc::new(crate::services::sales::SaleService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let purchases = Arc::new(crate::services::purchasing::PurchaseService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let products = Arc::new(crate::services::products::ProductService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let customers = Arc::new(crate::services::customers::CustomerService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let suppliers = Arc::new(crate::services::suppliers::SupplierService::new(
            db_pool.clone(),
            event_sender,
        ));
        let reports = Arc::new(crate::services::reporting::ReportService::new(db_pool));

        Self {
            sales,
            purchases,
            inventory,
            products,
            customers,
            suppliers,
            reports,
        }
    }
}
