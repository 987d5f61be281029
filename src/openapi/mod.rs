use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OrderDesk API",
        version = "1.0.0",
        description = r#"
# OrderDesk Order & Inventory API

An API for running a small trading operation: products, customers,
suppliers, sales, purchases and stock, with reporting on top.

## Features

- **Sales**: Create sales, move them through their lifecycle, track payment
- **Purchasing**: Order from suppliers and book goods into stock on receipt
- **Stock**: Guarded stock movements that never let quantities go negative
- **Catalog**: Products with categories, SKUs and soft deletion
- **Parties**: Customers and suppliers with contact details
- **Reporting**: Sales, inventory, customer and purchase rollups

## Document Numbers

Sales and purchases get sequential numbers per day, for example
`SL202601150001` or `PO202601150003`. Numbers restart at 0001 each day.

## Error Handling

The API uses a consistent error envelope with appropriate HTTP status codes:

```json
{
  "error": "Not Found",
  "message": "Product not found",
  "request_id": "req-abc123xyz",
  "timestamp": "2026-01-15T00:00:00Z"
}
```

## Pagination

List endpoints support pagination with the following query parameters:
- `page`: Page number (default: 1)
- `limit`: Items per page (default: 20, max: 100)
- `search`: Search term for filtering results
- `sort_by`: Field to sort by
- `sort_order`: Sort order (asc/desc)
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Sales", description = "Sales document endpoints"),
        (name = "Purchases", description = "Purchase document endpoints"),
        (name = "Products", description = "Product catalog and stock endpoints"),
        (name = "Customers", description = "Customer management endpoints"),
        (name = "Suppliers", description = "Supplier management endpoints"),
        (name = "Reports", description = "Reporting and analytics endpoints")
    ),
    paths(
        // Sales
        crate::handlers::sales::list_sales,
        crate::handlers::sales::create_sale,
        crate::handlers::sales::get_sale,
        crate::handlers::sales::update_sale_status,
        crate::handlers::sales::update_sale_payment,
        crate::handlers::sales::dashboard_summary,

        // Purchases
        crate::handlers::purchases::list_purchases,
        crate::handlers::purchases::create_purchase,
        crate::handlers::purchases::get_purchase,
        crate::handlers::purchases::receive_purchase,
        crate::handlers::purchases::update_purchase_status,
        crate::handlers::purchases::update_purchase_payment,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_categories,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::adjust_stock,

        // Customers
        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,
        crate::handlers::customers::customer_summary,
        crate::handlers::customers::list_customer_sales,

        // Suppliers
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,

        // Reports
        crate::handlers::reports::sales_report,
        crate::handlers::reports::sales_dashboard,
        crate::handlers::reports::inventory_summary,
        crate::handlers::reports::customer_analytics,
        crate::handlers::reports::purchase_report,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Sale types
            crate::services::sales::CreateSaleRequest,
            crate::services::sales::CreateSaleItemRequest,
            crate::services::sales::UpdateSaleStatusRequest,
            crate::services::sales::UpdateSalePaymentRequest,
            crate::services::sales::SaleResponse,
            crate::services::sales::SaleDetailResponse,
            crate::services::sales::SaleItemResponse,
            crate::services::sales::DashboardSummaryResponse,
            crate::entities::sale::SaleStatus,
            crate::entities::sale::PaymentStatus,

            // Purchase types
            crate::services::purchasing::CreatePurchaseRequest,
            crate::services::purchasing::CreatePurchaseItemRequest,
            crate::services::purchasing::ReceivePurchaseRequest,
            crate::services::purchasing::ReceivePurchaseItem,
            crate::services::purchasing::UpdatePurchaseStatusRequest,
            crate::services::purchasing::UpdatePurchasePaymentRequest,
            crate::services::purchasing::PurchaseResponse,
            crate::services::purchasing::PurchaseDetailResponse,
            crate::services::purchasing::PurchaseItemResponse,
            crate::entities::purchase::PurchaseStatus,

            // Product and stock types
            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,
            crate::services::products::ProductResponse,
            crate::services::inventory::AdjustStockRequest,
            crate::services::inventory::StockAdjustment,

            // Customer types
            crate::services::customers::CreateCustomerRequest,
            crate::services::customers::UpdateCustomerRequest,
            crate::services::customers::CustomerResponse,
            crate::services::customers::CustomerSummaryResponse,

            // Supplier types
            crate::services::suppliers::CreateSupplierRequest,
            crate::services::suppliers::SupplierResponse,

            // Report types
            crate::services::reporting::ReportGroupBy,
            crate::services::reporting::SalesReportResponse,
            crate::services::reporting::SalesPeriodData,
            crate::services::reporting::TopProductData,
            crate::services::reporting::SalesDashboardResponse,
            crate::services::reporting::InventorySummaryResponse,
            crate::services::reporting::InventoryProductData,
            crate::services::reporting::CategoryBreakdown,
            crate::services::reporting::CustomerAnalyticsResponse,
            crate::services::reporting::CustomerActivityData,
            crate::services::reporting::PurchaseReportResponse,
            crate::services::reporting::SupplierSpendData,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
