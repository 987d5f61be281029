mod common;

use axum::http::{Method, StatusCode};
use axum::response::Response;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("decimal fields serialize as strings")
        .parse()
        .expect("decimal string should parse")
}

async fn create_sale(app: &TestApp, customer_id: Uuid, product_id: Uuid, quantity: i32) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "customer_id": customer_id,
                "items": [{"product_id": product_id, "quantity": quantity}],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

async fn set_sale_status(app: &TestApp, sale_id: &str, status: &str) -> Response {
    app.request(
        Method::PUT,
        &format!("/api/v1/sales/{}/status", sale_id),
        Some(json!({ "status": status })),
    )
    .await
}

async fn product_stock(app: &TestApp, product_id: Uuid) -> i64 {
    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", product_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await["data"]["stock_quantity"]
        .as_i64()
        .expect("stock quantity should be numeric")
}

// ==================== Creation ====================

#[tokio::test]
async fn creating_a_sale_decrements_stock_and_prices_from_the_catalog() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let body = create_sale(&app, customer.id, product.id, 2).await;

    assert_eq!(body["success"], json!(true));
    let data = &body["data"];
    let sale_number = data["sale_number"].as_str().expect("sale number expected");
    assert!(sale_number.starts_with("SL"), "got {}", sale_number);
    assert_eq!(sale_number.len(), 14);
    assert_eq!(data["status"], json!("Pending"));
    assert_eq!(data["payment_status"], json!("Pending"));
    assert_eq!(data["customer_id"].as_str(), Some(customer.id.to_string().as_str()));

    // Price falls back to the catalog price when the request omits it.
    let items = data["items"].as_array().expect("items expected");
    assert_eq!(items.len(), 1);
    assert_eq!(decimal(&items[0]["unit_price"]), dec!(50.00));
    assert_eq!(decimal(&items[0]["total_price"]), dec!(100.00));
    assert_eq!(items[0]["product_name"], json!("Widget"));

    assert_eq!(decimal(&data["total_amount"]), dec!(100.00));
    assert_eq!(decimal(&data["tax_amount"]), dec!(0));
    assert_eq!(decimal(&data["net_amount"]), dec!(100.00));

    assert_eq!(product_stock(&app, product.id).await, 8);
}

#[tokio::test]
async fn requested_price_discount_and_tax_flow_into_totals() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Grace Hopper", "grace@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "customer_id": customer.id,
                "items": [{
                    "product_id": product.id,
                    "quantity": 2,
                    "unit_price": "40.00",
                    "discount": "5.00",
                }],
                "tax_rate": "0.10",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = response_json(response).await["data"].take();

    // 2 * 40.00 - 5.00 = 75.00, taxed at 10%.
    assert_eq!(decimal(&data["total_amount"]), dec!(75.00));
    assert_eq!(decimal(&data["discount_amount"]), dec!(5.00));
    assert_eq!(decimal(&data["tax_amount"]), dec!(7.50));
    assert_eq!(decimal(&data["net_amount"]), dec!(82.50));
}

#[tokio::test]
async fn unknown_customer_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "customer_id": Uuid::new_v4(),
                "items": [{"product_id": product.id, "quantity": 1}],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Not Found"));
    assert_eq!(body["message"], json!("Not found: Customer not found"));

    assert_eq!(product_stock(&app, product.id).await, 10);
}

#[tokio::test]
async fn inactive_product_is_rejected() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{}", product.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "customer_id": customer.id,
                "items": [{"product_id": product.id, "quantity": 1}],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(
        body["message"],
        json!("Invalid reference: One or more products not found or inactive.")
    );
}

#[tokio::test]
async fn insufficient_stock_reports_available_and_requested() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "customer_id": customer.id,
                "items": [{"product_id": product.id, "quantity": 5}],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(
        body["message"],
        json!("Insufficient stock for product Widget. Available: 1, Requested: 5")
    );

    // The whole transaction rolled back.
    assert_eq!(product_stock(&app, product.id).await, 1);
}

#[tokio::test]
async fn empty_item_list_fails_validation() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({"customer_id": customer.id, "items": []})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Validation failed"));
    let errors = body["errors"].as_array().expect("errors expected");
    assert!(
        errors
            .iter()
            .any(|e| e.as_str().unwrap_or_default().contains("At least one item is required")),
        "got {:?}",
        errors
    );
}

// ==================== Status transitions ====================

#[tokio::test]
async fn completing_then_cancelling_restores_stock_once() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let sale = create_sale(&app, customer.id, product.id, 2).await;
    let sale_id = sale["data"]["id"].as_str().expect("sale id expected");
    assert_eq!(product_stock(&app, product.id).await, 8);

    let response = set_sale_status(&app, sale_id, "Completed").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["status"], json!("Completed"));
    assert_eq!(product_stock(&app, product.id).await, 8);

    let response = set_sale_status(&app, sale_id, "Cancelled").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(product_stock(&app, product.id).await, 10);

    // Repeating the cancellation is a no-op and must not restore again.
    let response = set_sale_status(&app, sale_id, "Cancelled").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(product_stock(&app, product.id).await, 10);
}

#[tokio::test]
async fn cancelling_a_pending_sale_restores_stock() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let sale = create_sale(&app, customer.id, product.id, 3).await;
    let sale_id = sale["data"]["id"].as_str().expect("sale id expected");
    assert_eq!(product_stock(&app, product.id).await, 7);

    let response = set_sale_status(&app, sale_id, "Cancelled").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(product_stock(&app, product.id).await, 10);
}

#[tokio::test]
async fn cancelled_sales_refuse_further_transitions() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let sale = create_sale(&app, customer.id, product.id, 1).await;
    let sale_id = sale["data"]["id"].as_str().expect("sale id expected");

    let response = set_sale_status(&app, sale_id, "Cancelled").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = set_sale_status(&app, sale_id, "Pending").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(
        body["message"],
        json!("Invalid state: Cannot change the status of a cancelled sale")
    );
}

#[tokio::test]
async fn completed_sales_cannot_return_to_pending() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let sale = create_sale(&app, customer.id, product.id, 1).await;
    let sale_id = sale["data"]["id"].as_str().expect("sale id expected");

    let response = set_sale_status(&app, sale_id, "Completed").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = set_sale_status(&app, sale_id, "Pending").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(
        body["message"],
        json!("Invalid state: Cannot move a completed sale back to pending")
    );
}

// ==================== Payment and retrieval ====================

#[tokio::test]
async fn payment_updates_leave_the_lifecycle_alone() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let sale = create_sale(&app, customer.id, product.id, 1).await;
    let sale_id = sale["data"]["id"].as_str().expect("sale id expected");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/sales/{}/payment", sale_id),
            Some(json!({"payment_status": "Paid", "payment_method": "card"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["payment_status"], json!("Paid"));
    assert_eq!(data["payment_method"], json!("card"));
    assert_eq!(data["status"], json!("Pending"));

    assert_eq!(product_stock(&app, product.id).await, 9);
}

#[tokio::test]
async fn fetching_a_sale_returns_its_items() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let sale = create_sale(&app, customer.id, product.id, 2).await;
    let sale_id = sale["data"]["id"].as_str().expect("sale id expected");

    let response = app
        .request(Method::GET, &format!("/api/v1/sales/{}", sale_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["customer_name"], json!("Ada Lovelace"));
    let items = data["items"].as_array().expect("items expected");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], json!(2));
}

#[tokio::test]
async fn sale_listing_paginates() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    for _ in 0..3 {
        create_sale(&app, customer.id, product.id, 1).await;
    }

    let response = app
        .request(Method::GET, "/api/v1/sales?page=1&limit=2", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["total"], json!(3));
    assert_eq!(data["page"], json!(1));
    assert_eq!(data["limit"], json!(2));
    assert_eq!(data["total_pages"], json!(2));
}

// ==================== Dashboard ====================

#[tokio::test]
async fn dashboard_counts_pending_orders_and_completed_revenue() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let first = create_sale(&app, customer.id, product.id, 2).await;
    create_sale(&app, customer.id, product.id, 1).await;

    // Both sales are still pending, so no revenue is counted yet.
    let response = app
        .request(Method::GET, "/api/v1/sales/dashboard", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["pending_orders"], json!(2));
    assert_eq!(data["today_orders"], json!(2));
    assert_eq!(decimal(&data["today_sales"]), dec!(0));

    let sale_id = first["data"]["id"].as_str().expect("sale id expected");
    let response = set_sale_status(&app, sale_id, "Completed").await;
    assert_eq!(response.status(), StatusCode::OK);

    // The completed sale's net amount lands in every revenue window.
    let response = app
        .request(Method::GET, "/api/v1/sales/dashboard", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["pending_orders"], json!(1));
    assert_eq!(data["today_orders"], json!(2));
    assert_eq!(decimal(&data["today_sales"]), dec!(100.00));
    assert_eq!(decimal(&data["month_sales"]), dec!(100.00));
    assert_eq!(decimal(&data["year_sales"]), dec!(100.00));
    assert!(data["generated_at"].is_string());
}
