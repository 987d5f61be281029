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

async fn create_purchase(
    app: &TestApp,
    supplier_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    notes: Option<&str>,
) -> Value {
    let mut payload = json!({
        "supplier_id": supplier_id,
        "items": [{
            "product_id": product_id,
            "quantity": quantity,
            "unit_price": "9.00",
        }],
    });
    if let Some(notes) = notes {
        payload["notes"] = json!(notes);
    }

    let response = app
        .request(Method::POST, "/api/v1/purchases", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
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
async fn creating_a_purchase_leaves_stock_alone() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supply Co").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    let body = create_purchase(&app, supplier.id, product.id, 10, None).await;

    let data = &body["data"];
    let number = data["purchase_number"].as_str().expect("number expected");
    assert!(number.starts_with("PO"), "got {}", number);
    assert_eq!(number.len(), 14);
    assert_eq!(data["status"], json!("Pending"));
    assert_eq!(data["received_date"], json!(null));
    assert_eq!(decimal(&data["total_amount"]), dec!(90.00));
    assert_eq!(decimal(&data["net_amount"]), dec!(90.00));

    // Stock moves on receipt, not on order.
    assert_eq!(product_stock(&app, product.id).await, 5);
}

#[tokio::test]
async fn unknown_supplier_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/purchases",
            Some(json!({
                "supplier_id": Uuid::new_v4(),
                "items": [{"product_id": product.id, "quantity": 1, "unit_price": "9.00"}],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["message"], json!("Not found: Supplier not found"));
}

#[tokio::test]
async fn purchase_items_require_a_unit_price() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supply Co").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    // unit_price has no fallback for purchases; the deserializer rejects
    // the payload before it reaches the service.
    let response = app
        .request(
            Method::POST,
            "/api/v1/purchases",
            Some(json!({
                "supplier_id": supplier.id,
                "items": [{"product_id": product.id, "quantity": 1}],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ==================== Receiving ====================

#[tokio::test]
async fn receiving_books_ordered_quantities_into_stock() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supply Co").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    let purchase = create_purchase(&app, supplier.id, product.id, 10, None).await;
    let purchase_id = purchase["data"]["id"].as_str().expect("id expected");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/purchases/{}/receive", purchase_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["status"], json!("Received"));
    assert!(data["received_date"].is_string());

    assert_eq!(product_stock(&app, product.id).await, 15);
}

#[tokio::test]
async fn receiving_with_overrides_books_the_delivered_quantity() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supply Co").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    let purchase = create_purchase(&app, supplier.id, product.id, 10, Some("Initial order")).await;
    let purchase_id = purchase["data"]["id"].as_str().expect("id expected");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/purchases/{}/receive", purchase_id),
            Some(json!({
                "items": [{"product_id": product.id, "quantity": 4}],
                "notes": "short delivery",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(
        data["notes"],
        json!("Initial order\nReceived: short delivery")
    );

    // Only the delivered 4 of the ordered 10 land in stock.
    assert_eq!(product_stock(&app, product.id).await, 9);
}

#[tokio::test]
async fn only_pending_purchases_can_be_received() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supply Co").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    let purchase = create_purchase(&app, supplier.id, product.id, 10, None).await;
    let purchase_id = purchase["data"]["id"].as_str().expect("id expected");

    let receive_uri = format!("/api/v1/purchases/{}/receive", purchase_id);
    let response = app.request(Method::POST, &receive_uri, Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::POST, &receive_uri, Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(
        body["message"],
        json!("Invalid state: Only pending purchases can be received.")
    );

    // The failed second receipt must not double-book stock.
    assert_eq!(product_stock(&app, product.id).await, 15);
}

#[tokio::test]
async fn direct_status_edits_bypass_stock_booking() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supply Co").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    let purchase = create_purchase(&app, supplier.id, product.id, 10, None).await;
    let purchase_id = purchase["data"]["id"].as_str().expect("id expected");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/purchases/{}/status", purchase_id),
            Some(json!({"status": "Received"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["status"], json!("Received"));
    assert_eq!(data["received_date"], json!(null));

    assert_eq!(product_stock(&app, product.id).await, 5);
}

#[tokio::test]
async fn cancelled_purchases_cannot_be_received() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supply Co").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    let purchase = create_purchase(&app, supplier.id, product.id, 10, None).await;
    let purchase_id = purchase["data"]["id"].as_str().expect("id expected");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/purchases/{}/status", purchase_id),
            Some(json!({"status": "Cancelled"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/purchases/{}/receive", purchase_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(product_stock(&app, product.id).await, 5);
}

// ==================== Payment ====================

#[tokio::test]
async fn payment_updates_keep_their_own_lane() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supply Co").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 5).await;

    let purchase = create_purchase(&app, supplier.id, product.id, 10, None).await;
    let purchase_id = purchase["data"]["id"].as_str().expect("id expected");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/purchases/{}/payment", purchase_id),
            Some(json!({"payment_status": "Paid", "payment_method": "transfer"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["payment_status"], json!("Paid"));
    assert_eq!(data["payment_method"], json!("transfer"));
    assert_eq!(data["status"], json!("Pending"));
}
