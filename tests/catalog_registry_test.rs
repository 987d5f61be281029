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

// ==================== Products ====================

#[tokio::test]
async fn product_creation_round_trips() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Torque Wrench",
                "sku": "TW-100",
                "price": "79.90",
                "stock_quantity": 12,
                "category": "Tools",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["sku"], json!("TW-100"));
    assert_eq!(decimal(&data["price"]), dec!(79.90));
    assert_eq!(data["stock_quantity"], json!(12));
    assert_eq!(data["is_active"], json!(true));

    let id = data["id"].as_str().expect("id expected");
    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["name"], json!("Torque Wrench"));
}

#[tokio::test]
async fn duplicate_skus_are_rejected() {
    let app = TestApp::new().await;
    app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Widget Clone",
                "sku": "WID-001",
                "price": "45.00",
                "stock_quantity": 3,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Conflict"));
    assert_eq!(
        body["message"],
        json!("Conflict: A product with this SKU already exists.")
    );
}

#[tokio::test]
async fn product_updates_apply_requested_fields_only() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}", product.id),
            Some(json!({"price": "55.00", "category": "Hardware"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(decimal(&data["price"]), dec!(55.00));
    assert_eq!(data["category"], json!("Hardware"));
    assert_eq!(data["name"], json!("Widget"));
    assert_eq!(data["stock_quantity"], json!(10));
}

#[tokio::test]
async fn deleting_a_product_deactivates_it() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{}", product.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // History keeps the row; only the active flag drops.
    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", product.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["is_active"], json!(false));

    let response = app.request(Method::GET, "/api/v1/products", None).await;
    let data = response_json(response).await["data"].take();
    assert_eq!(data["total"], json!(0));

    let response = app
        .request(Method::GET, "/api/v1/products?active_only=false", None)
        .await;
    let data = response_json(response).await["data"].take();
    assert_eq!(data["total"], json!(1));
}

#[tokio::test]
async fn categories_list_distinct_active_values() {
    let app = TestApp::new().await;

    for (name, sku, category) in [
        ("Wrench", "TW-100", Some("Tools")),
        ("Hammer", "TH-200", Some("Tools")),
        ("Hinge", "HH-300", Some("Hardware")),
        ("Mystery Box", "MB-400", None),
    ] {
        let mut payload = json!({
            "name": name,
            "sku": sku,
            "price": "10.00",
            "stock_quantity": 1,
        });
        if let Some(category) = category {
            payload["category"] = json!(category);
        }
        let response = app
            .request(Method::POST, "/api/v1/products", Some(payload))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(Method::GET, "/api/v1/products/categories", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"], json!(["Hardware", "Tools"]));
}

// ==================== Customers ====================

#[tokio::test]
async fn duplicate_customer_emails_are_rejected() {
    let app = TestApp::new().await;
    app.seed_customer("Ada Lovelace", "ada@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/customers",
            Some(json!({"name": "Ada Again", "email": "ada@example.com"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(
        body["message"],
        json!("Conflict: A customer with this email already exists.")
    );
}

#[tokio::test]
async fn deleting_a_customer_without_sales_removes_the_row() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/customers/{}", customer.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/customers/{}", customer.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_customer_with_sales_deactivates_instead() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

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
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/customers/{}", customer.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/customers/{}", customer.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["is_active"], json!(false));
}

#[tokio::test]
async fn customer_summary_counts_all_sales_but_values_completed_ones() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "customer_id": customer.id,
                "items": [{"product_id": product.id, "quantity": 2}],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let completed_id = response_json(response).await["data"]["id"]
        .as_str()
        .expect("id expected")
        .to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/sales/{}/status", completed_id),
            Some(json!({"status": "Completed"})),
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
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/customers/{}/summary", customer.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["customer_name"], json!("Ada Lovelace"));
    assert_eq!(data["sale_count"], json!(2));
    assert_eq!(decimal(&data["lifetime_value"]), dec!(100.00));
    assert!(data["first_sale_date"].is_string());
    assert!(data["last_sale_date"].is_string());
}

#[tokio::test]
async fn customer_sales_listing_returns_their_documents() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Ada Lovelace", "ada@example.com").await;
    let other = app.seed_customer("Grace Hopper", "grace@example.com").await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    for customer_id in [customer.id, customer.id, other.id] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/sales",
                Some(json!({
                    "customer_id": customer_id,
                    "items": [{"product_id": product.id, "quantity": 1}],
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/customers/{}/sales", customer.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["total"], json!(2));
    assert_eq!(data["items"].as_array().map(Vec::len), Some(2));
}

// ==================== Suppliers ====================

#[tokio::test]
async fn supplier_creation_round_trips() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "name": "Acme Supply Co",
                "contact_person": "Wile E.",
                "email": "orders@acme.example",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["name"], json!("Acme Supply Co"));
    assert_eq!(data["contact_person"], json!("Wile E."));
    assert_eq!(data["is_active"], json!(true));

    let id = data["id"].as_str().expect("id expected");
    let response = app
        .request(Method::GET, &format!("/api/v1/suppliers/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn supplier_email_is_validated() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({"name": "Acme Supply Co", "email": "not-an-email"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Validation failed"));
}

#[tokio::test]
async fn supplier_listing_paginates() {
    let app = TestApp::new().await;
    for i in 0..3 {
        app.seed_supplier(&format!("Supplier {}", i)).await;
    }

    let response = app
        .request(Method::GET, "/api/v1/suppliers?page=2&limit=2", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["total"], json!(3));
    assert_eq!(data["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(data["page"], json!(2));
    assert_eq!(data["total_pages"], json!(2));
}

#[tokio::test]
async fn unknown_ids_return_not_found() {
    let app = TestApp::new().await;

    for uri in [
        format!("/api/v1/products/{}", Uuid::new_v4()),
        format!("/api/v1/customers/{}", Uuid::new_v4()),
        format!("/api/v1/suppliers/{}", Uuid::new_v4()),
        format!("/api/v1/sales/{}", Uuid::new_v4()),
        format!("/api/v1/purchases/{}", Uuid::new_v4()),
    ] {
        let response = app.request(Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {}", uri);
    }
}
