mod common;

use axum::http::{Method, StatusCode};
use axum::response::Response;
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

async fn adjust(app: &TestApp, product_id: Uuid, payload: Value) -> Response {
    app.request(
        Method::POST,
        &format!("/api/v1/products/{}/adjust-stock", product_id),
        Some(payload),
    )
    .await
}

#[tokio::test]
async fn positive_adjustments_increase_stock() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = adjust(&app, product.id, json!({"adjustment": 5})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["product_id"].as_str(), Some(product.id.to_string().as_str()));
    assert_eq!(data["new_quantity"], json!(15));
}

#[tokio::test]
async fn negative_adjustments_decrease_stock() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    let response = adjust(
        &app,
        product.id,
        json!({"adjustment": -3, "reason": "damaged in storage"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["new_quantity"], json!(7));
}

#[tokio::test]
async fn drawing_down_to_exactly_zero_is_allowed() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 4).await;

    let response = adjust(&app, product.id, json!({"adjustment": -4})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].take();
    assert_eq!(data["new_quantity"], json!(0));
}

#[tokio::test]
async fn adjustments_cannot_drive_stock_negative() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 4).await;

    let response = adjust(&app, product.id, json!({"adjustment": -5})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(
        body["message"],
        json!("Insufficient stock for product Widget. Available: 4, Requested: 5")
    );

    // The rejected adjustment leaves the quantity untouched.
    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", product.id), None)
        .await;
    let data = response_json(response).await["data"].take();
    assert_eq!(data["stock_quantity"], json!(4));
}

#[tokio::test]
async fn adjusting_an_unknown_product_is_not_found() {
    let app = TestApp::new().await;

    let response = adjust(&app, Uuid::new_v4(), json!({"adjustment": 1})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Not Found"));
    assert_eq!(body["message"], json!("Not found: Product not found"));
}

#[tokio::test]
async fn adjustments_accumulate() {
    let app = TestApp::new().await;
    let product = app.seed_product("Widget", "WID-001", dec!(50.00), 10).await;

    for delta in [5, -2, -3] {
        let response = adjust(&app, product.id, json!({"adjustment": delta})).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", product.id), None)
        .await;
    let data = response_json(response).await["data"].take();
    assert_eq!(data["stock_quantity"], json!(10));
}
