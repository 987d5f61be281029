//! Shared test harness: spins up the full router against a private
//! in-memory database so every test file gets an isolated server.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::util::ServiceExt;

use orderdesk_api::config::AppConfig;
use orderdesk_api::db;
use orderdesk_api::events::{self, EventSender};
use orderdesk_api::handlers::AppServices;
use orderdesk_api::services::customers::{CreateCustomerRequest, CustomerResponse};
use orderdesk_api::services::products::{CreateProductRequest, ProductResponse};
use orderdesk_api::services::suppliers::{CreateSupplierRequest, SupplierResponse};
use orderdesk_api::AppState;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Builds a fully wired application over `sqlite::memory:` with the
    /// schema migrated. The pool is pinned to a single connection; a second
    /// connection would open a second, empty in-memory database.
    pub async fn new() -> Self {
        let mut config = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        config.db_max_connections = 1;
        config.db_min_connections = 1;

        let db = db::establish_connection_from_app_config(&config)
            .await
            .expect("test database should connect");
        db::run_migrations(&db)
            .await
            .expect("migrations should apply cleanly");
        let db = Arc::new(db);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db.clone(), Some(event_sender.clone()));
        let state = AppState {
            db,
            config,
            event_sender: Some(event_sender),
            services,
        };

        let router = Router::new()
            .nest("/api/v1", orderdesk_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Sends a request through the router. A `Some` body is serialized as
    /// JSON with the matching content type.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request should produce a response")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        sku: &str,
        price: Decimal,
        stock: i32,
    ) -> ProductResponse {
        self.state
            .services
            .products
            .create_product(CreateProductRequest {
                name: name.to_string(),
                description: None,
                sku: sku.to_string(),
                price,
                stock_quantity: stock,
                category: None,
            })
            .await
            .expect("product seed should insert")
    }

    pub async fn seed_customer(&self, name: &str, email: &str) -> CustomerResponse {
        self.state
            .services
            .customers
            .create_customer(CreateCustomerRequest {
                name: name.to_string(),
                email: email.to_string(),
                phone: None,
                address: None,
            })
            .await
            .expect("customer seed should insert")
    }

    pub async fn seed_supplier(&self, name: &str) -> SupplierResponse {
        self.state
            .services
            .suppliers
            .create_supplier(CreateSupplierRequest {
                name: name.to_string(),
                contact_person: None,
                email: None,
                phone: None,
                address: None,
            })
            .await
            .expect("supplier seed should insert")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
