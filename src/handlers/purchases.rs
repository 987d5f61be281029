use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::purchasing::{
    CreatePurchaseRequest, PurchaseDetailResponse, PurchaseFilters, PurchaseResponse,
    ReceivePurchaseRequest, UpdatePurchasePaymentRequest, UpdatePurchaseStatusRequest,
};
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List purchases with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    summary = "List purchases",
    description = "Get a paginated list of purchase orders with optional filtering",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("status" = Option<String>, Query, description = "Filter by purchase status"),
        ("supplier_id" = Option<Uuid>, Query, description = "Filter by supplier ID"),
        ("date_from" = Option<String>, Query, description = "Earliest purchase date (RFC 3339)"),
        ("date_to" = Option<String>, Query, description = "Latest purchase date (RFC 3339)"),
    ),
    responses(
        (status = 200, description = "Purchases retrieved successfully", body = ApiResponse<PaginatedResponse<PurchaseResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filters): Query<PurchaseFilters>,
) -> Result<Json<ApiResponse<PaginatedResponse<PurchaseResponse>>>, ServiceError> {
    let limit = query.limit.clamp(1, u64::from(state.config.api_max_page_size));

    let result = state
        .services
        .purchases
        .list_purchases(query.page, limit, filters)
        .await?;

    let total_pages = (result.total + limit - 1) / limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.purchases,
        total: result.total,
        page: result.page,
        limit,
        total_pages,
    })))
}

/// Create a new purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    summary = "Create purchase",
    description = "Create a purchase order; stock is only booked in on receipt",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Purchase created successfully", body = ApiResponse<PurchaseDetailResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Purchase number conflict", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(request): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PurchaseDetailResponse>>), ServiceError> {
    // Validate the request
    if let Err(validation_errors) = request.validate() {
        let errors: Vec<String> = validation_errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                let field = field.clone();
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    let purchase = state.services.purchases.create_purchase(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(purchase))))
}

/// Get a purchase by ID
#[utoipa::path(
    get,
    path = "/api/v1/purchases/{id}",
    summary = "Get purchase",
    description = "Get a single purchase order with its line items",
    params(
        ("id" = Uuid, Path, description = "Purchase ID"),
    ),
    responses(
        (status = 200, description = "Purchase retrieved successfully", body = ApiResponse<PurchaseDetailResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn get_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PurchaseDetailResponse>>, ServiceError> {
    let purchase = state.services.purchases.get_purchase(id).await?;
    Ok(Json(ApiResponse::success(purchase)))
}

/// Receive a pending purchase
#[utoipa::path(
    post,
    path = "/api/v1/purchases/{id}/receive",
    summary = "Receive purchase",
    description = "Book a pending purchase into stock, optionally overriding received quantities",
    params(
        ("id" = Uuid, Path, description = "Purchase ID"),
    ),
    request_body = ReceivePurchaseRequest,
    responses(
        (status = 200, description = "Purchase received", body = ApiResponse<PurchaseDetailResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Purchase is not pending", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn receive_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReceivePurchaseRequest>,
) -> Result<Json<ApiResponse<PurchaseDetailResponse>>, ServiceError> {
    let purchase = state
        .services
        .purchases
        .receive_purchase(id, request)
        .await?;
    Ok(Json(ApiResponse::success(purchase)))
}

/// Update the status of a purchase
#[utoipa::path(
    put,
    path = "/api/v1/purchases/{id}/status",
    summary = "Update purchase status",
    description = "Write the purchase status directly; no stock movement happens here",
    params(
        ("id" = Uuid, Path, description = "Purchase ID"),
    ),
    request_body = UpdatePurchaseStatusRequest,
    responses(
        (status = 200, description = "Purchase status updated", body = ApiResponse<PurchaseResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn update_purchase_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePurchaseStatusRequest>,
) -> Result<Json<ApiResponse<PurchaseResponse>>, ServiceError> {
    let purchase = state
        .services
        .purchases
        .update_purchase_status(id, request)
        .await?;
    Ok(Json(ApiResponse::success(purchase)))
}

/// Update the payment fields of a purchase
#[utoipa::path(
    put,
    path = "/api/v1/purchases/{id}/payment",
    summary = "Update purchase payment",
    description = "Set the payment status and optionally the payment method",
    params(
        ("id" = Uuid, Path, description = "Purchase ID"),
    ),
    request_body = UpdatePurchasePaymentRequest,
    responses(
        (status = 200, description = "Purchase payment updated", body = ApiResponse<PurchaseResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn update_purchase_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePurchasePaymentRequest>,
) -> Result<Json<ApiResponse<PurchaseResponse>>, ServiceError> {
    let purchase = state
        .services
        .purchases
        .update_purchase_payment(id, request)
        .await?;
    Ok(Json(ApiResponse::success(purchase)))
}
