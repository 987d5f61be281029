use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::sales::{
    CreateSaleRequest, DashboardSummaryResponse, SaleDetailResponse, SaleFilters, SaleResponse,
    UpdateSalePaymentRequest, UpdateSaleStatusRequest,
};
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List sales with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/sales",
    summary = "List sales",
    description = "Get a paginated list of sales with optional filtering",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("status" = Option<String>, Query, description = "Filter by sale status"),
        ("customer_id" = Option<Uuid>, Query, description = "Filter by customer ID"),
        ("date_from" = Option<String>, Query, description = "Earliest sale date (RFC 3339)"),
        ("date_to" = Option<String>, Query, description = "Latest sale date (RFC 3339)"),
    ),
    responses(
        (status = 200, description = "Sales retrieved successfully", body = ApiResponse<PaginatedResponse<SaleResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filters): Query<SaleFilters>,
) -> Result<Json<ApiResponse<PaginatedResponse<SaleResponse>>>, ServiceError> {
    let limit = query.limit.clamp(1, u64::from(state.config.api_max_page_size));

    let result = state
        .services
        .sales
        .list_sales(query.page, limit, filters)
        .await?;

    let total_pages = (result.total + limit - 1) / limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.sales,
        total: result.total,
        page: result.page,
        limit,
        total_pages,
    })))
}

/// Create a new sale
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    summary = "Create sale",
    description = "Create a sale, decrementing stock for every line atomically",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale created successfully", body = ApiResponse<SaleDetailResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Sale number conflict", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    Json(request): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SaleDetailResponse>>), ServiceError> {
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

    let sale = state.services.sales.create_sale(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(sale))))
}

/// Get a sale by ID
#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    summary = "Get sale",
    description = "Get a single sale with its line items",
    params(
        ("id" = Uuid, Path, description = "Sale ID"),
    ),
    responses(
        (status = 200, description = "Sale retrieved successfully", body = ApiResponse<SaleDetailResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SaleDetailResponse>>, ServiceError> {
    let sale = state.services.sales.get_sale(id).await?;
    Ok(Json(ApiResponse::success(sale)))
}

/// Update the status of a sale
#[utoipa::path(
    put,
    path = "/api/v1/sales/{id}/status",
    summary = "Update sale status",
    description = "Move a sale through its lifecycle; cancelling restores stock",
    params(
        ("id" = Uuid, Path, description = "Sale ID"),
    ),
    request_body = UpdateSaleStatusRequest,
    responses(
        (status = 200, description = "Sale status updated", body = ApiResponse<SaleResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid status transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn update_sale_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSaleStatusRequest>,
) -> Result<Json<ApiResponse<SaleResponse>>, ServiceError> {
    let sale = state.services.sales.update_sale_status(id, request).await?;
    Ok(Json(ApiResponse::success(sale)))
}

/// Update the payment fields of a sale
#[utoipa::path(
    put,
    path = "/api/v1/sales/{id}/payment",
    summary = "Update sale payment",
    description = "Set the payment status and optionally the payment method",
    params(
        ("id" = Uuid, Path, description = "Sale ID"),
    ),
    request_body = UpdateSalePaymentRequest,
    responses(
        (status = 200, description = "Sale payment updated", body = ApiResponse<SaleResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn update_sale_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSalePaymentRequest>,
) -> Result<Json<ApiResponse<SaleResponse>>, ServiceError> {
    let sale = state
        .services
        .sales
        .update_sale_payment(id, request)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

/// Sales dashboard counters
#[utoipa::path(
    get,
    path = "/api/v1/sales/dashboard",
    summary = "Sales dashboard",
    description = "Completed revenue for today, this month and this year, plus open order counts",
    responses(
        (status = 200, description = "Dashboard retrieved successfully", body = ApiResponse<DashboardSummaryResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "sales"
)]
pub async fn dashboard_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardSummaryResponse>>, ServiceError> {
    let summary = state.services.sales.dashboard_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}
