use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::suppliers::{CreateSupplierRequest, SupplierFilters, SupplierResponse};
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List suppliers with pagination
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    summary = "List suppliers",
    description = "Get a paginated list of suppliers",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("active_only" = Option<bool>, Query, description = "Only active suppliers (default: true)"),
    ),
    responses(
        (status = 200, description = "Suppliers retrieved successfully", body = ApiResponse<PaginatedResponse<SupplierResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filters): Query<SupplierFilters>,
) -> Result<Json<ApiResponse<PaginatedResponse<SupplierResponse>>>, ServiceError> {
    let limit = query.limit.clamp(1, u64::from(state.config.api_max_page_size));

    let result = state
        .services
        .suppliers
        .list_suppliers(query.page, limit, filters)
        .await?;

    let total_pages = (result.total + limit - 1) / limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.suppliers,
        total: result.total,
        page: result.page,
        limit,
        total_pages,
    })))
}

/// Create a new supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    summary = "Create supplier",
    description = "Register a supplier",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created successfully", body = ApiResponse<SupplierResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SupplierResponse>>), ServiceError> {
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

    let supplier = state.services.suppliers.create_supplier(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(supplier))))
}

/// Get a supplier by ID
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    summary = "Get supplier",
    description = "Get a single supplier",
    params(
        ("id" = Uuid, Path, description = "Supplier ID"),
    ),
    responses(
        (status = 200, description = "Supplier retrieved successfully", body = ApiResponse<SupplierResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SupplierResponse>>, ServiceError> {
    let supplier = state.services.suppliers.get_supplier(id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}
