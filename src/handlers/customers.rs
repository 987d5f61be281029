use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::customers::{
    CreateCustomerRequest, CustomerFilters, CustomerResponse, CustomerSummaryResponse,
    UpdateCustomerRequest,
};
use crate::services::sales::SaleResponse;
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List customers with pagination and search
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    summary = "List customers",
    description = "Get a paginated list of customers; search matches name or email",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("search" = Option<String>, Query, description = "Search term"),
    ),
    responses(
        (status = 200, description = "Customers retrieved successfully", body = ApiResponse<PaginatedResponse<CustomerResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filters): Query<CustomerFilters>,
) -> Result<Json<ApiResponse<PaginatedResponse<CustomerResponse>>>, ServiceError> {
    let limit = query.limit.clamp(1, u64::from(state.config.api_max_page_size));

    let result = state
        .services
        .customers
        .list_customers(query.page, limit, filters)
        .await?;

    let total_pages = (result.total + limit - 1) / limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.customers,
        total: result.total,
        page: result.page,
        limit,
        total_pages,
    })))
}

/// Create a new customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    summary = "Create customer",
    description = "Register a customer with a unique email",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created successfully", body = ApiResponse<CustomerResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerResponse>>), ServiceError> {
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

    let customer = state.services.customers.create_customer(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

/// Get a customer by ID
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    summary = "Get customer",
    description = "Get a single customer",
    params(
        ("id" = Uuid, Path, description = "Customer ID"),
    ),
    responses(
        (status = 200, description = "Customer retrieved successfully", body = ApiResponse<CustomerResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    summary = "Update customer",
    description = "Update customer fields; email uniqueness is re-checked",
    params(
        ("id" = Uuid, Path, description = "Customer ID"),
    ),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated successfully", body = ApiResponse<CustomerResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    let customer = state
        .services
        .customers
        .update_customer(id, request)
        .await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Delete a customer
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    summary = "Delete customer",
    description = "Remove a customer; customers referenced by sales are deactivated instead",
    params(
        ("id" = Uuid, Path, description = "Customer ID"),
    ),
    responses(
        (status = 200, description = "Customer deleted or deactivated", body = ApiResponse<serde_json::Value>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.customers.delete_customer(id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// Get a customer's purchase history rollup
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/summary",
    summary = "Customer summary",
    description = "Sale count, lifetime value over completed sales, and first/last sale dates",
    params(
        ("id" = Uuid, Path, description = "Customer ID"),
    ),
    responses(
        (status = 200, description = "Summary retrieved successfully", body = ApiResponse<CustomerSummaryResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn customer_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerSummaryResponse>>, ServiceError> {
    let summary = state.services.customers.customer_summary(id).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// List a customer's sales
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/sales",
    summary = "List customer sales",
    description = "Get the customer's sales, newest first",
    params(
        ("id" = Uuid, Path, description = "Customer ID"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Sales retrieved successfully", body = ApiResponse<PaginatedResponse<SaleResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn list_customer_sales(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<SaleResponse>>>, ServiceError> {
    let limit = query.limit.clamp(1, u64::from(state.config.api_max_page_size));

    let result = state
        .services
        .customers
        .list_customer_sales(id, query.page, limit)
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
