use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::services::reporting::{
    CustomerAnalyticsResponse, InventorySummaryResponse, PurchaseReportResponse, ReportGroupBy,
    SalesDashboardResponse, SalesReportResponse,
};
use crate::{ApiResponse, AppState};

const DEFAULT_DASHBOARD_DAYS: i64 = 30;
const DEFAULT_ANALYTICS_DAYS: i64 = 90;

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub start_date: String,
    pub end_date: String,
}

impl DateRangeParams {
    /// Converts the date strings to an inclusive datetime range covering
    /// both days in full.
    fn to_datetime_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
        let start_date = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid start date format: {}", e)))?;
        let end_date = NaiveDate::parse_from_str(&self.end_date, "%Y-%m-%d")
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid end date format: {}", e)))?;

        let from = start_date.and_time(NaiveTime::MIN).and_utc();
        let to = (end_date + Duration::days(1)).and_time(NaiveTime::MIN).and_utc()
            - Duration::seconds(1);
        Ok((from, to))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupByParams {
    pub group_by: Option<ReportGroupBy>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub days: Option<i64>,
}

/// Generate a sales report over a date range
#[utoipa::path(
    get,
    path = "/api/v1/reports/sales",
    summary = "Sales report",
    description = "Aggregate completed sales into daily, weekly or monthly buckets",
    params(
        ("start_date" = String, Query, description = "Range start (YYYY-MM-DD)"),
        ("end_date" = String, Query, description = "Range end (YYYY-MM-DD)"),
        ("group_by" = Option<String>, Query, description = "daily, weekly or monthly (default: daily)"),
    ),
    responses(
        (status = 200, description = "Report generated successfully", body = ApiResponse<SalesReportResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    Query(range): Query<DateRangeParams>,
    Query(grouping): Query<GroupByParams>,
) -> Result<Json<ApiResponse<SalesReportResponse>>, ServiceError> {
    let (from, to) = range.to_datetime_range()?;
    let report = state
        .services
        .reports
        .sales_report(from, to, grouping.group_by.unwrap_or_default())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Sales dashboard over a rolling window
#[utoipa::path(
    get,
    path = "/api/v1/reports/sales-dashboard",
    summary = "Sales dashboard",
    description = "Daily series, totals and top products over the last N days",
    params(
        ("days" = Option<i64>, Query, description = "Window size in days (default: 30)"),
    ),
    responses(
        (status = 200, description = "Dashboard generated successfully", body = ApiResponse<SalesDashboardResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn sales_dashboard(
    State(state): State<AppState>,
    Query(window): Query<WindowParams>,
) -> Result<Json<ApiResponse<SalesDashboardResponse>>, ServiceError> {
    let report = state
        .services
        .reports
        .sales_dashboard(window.days.unwrap_or(DEFAULT_DASHBOARD_DAYS))
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Inventory snapshot
#[utoipa::path(
    get,
    path = "/api/v1/reports/inventory-summary",
    summary = "Inventory summary",
    description = "Low-stock and out-of-stock lists, total value and category breakdown",
    responses(
        (status = 200, description = "Summary generated successfully", body = ApiResponse<InventorySummaryResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn inventory_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InventorySummaryResponse>>, ServiceError> {
    let report = state.services.reports.inventory_summary().await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Customer analytics over a rolling window
#[utoipa::path(
    get,
    path = "/api/v1/reports/customer-analytics",
    summary = "Customer analytics",
    description = "Recency segmentation, top customers and new-customer counts",
    params(
        ("days" = Option<i64>, Query, description = "Window size in days (default: 90)"),
    ),
    responses(
        (status = 200, description = "Analytics generated successfully", body = ApiResponse<CustomerAnalyticsResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn customer_analytics(
    State(state): State<AppState>,
    Query(window): Query<WindowParams>,
) -> Result<Json<ApiResponse<CustomerAnalyticsResponse>>, ServiceError> {
    let report = state
        .services
        .reports
        .customer_analytics(window.days.unwrap_or(DEFAULT_ANALYTICS_DAYS))
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Generate a purchase report over a date range
#[utoipa::path(
    get,
    path = "/api/v1/reports/purchases",
    summary = "Purchase report",
    description = "Purchase totals, counts per status and top suppliers by spend",
    params(
        ("start_date" = String, Query, description = "Range start (YYYY-MM-DD)"),
        ("end_date" = String, Query, description = "Range end (YYYY-MM-DD)"),
    ),
    responses(
        (status = 200, description = "Report generated successfully", body = ApiResponse<PurchaseReportResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn purchase_report(
    State(state): State<AppState>,
    Query(range): Query<DateRangeParams>,
) -> Result<Json<ApiResponse<PurchaseReportResponse>>, ServiceError> {
    let (from, to) = range.to_datetime_range()?;
    let report = state.services.reports.purchase_report(from, to).await?;
    Ok(Json(ApiResponse::success(report)))
}
