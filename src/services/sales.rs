use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::sale::{self, PaymentStatus, SaleStatus};
use crate::entities::{customer, product, sale_item};
use crate::errors::{is_unique_violation, ServiceError};
use crate::events::{Event, EventSender};
use crate::services::inventory::adjust_stock_level;
use crate::services::numbering::{self, MAX_NUMBER_ATTEMPTS};
use crate::services::totals::{self, LineAmounts};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateSaleItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Defaults to the product's list price when omitted.
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateSaleRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<CreateSaleItemRequest>,
    /// Applied to the subtotal; omitted means no tax.
    pub tax_rate: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    #[validate(length(max = 20, message = "Payment method cannot exceed 20 characters"))]
    pub payment_method: Option<String>,
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateSaleStatusRequest {
    pub status: SaleStatus,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateSalePaymentRequest {
    pub payment_status: PaymentStatus,
    #[validate(length(max = 20, message = "Payment method cannot exceed 20 characters"))]
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleResponse {
    pub id: Uuid,
    pub sale_number: String,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub net_amount: Decimal,
    pub notes: Option<String>,
    pub sale_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleDetailResponse {
    pub id: Uuid,
    pub sale_number: String,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub net_amount: Decimal,
    pub notes: Option<String>,
    pub sale_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<SaleItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaleListResponse {
    pub sales: Vec<SaleResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct SaleFilters {
    pub status: Option<SaleStatus>,
    pub customer_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Rolling counters for the sales screen.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummaryResponse {
    pub today_sales: Decimal,
    pub month_sales: Decimal,
    pub year_sales: Decimal,
    pub today_orders: u64,
    pub pending_orders: u64,
    pub generated_at: DateTime<Utc>,
}

/// Orchestrates the sale lifecycle: creation with stock decrement, status
/// transitions with stock restoration on cancel, payment updates.
#[derive(Clone)]
pub struct SaleService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SaleService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a sale with its items, decrementing stock per item, in one
    /// transaction. A race on the generated sale number rolls the whole
    /// transaction back and retries with a fresh number.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, item_count = request.items.len()))]
    pub async fn create_sale(
        &self,
        request: CreateSaleRequest,
    ) -> Result<SaleDetailResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for item in &request.items {
            item.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        }

        let mut attempt = 1;
        loop {
            match self.try_create_sale(&request).await {
                Err(ServiceError::Conflict(message)) if attempt < MAX_NUMBER_ATTEMPTS => {
                    warn!(attempt, %message, "Sale number collision, retrying with a fresh number");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_create_sale(
        &self,
        request: &CreateSaleRequest,
    ) -> Result<SaleDetailResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let sale_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        let product_ids: Vec<Uuid> = request.items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .filter(product::Column::IsActive.eq(true))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        if request
            .items
            .iter()
            .any(|i| !products.contains_key(&i.product_id))
        {
            return Err(ServiceError::InvalidReference(
                "One or more products not found or inactive.".to_string(),
            ));
        }

        let mut lines = Vec::with_capacity(request.items.len());
        let mut item_models = Vec::with_capacity(request.items.len());
        let mut item_responses = Vec::with_capacity(request.items.len());

        for item in &request.items {
            let item_product = products.get(&item.product_id).ok_or_else(|| {
                ServiceError::InvalidReference(
                    "One or more products not found or inactive.".to_string(),
                )
            })?;

            // The guarded decrement doubles as the availability check.
            adjust_stock_level(&txn, item.product_id, -item.quantity).await?;

            let unit_price = item.unit_price.unwrap_or(item_product.price);
            let discount = item.discount.unwrap_or(Decimal::ZERO);
            let total_price = totals::line_total(unit_price, item.quantity, discount);
            let item_id = Uuid::new_v4();

            lines.push(LineAmounts {
                unit_price,
                quantity: item.quantity,
                discount,
            });
            item_models.push(sale_item::ActiveModel {
                id: Set(item_id),
                sale_id: Set(sale_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(unit_price),
                discount: Set(discount),
                total_price: Set(total_price),
            });
            item_responses.push(SaleItemResponse {
                id: item_id,
                product_id: item.product_id,
                product_name: Some(item_product.name.clone()),
                quantity: item.quantity,
                unit_price,
                discount,
                total_price,
            });
        }

        let document_totals = totals::document_totals(&lines, request.tax_rate);
        let sale_number = numbering::next_sale_number(&txn, now).await?;

        let sale_model = sale::ActiveModel {
            id: Set(sale_id),
            sale_number: Set(sale_number.clone()),
            customer_id: Set(request.customer_id),
            status: Set(SaleStatus::Pending),
            payment_status: Set(request.payment_status.unwrap_or(PaymentStatus::Pending)),
            payment_method: Set(request.payment_method.clone()),
            total_amount: Set(document_totals.subtotal),
            discount_amount: Set(document_totals.discount_amount),
            tax_amount: Set(document_totals.tax_amount),
            net_amount: Set(document_totals.net_amount),
            notes: Set(request.notes.clone()),
            sale_date: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let sale_row = sale_model.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict(format!("Sale number {} already exists", sale_number))
            } else {
                error!(error = %e, sale_id = %sale_id, "Failed to insert sale");
                ServiceError::db_error(e)
            }
        })?;

        sale_item::Entity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            sale_id = %sale_id,
            sale_number = %sale_number,
            net_amount = %sale_row.net_amount,
            "Sale created"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::SaleCreated(sale_id)).await {
                warn!(error = %e, sale_id = %sale_id, "Failed to send sale created event");
            }
        }

        Ok(detail_response(
            sale_row,
            Some(customer.name),
            item_responses,
        ))
    }

    /// Retrieves a sale with its items.
    #[instrument(skip(self), fields(sale_id = %sale_id))]
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<SaleDetailResponse, ServiceError> {
        let db = &*self.db_pool;

        let sale_row = sale::Entity::find_by_id(sale_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Sale not found".to_string()))?;

        let customer_name = customer::Entity::find_by_id(sale_row.customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|c| c.name);

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let product_names = product_name_map(db, items.iter().map(|i| i.product_id)).await?;

        let item_responses = items
            .into_iter()
            .map(|item| SaleItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: product_names.get(&item.product_id).cloned(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount: item.discount,
                total_price: item.total_price,
            })
            .collect();

        Ok(detail_response(sale_row, customer_name, item_responses))
    }

    /// Lists sales with pagination and optional status/customer/date filters.
    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        page: u64,
        per_page: u64,
        filters: SaleFilters,
    ) -> Result<SaleListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = sale::Entity::find();
        if let Some(status) = filters.status {
            query = query.filter(sale::Column::Status.eq(status));
        }
        if let Some(customer_id) = filters.customer_id {
            query = query.filter(sale::Column::CustomerId.eq(customer_id));
        }
        if let Some(from) = filters.date_from {
            query = query.filter(sale::Column::SaleDate.gte(from));
        }
        if let Some(to) = filters.date_to {
            query = query.filter(sale::Column::SaleDate.lte(to));
        }

        let paginator = query
            .order_by_desc(sale::Column::SaleDate)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let sales = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        let customer_names =
            customer_name_map(db, sales.iter().map(|s| s.customer_id)).await?;

        let sale_responses = sales
            .into_iter()
            .map(|s| {
                let customer_name = customer_names.get(&s.customer_id).cloned();
                header_response(s, customer_name)
            })
            .collect();

        Ok(SaleListResponse {
            sales: sale_responses,
            total,
            page,
            per_page,
        })
    }

    /// Applies a status transition. Moving into Cancelled from any other
    /// state restores stock for every item in the same transaction as the
    /// status write; writing the current status back is an accepted no-op,
    /// so a second cancellation never restores twice. Leaving Cancelled is
    /// rejected.
    #[instrument(skip(self, request), fields(sale_id = %sale_id, new_status = %request.status))]
    pub async fn update_sale_status(
        &self,
        sale_id: Uuid,
        request: UpdateSaleStatusRequest,
    ) -> Result<SaleResponse, ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let sale_row = sale::Entity::find_by_id(sale_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Sale not found".to_string()))?;

        let old_status = sale_row.status;
        let new_status = request.status;

        if old_status != new_status {
            match (old_status, new_status) {
                (SaleStatus::Cancelled, _) => {
                    return Err(ServiceError::InvalidState(
                        "Cannot change the status of a cancelled sale".to_string(),
                    ));
                }
                (SaleStatus::Completed, SaleStatus::Pending) => {
                    return Err(ServiceError::InvalidState(
                        "Cannot move a completed sale back to pending".to_string(),
                    ));
                }
                _ => {}
            }
        }

        let restores_stock = new_status == SaleStatus::Cancelled && old_status != new_status;
        if restores_stock {
            let items = sale_item::Entity::find()
                .filter(sale_item::Column::SaleId.eq(sale_id))
                .all(&txn)
                .await
                .map_err(ServiceError::db_error)?;

            for item in &items {
                adjust_stock_level(&txn, item.product_id, item.quantity).await?;
            }
            info!(sale_id = %sale_id, items = items.len(), "Restored stock for cancelled sale");
        }

        let mut active: sale::ActiveModel = sale_row.into();
        active.status = Set(new_status);
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            sale_id = %sale_id,
            old_status = %old_status,
            new_status = %new_status,
            "Sale status updated"
        );

        if old_status != new_status {
            if let Some(event_sender) = &self.event_sender {
                if let Err(e) = event_sender
                    .send(Event::SaleStatusChanged {
                        sale_id,
                        old_status: old_status.to_string(),
                        new_status: new_status.to_string(),
                    })
                    .await
                {
                    warn!(error = %e, sale_id = %sale_id, "Failed to send sale status event");
                }
                if restores_stock {
                    if let Err(e) = event_sender.send(Event::SaleCancelled(sale_id)).await {
                        warn!(error = %e, sale_id = %sale_id, "Failed to send sale cancelled event");
                    }
                }
            }
        }

        Ok(header_response(updated, None))
    }

    /// Updates payment fields only; no transition rules apply.
    #[instrument(skip(self, request), fields(sale_id = %sale_id))]
    pub async fn update_sale_payment(
        &self,
        sale_id: Uuid,
        request: UpdateSalePaymentRequest,
    ) -> Result<SaleResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let sale_row = sale::Entity::find_by_id(sale_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Sale not found".to_string()))?;

        let mut active: sale::ActiveModel = sale_row.into();
        active.payment_status = Set(request.payment_status);
        if let Some(method) = request.payment_method {
            active.payment_method = Set(Some(method));
        }

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(sale_id = %sale_id, payment_status = %updated.payment_status, "Sale payment updated");

        Ok(header_response(updated, None))
    }

    /// Completed revenue since midnight, month start and year start, plus
    /// today's order count across all statuses and the number of sales
    /// still pending.
    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> Result<DashboardSummaryResponse, ServiceError> {
        let db = &*self.db_pool;

        let now = Utc::now();
        let today = now.date_naive();
        let today_start = day_start(today);
        let month_start = day_start(today.with_day(1).unwrap_or(today));
        let year_start = day_start(today.with_ordinal(1).unwrap_or(today));

        let sales = sale::Entity::find()
            .filter(sale::Column::SaleDate.gte(year_start))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut today_sales = Decimal::ZERO;
        let mut month_sales = Decimal::ZERO;
        let mut year_sales = Decimal::ZERO;
        let mut today_orders = 0u64;
        for sale_row in &sales {
            if sale_row.sale_date >= today_start {
                today_orders += 1;
            }
            if sale_row.status != SaleStatus::Completed {
                continue;
            }
            year_sales += sale_row.net_amount;
            if sale_row.sale_date >= month_start {
                month_sales += sale_row.net_amount;
            }
            if sale_row.sale_date >= today_start {
                today_sales += sale_row.net_amount;
            }
        }

        // Pending count is all-time, not bounded to the current year.
        let pending_orders = sale::Entity::find()
            .filter(sale::Column::Status.eq(SaleStatus::Pending))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(DashboardSummaryResponse {
            today_sales,
            month_sales,
            year_sales,
            today_orders,
            pending_orders,
            generated_at: now,
        })
    }
}

pub(crate) fn header_response(model: sale::Model, customer_name: Option<String>) -> SaleResponse {
    SaleResponse {
        id: model.id,
        sale_number: model.sale_number,
        customer_id: model.customer_id,
        customer_name,
        status: model.status,
        payment_status: model.payment_status,
        payment_method: model.payment_method,
        total_amount: model.total_amount,
        discount_amount: model.discount_amount,
        tax_amount: model.tax_amount,
        net_amount: model.net_amount,
        notes: model.notes,
        sale_date: model.sale_date,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn detail_response(
    model: sale::Model,
    customer_name: Option<String>,
    items: Vec<SaleItemResponse>,
) -> SaleDetailResponse {
    SaleDetailResponse {
        id: model.id,
        sale_number: model.sale_number,
        customer_id: model.customer_id,
        customer_name,
        status: model.status,
        payment_status: model.payment_status,
        payment_method: model.payment_method,
        total_amount: model.total_amount,
        discount_amount: model.discount_amount,
        tax_amount: model.tax_amount,
        net_amount: model.net_amount,
        notes: model.notes,
        sale_date: model.sale_date,
        created_at: model.created_at,
        updated_at: model.updated_at,
        items,
    }
}

/// Batch-resolves product names for line responses.
pub(crate) async fn product_name_map<C: sea_orm::ConnectionTrait>(
    db: &C,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let ids: Vec<Uuid> = ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(product::Entity::find()
        .filter(product::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

async fn customer_name_map<C: sea_orm::ConnectionTrait>(
    db: &C,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let ids: Vec<Uuid> = ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(customer::Entity::find()
        .filter(customer::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
