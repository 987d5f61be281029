use chrono::{DateTime, Utc};
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
use crate::entities::purchase::{self, PaymentStatus, PurchaseStatus};
use crate::entities::{product, purchase_item, supplier};
use crate::errors::{is_unique_violation, ServiceError};
use crate::events::{Event, EventSender};
use crate::services::inventory::adjust_stock_level;
use crate::services::numbering::{self, MAX_NUMBER_ATTEMPTS};
use crate::services::sales::product_name_map;
use crate::services::totals::{self, LineAmounts};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePurchaseItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Purchase cost per unit; there is no list-price fallback.
    pub unit_price: Decimal,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePurchaseRequest {
    pub supplier_id: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<CreatePurchaseItemRequest>,
    pub tax_rate: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    #[validate(length(max = 20, message = "Payment method cannot exceed 20 characters"))]
    pub payment_method: Option<String>,
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReceivePurchaseItem {
    pub product_id: Uuid,
    #[validate(range(min = 0, message = "Received quantity cannot be negative"))]
    pub quantity: i32,
}

/// Receipt confirmation. Items present here override the ordered quantity
/// for the matching product; everything else books in as ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReceivePurchaseRequest {
    pub items: Option<Vec<ReceivePurchaseItem>>,
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePurchaseStatusRequest {
    pub status: PurchaseStatus,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePurchasePaymentRequest {
    pub payment_status: PaymentStatus,
    #[validate(length(max = 20, message = "Payment method cannot exceed 20 characters"))]
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub id: Uuid,
    pub purchase_number: String,
    pub supplier_id: Uuid,
    pub supplier_name: Option<String>,
    pub status: PurchaseStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub net_amount: Decimal,
    pub notes: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub received_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseDetailResponse {
    pub id: Uuid,
    pub purchase_number: String,
    pub supplier_id: Uuid,
    pub supplier_name: Option<String>,
    pub status: PurchaseStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub net_amount: Decimal,
    pub notes: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub received_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<PurchaseItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct PurchaseFilters {
    pub status: Option<PurchaseStatus>,
    pub supplier_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Orchestrates the purchase lifecycle. Stock moves only in the receive
/// flow; creation and plain status writes never touch it.
#[derive(Clone)]
pub struct PurchaseService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl PurchaseService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a purchase order with its items in one transaction. No stock
    /// check or movement happens here. Number collisions are retried like
    /// sale numbers.
    #[instrument(skip(self, request), fields(supplier_id = %request.supplier_id, item_count = request.items.len()))]
    pub async fn create_purchase(
        &self,
        request: CreatePurchaseRequest,
    ) -> Result<PurchaseDetailResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for item in &request.items {
            item.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        }

        let mut attempt = 1;
        loop {
            match self.try_create_purchase(&request).await {
                Err(ServiceError::Conflict(message)) if attempt < MAX_NUMBER_ATTEMPTS => {
                    warn!(attempt, %message, "Purchase number collision, retrying with a fresh number");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_create_purchase(
        &self,
        request: &CreatePurchaseRequest,
    ) -> Result<PurchaseDetailResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let purchase_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let supplier_row = supplier::Entity::find_by_id(request.supplier_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Supplier not found".to_string()))?;

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

            let discount = item.discount.unwrap_or(Decimal::ZERO);
            let total_price = totals::line_total(item.unit_price, item.quantity, discount);
            let item_id = Uuid::new_v4();

            lines.push(LineAmounts {
                unit_price: item.unit_price,
                quantity: item.quantity,
                discount,
            });
            item_models.push(purchase_item::ActiveModel {
                id: Set(item_id),
                purchase_id: Set(purchase_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                discount: Set(discount),
                total_price: Set(total_price),
            });
            item_responses.push(PurchaseItemResponse {
                id: item_id,
                product_id: item.product_id,
                product_name: Some(item_product.name.clone()),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount,
                total_price,
            });
        }

        let document_totals = totals::document_totals(&lines, request.tax_rate);
        let purchase_number = numbering::next_purchase_number(&txn, now).await?;

        let purchase_model = purchase::ActiveModel {
            id: Set(purchase_id),
            purchase_number: Set(purchase_number.clone()),
            supplier_id: Set(request.supplier_id),
            status: Set(PurchaseStatus::Pending),
            payment_status: Set(request.payment_status.unwrap_or(PaymentStatus::Pending)),
            payment_method: Set(request.payment_method.clone()),
            total_amount: Set(document_totals.subtotal),
            discount_amount: Set(document_totals.discount_amount),
            tax_amount: Set(document_totals.tax_amount),
            net_amount: Set(document_totals.net_amount),
            notes: Set(request.notes.clone()),
            purchase_date: Set(now),
            received_date: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let purchase_row = purchase_model.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict(format!(
                    "Purchase number {} already exists",
                    purchase_number
                ))
            } else {
                error!(error = %e, purchase_id = %purchase_id, "Failed to insert purchase");
                ServiceError::db_error(e)
            }
        })?;

        purchase_item::Entity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            purchase_id = %purchase_id,
            purchase_number = %purchase_number,
            net_amount = %purchase_row.net_amount,
            "Purchase created"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::PurchaseCreated(purchase_id)).await {
                warn!(error = %e, purchase_id = %purchase_id, "Failed to send purchase created event");
            }
        }

        Ok(detail_response(
            purchase_row,
            Some(supplier_row.name),
            item_responses,
        ))
    }

    /// Books a pending purchase into stock. Every original item is
    /// incremented by the caller-supplied quantity when one is given for
    /// that product, otherwise by the ordered quantity. The Pending guard
    /// is the sole re-entrancy protection: a Received or Cancelled purchase
    /// is rejected before any stock moves.
    #[instrument(skip(self, request), fields(purchase_id = %purchase_id))]
    pub async fn receive_purchase(
        &self,
        purchase_id: Uuid,
        request: ReceivePurchaseRequest,
    ) -> Result<PurchaseDetailResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if let Some(items) = &request.items {
            for item in items {
                item.validate()
                    .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
            }
        }

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let purchase_row = purchase::Entity::find_by_id(purchase_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Purchase not found".to_string()))?;

        if purchase_row.status != PurchaseStatus::Pending {
            return Err(ServiceError::InvalidState(
                "Only pending purchases can be received.".to_string(),
            ));
        }

        let items = purchase_item::Entity::find()
            .filter(purchase_item::Column::PurchaseId.eq(purchase_id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let overrides: HashMap<Uuid, i32> = request
            .items
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|i| (i.product_id, i.quantity))
            .collect();

        for item in &items {
            let received = overrides.get(&item.product_id).copied().unwrap_or(item.quantity);
            adjust_stock_level(&txn, item.product_id, received).await?;
        }

        let existing_notes = purchase_row.notes.clone();
        let mut active: purchase::ActiveModel = purchase_row.into();
        active.status = Set(PurchaseStatus::Received);
        active.received_date = Set(Some(now));
        if let Some(notes) = request.notes.as_deref() {
            if !notes.is_empty() {
                active.notes = Set(Some(format!(
                    "{}\nReceived: {}",
                    existing_notes.unwrap_or_default(),
                    notes
                )));
            }
        }

        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            purchase_id = %purchase_id,
            items = items.len(),
            "Purchase received, stock booked in"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::PurchaseReceived(purchase_id)).await {
                warn!(error = %e, purchase_id = %purchase_id, "Failed to send purchase received event");
            }
        }

        let supplier_name = supplier::Entity::find_by_id(updated.supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|s| s.name);

        let product_names = product_name_map(db, items.iter().map(|i| i.product_id)).await?;
        let item_responses = items
            .into_iter()
            .map(|item| PurchaseItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: product_names.get(&item.product_id).cloned(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount: item.discount,
                total_price: item.total_price,
            })
            .collect();

        Ok(detail_response(updated, supplier_name, item_responses))
    }

    /// Retrieves a purchase with its items.
    #[instrument(skip(self), fields(purchase_id = %purchase_id))]
    pub async fn get_purchase(
        &self,
        purchase_id: Uuid,
    ) -> Result<PurchaseDetailResponse, ServiceError> {
        let db = &*self.db_pool;

        let purchase_row = purchase::Entity::find_by_id(purchase_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Purchase not found".to_string()))?;

        let supplier_name = supplier::Entity::find_by_id(purchase_row.supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|s| s.name);

        let items = purchase_item::Entity::find()
            .filter(purchase_item::Column::PurchaseId.eq(purchase_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let product_names = product_name_map(db, items.iter().map(|i| i.product_id)).await?;

        let item_responses = items
            .into_iter()
            .map(|item| PurchaseItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: product_names.get(&item.product_id).cloned(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount: item.discount,
                total_price: item.total_price,
            })
            .collect();

        Ok(detail_response(purchase_row, supplier_name, item_responses))
    }

    /// Lists purchases with pagination and optional filters.
    #[instrument(skip(self))]
    pub async fn list_purchases(
        &self,
        page: u64,
        per_page: u64,
        filters: PurchaseFilters,
    ) -> Result<PurchaseListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = purchase::Entity::find();
        if let Some(status) = filters.status {
            query = query.filter(purchase::Column::Status.eq(status));
        }
        if let Some(supplier_id) = filters.supplier_id {
            query = query.filter(purchase::Column::SupplierId.eq(supplier_id));
        }
        if let Some(from) = filters.date_from {
            query = query.filter(purchase::Column::PurchaseDate.gte(from));
        }
        if let Some(to) = filters.date_to {
            query = query.filter(purchase::Column::PurchaseDate.lte(to));
        }

        let paginator = query
            .order_by_desc(purchase::Column::PurchaseDate)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let purchases = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        let supplier_names =
            supplier_name_map(db, purchases.iter().map(|p| p.supplier_id)).await?;

        let purchase_responses = purchases
            .into_iter()
            .map(|p| {
                let supplier_name = supplier_names.get(&p.supplier_id).cloned();
                header_response(p, supplier_name)
            })
            .collect();

        Ok(PurchaseListResponse {
            purchases: purchase_responses,
            total,
            page,
            per_page,
        })
    }

    /// Writes the given status without transition rules or stock effects.
    /// Setting Received here does not book stock in; only the receive flow
    /// does that.
    #[instrument(skip(self, request), fields(purchase_id = %purchase_id, new_status = %request.status))]
    pub async fn update_purchase_status(
        &self,
        purchase_id: Uuid,
        request: UpdatePurchaseStatusRequest,
    ) -> Result<PurchaseResponse, ServiceError> {
        let db = &*self.db_pool;

        let purchase_row = purchase::Entity::find_by_id(purchase_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Purchase not found".to_string()))?;

        let old_status = purchase_row.status;
        let new_status = request.status;

        let mut active: purchase::ActiveModel = purchase_row.into();
        active.status = Set(new_status);
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(
            purchase_id = %purchase_id,
            old_status = %old_status,
            new_status = %new_status,
            "Purchase status updated"
        );

        if old_status != new_status {
            if let Some(event_sender) = &self.event_sender {
                if let Err(e) = event_sender
                    .send(Event::PurchaseStatusChanged {
                        purchase_id,
                        old_status: old_status.to_string(),
                        new_status: new_status.to_string(),
                    })
                    .await
                {
                    warn!(error = %e, purchase_id = %purchase_id, "Failed to send purchase status event");
                }
            }
        }

        Ok(header_response(updated, None))
    }

    /// Updates payment fields only.
    #[instrument(skip(self, request), fields(purchase_id = %purchase_id))]
    pub async fn update_purchase_payment(
        &self,
        purchase_id: Uuid,
        request: UpdatePurchasePaymentRequest,
    ) -> Result<PurchaseResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let purchase_row = purchase::Entity::find_by_id(purchase_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Purchase not found".to_string()))?;

        let mut active: purchase::ActiveModel = purchase_row.into();
        active.payment_status = Set(request.payment_status);
        if let Some(method) = request.payment_method {
            active.payment_method = Set(Some(method));
        }

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(
            purchase_id = %purchase_id,
            payment_status = %updated.payment_status,
            "Purchase payment updated"
        );

        Ok(header_response(updated, None))
    }
}

fn header_response(model: purchase::Model, supplier_name: Option<String>) -> PurchaseResponse {
    PurchaseResponse {
        id: model.id,
        purchase_number: model.purchase_number,
        supplier_id: model.supplier_id,
        supplier_name,
        status: model.status,
        payment_status: model.payment_status,
        payment_method: model.payment_method,
        total_amount: model.total_amount,
        discount_amount: model.discount_amount,
        tax_amount: model.tax_amount,
        net_amount: model.net_amount,
        notes: model.notes,
        purchase_date: model.purchase_date,
        received_date: model.received_date,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn detail_response(
    model: purchase::Model,
    supplier_name: Option<String>,
    items: Vec<PurchaseItemResponse>,
) -> PurchaseDetailResponse {
    PurchaseDetailResponse {
        id: model.id,
        purchase_number: model.purchase_number,
        supplier_id: model.supplier_id,
        supplier_name,
        status: model.status,
        payment_status: model.payment_status,
        payment_method: model.payment_method,
        total_amount: model.total_amount,
        discount_amount: model.discount_amount,
        tax_amount: model.tax_amount,
        net_amount: model.net_amount,
        notes: model.notes,
        purchase_date: model.purchase_date,
        received_date: model.received_date,
        created_at: model.created_at,
        updated_at: model.updated_at,
        items,
    }
}

async fn supplier_name_map<C: sea_orm::ConnectionTrait>(
    db: &C,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let ids: Vec<Uuid> = ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(supplier::Entity::find()
        .filter(supplier::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect())
}
