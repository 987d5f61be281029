use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::db::DbPool;
use crate::entities::product;
use crate::errors::{is_unique_violation, ServiceError};
use crate::events::{Event, EventSender};

fn validate_decimal_min_zero(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("decimal_min_zero"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "SKU must be between 1 and 100 characters"))]
    pub sku: String,
    #[validate(custom = "validate_decimal_min_zero")]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    pub stock_quantity: i32,
    #[validate(length(max = 50, message = "Category cannot exceed 50 characters"))]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "SKU must be between 1 and 100 characters"))]
    pub sku: Option<String>,
    #[validate(custom = "validate_decimal_min_zero")]
    pub price: Option<Decimal>,
    #[validate(length(max = 50, message = "Category cannot exceed 50 characters"))]
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            sku: model.sku,
            price: model.price,
            stock_quantity: model.stock_quantity,
            category: model.category,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct ProductFilters {
    /// Matches name, SKU or description.
    pub search: Option<String>,
    pub category: Option<String>,
    /// Defaults to true; pass false to include deactivated products.
    pub active_only: Option<bool>,
}

#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let product_id = Uuid::new_v4();

        let model = product::ActiveModel {
            id: Set(product_id),
            name: Set(request.name),
            description: Set(request.description),
            sku: Set(request.sku),
            price: Set(request.price),
            stock_quantity: Set(request.stock_quantity),
            category: Set(request.category),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let created = model.insert(db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("A product with this SKU already exists.".to_string())
            } else {
                ServiceError::db_error(e)
            }
        })?;

        info!(product_id = %created.id, sku = %created.sku, "Product created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ProductCreated(created.id)).await {
                warn!(error = %e, product_id = %created.id, "Failed to send product created event");
            }
        }

        Ok(created.into())
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let existing = product::Entity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(sku) = request.sku {
            active.sku = Set(sku);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(category) = request.category {
            active.category = Set(Some(category));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("A product with this SKU already exists.".to_string())
            } else {
                ServiceError::db_error(e)
            }
        })?;

        info!(product_id = %updated.id, "Product updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ProductUpdated(updated.id)).await {
                warn!(error = %e, product_id = %updated.id, "Failed to send product updated event");
            }
        }

        Ok(updated.into())
    }

    /// Deactivates the product. Historical sale and purchase lines keep
    /// referencing it, so rows are never removed.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let existing = product::Entity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let mut active: product::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.update(db).await.map_err(ServiceError::db_error)?;

        info!(product_id = %product_id, "Product deactivated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ProductDeleted(product_id)).await {
                warn!(error = %e, product_id = %product_id, "Failed to send product deleted event");
            }
        }

        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;

        let model = product::Entity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
        filters: ProductFilters,
    ) -> Result<ProductListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = product::Entity::find();

        if let Some(search) = filters.search.as_deref() {
            query = query.filter(
                product::Column::Name
                    .contains(search)
                    .or(product::Column::Sku.contains(search))
                    .or(product::Column::Description.contains(search)),
            );
        }
        if let Some(category) = filters.category {
            query = query.filter(product::Column::Category.eq(category));
        }
        if filters.active_only.unwrap_or(true) {
            query = query.filter(product::Column::IsActive.eq(true));
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let products = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(ProductListResponse {
            products: products.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Distinct non-empty categories across active products, sorted.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<String>, ServiceError> {
        let db = &*self.db_pool;

        let mut categories: Vec<String> = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Category.is_not_null())
            .select_only()
            .column(product::Column::Category)
            .distinct()
            .into_tuple::<Option<String>>()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .collect();

        categories.sort();
        Ok(categories)
    }
}
