use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::supplier;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateSupplierRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Supplier name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(length(max = 100, message = "Contact person cannot exceed 100 characters"))]
    pub contact_person: Option<String>,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "Phone number cannot exceed 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "Address cannot exceed 255 characters"))]
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplierResponse {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<supplier::Model> for SupplierResponse {
    fn from(model: supplier::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            contact_person: model.contact_person,
            email: model.email,
            phone: model.phone,
            address: model.address,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SupplierListResponse {
    pub suppliers: Vec<SupplierResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct SupplierFilters {
    /// Defaults to true; pass false to include deactivated suppliers.
    pub active_only: Option<bool>,
}

#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<SupplierResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let supplier_id = Uuid::new_v4();

        let model = supplier::ActiveModel {
            id: Set(supplier_id),
            name: Set(request.name),
            contact_person: Set(request.contact_person),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let created = model.insert(db).await.map_err(ServiceError::db_error)?;

        info!(supplier_id = %created.id, "Supplier created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::SupplierCreated(created.id)).await {
                warn!(error = %e, supplier_id = %created.id, "Failed to send supplier created event");
            }
        }

        Ok(created.into())
    }

    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn get_supplier(&self, supplier_id: Uuid) -> Result<SupplierResponse, ServiceError> {
        let db = &*self.db_pool;

        let model = supplier::Entity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Supplier not found".to_string()))?;

        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        per_page: u64,
        filters: SupplierFilters,
    ) -> Result<SupplierListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = supplier::Entity::find();
        if filters.active_only.unwrap_or(true) {
            query = query.filter(supplier::Column::IsActive.eq(true));
        }

        let paginator = query
            .order_by_desc(supplier::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let suppliers = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(SupplierListResponse {
            suppliers: suppliers.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        })
    }
}
