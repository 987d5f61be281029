use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::customer;
use crate::entities::sale::{self, SaleStatus};
use crate::errors::{is_unique_violation, ServiceError};
use crate::events::{Event, EventSender};
use crate::services::sales::{self, SaleListResponse};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Customer name must be between 1 and 200 characters"
    ))]
    pub name: String,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 20, message = "Phone number cannot exceed 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "Address cannot exceed 255 characters"))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCustomerRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Customer name must be between 1 and 200 characters"
    ))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "Phone number cannot exceed 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "Address cannot exceed 255 characters"))]
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<customer::Model> for CustomerResponse {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
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
pub struct CustomerListResponse {
    pub customers: Vec<CustomerResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Purchase history rollup. Lifetime value counts completed sales only;
/// the count and date bounds cover every sale regardless of status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerSummaryResponse {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub sale_count: u64,
    pub lifetime_value: Decimal,
    pub first_sale_date: Option<DateTime<Utc>>,
    pub last_sale_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct CustomerFilters {
    /// Matches name or email.
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let customer_id = Uuid::new_v4();

        let model = customer::ActiveModel {
            id: Set(customer_id),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let created = model.insert(db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("A customer with this email already exists.".to_string())
            } else {
                ServiceError::db_error(e)
            }
        })?;

        info!(customer_id = %created.id, "Customer created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerCreated(created.id)).await {
                warn!(error = %e, customer_id = %created.id, "Failed to send customer created event");
            }
        }

        Ok(created.into())
    }

    #[instrument(skip(self, request), fields(customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let existing = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        let mut active: customer::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("A customer with this email already exists.".to_string())
            } else {
                ServiceError::db_error(e)
            }
        })?;

        info!(customer_id = %updated.id, "Customer updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerUpdated(updated.id)).await {
                warn!(error = %e, customer_id = %updated.id, "Failed to send customer updated event");
            }
        }

        Ok(updated.into())
    }

    /// Removes the customer row outright when no sale references it,
    /// otherwise only deactivates so the sale history stays intact.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let existing = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        let sale_count = sale::Entity::find()
            .filter(sale::Column::CustomerId.eq(customer_id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        if sale_count > 0 {
            let mut active: customer::ActiveModel = existing.into();
            active.is_active = Set(false);
            active.update(db).await.map_err(ServiceError::db_error)?;
            info!(customer_id = %customer_id, sale_count, "Customer deactivated, sales reference it");
        } else {
            existing.delete(db).await.map_err(ServiceError::db_error)?;
            info!(customer_id = %customer_id, "Customer deleted");
        }

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerDeleted(customer_id)).await {
                warn!(error = %e, customer_id = %customer_id, "Failed to send customer deleted event");
            }
        }

        Ok(())
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerResponse, ServiceError> {
        let db = &*self.db_pool;

        let model = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        per_page: u64,
        filters: CustomerFilters,
    ) -> Result<CustomerListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = customer::Entity::find();
        if let Some(search) = filters.search.as_deref() {
            query = query.filter(
                customer::Column::Name
                    .contains(search)
                    .or(customer::Column::Email.contains(search)),
            );
        }

        let paginator = query
            .order_by_desc(customer::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let customers = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(CustomerListResponse {
            customers: customers.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn customer_summary(
        &self,
        customer_id: Uuid,
    ) -> Result<CustomerSummaryResponse, ServiceError> {
        let db = &*self.db_pool;

        let customer_row = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        let customer_sales = sale::Entity::find()
            .filter(sale::Column::CustomerId.eq(customer_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let lifetime_value = customer_sales
            .iter()
            .filter(|s| s.status == SaleStatus::Completed)
            .map(|s| s.net_amount)
            .sum();
        let first_sale_date = customer_sales.iter().map(|s| s.sale_date).min();
        let last_sale_date = customer_sales.iter().map(|s| s.sale_date).max();

        Ok(CustomerSummaryResponse {
            customer_id,
            customer_name: customer_row.name,
            sale_count: customer_sales.len() as u64,
            lifetime_value,
            first_sale_date,
            last_sale_date,
        })
    }

    /// The customer's sales, newest first.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list_customer_sales(
        &self,
        customer_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<SaleListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let customer_row = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        let paginator = sale::Entity::find()
            .filter(sale::Column::CustomerId.eq(customer_id))
            .order_by_desc(sale::Column::SaleDate)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let sale_rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        let sale_responses = sale_rows
            .into_iter()
            .map(|s| sales::header_response(s, Some(customer_row.name.clone())))
            .collect();

        Ok(SaleListResponse {
            sales: sale_responses,
            total,
            page,
            per_page,
        })
    }
}
