use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::product;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Applies a signed stock delta to a product inside the caller's
/// transaction and returns the updated product row.
///
/// Decrements are guarded in the UPDATE itself: the row is only touched when
/// the remaining quantity stays non-negative, so two concurrent callers can
/// never drive stock below zero. There is no activity-flag check here;
/// receiving stock for a deactivated product is allowed.
pub async fn adjust_stock_level<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    delta: i32,
) -> Result<product::Model, ServiceError> {
    let mut update = product::Entity::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).add(delta),
        )
        .filter(product::Column::Id.eq(product_id));

    if delta < 0 {
        update = update.filter(product::Column::StockQuantity.gte(-delta));
    }

    let result = update.exec(db).await.map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        // Distinguish a missing product from a guarded decrement.
        let current = product::Entity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        return match current {
            None => Err(ServiceError::NotFound("Product not found".to_string())),
            Some(p) => Err(ServiceError::InsufficientStock {
                product: p.name,
                available: p.stock_quantity,
                requested: -delta,
            }),
        };
    }

    product::Entity::find_by_id(product_id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
}

/// Request body for the standalone stock adjustment operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AdjustStockRequest {
    /// Signed quantity delta; negative values reduce stock.
    pub adjustment: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockAdjustment {
    pub product_id: Uuid,
    pub new_quantity: i32,
}

/// Stock adjustments outside the sale/purchase flows, e.g. stocktake
/// corrections. Each adjustment runs in its own transaction.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(product_id = %product_id, adjustment = request.adjustment))]
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        request: AdjustStockRequest,
    ) -> Result<StockAdjustment, ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let product_row = adjust_stock_level(&txn, product_id, request.adjustment).await?;
        let new_quantity = product_row.stock_quantity;

        // Adjustments leave an updated_at trail on the product row.
        let touch: product::ActiveModel = product_row.into();
        touch.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            product_id = %product_id,
            adjustment = request.adjustment,
            new_quantity,
            reason = request.reason.as_deref().unwrap_or("not given"),
            "Stock adjusted"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::StockAdjusted {
                    product_id,
                    delta: request.adjustment,
                    new_quantity,
                })
                .await
            {
                warn!(error = %e, product_id = %product_id, "Failed to send stock adjusted event");
            }
        }

        Ok(StockAdjustment {
            product_id,
            new_quantity,
        })
    }
}
