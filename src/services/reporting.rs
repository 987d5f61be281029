use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::product;
use crate::entities::purchase;
use crate::entities::sale::{self, SaleStatus};
use crate::entities::{customer, sale_item, supplier};
use crate::errors::ServiceError;

/// Stock at or below this level (but above zero) counts as low.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

const ACTIVE_RECENCY_DAYS: i64 = 30;
const RECENT_RECENCY_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportGroupBy {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

/// One aggregation bucket of the sales report or dashboard series.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesPeriodData {
    pub period_start: NaiveDate,
    pub total_orders: u64,
    pub total_sales: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub average_order_value: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopProductData {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesReportResponse {
    pub period: String,
    pub group_by: ReportGroupBy,
    pub periods: Vec<SalesPeriodData>,
    pub total_orders: u64,
    pub total_sales: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub top_products: Vec<TopProductData>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesDashboardResponse {
    pub period: String,
    pub total_sales: Decimal,
    pub total_orders: u64,
    pub average_order_value: Decimal,
    pub daily_sales: Vec<SalesPeriodData>,
    pub top_products: Vec<TopProductData>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryProductData {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub stock_quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryBreakdown {
    pub category: Option<String>,
    pub product_count: u64,
    pub total_value: Decimal,
    pub low_stock_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventorySummaryResponse {
    pub total_products: u64,
    pub total_value: Decimal,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub low_stock_products: Vec<InventoryProductData>,
    pub out_of_stock_products: Vec<InventoryProductData>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerActivityData {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub email: String,
    pub total_orders: u64,
    pub total_spent: Decimal,
    pub last_order_date: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerAnalyticsResponse {
    pub period: String,
    pub total_active_customers: u64,
    pub new_customers: u64,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub top_customers: Vec<CustomerActivityData>,
    pub customers_by_status: HashMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplierSpendData {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub total_purchases: u64,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseReportResponse {
    pub period: String,
    pub total_purchases: u64,
    pub total_amount: Decimal,
    pub purchases_by_status: HashMap<String, u64>,
    pub top_suppliers: Vec<SupplierSpendData>,
}

/// Read-only rollups over sales, purchases, products and customers.
/// Every report runs plain reads and may observe writers mid-flight, so
/// figures are a snapshot, not a ledger.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Aggregates completed sales between `from` and `to` into daily,
    /// weekly or monthly buckets, with document-range totals and the top
    /// ten products by revenue.
    #[instrument(skip(self))]
    pub async fn sales_report(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        group_by: ReportGroupBy,
    ) -> Result<SalesReportResponse, ServiceError> {
        let db = &*self.db_pool;

        let sales_with_items = sale::Entity::find()
            .filter(sale::Column::Status.eq(SaleStatus::Completed))
            .filter(sale::Column::SaleDate.gte(from))
            .filter(sale::Column::SaleDate.lte(to))
            .find_with_related(sale_item::Entity)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let periods = bucket_sales(
            sales_with_items.iter().map(|(s, _)| s),
            group_by,
        );

        let total_orders = periods.iter().map(|p| p.total_orders).sum();
        let total_sales = periods.iter().map(|p| p.total_sales).sum();
        let total_discount = periods.iter().map(|p| p.total_discount).sum();
        let total_tax = periods.iter().map(|p| p.total_tax).sum();

        let items = sales_with_items.iter().flat_map(|(_, items)| items);
        let top_products = self.top_products_by_revenue(items).await?;

        Ok(SalesReportResponse {
            period: format!("{} to {}", from.date_naive(), to.date_naive()),
            group_by,
            periods,
            total_orders,
            total_sales,
            total_discount,
            total_tax,
            top_products,
        })
    }

    /// Rolling window over the last `days` days of completed sales: a
    /// per-day series, window totals with a zero-safe average order value,
    /// and the top ten products.
    #[instrument(skip(self))]
    pub async fn sales_dashboard(
        &self,
        days: i64,
    ) -> Result<SalesDashboardResponse, ServiceError> {
        let db = &*self.db_pool;
        let days = days.max(1);

        let today = Utc::now().date_naive();
        let window_start = day_start(today - Duration::days(days));
        let window_end = day_start(today + Duration::days(1));

        let sales_with_items = sale::Entity::find()
            .filter(sale::Column::Status.eq(SaleStatus::Completed))
            .filter(sale::Column::SaleDate.gte(window_start))
            .filter(sale::Column::SaleDate.lt(window_end))
            .find_with_related(sale_item::Entity)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let daily_sales = bucket_sales(
            sales_with_items.iter().map(|(s, _)| s),
            ReportGroupBy::Daily,
        );

        let total_sales: Decimal = daily_sales.iter().map(|p| p.total_sales).sum();
        let total_orders: u64 = daily_sales.iter().map(|p| p.total_orders).sum();
        let average_order_value = if total_orders > 0 {
            total_sales / Decimal::from(total_orders)
        } else {
            Decimal::ZERO
        };

        let items = sales_with_items.iter().flat_map(|(_, items)| items);
        let top_products = self.top_products_by_revenue(items).await?;

        Ok(SalesDashboardResponse {
            period: format!("Last {} days", days),
            total_sales,
            total_orders,
            average_order_value,
            daily_sales,
            top_products,
        })
    }

    /// Point-in-time snapshot of the active catalog: counts and lists of
    /// low-stock and out-of-stock products, the total on-hand value and a
    /// per-category breakdown.
    #[instrument(skip(self))]
    pub async fn inventory_summary(&self) -> Result<InventorySummaryResponse, ServiceError> {
        let db = &*self.db_pool;

        let products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let total_value: Decimal = products
            .iter()
            .map(|p| p.price * Decimal::from(p.stock_quantity))
            .sum();

        let mut low_stock: Vec<&product::Model> = products
            .iter()
            .filter(|p| p.stock_quantity > 0 && p.stock_quantity <= LOW_STOCK_THRESHOLD)
            .collect();
        let mut out_of_stock: Vec<&product::Model> = products
            .iter()
            .filter(|p| p.stock_quantity == 0)
            .collect();
        low_stock.sort_by_key(|p| p.stock_quantity);
        out_of_stock.sort_by(|a, b| a.name.cmp(&b.name));

        let mut by_category: HashMap<Option<String>, (u64, Decimal, u64)> = HashMap::new();
        for p in &products {
            let entry = by_category
                .entry(p.category.clone())
                .or_insert((0, Decimal::ZERO, 0));
            entry.0 += 1;
            entry.1 += p.price * Decimal::from(p.stock_quantity);
            if p.stock_quantity > 0 && p.stock_quantity <= LOW_STOCK_THRESHOLD {
                entry.2 += 1;
            }
        }
        let mut category_breakdown: Vec<CategoryBreakdown> = by_category
            .into_iter()
            .map(|(category, (product_count, total_value, low_stock_count))| CategoryBreakdown {
                category,
                product_count,
                total_value,
                low_stock_count,
            })
            .collect();
        category_breakdown.sort_by(|a, b| a.category.cmp(&b.category));

        Ok(InventorySummaryResponse {
            total_products: products.len() as u64,
            total_value,
            low_stock_count: low_stock.len() as u64,
            out_of_stock_count: out_of_stock.len() as u64,
            category_breakdown,
            low_stock_products: low_stock
                .into_iter()
                .take(10)
                .map(inventory_product_data)
                .collect(),
            out_of_stock_products: out_of_stock
                .into_iter()
                .take(10)
                .map(inventory_product_data)
                .collect(),
        })
    }

    /// Segments active customers by how recently they completed a sale
    /// within the window. Customers with no completed sales in the window
    /// fall into the Inactive segment and produce no activity row.
    #[instrument(skip(self))]
    pub async fn customer_analytics(
        &self,
        days: i64,
    ) -> Result<CustomerAnalyticsResponse, ServiceError> {
        let db = &*self.db_pool;
        let days = days.max(1);

        let today = Utc::now().date_naive();
        let window_start = day_start(today - Duration::days(days));

        let customers = customer::Entity::find()
            .filter(customer::Column::IsActive.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let window_sales = sale::Entity::find()
            .filter(sale::Column::Status.eq(SaleStatus::Completed))
            .filter(sale::Column::SaleDate.gte(window_start))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut sales_by_customer: HashMap<Uuid, Vec<&sale::Model>> = HashMap::new();
        for s in &window_sales {
            sales_by_customer.entry(s.customer_id).or_default().push(s);
        }

        let mut customers_by_status: HashMap<String, u64> = HashMap::new();
        let mut activity: Vec<CustomerActivityData> = Vec::new();

        for c in &customers {
            match sales_by_customer.get(&c.id) {
                Some(customer_sales) => {
                    let total_spent: Decimal =
                        customer_sales.iter().map(|s| s.net_amount).sum();
                    let last_order_date = customer_sales
                        .iter()
                        .map(|s| s.sale_date)
                        .max()
                        .unwrap_or(c.created_at);
                    let status = recency_status(last_order_date.date_naive(), today);
                    *customers_by_status.entry(status.to_string()).or_insert(0) += 1;
                    activity.push(CustomerActivityData {
                        customer_id: c.id,
                        customer_name: c.name.clone(),
                        email: c.email.clone(),
                        total_orders: customer_sales.len() as u64,
                        total_spent,
                        last_order_date,
                        status: status.to_string(),
                    });
                }
                None => {
                    *customers_by_status
                        .entry("Inactive".to_string())
                        .or_insert(0) += 1;
                }
            }
        }

        let total_active_customers = activity.len() as u64;
        let total_revenue: Decimal = activity.iter().map(|c| c.total_spent).sum();
        let average_order_value = if activity.is_empty() {
            Decimal::ZERO
        } else {
            let per_customer: Decimal = activity
                .iter()
                .map(|c| c.total_spent / Decimal::from(c.total_orders))
                .sum();
            per_customer / Decimal::from(activity.len() as u64)
        };

        activity.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
        activity.truncate(10);

        let new_customers = customer::Entity::find()
            .filter(customer::Column::CreatedAt.gte(window_start))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(CustomerAnalyticsResponse {
            period: format!("Last {} days", days),
            total_active_customers,
            new_customers,
            total_revenue,
            average_order_value,
            top_customers: activity,
            customers_by_status,
        })
    }

    /// Purchase totals between `from` and `to`, counts per status and the
    /// top ten suppliers by spend. All statuses count toward the totals.
    #[instrument(skip(self))]
    pub async fn purchase_report(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PurchaseReportResponse, ServiceError> {
        let db = &*self.db_pool;

        let purchases = purchase::Entity::find()
            .filter(purchase::Column::PurchaseDate.gte(from))
            .filter(purchase::Column::PurchaseDate.lte(to))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let total_amount: Decimal = purchases.iter().map(|p| p.net_amount).sum();

        let mut purchases_by_status: HashMap<String, u64> = HashMap::new();
        let mut by_supplier: HashMap<Uuid, (u64, Decimal)> = HashMap::new();
        for p in &purchases {
            *purchases_by_status
                .entry(p.status.to_string())
                .or_insert(0) += 1;
            let entry = by_supplier
                .entry(p.supplier_id)
                .or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += p.net_amount;
        }

        let supplier_ids: Vec<Uuid> = by_supplier.keys().copied().collect();
        let supplier_names: HashMap<Uuid, String> = if supplier_ids.is_empty() {
            HashMap::new()
        } else {
            supplier::Entity::find()
                .filter(supplier::Column::Id.is_in(supplier_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect()
        };

        let mut top_suppliers: Vec<SupplierSpendData> = by_supplier
            .into_iter()
            .map(|(supplier_id, (total_purchases, total_amount))| SupplierSpendData {
                supplier_id,
                supplier_name: supplier_names
                    .get(&supplier_id)
                    .cloned()
                    .unwrap_or_default(),
                total_purchases,
                total_amount,
            })
            .collect();
        top_suppliers.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
        top_suppliers.truncate(10);

        Ok(PurchaseReportResponse {
            period: format!("{} to {}", from.date_naive(), to.date_naive()),
            total_purchases: purchases.len() as u64,
            total_amount,
            purchases_by_status,
            top_suppliers,
        })
    }

    async fn top_products_by_revenue<'a>(
        &self,
        items: impl Iterator<Item = &'a sale_item::Model>,
    ) -> Result<Vec<TopProductData>, ServiceError> {
        let db = &*self.db_pool;

        let mut by_product: HashMap<Uuid, (i64, Decimal)> = HashMap::new();
        for item in items {
            let entry = by_product
                .entry(item.product_id)
                .or_insert((0, Decimal::ZERO));
            entry.0 += i64::from(item.quantity);
            entry.1 += item.total_price;
        }

        let product_ids: Vec<Uuid> = by_product.keys().copied().collect();
        let product_info: HashMap<Uuid, (String, String)> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|p| (p.id, (p.name, p.sku)))
                .collect()
        };

        let mut top_products: Vec<TopProductData> = by_product
            .into_iter()
            .map(|(product_id, (quantity_sold, revenue))| {
                let (product_name, sku) =
                    product_info.get(&product_id).cloned().unwrap_or_default();
                TopProductData {
                    product_id,
                    product_name,
                    sku,
                    quantity_sold,
                    revenue,
                }
            })
            .collect();
        top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue));
        top_products.truncate(10);

        Ok(top_products)
    }
}

fn inventory_product_data(p: &product::Model) -> InventoryProductData {
    InventoryProductData {
        id: p.id,
        name: p.name.clone(),
        sku: p.sku.clone(),
        stock_quantity: p.stock_quantity,
        price: p.price,
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Maps a sale date to the start of its aggregation bucket.
fn period_start(date: NaiveDate, group_by: ReportGroupBy) -> NaiveDate {
    match group_by {
        ReportGroupBy::Daily => date,
        ReportGroupBy::Weekly => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        ReportGroupBy::Monthly => date.with_day(1).unwrap_or(date),
    }
}

fn recency_status(last_order: NaiveDate, today: NaiveDate) -> &'static str {
    if last_order >= today - Duration::days(ACTIVE_RECENCY_DAYS) {
        "Active"
    } else if last_order >= today - Duration::days(RECENT_RECENCY_DAYS) {
        "Recent"
    } else {
        "Inactive"
    }
}

fn bucket_sales<'a>(
    sales: impl Iterator<Item = &'a sale::Model>,
    group_by: ReportGroupBy,
) -> Vec<SalesPeriodData> {
    let mut buckets: HashMap<NaiveDate, (u64, Decimal, Decimal, Decimal)> = HashMap::new();
    for s in sales {
        let key = period_start(s.sale_date.date_naive(), group_by);
        let entry = buckets
            .entry(key)
            .or_insert((0, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += s.net_amount;
        entry.2 += s.discount_amount;
        entry.3 += s.tax_amount;
    }

    let mut periods: Vec<SalesPeriodData> = buckets
        .into_iter()
        .map(
            |(period_start, (total_orders, total_sales, total_discount, total_tax))| {
                let average_order_value = if total_orders > 0 {
                    total_sales / Decimal::from(total_orders)
                } else {
                    Decimal::ZERO
                };
                SalesPeriodData {
                    period_start,
                    total_orders,
                    total_sales,
                    total_discount,
                    total_tax,
                    average_order_value,
                }
            },
        )
        .collect();
    periods.sort_by_key(|p| p.period_start);
    periods
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_bucket_is_the_date_itself() {
        let d = date(2025, 3, 14);
        assert_eq!(period_start(d, ReportGroupBy::Daily), d);
    }

    #[test]
    fn weekly_bucket_starts_on_monday() {
        // 2025-03-14 is a Friday; its week starts 2025-03-10.
        assert_eq!(
            period_start(date(2025, 3, 14), ReportGroupBy::Weekly),
            date(2025, 3, 10)
        );
        // A Monday maps to itself.
        assert_eq!(
            period_start(date(2025, 3, 10), ReportGroupBy::Weekly),
            date(2025, 3, 10)
        );
    }

    #[test]
    fn monthly_bucket_is_first_of_month() {
        assert_eq!(
            period_start(date(2025, 3, 14), ReportGroupBy::Monthly),
            date(2025, 3, 1)
        );
    }

    #[test]
    fn recency_boundaries() {
        let today = date(2025, 6, 1);
        assert_eq!(recency_status(today, today), "Active");
        assert_eq!(recency_status(today - Duration::days(30), today), "Active");
        assert_eq!(recency_status(today - Duration::days(31), today), "Recent");
        assert_eq!(recency_status(today - Duration::days(90), today), "Recent");
        assert_eq!(
            recency_status(today - Duration::days(91), today),
            "Inactive"
        );
    }
}
