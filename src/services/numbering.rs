use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use crate::entities::{purchase, sale};
use crate::errors::ServiceError;

pub const SALE_NUMBER_PREFIX: &str = "SL";
pub const PURCHASE_NUMBER_PREFIX: &str = "PO";

/// Attempts at inserting a freshly generated document number before the
/// collision surfaces as `Conflict`.
pub const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// Builds the shared per-day prefix, e.g. `SL20240115`.
fn day_prefix(prefix: &str, date: DateTime<Utc>) -> String {
    format!("{}{}", prefix, date.format("%Y%m%d"))
}

/// Next sequence for a day given the current maximum document number.
/// A number whose suffix does not parse restarts the sequence at 1.
fn next_sequence(latest: Option<&str>, day_prefix: &str) -> u32 {
    latest
        .and_then(|number| number.strip_prefix(day_prefix))
        .and_then(|suffix| suffix.parse::<u32>().ok())
        .map(|sequence| sequence + 1)
        .unwrap_or(1)
}

fn format_number(day_prefix: &str, sequence: u32) -> String {
    format!("{}{:04}", day_prefix, sequence)
}

/// Generates the next sale number for the given date, reading the current
/// maximum inside the caller's transaction. Uniqueness is enforced by the
/// column constraint; callers retry the whole transaction on a collision.
pub async fn next_sale_number<C: ConnectionTrait>(
    db: &C,
    date: DateTime<Utc>,
) -> Result<String, ServiceError> {
    let prefix = day_prefix(SALE_NUMBER_PREFIX, date);

    let latest = sale::Entity::find()
        .filter(sale::Column::SaleNumber.like(format!("{}%", prefix)))
        .order_by_desc(sale::Column::SaleNumber)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?;

    let sequence = next_sequence(latest.as_ref().map(|s| s.sale_number.as_str()), &prefix);
    let number = format_number(&prefix, sequence);
    debug!(number = %number, "Generated sale number");

    Ok(number)
}

/// Generates the next purchase number for the given date. Same contract as
/// [`next_sale_number`].
pub async fn next_purchase_number<C: ConnectionTrait>(
    db: &C,
    date: DateTime<Utc>,
) -> Result<String, ServiceError> {
    let prefix = day_prefix(PURCHASE_NUMBER_PREFIX, date);

    let latest = purchase::Entity::find()
        .filter(purchase::Column::PurchaseNumber.like(format!("{}%", prefix)))
        .order_by_desc(purchase::Column::PurchaseNumber)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?;

    let sequence = next_sequence(
        latest.as_ref().map(|p| p.purchase_number.as_str()),
        &prefix,
    );
    let number = format_number(&prefix, sequence);
    debug!(number = %number, "Generated purchase number");

    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan_15() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn day_prefix_embeds_date() {
        assert_eq!(day_prefix(SALE_NUMBER_PREFIX, jan_15()), "SL20240115");
        assert_eq!(day_prefix(PURCHASE_NUMBER_PREFIX, jan_15()), "PO20240115");
    }

    #[test]
    fn first_number_of_the_day_starts_at_one() {
        assert_eq!(next_sequence(None, "SL20240115"), 1);
        assert_eq!(format_number("SL20240115", 1), "SL202401150001");
    }

    #[test]
    fn sequence_increments_from_latest() {
        assert_eq!(next_sequence(Some("SL202401150041"), "SL20240115"), 42);
    }

    #[test]
    fn unparseable_suffix_restarts_at_one() {
        assert_eq!(next_sequence(Some("SL20240115ABCD"), "SL20240115"), 1);
        assert_eq!(next_sequence(Some("XX999"), "SL20240115"), 1);
    }

    #[test]
    fn sequence_grows_past_four_digits() {
        assert_eq!(next_sequence(Some("SL202401159999"), "SL20240115"), 10000);
        assert_eq!(format_number("SL20240115", 10000), "SL2024011510000");
    }
}
