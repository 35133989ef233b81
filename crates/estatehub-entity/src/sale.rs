//! Sale entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A completed sale of a property to a buyer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    /// Sale id.
    pub id: i64,
    /// Property that was sold.
    pub property_id: i64,
    /// Buying account.
    pub buyer_id: i64,
    /// When the sale was recorded.
    pub sale_date: DateTime<Utc>,
    /// Agreed price.
    pub final_price: f64,
    /// Account that recorded the sale (0 = unowned).
    pub owner_id: i64,
}

/// Writable fields of a sale.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaleInput {
    /// Property that was sold.
    #[validate(range(min = 1))]
    pub property_id: i64,
    /// Buying account.
    #[validate(range(min = 1))]
    pub buyer_id: i64,
    /// Agreed price.
    #[validate(range(min = 0.0, message = "final_price must not be negative"))]
    pub final_price: f64,
}
